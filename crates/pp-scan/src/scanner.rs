use log::trace;
use pp_core::ImageView;
use serde::{Deserialize, Serialize};

use crate::profile::{ProfileKernel, RowProfile};

/// Number of minima reported per row.
pub const MAX_MINIMA: usize = 3;
/// Slots tracked while scanning; the extra slot competes for a place among
/// the reported minima.
const SLOTS: usize = MAX_MINIMA + 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanMode {
    /// Thresholds at 33% and 50% of the row's own grey range.
    #[default]
    Relative,
    /// Report only the darkest profile sample.
    Simple,
    /// Thresholds taken from `lower_threshold` / `upper_threshold`.
    Absolute,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub mode: ScanMode,
    pub window_x: usize,
    pub window_y: usize,
    /// Mean grey level below which a sample counts as dark. Flat-row minima
    /// must also stay below it to take part in chains.
    pub lower_threshold: u32,
    /// Mean grey level at or above which a sample counts as bright.
    pub upper_threshold: u32,
    pub min_rows_below: usize,
    pub min_rows_above: usize,
    /// Rows whose grey range (per pixel) is below this are treated as flat.
    pub flat_range: u32,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            mode: ScanMode::Relative,
            window_x: 4,
            window_y: 4,
            lower_threshold: 50,
            upper_threshold: 100,
            min_rows_below: 4,
            min_rows_above: 4,
            flat_range: 30,
        }
    }
}

impl ScanConfig {
    pub fn kernel(&self) -> ProfileKernel {
        ProfileKernel::Centered {
            wx: self.window_x.max(1),
            wy: self.window_y.max(1),
        }
    }
}

/// A dark run found on one scan line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanMinimum {
    /// Column where the profile dropped below the lower threshold.
    pub left: i32,
    /// Column where the profile climbed back to the lower threshold.
    pub right: i32,
    /// Column of the darkest sample.
    pub position: i32,
    /// Darkest filtered value divided by the filter area.
    pub grey: i32,
    /// Reported from a flat row or in [`ScanMode::Simple`]; both edges sit
    /// on the darkest column.
    pub flat: bool,
}

impl ScanMinimum {
    pub fn width(&self) -> i32 {
        self.right - self.left
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowScan {
    /// First image row of the filter band.
    pub row: usize,
    /// Up to [`MAX_MINIMA`] minima, left to right.
    pub minima: Vec<ScanMinimum>,
}

/// Raw-sum thresholds for one row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    pub lower: u32,
    pub upper: u32,
}

/// Counters required before a dark run is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunLengths {
    pub below: usize,
    pub above: usize,
}

/// A minimum while it is being tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OpenMinimum {
    pub left: usize,
    pub right: usize,
    pub position: usize,
    /// Darkest raw sum seen so far; 0 means the slot is unused.
    pub value: u32,
    pub below: usize,
    pub above: usize,
}

impl OpenMinimum {
    fn open(col: usize, v: u32) -> Self {
        Self {
            left: col,
            right: col,
            position: col,
            value: v,
            below: 1,
            above: 0,
        }
    }

    fn track_darker(&mut self, col: usize, v: u32) {
        if v < self.value {
            self.value = v;
            self.position = col;
        }
    }
}

/// Scanner state. The payload is the slot of the minimum being tracked
/// (`0..=3`, slot 3 being the replacement candidate).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    /// Waiting for the first bright sample.
    Start,
    /// Bright, waiting for a drop below the lower threshold.
    High(usize),
    /// Inside a dark run.
    Below(usize),
    /// Between the thresholds after a dark run.
    Between(usize),
    /// Bright again after a dark run; counting bright samples.
    Above(usize),
}

impl ScanState {
    /// Advances by one profile sample `v` at column `col`, updating `slots`.
    pub fn step(
        self,
        col: usize,
        v: u32,
        th: Thresholds,
        runs: RunLengths,
        slots: &mut [OpenMinimum; SLOTS],
    ) -> ScanState {
        match self {
            Self::Start => {
                if v >= th.upper {
                    Self::High(0)
                } else {
                    Self::Start
                }
            }
            Self::High(k) => {
                if v < th.lower {
                    slots[k] = OpenMinimum::open(col, v);
                    Self::Below(k)
                } else {
                    Self::High(k)
                }
            }
            Self::Below(k) => {
                if v >= th.lower {
                    slots[k].right = col;
                    Self::Between(k)
                } else {
                    slots[k].track_darker(col, v);
                    slots[k].below += 1;
                    Self::Below(k)
                }
            }
            Self::Between(k) => {
                if v >= th.upper {
                    if slots[k].below >= runs.below {
                        slots[k].above = 1;
                        Self::Above(k)
                    } else {
                        slots[k] = OpenMinimum::default();
                        Self::High(k)
                    }
                } else if v < th.lower {
                    slots[k].track_darker(col, v);
                    slots[k].below += 1;
                    Self::Below(k)
                } else {
                    Self::Between(k)
                }
            }
            Self::Above(k) => {
                if v >= th.upper {
                    slots[k].above += 1;
                    if slots[k].above < runs.above {
                        Self::Above(k)
                    } else if k + 1 < SLOTS {
                        Self::High(k + 1)
                    } else {
                        replace_weakest(slots);
                        Self::High(k)
                    }
                } else if v >= th.lower {
                    Self::Between(k)
                } else {
                    slots[k].below += 1;
                    Self::Below(k)
                }
            }
        }
    }
}

/// Folds the replacement slot into the reported minima: it takes the place
/// of the weakest (highest value) one if it is darker. Order is kept.
fn replace_weakest(slots: &mut [OpenMinimum; SLOTS]) {
    let cand = slots[MAX_MINIMA];
    slots[MAX_MINIMA] = OpenMinimum::default();

    let mut weakest = 0;
    for k in 1..MAX_MINIMA {
        if slots[k].value > slots[weakest].value {
            weakest = k;
        }
    }
    if cand.value < slots[weakest].value {
        slots.copy_within(weakest + 1..MAX_MINIMA, weakest);
        slots[MAX_MINIMA - 1] = cand;
    }
}

/// Multi-minimum row scanner with reusable buffers.
#[derive(Debug, Clone, Default)]
pub struct MultiMinimumScanner {
    profile: RowProfile,
}

impl MultiMinimumScanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Profile of the most recent scan.
    pub fn profile(&self) -> &RowProfile {
        &self.profile
    }

    /// Finds up to three dark runs along the band starting at `row`,
    /// restricted to the column span `cols`.
    ///
    /// Flat rows and [`ScanMode::Simple`] report the single darkest sample
    /// with both edges at its column.
    pub fn scan_row(
        &mut self,
        img: &ImageView<'_, u8>,
        row: i32,
        cols: (i32, i32),
        cfg: &ScanConfig,
    ) -> RowScan {
        self.profile.compute(img, row, cols, cfg.kernel());
        let row = self.profile.row();
        let area = self.profile.area();

        let (Some((min_col, min)), Some(max)) = (self.profile.min(), self.profile.max()) else {
            return RowScan {
                row,
                minima: Vec::new(),
            };
        };

        if (max - min) / area < cfg.flat_range || cfg.mode == ScanMode::Simple {
            let c = min_col as i32;
            return RowScan {
                row,
                minima: vec![ScanMinimum {
                    left: c,
                    right: c,
                    position: c,
                    grey: (min / area) as i32,
                    flat: true,
                }],
            };
        }

        let th = match cfg.mode {
            ScanMode::Absolute => Thresholds {
                lower: cfg.lower_threshold * area,
                upper: cfg.upper_threshold * area,
            },
            _ => {
                let range = (max - min) as f32;
                Thresholds {
                    lower: min + (0.33 * range) as u32,
                    upper: min + (0.50 * range) as u32,
                }
            }
        };
        let runs = RunLengths {
            below: cfg.min_rows_below,
            above: cfg.min_rows_above,
        };

        let mut slots = [OpenMinimum::default(); SLOTS];
        let mut state = ScanState::Start;
        for (col, v) in self.profile.iter() {
            state = state.step(col, v, th, runs, &mut slots);
        }

        let complete = finish(state, runs, &mut slots);
        let minima = slots[..complete]
            .iter()
            .map(|m| ScanMinimum {
                left: m.left as i32,
                right: m.right as i32,
                position: m.position as i32,
                grey: (m.value / area) as i32,
                flat: false,
            })
            .collect::<Vec<_>>();

        trace!("row {row}: {} minima, end state {state:?}", minima.len());
        RowScan { row, minima }
    }
}

/// Resolves the minimum still open when the row ends and returns how many
/// leading slots hold accepted minima.
fn finish(state: ScanState, runs: RunLengths, slots: &mut [OpenMinimum; SLOTS]) -> usize {
    match state {
        ScanState::Start => 0,
        ScanState::High(k) | ScanState::Below(k) => k.min(MAX_MINIMA),
        ScanState::Between(k) | ScanState::Above(k) => {
            let closed = slots[k].below >= runs.below;
            if k < MAX_MINIMA {
                if closed { k + 1 } else { k }
            } else {
                if closed {
                    replace_weakest(slots);
                }
                MAX_MINIMA
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pp_core::{Image, PixelBox};

    use super::{
        MultiMinimumScanner, OpenMinimum, RunLengths, SLOTS, ScanConfig, ScanMode, ScanState,
        Thresholds, finish, replace_weakest,
    };

    const TH: Thresholds = Thresholds {
        lower: 50,
        upper: 100,
    };
    const RUNS: RunLengths = RunLengths { below: 2, above: 2 };

    fn slots() -> [OpenMinimum; SLOTS] {
        [OpenMinimum::default(); SLOTS]
    }

    #[test]
    fn start_waits_for_bright_sample() {
        let mut s = slots();
        assert_eq!(ScanState::Start.step(0, 99, TH, RUNS, &mut s), ScanState::Start);
        assert_eq!(ScanState::Start.step(0, 100, TH, RUNS, &mut s), ScanState::High(0));
    }

    #[test]
    fn high_opens_minimum_below_lower() {
        let mut s = slots();
        assert_eq!(ScanState::High(1).step(7, 50, TH, RUNS, &mut s), ScanState::High(1));
        assert_eq!(ScanState::High(1).step(7, 20, TH, RUNS, &mut s), ScanState::Below(1));
        assert_eq!(s[1].left, 7);
        assert_eq!(s[1].position, 7);
        assert_eq!(s[1].value, 20);
        assert_eq!(s[1].below, 1);
    }

    #[test]
    fn below_tracks_darkest_and_closes_on_lower() {
        let mut s = slots();
        s[0] = OpenMinimum::open(3, 30);
        assert_eq!(ScanState::Below(0).step(4, 10, TH, RUNS, &mut s), ScanState::Below(0));
        assert_eq!((s[0].position, s[0].value, s[0].below), (4, 10, 2));
        assert_eq!(ScanState::Below(0).step(5, 40, TH, RUNS, &mut s), ScanState::Below(0));
        assert_eq!((s[0].position, s[0].below), (4, 3));
        assert_eq!(ScanState::Below(0).step(6, 60, TH, RUNS, &mut s), ScanState::Between(0));
        assert_eq!(s[0].right, 6);
    }

    #[test]
    fn between_rejects_short_dark_run() {
        let mut s = slots();
        s[2] = OpenMinimum::open(3, 30);
        assert_eq!(ScanState::Between(2).step(9, 70, TH, RUNS, &mut s), ScanState::Between(2));
        assert_eq!(ScanState::Between(2).step(9, 120, TH, RUNS, &mut s), ScanState::High(2));
        assert_eq!(s[2], OpenMinimum::default());
    }

    #[test]
    fn between_moves_to_above_or_back_below() {
        let mut s = slots();
        s[0] = OpenMinimum::open(3, 30);
        s[0].below = 2;
        assert_eq!(ScanState::Between(0).step(8, 10, TH, RUNS, &mut s), ScanState::Below(0));
        assert_eq!((s[0].position, s[0].value, s[0].below), (8, 10, 3));
        assert_eq!(ScanState::Between(0).step(9, 100, TH, RUNS, &mut s), ScanState::Above(0));
        assert_eq!(s[0].above, 1);
    }

    #[test]
    fn above_accepts_after_enough_bright_samples() {
        let mut s = slots();
        s[0] = OpenMinimum::open(3, 30);
        s[0].above = 1;
        assert_eq!(ScanState::Above(0).step(9, 150, TH, RUNS, &mut s), ScanState::High(1));
        assert_eq!(s[0].above, 2);
    }

    #[test]
    fn above_falls_back_without_updating_value() {
        let mut s = slots();
        s[1] = OpenMinimum::open(3, 30);
        s[1].above = 1;
        assert_eq!(ScanState::Above(1).step(9, 70, TH, RUNS, &mut s), ScanState::Between(1));
        assert_eq!(ScanState::Above(1).step(10, 5, TH, RUNS, &mut s), ScanState::Below(1));
        assert_eq!((s[1].value, s[1].position, s[1].below), (30, 3, 2));
    }

    #[test]
    fn fourth_minimum_replaces_weakest() {
        let mut s = slots();
        s[0] = OpenMinimum::open(10, 40);
        s[1] = OpenMinimum::open(20, 90);
        s[2] = OpenMinimum::open(30, 60);
        s[3] = OpenMinimum::open(40, 20);
        s[3].above = 1;

        assert_eq!(ScanState::Above(3).step(45, 200, TH, RUNS, &mut s), ScanState::High(3));
        assert_eq!(
            [s[0].position, s[1].position, s[2].position],
            [10, 30, 40]
        );
        assert_eq!(s[3], OpenMinimum::default());
    }

    #[test]
    fn brighter_fourth_minimum_is_dropped() {
        let mut s = slots();
        s[0] = OpenMinimum::open(10, 40);
        s[1] = OpenMinimum::open(20, 45);
        s[2] = OpenMinimum::open(30, 50);
        s[3] = OpenMinimum::open(40, 70);
        replace_weakest(&mut s);
        assert_eq!([s[0].value, s[1].value, s[2].value], [40, 45, 50]);
    }

    #[test]
    fn finish_counts_closed_minima() {
        let mut s = slots();
        s[0] = OpenMinimum::open(1, 10);
        s[0].below = 3;
        s[1] = OpenMinimum::open(5, 10);
        assert_eq!(finish(ScanState::Below(1), RUNS, &mut s), 1);
        assert_eq!(finish(ScanState::Between(1), RUNS, &mut s), 1);
        s[1].below = 2;
        assert_eq!(finish(ScanState::Above(1), RUNS, &mut s), 2);
        assert_eq!(finish(ScanState::Start, RUNS, &mut s), 0);
    }

    fn stripes(width: usize, height: usize, dark: &[(usize, usize)]) -> Image<u8> {
        let mut data = vec![200u8; width * height];
        for y in 0..height {
            for &(x0, x1) in dark {
                for x in x0..x1 {
                    data[y * width + x] = 40;
                }
            }
        }
        Image::from_vec(width, height, data).expect("valid image")
    }

    #[test]
    fn single_stripe_found_with_edges() {
        let img = stripes(120, 20, &[(50, 60)]);
        let mut scanner = MultiMinimumScanner::new();
        let scan = scanner.scan_row(&img.as_view(), 5, (5, 115), &ScanConfig::default());

        assert_eq!(scan.row, 5);
        assert_eq!(scan.minima.len(), 1);
        let m = scan.minima[0];
        assert!((m.left - 50).abs() <= 2, "left {}", m.left);
        assert!((m.right - 61).abs() <= 2, "right {}", m.right);
        assert!(m.position > m.left && m.position < m.right);
        assert_eq!(m.grey, 40);
        assert!(!m.flat);
    }

    #[test]
    fn three_stripes_reported_left_to_right() {
        let img = stripes(200, 10, &[(30, 40), (80, 90), (130, 140)]);
        let mut scanner = MultiMinimumScanner::new();
        let scan = scanner.scan_row(&img.as_view(), 0, (5, 195), &ScanConfig::default());

        let pos: Vec<i32> = scan.minima.iter().map(|m| m.position).collect();
        assert_eq!(pos.len(), 3);
        assert!(pos.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn flat_row_reports_global_minimum() {
        let img = Image::new_fill(60, 10, 200u8);
        let mut scanner = MultiMinimumScanner::new();
        let scan = scanner.scan_row(&img.as_view(), 0, (5, 55), &ScanConfig::default());
        assert_eq!(scan.minima.len(), 1);
        let m = scan.minima[0];
        assert_eq!((m.left, m.right, m.position), (7, 7, 7));
        assert_eq!(m.grey, 200);
        assert!(m.flat);
    }

    #[test]
    fn simple_mode_reports_darkest_column() {
        let img = stripes(120, 10, &[(30, 40), (80, 84)]);
        let cfg = ScanConfig {
            mode: ScanMode::Simple,
            ..ScanConfig::default()
        };
        let mut scanner = MultiMinimumScanner::new();
        let scan = scanner.scan_row(&img.as_view(), 0, (0, 120), &cfg);
        assert_eq!(scan.minima.len(), 1);
        assert!((30..40).contains(&scan.minima[0].position));
        assert!(scan.minima[0].flat);
    }

    #[test]
    fn absolute_thresholds_skip_shallow_dip() {
        let mut img = stripes(120, 10, &[(30, 40)]);
        img.fill_box(PixelBox::new(70, 0, 79, 9), 80);
        let cfg = ScanConfig {
            mode: ScanMode::Absolute,
            ..ScanConfig::default()
        };
        let mut scanner = MultiMinimumScanner::new();
        let scan = scanner.scan_row(&img.as_view(), 0, (0, 120), &cfg);
        assert_eq!(scan.minima.len(), 1);
        assert!((30..40).contains(&scan.minima[0].position));
    }
}
