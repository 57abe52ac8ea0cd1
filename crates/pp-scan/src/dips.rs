use pp_core::{ImageView, RingBuffer};
use serde::{Deserialize, Serialize};

use crate::profile::{ProfileKernel, RowProfile};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DipMode {
    /// A dip closes as soon as the profile rises by `grey_distance`.
    #[default]
    Plain,
    /// As `Plain`, but the closing sample must also reach the lower threshold.
    Floor,
    /// Keep only dips with bright flanks on both sides and a dark core.
    Contrast,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DipConfig {
    pub window_x: usize,
    pub window_y: usize,
    pub lower_threshold: u32,
    pub upper_threshold: u32,
    /// Minimum per-pixel grey step that opens and closes a dip.
    pub grey_distance: u32,
    /// `Contrast` mode: bright 4-sample means required on each flank.
    pub min_above: usize,
    /// `Contrast` mode: dark samples required around the dip.
    pub min_below: usize,
    pub mode: DipMode,
}

impl Default for DipConfig {
    fn default() -> Self {
        Self {
            window_x: 3,
            window_y: 3,
            lower_threshold: 100,
            upper_threshold: 160,
            grey_distance: 10,
            min_above: 2,
            min_below: 2,
            mode: DipMode::Plain,
        }
    }
}

impl DipConfig {
    pub fn kernel(&self) -> ProfileKernel {
        ProfileKernel::Symmetric {
            wx: self.window_x.max(1),
            wy: self.window_y.max(1),
        }
    }
}

/// Darkest point of one dip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dip {
    pub x: i32,
    pub y: i32,
    pub grey: i32,
    /// Set when the row had no dip and this is just its darkest sample.
    pub fallback: bool,
}

impl Dip {
    pub fn new(x: i32, y: i32, grey: i32) -> Self {
        Self {
            x,
            y,
            grey,
            fallback: false,
        }
    }
}

/// Per-row dip finder with reusable profile storage.
#[derive(Debug, Clone, Default)]
pub struct DipScanner {
    profile: RowProfile,
}

impl DipScanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dips along the band starting at `row`, darkest first.
    ///
    /// A row without any dip reports its darkest sample flagged as
    /// [`Dip::fallback`]. In [`DipMode::Contrast`] that sample must pass the
    /// contrast test like any other dip.
    pub fn scan_row(
        &mut self,
        img: &ImageView<'_, u8>,
        row: i32,
        cols: (i32, i32),
        cfg: &DipConfig,
    ) -> Vec<Dip> {
        self.profile.compute(img, row, cols, cfg.kernel());
        let p = &self.profile;
        let y = p.row() as i32;
        let area = p.area();
        let Some((min_col, min)) = p.min() else {
            return Vec::new();
        };

        let low = cfg.lower_threshold * area;
        let dist = cfg.grey_distance * area;
        let close_floor = match cfg.mode {
            DipMode::Floor => low,
            _ => 0,
        };

        let mut dips = Vec::new();
        let mut open = false;
        let mut last = 0u32;
        let mut best: Option<(usize, u32)> = None;
        for (c, v) in p.iter() {
            let opens = c >= 2
                && p.value(c - 2).is_some_and(|prev| v + dist < prev)
                && v < low;
            if opens {
                open = true;
                last = v;
                if best.is_none_or(|(_, b)| v < b) {
                    best = Some((c, v));
                }
            }
            if open && v > last + dist && v >= close_floor {
                if let Some((bx, bv)) = best.take() {
                    dips.push(Dip::new(bx as i32, y, (bv / area) as i32));
                }
                open = false;
            }
        }

        if dips.is_empty() {
            dips.push(Dip {
                fallback: true,
                ..Dip::new(min_col as i32, y, (min / area) as i32)
            });
        }

        if cfg.mode == DipMode::Contrast {
            let width = img.width() as i64;
            dips.retain(|d| has_contrast(p, d.x as i64, width, cfg));
        }

        dips.sort_by_key(|d| d.grey);
        dips
    }
}

/// Walks outward from `x` on both sides looking for a bright flank, counting
/// dark samples passed on the way.
fn has_contrast(p: &RowProfile, x: i64, width: i64, cfg: &DipConfig) -> bool {
    let area = p.area();
    let low = cfg.lower_threshold * area;
    let up = (cfg.upper_threshold * area) as i64;
    let mut under = 0usize;

    let mut flank = |dir: i64| -> bool {
        let mut window = RingBuffer::new(4);
        for k in 0..3 {
            window.push(p.value_or_zero(x + dir * k) as i32);
        }
        let mut upper = 0usize;
        let mut high_edge = false;
        let mut l = x;
        while (dir < 0 && l > 4) || (dir > 0 && l < width - 4) {
            window.push(p.value_or_zero(l + dir * 3) as i32);
            if p.value_or_zero(l) < low && !high_edge {
                under += 1;
            }
            let mean4 = window.sum() / 4;
            if mean4 >= up {
                upper += 1;
                high_edge = true;
            }
            if upper > cfg.min_above {
                return true;
            }
            if upper > 1 && mean4 < up {
                return false;
            }
            l += dir;
        }
        false
    };

    let left = flank(-1);
    let right = flank(1);
    left && right && under > cfg.min_below
}

#[cfg(test)]
mod tests {
    use pp_core::{Image, PixelBox};

    use super::{DipConfig, DipMode, DipScanner};

    fn image_with(width: usize, height: usize, dark: &[(usize, usize, u8)]) -> Image<u8> {
        let mut data = vec![200u8; width * height];
        for y in 0..height {
            for &(x0, x1, v) in dark {
                for x in x0..x1 {
                    data[y * width + x] = v;
                }
            }
        }
        Image::from_vec(width, height, data).expect("valid image")
    }

    #[test]
    fn dips_sorted_darkest_first() {
        let img = image_with(120, 8, &[(30, 36, 60), (80, 86, 20)]);
        let mut s = DipScanner::new();
        let dips = s.scan_row(&img.as_view(), 2, (0, 120), &DipConfig::default());

        assert_eq!(dips.len(), 2);
        assert!((80..86).contains(&dips[0].x));
        assert_eq!(dips[0].grey, 20);
        assert!((30..36).contains(&dips[1].x));
        assert_eq!(dips[0].y, 2);
        assert!(dips.iter().all(|d| !d.fallback));
    }

    #[test]
    fn flat_row_falls_back_to_darkest_sample() {
        let img = Image::new_fill(50, 6, 180u8);
        let mut s = DipScanner::new();
        let dips = s.scan_row(&img.as_view(), 0, (0, 50), &DipConfig::default());
        assert_eq!(dips.len(), 1);
        assert_eq!(dips[0].x, 2);
        assert_eq!(dips[0].grey, 180);
        assert!(dips[0].fallback);
    }

    #[test]
    fn contrast_mode_needs_bright_flanks() {
        let cfg = DipConfig {
            mode: DipMode::Contrast,
            ..DipConfig::default()
        };
        let mut s = DipScanner::new();

        let good = image_with(120, 6, &[(55, 62, 20)]);
        let dips = s.scan_row(&good.as_view(), 0, (0, 120), &cfg);
        assert_eq!(dips.len(), 1);

        // Right flank only reaches a mid grey level.
        let mut dull = image_with(120, 6, &[(55, 62, 20)]);
        dull.fill_box(PixelBox::new(62, 0, 119, 5), 130);
        let dips = s.scan_row(&dull.as_view(), 0, (0, 120), &cfg);
        assert!(dips.is_empty());
    }
}
