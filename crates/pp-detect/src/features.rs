use pp_chain::{ChainSummary, RowMinimaTable};
use pp_core::{BoxSummer, BucketHistogram, Error, ImageView, PixelBox, box_sum};
use serde::Serialize;

use crate::config::DetectorConfig;

/// Boxes whose centre is closer than this to either image side are skipped.
const MIN_CENTER_DISTANCE: i32 = 20;
/// Edge responses above this may replace a stronger one on a darker side.
const STRONG_GRADIENT: i32 = 2000;
/// Displacement histogram range.
const DISPLACEMENT_BUCKETS: usize = 500;
/// Chains at most this wide in x count as narrow.
const NARROW_EXTENT: i32 = 5;

/// Refined edges on one sampled row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EdgeSample {
    pub row: i32,
    pub left: i32,
    pub right: i32,
}

/// Gap measurements along a chain, before rounding into a candidate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChainFeatures {
    /// Chain box after clamping to the image.
    pub bbox: PixelBox,
    pub left_x: i32,
    pub right_x: i32,
    pub width: i32,
    /// Mean of the left and right edge responses per filter pixel.
    pub gradient: f64,
    /// Mean grey level between the refined edges.
    pub gap_grey: f64,
    pub chain_grey: f64,
    pub std_left: f64,
    pub std_right: f64,
    pub std_width: f64,
    /// Trimmed mean row-to-row displacement of each edge.
    pub developed_left: f64,
    pub developed_right: f64,
    pub samples: Vec<EdgeSample>,
}

impl ChainFeatures {
    pub fn std_deviation(&self) -> f64 {
        self.std_left + self.std_right + self.std_width
    }
}

/// Strongest edge response seen along one row.
#[derive(Debug, Clone, Copy)]
struct EdgeTrack {
    value: i32,
    column: i32,
    /// Box sum on the dark side of the edge.
    dark: u32,
}

impl EdgeTrack {
    fn new() -> Self {
        Self {
            value: i32::MIN,
            column: 0,
            dark: u32::MAX,
        }
    }

    /// Narrow chains prefer the darkest gap: a response only counts if its
    /// dark side is darker than the current best, and then also wins when it
    /// is weaker but still strong.
    fn offer(&mut self, value: i32, column: i32, dark: u32, narrow: bool) {
        let take = if narrow {
            (value > self.value || value > STRONG_GRADIENT) && dark < self.dark
        } else {
            value > self.value
        };
        if take {
            *self = Self {
                value,
                column,
                dark,
            };
        }
    }
}

fn filter_width(extent: i32) -> i32 {
    match extent {
        e if e <= 2 => 3,
        e if e < 9 => 5,
        _ => 15,
    }
}

/// Mean and standard deviation of the values within `max_dist` of `center`.
fn robust_stats(values: &[i32], center: f64, max_dist: f64) -> (f64, f64) {
    let (mut n, mut s, mut ss) = (0usize, 0.0f64, 0.0f64);
    for &v in values {
        let v = v as f64;
        if (v - center).abs() < max_dist {
            n += 1;
            s += v;
            ss += v * v;
        }
    }
    let n = n.max(1) as f64;
    let mean = s / n;
    (mean, (ss / n - mean * mean).max(0.0).sqrt())
}

fn mean_of(values: &[i32]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().map(|&v| v as f64).sum::<f64>() / values.len() as f64
}

/// Rejects boxes too close to the image sides and pulls the rest inside.
fn fit_box(b: PixelBox, width: i32, height: i32, margin: i32) -> Option<PixelBox> {
    let center = b.center_x();
    if center < MIN_CENTER_DISTANCE
        || width - center < MIN_CENTER_DISTANCE
        || b.x1 > width
        || b.x2 < margin
        || b.y1 < margin
        || b.y1 > height
        || b.y2 < margin
        || b.y2 > height
    {
        return None;
    }
    let x1 = b.x1.max(margin);
    let x2 = if b.x2 > width { width - margin } else { b.x2 };
    Some(PixelBox::new(x1, b.y1, x2, b.y2))
}

/// Refines the gap edges of `chain` on every second row of its box.
///
/// Per row, every second column is tested as an edge: the box sums of the
/// `s` columns on either side over three rows are compared, where `s`
/// grows with the chain's x spread. The left edge is the strongest bright
/// to dark step, the right edge the strongest dark to bright step.
///
/// Returns `Ok(None)` when the chain's box is too close to the image border
/// or leaves no room for the filter.
pub fn extract_features(
    img: &ImageView<'_, u8>,
    table: &RowMinimaTable,
    chain: &ChainSummary,
    cfg: &DetectorConfig,
) -> Result<Option<ChainFeatures>, Error> {
    if chain.span.len == 0 {
        return Err(Error::DegenerateChain);
    }
    let (w, h) = (img.width() as i32, img.height() as i32);
    let Some(bbox) = fit_box(chain.bbox, w, h, cfg.roi_margin) else {
        return Ok(None);
    };

    let extent = chain.x_extent();
    let s = filter_width(extent);
    let narrow = extent <= NARROW_EXTENT;
    let div = 3 * s;

    let first_col = bbox.x1 + s - 1;
    let last_col = bbox.x2 - s;
    let first_row = bbox.y1 + 2;
    let last_row = bbox.y2 - 2;
    if first_col >= last_col || first_col - s + 1 < 0 || first_row > last_row {
        return Ok(None);
    }

    let mut bright_side = BoxSummer::new(*img);
    let mut dark_side = BoxSummer::new(*img);
    let mut disp_left = BucketHistogram::new(DISPLACEMENT_BUCKETS);
    let mut disp_right = BucketHistogram::new(DISPLACEMENT_BUCKETS);

    let mut samples = Vec::new();
    let mut lefts = Vec::new();
    let mut rights = Vec::new();
    let mut widths = Vec::new();
    let (mut grad_left, mut grad_right) = (0.0f64, 0.0f64);
    let (mut gap_sum, mut gap_count) = (0u64, 0u64);
    let mut last: Option<(i32, i32)> = None;

    for row in (first_row..=last_row).step_by(2) {
        let (ya, yb) = ((row - 1) as usize, (row + 1) as usize);
        let mut left = EdgeTrack::new();
        let mut right = EdgeTrack::new();

        for col in (first_col..last_col).step_by(2) {
            let s1 = bright_side.sum((col - s + 1) as usize, col as usize, ya, yb)?;
            let s2 = dark_side.sum((col + 1) as usize, (col + s) as usize, ya, yb)?;
            let step = s1 as i32 - s2 as i32;
            left.offer(step, col, s2, narrow);
            right.offer(-step, col, s1, narrow);
        }

        grad_left += (left.value / div) as f64;
        grad_right += (right.value / div) as f64;

        let (l, r) = (left.column, right.column);
        if let Some((pl, pr)) = last {
            disp_left.add((pl - l).abs());
            disp_right.add((pr - r).abs());
        }
        last = Some((l, r));

        let (lo, hi) = (l.min(r), l.max(r));
        gap_sum += box_sum(img, lo as usize, hi as usize, row as usize, row as usize)? as u64;
        gap_count += (hi - lo + 1) as u64;

        lefts.push(l);
        rights.push(r);
        widths.push((r - l).abs());
        samples.push(EdgeSample { row, left: l, right: r });
    }

    let n = samples.len() as f64;
    let gradient = (grad_left / n + grad_right / n) / 2.0;

    let d = cfg.outlier_distance;
    let (mean_l, std_left) = robust_stats(&lefts, mean_of(&lefts), d);
    let (mean_r, std_right) = robust_stats(&rights, mean_of(&rights), d);
    let (mean_w, std_width) = robust_stats(&widths, mean_of(&widths), d);

    let mut left_x = (mean_l + 0.5) as i32;
    let mut right_x = (mean_r + 0.5) as i32;
    if right_x - left_x <= 0 {
        // Gradient edges crossed over; fall back to the threshold edges.
        let rows = chain.span.start..chain.span.end();
        let (mut sl, mut sr) = (0i32, 0i32);
        for m in rows.filter_map(|i| table.primary(i)) {
            sl += m.left;
            sr += m.right;
        }
        let len = (chain.span.len as i32).max(1);
        left_x = sl / len;
        right_x = sr / len;
    }

    Ok(Some(ChainFeatures {
        bbox,
        left_x,
        right_x,
        width: (mean_w + 0.5) as i32,
        gradient,
        gap_grey: gap_sum as f64 / gap_count.max(1) as f64,
        chain_grey: chain.mean_grey,
        std_left,
        std_right,
        std_width,
        developed_left: disp_left.trimmed_mean(cfg.trim_percent).unwrap_or(0.0) as f64,
        developed_right: disp_right.trimmed_mean(cfg.trim_percent).unwrap_or(0.0) as f64,
        samples,
    }))
}
