use log::{debug, trace};
use pp_core::{BucketHistogram, Color, Error, ImageView, OverlaySink, PixelBox};
use pp_scan::{Dip, DipScanner};

use crate::candidate::{Candidate, RankedCandidate};
use crate::config::HistogramConfig;

/// Column bin width of the dip histogram.
const BIN_WIDTH: i32 = 10;
/// Extra columns added around the column deviation for the candidate box.
const BOX_PAD: i32 = 10;
/// Samples averaged beside each edge for the outer grey level.
const FLANK: i32 = 3;

/// Centre of the most populated column bin.
pub fn dominant_column(dips: &[Dip], image_width: usize) -> Option<i32> {
    let mut hist = BucketHistogram::new(image_width / BIN_WIDTH as usize + 1);
    for d in dips {
        hist.add(d.x / BIN_WIDTH);
    }
    hist.peak().map(|(bin, _)| bin * BIN_WIDTH + BIN_WIDTH / 2)
}

/// Dips within `deviation` of `column`, at most one per row.
pub fn dips_near_column(dips: &[Dip], column: i32, deviation: i32) -> Vec<Dip> {
    let mut out: Vec<Dip> = Vec::new();
    for d in dips.iter().filter(|d| (d.x - column).abs() <= deviation) {
        if out.last().is_some_and(|p| p.y == d.y) {
            continue;
        }
        out.push(*d);
    }
    out
}

/// Longest run of points whose row spacing stays within `max_gap`.
///
/// Returns the run and its length in rows. Without any such run all points
/// are kept and the length spans first to last.
pub fn longest_run(points: &[Dip], max_gap: i32) -> (Vec<Dip>, i32) {
    let mut best: Option<(usize, usize)> = None;
    let mut best_len = 0;
    let mut start = 0;
    for i in 1..=points.len() {
        let broken = i == points.len() || points[i].y - points[i - 1].y > max_gap;
        if !broken {
            continue;
        }
        if i - start > 1 {
            let len = points[i - 1].y - points[start].y;
            if len > best_len {
                best_len = len;
                best = Some((start, i));
            }
        }
        start = i;
    }
    match best {
        Some((a, b)) => (points[a..b].to_vec(), best_len),
        None => {
            let len = match (points.first(), points.last()) {
                (Some(f), Some(l)) => l.y - f.y,
                _ => 0,
            };
            (points.to_vec(), len)
        }
    }
}

/// Nearest columns left and right of each point whose grey level exceeds
/// `threshold`, with the summed step height at those edges.
fn walk_edges(img: &ImageView<'_, u8>, points: &[Dip], threshold: i32) -> EdgeWalk {
    let w = img.width() as i32;
    let mut walk = EdgeWalk::default();
    for p in points {
        let y = p.y as usize;
        let mut found = (None, None);
        for x in (1..=p.x.min(w - 1)).rev() {
            if img.at(x as usize, y) > threshold {
                walk.step_sum += img.at(x as usize, y) - img.at((x + 1).min(w - 1) as usize, y);
                walk.left.push((x, p.y));
                found.0 = Some(x);
                break;
            }
        }
        for x in p.x.max(0)..w {
            if img.at(x as usize, y) > threshold {
                walk.step_sum += img.at(x as usize, y) - img.at((x - 1).max(0) as usize, y);
                walk.right.push((x, p.y));
                found.1 = Some(x);
                break;
            }
        }
        if let (Some(l), Some(r)) = found {
            walk.width_sum += r - l;
        }
    }
    walk
}

#[derive(Debug, Default)]
struct EdgeWalk {
    left: Vec<(i32, i32)>,
    right: Vec<(i32, i32)>,
    step_sum: i32,
    width_sum: i32,
}

fn polyline_length(points: &[(i32, i32)]) -> f64 {
    points
        .windows(2)
        .map(|w| {
            let (dx, dy) = ((w[1].0 - w[0].0) as f64, (w[1].1 - w[0].1) as f64);
            dx.hypot(dy)
        })
        .sum()
}

fn position_std(points: &[(i32, i32)]) -> f64 {
    if points.is_empty() {
        return 0.0;
    }
    let n = points.len() as i32;
    let mean = points.iter().map(|p| p.0).sum::<i32>() / n;
    let ss: i32 = points.iter().map(|p| (p.0 - mean) * (p.0 - mean)).sum();
    (ss as f64 / n as f64).sqrt()
}

/// Grey levels beside and between the walked edges.
fn edge_greys(img: &ImageView<'_, u8>, walk: &EdgeWalk) -> (i32, i32) {
    let w = img.width() as i32;
    let clamp = |x: i32| x.clamp(0, w - 1) as usize;
    let mut flanks = 0;
    for &(x, y) in &walk.left {
        flanks += (0..FLANK).map(|k| img.at(clamp(x - k), y as usize)).sum::<i32>() / FLANK;
    }
    for &(x, y) in &walk.right {
        flanks += (0..FLANK).map(|k| img.at(clamp(x + k), y as usize)).sum::<i32>() / FLANK;
    }
    let outside = (flanks / 2) / walk.left.len().max(1) as i32;

    let inside = if walk.left.len() == walk.right.len() && walk.left.len() > 1 {
        let mut sum = 0;
        for (&(l, y), &(r, _)) in walk.left.iter().zip(&walk.right) {
            let (a, b) = (l + 2, r - 2);
            sum += if b > a {
                (a..b).map(|x| img.at(clamp(x), y as usize)).sum::<i32>() / (b - a)
            } else {
                img.at(clamp(a), y as usize)
            };
        }
        sum / walk.left.len() as i32
    } else {
        255
    };
    (inside, outside)
}

/// Histogram strategy: collects dips on every `row_stride`-th row, keeps
/// those near the dominant column and measures the longest uninterrupted
/// run. A completed run always yields a present candidate.
///
/// Rows that only report their darkest sample contribute nothing, so a
/// region without a single dip fails with [`Error::EmptyRegion`].
pub(crate) fn detect_histogram(
    scanner: &mut DipScanner,
    img: &ImageView<'_, u8>,
    cfg: &HistogramConfig,
    overlay: &mut dyn OverlaySink,
) -> Result<RankedCandidate, Error> {
    let (w, h) = (img.width() as i32, img.height() as i32);
    let m = cfg.roi_margin;
    let wy = cfg.dips.window_y.max(1) as i32;
    let stride = cfg.row_stride.max(1);

    let mut dips = Vec::new();
    let mut row = m;
    while row < h - m - (wy - 1) {
        let mut found = scanner.scan_row(img, row, (m, w - m), &cfg.dips);
        found.retain(|d| !d.fallback);
        found.truncate(cfg.max_minima_per_row);
        trace!("row {row}: {} dips", found.len());
        dips.extend(found);
        row += stride as i32;
    }

    let column = dominant_column(&dips, img.width()).ok_or(Error::EmptyRegion)?;
    let near = dips_near_column(&dips, column, cfg.column_deviation);
    let (run, length) = longest_run(&near, cfg.max_interruption);
    debug!(
        "histogram: {} dips, column {column}, {} near, run of {} rows",
        dips.len(),
        near.len(),
        length
    );

    let n = run.len().max(1) as i32;
    let mean_x = run.iter().map(|d| d.x).sum::<i32>() / n;
    let mean_grey = run.iter().map(|d| d.grey).sum::<i32>() / n;

    let (gradient, width, walk) = if run.len() > 1 {
        let walk = walk_edges(img, &run, cfg.dips.lower_threshold as i32);
        let n = run.len() as i32;
        (walk.step_sum / n / 2, walk.width_sum / n, walk)
    } else {
        (0, 0, EdgeWalk::default())
    };

    let (mut inside, mut outside, mut std_dev, mut dev_l, mut dev_r) = (0, 0, 0, 0, 0);
    if !walk.left.is_empty() && !walk.right.is_empty() {
        (inside, outside) = edge_greys(img, &walk);
        std_dev = ((position_std(&walk.left) + position_std(&walk.right)) / 2.0) as i32;
        dev_l = polyline_length(&walk.left) as i32;
        dev_r = polyline_length(&walk.right) as i32;
    }
    if width <= 3 {
        inside = mean_grey;
    }

    let half = cfg.column_deviation + BOX_PAD;
    let bbox = match run.first() {
        Some(first) => PixelBox::new(mean_x - half, first.y, mean_x + half, first.y + length),
        None => PixelBox::new(0, 0, 1, 1),
    };

    if cfg.display {
        for d in &dips {
            overlay.add_point(d.x, d.y, Color::Yellow);
        }
        for &(x, y) in walk.left.iter().chain(&walk.right) {
            overlay.add_point(x, y, Color::Blue);
        }
        if run.len() > 1 {
            overlay.add_rectangle(bbox.x1, bbox.y1, 2 * half, length, Color::Green);
        }
    }

    Ok(RankedCandidate::present(Candidate {
        bbox,
        width,
        length,
        gradient,
        grey_gap: mean_grey,
        grey_inside: inside,
        grey_outside: outside,
        std_deviation: std_dev,
        developed_length_left: dev_l,
        developed_length_right: dev_r,
    }))
}
