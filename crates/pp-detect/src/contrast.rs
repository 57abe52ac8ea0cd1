use pp_core::{Error, ImageView, PixelBox, box_sum};
use serde::Serialize;

/// Mean grey levels inside a gap and beside it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GreyContrast {
    pub inside: f64,
    pub outside: f64,
}

impl GreyContrast {
    /// Reported when the gap is too narrow or the edges cannot be placed.
    pub const NEUTRAL: Self = Self {
        inside: 128.0,
        outside: 128.0,
    };
}

/// Distance kept from each edge when sampling the flanks.
const FLANK_GAP: i32 = 4;

fn mean_grey(img: &ImageView<'_, u8>, x1: i32, x2: i32, y1: i32, y2: i32) -> Result<f64, Error> {
    let sum = box_sum(img, x1 as usize, x2 as usize, y1 as usize, y2 as usize)?;
    let n = (x2 - x1 + 1) as f64 * (y2 - y1 + 1) as f64;
    Ok(sum as f64 / n)
}

/// Compares the gap between `left` and `right` with its flanks inside
/// `bbox`.
///
/// The box is clamped to `margin` pixels from the image border. `outside`
/// averages the mean of each flank, sampled from the box border up to four
/// pixels short of the edge; `inside` is the mean strictly between the
/// edges, or 128 when they are at most two pixels apart.
pub fn grey_contrast(
    img: &ImageView<'_, u8>,
    bbox: PixelBox,
    left: i32,
    right: i32,
    margin: i32,
) -> Result<GreyContrast, Error> {
    let b = bbox
        .clamped(img.width(), img.height(), margin)
        .ok_or(Error::EmptyRegion)?;
    let (left, right) = (left.min(right), left.max(right));
    if !b.contains_x(left) || !b.contains_x(right) {
        return Err(Error::RegionOutsideBox { left, right });
    }

    let mut flanks = Vec::with_capacity(2);
    if left - FLANK_GAP >= b.x1 {
        flanks.push(mean_grey(img, b.x1, left - FLANK_GAP, b.y1, b.y2)?);
    }
    if right + FLANK_GAP <= b.x2 {
        flanks.push(mean_grey(img, right + FLANK_GAP, b.x2, b.y1, b.y2)?);
    }
    if flanks.is_empty() {
        return Err(Error::EmptyRegion);
    }
    let outside = flanks.iter().sum::<f64>() / flanks.len() as f64;

    let inside = if right - left > 2 {
        mean_grey(img, left + 1, right - 1, b.y1, b.y2)?
    } else {
        GreyContrast::NEUTRAL.inside
    };

    Ok(GreyContrast { inside, outside })
}
