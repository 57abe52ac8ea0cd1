use crate::{Error, ImageView};

/// Sum of the inclusive rectangle `[x1, x2] x [y1, y2]`.
pub fn box_sum(
    img: &ImageView<'_, u8>,
    x1: usize,
    x2: usize,
    y1: usize,
    y2: usize,
) -> Result<u32, Error> {
    check_bounds(img, x1, x2, y1, y2)?;
    let mut sum = 0u32;
    for y in y1..=y2 {
        sum += img.row(y)[x1..=x2].iter().map(|&v| v as u32).sum::<u32>();
    }
    Ok(sum)
}

fn check_bounds(
    img: &ImageView<'_, u8>,
    x1: usize,
    x2: usize,
    y1: usize,
    y2: usize,
) -> Result<(), Error> {
    if x1 > x2 || y1 > y2 || x2 >= img.width() || y2 >= img.height() {
        return Err(Error::OutOfBounds);
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Window {
    x1: usize,
    x2: usize,
    y1: usize,
    y2: usize,
}

/// Box summer that reuses the previous rectangle when the next one is the
/// same rectangle shifted right by one column.
///
/// With `step > 1` every `step`-th pixel on both axes is sampled, starting at
/// the top-left corner; the shift fast path is then disabled.
#[derive(Debug, Clone)]
pub struct BoxSummer<'a> {
    img: ImageView<'a, u8>,
    step: usize,
    last: Option<(Window, u32)>,
}

impl<'a> BoxSummer<'a> {
    pub fn new(img: ImageView<'a, u8>) -> Self {
        Self {
            img,
            step: 1,
            last: None,
        }
    }

    pub fn with_step(img: ImageView<'a, u8>, step: usize) -> Self {
        Self {
            img,
            step: step.max(1),
            last: None,
        }
    }

    pub fn sum(&mut self, x1: usize, x2: usize, y1: usize, y2: usize) -> Result<u32, Error> {
        check_bounds(&self.img, x1, x2, y1, y2)?;
        let win = Window { x1, x2, y1, y2 };

        if self.step > 1 {
            let mut sum = 0u32;
            for y in (y1..=y2).step_by(self.step) {
                let row = self.img.row(y);
                for x in (x1..=x2).step_by(self.step) {
                    sum += row[x] as u32;
                }
            }
            return Ok(sum);
        }

        let sum = match self.last {
            Some((prev, prev_sum))
                if prev.y1 == y1 && prev.y2 == y2 && prev.x1 + 1 == x1 && prev.x2 + 1 == x2 =>
            {
                prev_sum - self.column(prev.x1, y1, y2) + self.column(x2, y1, y2)
            }
            _ => box_sum(&self.img, x1, x2, y1, y2)?,
        };
        self.last = Some((win, sum));
        Ok(sum)
    }

    fn column(&self, x: usize, y1: usize, y2: usize) -> u32 {
        (y1..=y2).map(|y| self.img.row(y)[x] as u32).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::{BoxSummer, box_sum};
    use crate::{Error, Image};

    fn ramp(w: usize, h: usize) -> Image<u8> {
        let data = (0..w * h).map(|i| ((i * 7) % 251) as u8).collect();
        Image::from_vec(w, h, data).expect("valid image")
    }

    #[test]
    fn shifted_window_matches_direct_sum() {
        let img = ramp(20, 10);
        let view = img.as_view();
        let mut summer = BoxSummer::new(view);

        for x in 0..15 {
            let fast = summer.sum(x, x + 4, 2, 5).expect("in bounds");
            let direct = box_sum(&view, x, x + 4, 2, 5).expect("in bounds");
            assert_eq!(fast, direct, "x = {x}");
        }
    }

    #[test]
    fn subsampled_sum_visits_every_second_pixel() {
        let img = Image::new_fill(6, 6, 3u8);
        let mut summer = BoxSummer::with_step(img.as_view(), 2);
        // 3 columns x 3 rows sampled.
        assert_eq!(summer.sum(0, 5, 0, 5).expect("in bounds"), 27);
    }

    #[test]
    fn out_of_bounds_is_reported() {
        let img = Image::new_fill(4, 4, 1u8);
        assert_eq!(box_sum(&img.as_view(), 0, 4, 0, 0), Err(Error::OutOfBounds));
        assert_eq!(box_sum(&img.as_view(), 2, 1, 0, 0), Err(Error::OutOfBounds));
    }
}
