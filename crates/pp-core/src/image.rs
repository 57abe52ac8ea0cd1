use crate::{Error, PixelBox};

/// Owned grey image, rows stored back to back.
#[derive(Debug, Clone, PartialEq)]
pub struct Image<T> {
    width: usize,
    height: usize,
    data: Vec<T>,
}

impl<T> Image<T> {
    /// Wraps `data`, which must hold exactly `width * height` pixels.
    pub fn from_vec(width: usize, height: usize, data: Vec<T>) -> Result<Self, Error> {
        let expected = width.saturating_mul(height);
        if data.len() != expected {
            return Err(Error::SizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }

    pub fn as_view(&self) -> ImageView<'_, T> {
        ImageView {
            width: self.width,
            height: self.height,
            stride: self.width,
            data: &self.data,
        }
    }
}

impl<T: Clone> Image<T> {
    pub fn new_fill(width: usize, height: usize, value: T) -> Self {
        Self {
            width,
            height,
            data: vec![value; width.saturating_mul(height)],
        }
    }

    /// Overwrites the inclusive box with `value`, clipped to the image.
    pub fn fill_box(&mut self, bbox: PixelBox, value: T) {
        let Some(b) = bbox.clamped(self.width, self.height, 0) else {
            return;
        };
        for y in b.y1 as usize..=b.y2 as usize {
            let start = y * self.width;
            self.data[start + b.x1 as usize..=start + b.x2 as usize].fill(value.clone());
        }
    }
}

/// Borrowed window into an image. Rows are `stride` elements apart, so a
/// region cut out of a larger frame shares its pixels.
#[derive(Debug, Clone, Copy)]
pub struct ImageView<'a, T> {
    width: usize,
    height: usize,
    stride: usize,
    data: &'a [T],
}

impl<'a, T> ImageView<'a, T> {
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Pixels of row `y`. Panics when `y` is outside the view.
    pub fn row(&self, y: usize) -> &'a [T] {
        let start = y * self.stride;
        &self.data[start..start + self.width]
    }

    /// Cuts out `roi` after clamping it to the view, returning the region and
    /// its top-left offset in this view's coordinates.
    pub fn roi(&self, roi: PixelBox) -> Result<(ImageView<'a, T>, (usize, usize)), Error> {
        let b = roi
            .clamped(self.width, self.height, 0)
            .ok_or(Error::EmptyRegion)?;
        let (x, y) = (b.x1 as usize, b.y1 as usize);
        let (width, height) = (b.width() as usize, b.height() as usize);
        let start = y * self.stride + x;
        let end = start + (height - 1) * self.stride + width;
        let data = self.data.get(start..end).ok_or(Error::OutOfBounds)?;
        let view = ImageView {
            width,
            height,
            stride: self.stride,
            data,
        };
        Ok((view, (x, y)))
    }
}

impl ImageView<'_, u8> {
    /// Pixel value as `i32`, for arithmetic that mixes grey values and offsets.
    #[inline]
    pub fn at(&self, x: usize, y: usize) -> i32 {
        self.row(y)[x] as i32
    }
}

#[cfg(test)]
mod tests {
    use super::Image;
    use crate::{Error, PixelBox};

    #[test]
    fn roi_is_clamped_and_offset_reported() {
        let data: Vec<u8> = (0..30).collect();
        let img = Image::from_vec(6, 5, data).expect("valid image");
        let view = img.as_view();

        let (sub, off) = view
            .roi(PixelBox::new(4, 3, -2, 10))
            .expect("clamped roi");
        assert_eq!(off, (0, 3));
        assert_eq!(sub.width(), 5);
        assert_eq!(sub.height(), 2);
        assert_eq!(sub.row(0), &[18, 19, 20, 21, 22]);
        assert_eq!(sub.row(1), &[24, 25, 26, 27, 28]);
        assert_eq!(sub.at(4, 1), 28);

        assert_eq!(
            view.roi(PixelBox::new(10, 10, 20, 20)).err(),
            Some(Error::EmptyRegion)
        );
    }

    #[test]
    fn nested_roi_keeps_parent_rows() {
        let data: Vec<u8> = (0..48).collect();
        let img = Image::from_vec(8, 6, data).expect("valid image");
        let (outer, _) = img.as_view().roi(PixelBox::new(1, 1, 6, 4)).expect("outer");
        let (inner, off) = outer.roi(PixelBox::new(2, 1, 3, 2)).expect("inner");
        assert_eq!(off, (2, 1));
        assert_eq!(inner.row(0), &[19, 20]);
        assert_eq!(inner.row(1), &[27, 28]);
    }

    #[test]
    fn fill_box_clips_to_image() {
        let mut img = Image::new_fill(4, 3, 0u8);
        img.fill_box(PixelBox::new(2, 1, 9, 9), 7);
        assert_eq!(img.data(), &[0, 0, 0, 0, 0, 0, 7, 7, 0, 0, 7, 7]);
    }

    #[test]
    fn from_vec_rejects_wrong_length() {
        let err = Image::from_vec(3, 3, vec![0u8; 8]).expect_err("short buffer");
        assert_eq!(
            err,
            Error::SizeMismatch {
                expected: 9,
                actual: 8
            }
        );
    }
}
