use std::ops::Range;

use pp_core::ImageView;

/// Horizontal placement of the box filter around each profile column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileKernel {
    /// `wx` columns from `c - wx/2` up to but excluding `c + (wx+1)/2`.
    /// Profile columns run over `[start + wx/2, end - wx/2)`.
    Centered { wx: usize, wy: usize },
    /// `2*(wx/2) + 1` columns from `c - wx/2` to `c + wx/2` inclusive.
    /// Profile columns run over `[start + wx/2 + 1, end - wx/2)`.
    Symmetric { wx: usize, wy: usize },
}

impl ProfileKernel {
    fn half_widths(self) -> (usize, usize) {
        match self {
            Self::Centered { wx, .. } => (wx / 2, wx.div_ceil(2)),
            Self::Symmetric { wx, .. } => (wx / 2, wx / 2 + 1),
        }
    }

    fn first_offset(self) -> usize {
        match self {
            Self::Centered { wx, .. } => wx / 2,
            Self::Symmetric { wx, .. } => wx / 2 + 1,
        }
    }

    fn rows(self) -> usize {
        match self {
            Self::Centered { wy, .. } | Self::Symmetric { wy, .. } => wy.max(1),
        }
    }

    /// Number of pixels summed per profile sample.
    pub fn area(self) -> u32 {
        let (lo, hi) = self.half_widths();
        ((lo + hi).max(1) * self.rows()) as u32
    }
}

/// Box-filtered sums along one band of rows.
///
/// Values are raw sums (not divided by the filter area) indexed by image
/// column. Columns outside [`RowProfile::columns`] have no value.
#[derive(Debug, Clone, Default)]
pub struct RowProfile {
    row: usize,
    start: usize,
    values: Vec<u32>,
    col_sums: Vec<u32>,
    min: u32,
    max: u32,
    min_col: usize,
    area: u32,
}

impl RowProfile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the profile for the band starting at `row`, scanning the column
    /// span `cols`.
    ///
    /// The span is clamped instead of rejected: inverted bounds are swapped,
    /// the span is cut to the image width and `row` is moved so that the band
    /// fits inside the image. An image too small for the kernel leaves the
    /// profile empty.
    pub fn compute(
        &mut self,
        img: &ImageView<'_, u8>,
        row: i32,
        cols: (i32, i32),
        kernel: ProfileKernel,
    ) {
        self.values.clear();
        self.min = u32::MAX;
        self.max = 0;
        self.min_col = 0;
        self.area = kernel.area();

        let wy = kernel.rows();
        if img.height() < wy || img.width() == 0 {
            self.start = 0;
            return;
        }

        let (mut start, mut end) = cols;
        if start > end {
            std::mem::swap(&mut start, &mut end);
        }
        let start = start.max(0) as usize;
        let end = (end.max(0) as usize).min(img.width());
        let row = (row.max(0) as usize).min(img.height() - wy);
        self.row = row;

        let (lo, hi) = kernel.half_widths();
        let first = start + kernel.first_offset();
        let last = end.saturating_sub(lo);
        self.start = first;
        if first >= last {
            return;
        }

        // Column sums over the band, for every column any window touches.
        let x0 = first - lo;
        let x1 = last - 1 + hi;
        self.col_sums.clear();
        self.col_sums.resize(x1 - x0, 0);
        for y in row..row + wy {
            let line = &img.row(y)[x0..x1];
            for (acc, &px) in self.col_sums.iter_mut().zip(line) {
                *acc += px as u32;
            }
        }

        let win = lo + hi;
        let mut sum: u32 = self.col_sums[..win].iter().sum();
        for c in first..last {
            if c > first {
                let k = c - x0;
                sum = sum + self.col_sums[k + hi - 1] - self.col_sums[k - lo - 1];
            }
            self.values.push(sum);
            if sum < self.min {
                self.min = sum;
                self.min_col = c;
            }
            if sum > self.max {
                self.max = sum;
            }
        }
    }

    /// First image row of the band actually used after clamping.
    pub fn row(&self) -> usize {
        self.row
    }

    pub fn columns(&self) -> Range<usize> {
        self.start..self.start + self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn value(&self, col: usize) -> Option<u32> {
        col.checked_sub(self.start)
            .and_then(|i| self.values.get(i))
            .copied()
    }

    /// Value at `col`, or 0 outside the profile.
    pub fn value_or_zero(&self, col: i64) -> u32 {
        if col < 0 {
            return 0;
        }
        self.value(col as usize).unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, u32)> + '_ {
        self.values
            .iter()
            .enumerate()
            .map(|(i, &v)| (self.start + i, v))
    }

    /// Smallest sum and its column; the leftmost column wins ties.
    pub fn min(&self) -> Option<(usize, u32)> {
        (!self.values.is_empty()).then_some((self.min_col, self.min))
    }

    pub fn max(&self) -> Option<u32> {
        (!self.values.is_empty()).then_some(self.max)
    }

    pub fn area(&self) -> u32 {
        self.area
    }
}

#[cfg(test)]
mod tests {
    use pp_core::{Image, box_sum};

    use super::{ProfileKernel, RowProfile};

    fn ramp(w: usize, h: usize) -> Image<u8> {
        let data = (0..w * h).map(|i| ((i * 13) % 200) as u8).collect();
        Image::from_vec(w, h, data).expect("valid image")
    }

    #[test]
    fn centered_kernel_matches_box_sums() {
        let img = ramp(40, 12);
        let view = img.as_view();
        let mut p = RowProfile::new();
        p.compute(&view, 3, (5, 35), ProfileKernel::Centered { wx: 4, wy: 4 });

        assert_eq!(p.columns(), 7..33);
        assert_eq!(p.area(), 16);
        for (c, v) in p.iter() {
            let expected = box_sum(&view, c - 2, c + 1, 3, 6).expect("in bounds");
            assert_eq!(v, expected, "col {c}");
        }
    }

    #[test]
    fn symmetric_kernel_matches_box_sums() {
        let img = ramp(30, 8);
        let view = img.as_view();
        let mut p = RowProfile::new();
        p.compute(&view, 0, (0, 30), ProfileKernel::Symmetric { wx: 3, wy: 3 });

        assert_eq!(p.columns(), 2..29);
        assert_eq!(p.area(), 9);
        for (c, v) in p.iter() {
            let expected = box_sum(&view, c - 1, c + 1, 0, 2).expect("in bounds");
            assert_eq!(v, expected, "col {c}");
        }
    }

    #[test]
    fn bounds_are_clamped_not_rejected() {
        let mut data = vec![100u8; 20 * 10];
        for y in 0..10 {
            data[y * 20 + 9] = 10;
        }
        let img = Image::from_vec(20, 10, data).expect("valid image");
        let mut p = RowProfile::new();
        p.compute(
            &img.as_view(),
            50,
            (99, -7),
            ProfileKernel::Centered { wx: 2, wy: 4 },
        );

        assert_eq!(p.row(), 6);
        assert_eq!(p.columns(), 1..19);
        let (col, min) = p.min().expect("non-empty");
        assert_eq!(col, 9);
        assert_eq!(min, 100 * 4 + 10 * 4);
        assert_eq!(p.max(), Some(800));
    }

    #[test]
    fn too_small_image_gives_empty_profile() {
        let img = Image::new_fill(3, 2, 9u8);
        let mut p = RowProfile::new();
        p.compute(&img.as_view(), 0, (0, 3), ProfileKernel::Centered { wx: 4, wy: 4 });
        assert!(p.is_empty());
        assert!(p.min().is_none());
        assert_eq!(p.value_or_zero(1), 0);
    }
}
