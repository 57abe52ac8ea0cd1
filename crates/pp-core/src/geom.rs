use serde::{Deserialize, Serialize};

/// Axis-aligned box with inclusive integer corners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PixelBox {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl PixelBox {
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Box covering a whole `width` x `height` image.
    pub fn full(width: usize, height: usize) -> Self {
        Self::new(0, 0, width as i32 - 1, height as i32 - 1)
    }

    pub fn width(&self) -> i32 {
        self.x2 - self.x1 + 1
    }

    pub fn height(&self) -> i32 {
        self.y2 - self.y1 + 1
    }

    pub fn center_x(&self) -> i32 {
        (self.x1 + self.x2) / 2
    }

    pub fn contains_x(&self, x: i32) -> bool {
        x >= self.x1 && x <= self.x2
    }

    /// Corners reordered so that `x1 <= x2` and `y1 <= y2`.
    pub fn normalized(self) -> Self {
        Self {
            x1: self.x1.min(self.x2),
            y1: self.y1.min(self.y2),
            x2: self.x1.max(self.x2),
            y2: self.y1.max(self.y2),
        }
    }

    pub fn translated(self, dx: i32, dy: i32) -> Self {
        Self {
            x1: self.x1 + dx,
            y1: self.y1 + dy,
            x2: self.x2 + dx,
            y2: self.y2 + dy,
        }
    }

    /// Normalizes and clamps the box to `[margin, dim - 1 - margin]` on both
    /// axes. Returns `None` when nothing is left.
    pub fn clamped(self, width: usize, height: usize, margin: i32) -> Option<Self> {
        let b = self.normalized();
        let max_x = width as i32 - 1 - margin;
        let max_y = height as i32 - 1 - margin;
        let out = Self {
            x1: b.x1.max(margin),
            y1: b.y1.max(margin),
            x2: b.x2.min(max_x),
            y2: b.y2.min(max_y),
        };
        (out.x1 <= out.x2 && out.y1 <= out.y2).then_some(out)
    }
}
