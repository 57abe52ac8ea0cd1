use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Color {
    Red,
    Green,
    Blue,
    Yellow,
    Cyan,
    Magenta,
    Orange,
    /// Neutral grey used for "no value" diagnostics.
    Aluminium,
    White,
}

impl Color {
    pub fn rgb(self) -> [u8; 3] {
        match self {
            Self::Red => [255, 0, 0],
            Self::Green => [0, 255, 0],
            Self::Blue => [0, 0, 255],
            Self::Yellow => [255, 255, 0],
            Self::Cyan => [0, 255, 255],
            Self::Magenta => [255, 0, 255],
            Self::Orange => [255, 128, 0],
            Self::Aluminium => [186, 189, 182],
            Self::White => [255, 255, 255],
        }
    }
}

/// Drawing primitive in image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Primitive {
    Point {
        x: i32,
        y: i32,
        color: Color,
    },
    Line {
        x1: i32,
        y1: i32,
        x2: i32,
        y2: i32,
        color: Color,
    },
    Rectangle {
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        color: Color,
    },
}

/// Receiver for visualization primitives. Rendering happens elsewhere.
pub trait OverlaySink {
    fn add_point(&mut self, x: i32, y: i32, color: Color);
    fn add_line(&mut self, x1: i32, y1: i32, x2: i32, y2: i32, color: Color);
    fn add_rectangle(&mut self, x: i32, y: i32, width: i32, height: i32, color: Color);
}

/// Sink that drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullOverlay;

impl OverlaySink for NullOverlay {
    fn add_point(&mut self, _x: i32, _y: i32, _color: Color) {}
    fn add_line(&mut self, _x1: i32, _y1: i32, _x2: i32, _y2: i32, _color: Color) {}
    fn add_rectangle(&mut self, _x: i32, _y: i32, _w: i32, _h: i32, _color: Color) {}
}

/// Sink that records primitives in call order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OverlayLayer {
    primitives: Vec<Primitive>,
}

impl OverlayLayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn primitives(&self) -> &[Primitive] {
        &self.primitives
    }

    pub fn len(&self) -> usize {
        self.primitives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }

    pub fn clear(&mut self) {
        self.primitives.clear();
    }

    pub fn rectangles(&self) -> impl Iterator<Item = &Primitive> {
        self.primitives
            .iter()
            .filter(|p| matches!(p, Primitive::Rectangle { .. }))
    }
}

impl OverlaySink for OverlayLayer {
    fn add_point(&mut self, x: i32, y: i32, color: Color) {
        self.primitives.push(Primitive::Point { x, y, color });
    }

    fn add_line(&mut self, x1: i32, y1: i32, x2: i32, y2: i32, color: Color) {
        self.primitives.push(Primitive::Line {
            x1,
            y1,
            x2,
            y2,
            color,
        });
    }

    fn add_rectangle(&mut self, x: i32, y: i32, width: i32, height: i32, color: Color) {
        self.primitives.push(Primitive::Rectangle {
            x,
            y,
            width,
            height,
            color,
        });
    }
}
