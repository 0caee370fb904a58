use serde::{Deserialize, Serialize};

/// Axis-aligned face box in frame pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Integer rectangle fully inside a frame: `(x, y, width, height)`.
pub type PixelRect = (u32, u32, u32, u32);

impl BoundingBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Anchor for label plates drawn under the box.
    pub fn bottom_left(&self) -> (f64, f64) {
        (self.x, self.bottom())
    }

    /// Clamps to a `frame_w x frame_h` canvas. Returns `None` when nothing
    /// of the box is visible.
    pub fn to_pixel_rect(&self, frame_w: u32, frame_h: u32) -> Option<PixelRect> {
        let x1 = self.x.max(0.0).floor();
        let y1 = self.y.max(0.0).floor();
        let x2 = self.right().min(frame_w as f64).ceil();
        let y2 = self.bottom().min(frame_h as f64).ceil();
        if !(x2 > x1 && y2 > y1) {
            return None;
        }
        Some((x1 as u32, y1 as u32, (x2 - x1) as u32, (y2 - y1) as u32))
    }
}
