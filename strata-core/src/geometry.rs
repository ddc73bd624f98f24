//! Positions and rectangles in canvas space. Units are logical pixels, 0,0 is top left, +X Right, +Y down.

#[derive(Copy, Clone, Debug, PartialEq, PartialOrd, Default, serde::Serialize, serde::Deserialize)]
pub struct Coordinate {
    pub x: f32,
    pub y: f32,
}
impl Coordinate {
    pub const ORIGIN: Self = Self { x: 0.0, y: 0.0 };
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// An axis-aligned rectangle, extending down-right from `(x, y)`.
#[derive(Copy, Clone, Debug, PartialEq, PartialOrd, Default, serde::Serialize, serde::Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}
impl Rect {
    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
    #[must_use]
    pub fn origin(&self) -> Coordinate {
        Coordinate::new(self.x, self.y)
    }
    /// Finite, with a strictly positive area.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.origin().is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
            && self.width > 0.0
            && self.height > 0.0
    }
}
