use crate::util::{UnitF32, UnitF32Error};

/// An 8-bit-per-channel sRGB color with a floating point alpha, as used by tools and mask fills.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, serde::Serialize, serde::Deserialize)]
pub struct RgbaColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: UnitF32,
}
impl RgbaColor {
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    pub const TRANSPARENT: Self = Self {
        r: 0,
        g: 0,
        b: 0,
        a: UnitF32::ZERO,
    };
    /// A fully opaque color.
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self {
            r,
            g,
            b,
            a: UnitF32::ONE,
        }
    }
    pub fn new(r: u8, g: u8, b: u8, a: f32) -> Result<Self, UnitF32Error> {
        Ok(Self {
            r,
            g,
            b,
            a: UnitF32::new(a)?,
        })
    }
    /// The same hue, forced to full opacity.
    #[must_use]
    pub const fn opaque(self) -> Self {
        Self::rgb(self.r, self.g, self.b)
    }
    #[must_use]
    pub fn alpha(self) -> f32 {
        self.a.get()
    }
}
impl Default for RgbaColor {
    fn default() -> Self {
        Self::BLACK
    }
}

#[derive(
    strum::AsRefStr,
    strum::EnumIter,
    PartialEq,
    Eq,
    Copy,
    Clone,
    Hash,
    Debug,
    Default,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum FillStyle {
    #[default]
    Solid,
    Grid,
    Crosshatch,
    Diagonal,
    Horizontal,
    Vertical,
}

/// How a mask-like entity is painted on screen. Masks draw their objects in black, then composite
/// them with this fill in a separate pass.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct Fill {
    pub style: FillStyle,
    pub color: RgbaColor,
}
