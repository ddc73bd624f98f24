//! Utility types, used throughout the crate.

/// A float in the closed range `[0, 1]` - never NaN.
///
/// Used for opacities and alpha channels, where anything outside the unit range is meaningless.
#[derive(Copy, Clone, PartialEq, PartialOrd, Debug, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "f32", into = "f32")]
#[repr(transparent)]
pub struct UnitF32(f32);
impl UnitF32 {
    pub const ZERO: Self = Self(0.0);
    pub const ONE: Self = Self(1.0);
    pub fn new(val: f32) -> Result<Self, UnitF32Error> {
        if val.is_nan() {
            Err(UnitF32Error::NaN)
        } else if !(0.0..=1.0).contains(&val) {
            Err(UnitF32Error::OutOfRange)
        } else {
            // Normalize -0.0, so that bitwise hashing agrees with Eq.
            Ok(Self(val + 0.0))
        }
    }
    #[must_use]
    pub fn get(self) -> f32 {
        self.0
    }
}

impl Default for UnitF32 {
    fn default() -> Self {
        Self::ONE
    }
}

impl TryFrom<f32> for UnitF32 {
    type Error = UnitF32Error;
    fn try_from(value: f32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}
impl From<UnitF32> for f32 {
    fn from(value: UnitF32) -> Self {
        value.get()
    }
}

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitF32Error {
    #[error("value is NaN")]
    NaN,
    #[error("value outside of [0, 1]")]
    OutOfRange,
}

// Never NaN, so PartialEq can act like Eq.
impl Eq for UnitF32 {}
impl std::hash::Hash for UnitF32 {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        state.write_u32(self.0.to_bits());
    }
}
