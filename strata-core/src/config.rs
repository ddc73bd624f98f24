//! User preferences, saved to and loaded from the platform's preferences directory.

use crate::{color::RgbaColor, state::CanvasSettings};

const DOCUMENTATION: &str = r#"# Strata preferences. You may edit this file, but be aware that formatting and comments will not
# be preserved, and all keys and values are case sensitive.
# Missing keys take their default values.

# Examples:
# brush_width = 50.0
# eraser_width = 50.0
# [fill]
# r = 31
# g = 160
# b = 224
# a = 1.0
# [canvas]
# snap_to_grid = false

"#;

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("no preferences directory found")]
    NoPreferencesDir,
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("malformed preferences: {0}")]
    Parse(#[from] toml::de::Error),
    #[error(transparent)]
    Serialize(#[from] toml::ser::Error),
    #[error("invalid {0}")]
    InvalidValue(&'static str),
}

#[must_use]
pub fn preferences_dir() -> Option<std::path::PathBuf> {
    let mut base_dir = dirs::preference_dir()?;
    base_dir.push("strata");
    Some(base_dir)
}

/// Defaults for a fresh canvas.
#[derive(Clone, PartialEq, Debug, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub brush_width: f32,
    pub eraser_width: f32,
    pub fill: RgbaColor,
    pub canvas: CanvasSettings,
}
impl Default for Preferences {
    fn default() -> Self {
        let tool = crate::state::ToolState::default();
        Self {
            brush_width: tool.brush.width,
            eraser_width: tool.eraser.width,
            fill: tool.fill,
            canvas: CanvasSettings::default(),
        }
    }
}
impl Preferences {
    const FILENAME: &'static str = "preferences.toml";
    /// Load from the user's preferences dir, or defaults if unavailable for some reason.
    #[must_use]
    pub fn load() -> Self {
        match preferences_dir() {
            None => {
                log::warn!("Preferences dir unavailable, defaulting.");
                Self::default()
            }
            Some(mut dir) => {
                dir.push(Self::FILENAME);
                Self::load_or_default(&dir)
            }
        }
    }
    #[must_use]
    pub fn load_or_default(path: &std::path::Path) -> Self {
        match Self::load_from(path) {
            Ok(this) => this,
            // First run, not worth a warning.
            Err(ConfigError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No preferences at {}, defaulting.", path.display());
                Self::default()
            }
            Err(e) => {
                log::warn!("Failed to load preferences at {}: {e}", path.display());
                Self::default()
            }
        }
    }
    pub fn load_from(path: &std::path::Path) -> Result<Self, ConfigError> {
        let string = std::fs::read_to_string(path)?;
        let this: Self = toml::from_str(&string)?;
        this.validate()?;
        Ok(this)
    }
    fn validate(&self) -> Result<(), ConfigError> {
        let width_ok = |w: f32| w.is_finite() && w > 0.0;
        if !width_ok(self.brush_width) {
            return Err(ConfigError::InvalidValue("brush_width"));
        }
        if !width_ok(self.eraser_width) {
            return Err(ConfigError::InvalidValue("eraser_width"));
        }
        Ok(())
    }
    pub fn save(&self) -> Result<(), ConfigError> {
        let mut preferences = preferences_dir().ok_or(ConfigError::NoPreferencesDir)?;
        // Explicity do *not* create recursively. If not found, the user probably has a good reason.
        // Ignore errors (could already exist). Any real errors will be emitted by file access below.
        let _ = std::fs::DirBuilder::new().create(&preferences);

        preferences.push(Self::FILENAME);
        self.save_to(&preferences)
    }
    pub fn save_to(&self, path: &std::path::Path) -> Result<(), ConfigError> {
        let string = toml::ser::to_string_pretty(self)?;
        std::fs::write(path, DOCUMENTATION.to_owned() + &string)?;
        Ok(())
    }
}
