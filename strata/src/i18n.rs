//! Translated UI strings, looked up by dotted keys like `controlLayers.addLayer`.
//!
//! English is built in. Other languages are TOML files of overrides - either quoted dotted keys or nested tables:
//! ```toml
//! "controlLayers.addLayer" = "Ebene hinzufügen"
//! [controlLayers]
//! rasterLayer = "Rasterebene"
//! ```

const ENGLISH: &[(&str, &str)] = &[
    ("controlLayers.addLayer", "Add Layer"),
    ("controlLayers.regional", "Regional"),
    ("controlLayers.inpaintMask", "Inpaint Mask"),
    ("controlLayers.regionalGuidance", "Regional Guidance"),
    ("controlLayers.regionalReferenceImage", "Regional Reference Image"),
    ("controlLayers.layer_other", "Layers"),
    ("controlLayers.controlLayer", "Control Layer"),
    ("controlLayers.newControlLayerFromImage", "Control Layer from Initial Image"),
    ("controlLayers.rasterLayer", "Raster Layer"),
    ("controlLayers.newRasterLayerFromImage", "Raster Layer from Initial Image"),
];

#[derive(thiserror::Error, Debug)]
pub enum TranslationError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("malformed translations: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("translation for {0:?} is not a string")]
    NotAString(String),
}

#[derive(Clone, Debug)]
pub struct Translations {
    strings: hashbrown::HashMap<String, String>,
}
impl Default for Translations {
    fn default() -> Self {
        Self::english()
    }
}
impl Translations {
    const FILENAME: &'static str = "translations.toml";
    #[must_use]
    pub fn english() -> Self {
        Self {
            strings: ENGLISH
                .iter()
                .map(|&(key, value)| (key.to_owned(), value.to_owned()))
                .collect(),
        }
    }
    /// English, overridden by the user's translations file if there is one.
    #[must_use]
    pub fn load() -> Self {
        let Some(mut path) = strata_core::config::preferences_dir() else {
            return Self::english();
        };
        path.push(Self::FILENAME);
        match Self::load_from(&path) {
            Ok(this) => this,
            Err(TranslationError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                Self::english()
            }
            Err(e) => {
                log::warn!("Failed to load translations at {}: {e}", path.display());
                Self::english()
            }
        }
    }
    /// English, overridden by the given file.
    pub fn load_from(path: &std::path::Path) -> Result<Self, TranslationError> {
        let text = std::fs::read_to_string(path)?;
        Self::english().with_overrides(&text)
    }
    /// Apply overrides from TOML text. On error, none are applied.
    pub fn with_overrides(mut self, toml_text: &str) -> Result<Self, TranslationError> {
        let table: toml::Table = toml::from_str(toml_text)?;
        let mut flat = Vec::new();
        flatten(String::new(), table, &mut flat)?;
        self.strings.extend(flat);
        Ok(self)
    }
    /// Look up a key. Missing keys translate to themselves, so they're visible but not fatal.
    #[must_use]
    pub fn t<'a>(&'a self, key: &'a str) -> &'a str {
        match self.strings.get(key) {
            Some(value) => value,
            None => {
                log::trace!("Missing translation {key:?}");
                key
            }
        }
    }
}

fn flatten(
    prefix: String,
    table: toml::Table,
    out: &mut Vec<(String, String)>,
) -> Result<(), TranslationError> {
    for (key, value) in table {
        let key = if prefix.is_empty() {
            key
        } else {
            format!("{prefix}.{key}")
        };
        match value {
            toml::Value::String(s) => out.push((key, s)),
            toml::Value::Table(t) => flatten(key, t, out)?,
            _ => return Err(TranslationError::NotAString(key)),
        }
    }
    Ok(())
}
