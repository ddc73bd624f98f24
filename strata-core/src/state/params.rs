//! # Generation parameters
//!
//! The slice of state describing what the next generation will use, as opposed to what's on the canvas.
//! Other features announce intents through [`commands::Command`], like picking an initial image from the gallery.

use super::entity::ImageRef;
use crate::commands::{CommandConsumer, CommandError};

#[derive(
    strum::AsRefStr,
    strum::EnumIter,
    PartialEq,
    Eq,
    Copy,
    Clone,
    Hash,
    Debug,
    serde::Serialize,
    serde::Deserialize,
)]
pub enum BaseModel {
    #[serde(rename = "sd-1")]
    #[strum(serialize = "sd-1")]
    StableDiffusion1,
    #[serde(rename = "sd-2")]
    #[strum(serialize = "sd-2")]
    StableDiffusion2,
    #[serde(rename = "sdxl")]
    #[strum(serialize = "sdxl")]
    StableDiffusionXL,
    #[serde(rename = "sdxl-refiner")]
    #[strum(serialize = "sdxl-refiner")]
    StableDiffusionXLRefiner,
    #[serde(rename = "sd-3")]
    #[strum(serialize = "sd-3")]
    StableDiffusion3,
    #[serde(rename = "flux")]
    #[strum(serialize = "flux")]
    Flux,
}
impl BaseModel {
    /// The side length the model was trained at. The generation box snaps to this when the model changes.
    #[must_use]
    pub fn optimal_dimension(self) -> u32 {
        match self {
            Self::StableDiffusion1 => 512,
            Self::StableDiffusion2 => 768,
            Self::StableDiffusionXL
            | Self::StableDiffusionXLRefiner
            | Self::StableDiffusion3
            | Self::Flux => 1024,
        }
    }
}

#[derive(PartialEq, Eq, Copy, Clone, Hash, Debug, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelFormat {
    Main,
    Onnx,
}

#[derive(Clone, PartialEq, Eq, Hash, Debug, serde::Serialize, serde::Deserialize)]
pub struct ModelField {
    pub model_name: String,
    pub base_model: BaseModel,
    pub format: ModelFormat,
}

/// The image a generation starts from. Either fully resolved, or just a name that the image service knows.
#[derive(Clone, PartialEq, Eq, Hash, Debug, serde::Serialize, serde::Deserialize)]
pub enum InitialImage {
    Image(ImageRef),
    Name(String),
}
impl InitialImage {
    #[must_use]
    pub fn image_name(&self) -> &str {
        match self {
            Self::Image(image) => &image.image_name,
            Self::Name(name) => name,
        }
    }
    /// Resolve into an [`ImageRef`], using `fallback_size` when only the name is known.
    #[must_use]
    pub fn to_image_ref(&self, fallback_size: [u32; 2]) -> ImageRef {
        match self {
            Self::Image(image) => image.clone(),
            Self::Name(name) => ImageRef {
                image_name: name.clone(),
                width: fallback_size[0],
                height: fallback_size[1],
            },
        }
    }
}

#[derive(Clone, PartialEq, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct GenerationParams {
    pub initial_image: Option<InitialImage>,
    pub model: Option<ModelField>,
}

pub mod commands {
    #[derive(Clone, Debug, PartialEq)]
    pub enum Command {
        /// An initial image was picked, or cleared with `None`.
        InitialImageSelected(Option<super::InitialImage>),
        ModelSelected(super::ModelField),
    }
}

impl CommandConsumer<commands::Command> for GenerationParams {
    fn apply(&mut self, command: &commands::Command) -> Result<(), CommandError> {
        match command {
            commands::Command::InitialImageSelected(image) => {
                if &self.initial_image == image {
                    return Err(CommandError::NoOp);
                }
                self.initial_image.clone_from(image);
                Ok(())
            }
            commands::Command::ModelSelected(model) => {
                if self.model.as_ref() == Some(model) {
                    return Err(CommandError::NoOp);
                }
                self.model = Some(model.clone());
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    #[test]
    fn initial_image_name_resolves_with_fallback() {
        let image = InitialImage::Name("abc.png".into());
        assert_eq!(image.image_name(), "abc.png");
        assert_eq!(
            image.to_image_ref([512, 768]),
            ImageRef {
                image_name: "abc.png".into(),
                width: 512,
                height: 768,
            }
        );
    }
    #[test]
    fn selecting_same_model_twice_is_noop() {
        let model = ModelField {
            model_name: "dreamshaper".into(),
            base_model: BaseModel::StableDiffusion1,
            format: ModelFormat::Main,
        };
        let mut params = GenerationParams::default();
        params
            .apply(&commands::Command::ModelSelected(model.clone()))
            .unwrap();
        assert!(matches!(
            params.apply(&commands::Command::ModelSelected(model)),
            Err(CommandError::NoOp)
        ));
    }
    #[test]
    fn base_model_names() {
        assert_eq!(BaseModel::StableDiffusion3.as_ref(), "sd-3");
        assert_eq!(BaseModel::Flux.optimal_dimension(), 1024);
    }
}
