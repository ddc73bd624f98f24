//! # Session
//!
//! Tracks the staging area: generated images waiting for the user to accept one onto the canvas, or discard them all.

use super::entity::{EntityID, ImageRef};

#[derive(Clone, PartialEq, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct SessionState {
    pub is_staging: bool,
    pub staged_images: Vec<ImageRef>,
    pub selected_staged_image_index: usize,
}
impl SessionState {
    #[must_use]
    pub fn selected_staged_image(&self) -> Option<&ImageRef> {
        self.staged_images.get(self.selected_staged_image_index)
    }
}

pub mod commands {
    #[derive(Clone, Debug, PartialEq)]
    pub enum Command {
        StagingStarted,
        ImageStaged(super::ImageRef),
        StagedImageSelected(usize),
        /// Leave staging. If `accept_as` is set, the selected staged image becomes a new raster layer with that ID.
        StagingFinished { accept_as: Option<super::EntityID> },
    }
}
