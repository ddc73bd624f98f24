//! # Document state
//!
//! The serializable description of everything on the canvas. Owned by the [store](crate::store::CanvasStore),
//! and only ever changed by applying [commands](crate::commands).

pub mod canvas;
pub mod entity;
pub mod params;
pub mod session;
pub mod tool;

use crate::{
    commands::{Command, CommandConsumer, CommandError, SessionCommand},
    geometry::Rect,
};
use entity::{
    ControlLayerState, EntityAddOptions, EntityCollection, EntityCommon, EntityID,
    EntityIdentifier, EntityKind, EntityState, InpaintMaskState, RasterLayerState,
    RegionalGuidanceState,
};

pub use params::GenerationParams;
pub use session::SessionState;
pub use tool::{Tool, ToolState};

#[derive(Copy, Clone, PartialEq, Debug, serde::Serialize, serde::Deserialize)]
pub struct BboxState {
    /// The area of the canvas sent to generation.
    pub rect: Rect,
    /// Side length the current model prefers, see [`params::BaseModel::optimal_dimension`].
    pub optimal_dimension: u32,
}
impl Default for BboxState {
    fn default() -> Self {
        Self {
            rect: Rect::new(0.0, 0.0, 512.0, 512.0),
            optimal_dimension: 512,
        }
    }
}

#[derive(Clone, PartialEq, Eq, Debug, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CanvasSettings {
    pub auto_save: bool,
    /// Clip drawn lines to the generation box.
    pub clip_to_bbox: bool,
    /// Grid spacing adapts to the zoom level.
    pub dynamic_grid: bool,
    pub snap_to_grid: bool,
    pub show_hud: bool,
    pub invert_brush_size_scroll_direction: bool,
}
impl Default for CanvasSettings {
    fn default() -> Self {
        Self {
            auto_save: false,
            clip_to_bbox: false,
            dynamic_grid: true,
            snap_to_grid: true,
            show_hud: true,
            invert_brush_size_scroll_direction: false,
        }
    }
}

#[derive(Clone, PartialEq, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct CanvasState {
    pub raster_layers: EntityCollection<RasterLayerState>,
    pub control_layers: EntityCollection<ControlLayerState>,
    pub regions: EntityCollection<RegionalGuidanceState>,
    pub inpaint_masks: EntityCollection<InpaintMaskState>,
    pub selected_entity_identifier: Option<EntityIdentifier>,
    pub tool: ToolState,
    pub bbox: BboxState,
    pub settings: CanvasSettings,
    pub session: SessionState,
    pub params: GenerationParams,
}
impl CanvasState {
    /// A blank canvas, seeded from user preferences.
    #[must_use]
    pub fn from_preferences(preferences: &crate::config::Preferences) -> Self {
        let mut this = Self::default();
        this.tool.fill = preferences.fill;
        this.tool.brush.width = preferences.brush_width;
        this.tool.eraser.width = preferences.eraser_width;
        this.settings = preferences.canvas.clone();
        this
    }
    /// Find which collection, if any, holds this ID.
    #[must_use]
    pub fn kind_of(&self, id: EntityID) -> Option<EntityKind> {
        if self.raster_layers.contains(id) {
            Some(EntityKind::RasterLayer)
        } else if self.control_layers.contains(id) {
            Some(EntityKind::ControlLayer)
        } else if self.regions.contains(id) {
            Some(EntityKind::RegionalGuidance)
        } else if self.inpaint_masks.contains(id) {
            Some(EntityKind::InpaintMask)
        } else {
            None
        }
    }
    #[must_use]
    pub fn contains_entity(&self, identifier: EntityIdentifier) -> bool {
        self.entity_common(identifier).is_some()
    }
    /// Look up the fields shared by all kinds, in the collection matching the identifier's kind.
    #[must_use]
    pub fn entity_common(&self, identifier: EntityIdentifier) -> Option<&EntityCommon> {
        match identifier.kind {
            EntityKind::RasterLayer => self.raster_layers.get(identifier.id).map(EntityState::common),
            EntityKind::ControlLayer => self.control_layers.get(identifier.id).map(EntityState::common),
            EntityKind::RegionalGuidance => self.regions.get(identifier.id).map(EntityState::common),
            EntityKind::InpaintMask => self.inpaint_masks.get(identifier.id).map(EntityState::common),
        }
    }
    fn entity_common_mut(&mut self, identifier: EntityIdentifier) -> Option<&mut EntityCommon> {
        match identifier.kind {
            EntityKind::RasterLayer => self
                .raster_layers
                .get_mut(identifier.id)
                .map(EntityState::common_mut),
            EntityKind::ControlLayer => self
                .control_layers
                .get_mut(identifier.id)
                .map(EntityState::common_mut),
            EntityKind::RegionalGuidance => self
                .regions
                .get_mut(identifier.id)
                .map(EntityState::common_mut),
            EntityKind::InpaintMask => self
                .inpaint_masks
                .get_mut(identifier.id)
                .map(EntityState::common_mut),
        }
    }
    /// Every entity on the canvas, collection by collection.
    pub fn identifiers(&self) -> impl Iterator<Item = EntityIdentifier> + '_ {
        let of = |kind: EntityKind| move |id: EntityID| EntityIdentifier::new(id, kind);
        self.raster_layers
            .ids()
            .map(of(EntityKind::RasterLayer))
            .chain(self.control_layers.ids().map(of(EntityKind::ControlLayer)))
            .chain(self.regions.ids().map(of(EntityKind::RegionalGuidance)))
            .chain(self.inpaint_masks.ids().map(of(EntityKind::InpaintMask)))
    }
}

impl CommandConsumer<SessionCommand> for CanvasState {
    fn apply(&mut self, command: &SessionCommand) -> Result<(), CommandError> {
        let session = &mut self.session;
        match command {
            SessionCommand::StagingStarted => {
                if session.is_staging {
                    return Err(CommandError::NoOp);
                }
                *session = SessionState {
                    is_staging: true,
                    ..SessionState::default()
                };
                Ok(())
            }
            SessionCommand::ImageStaged(image) => {
                if !session.is_staging {
                    return Err(CommandError::InvalidValue("staging is not active"));
                }
                session.staged_images.push(image.clone());
                Ok(())
            }
            SessionCommand::StagedImageSelected(index) => {
                if !session.is_staging || *index >= session.staged_images.len() {
                    return Err(CommandError::InvalidValue("staged image index"));
                }
                if session.selected_staged_image_index == *index {
                    return Err(CommandError::NoOp);
                }
                session.selected_staged_image_index = *index;
                Ok(())
            }
            SessionCommand::StagingFinished { accept_as } => {
                if !session.is_staging {
                    return Err(CommandError::NoOp);
                }
                if let Some(id) = accept_as {
                    let image = session
                        .selected_staged_image()
                        .cloned()
                        .ok_or(CommandError::InvalidValue("no staged image to accept"))?;
                    if self.kind_of(*id).is_some() {
                        return Err(CommandError::DuplicateEntity);
                    }
                    let options = EntityAddOptions {
                        seed_image: Some(image),
                        position: self.bbox.rect.origin(),
                        ..EntityAddOptions::default()
                    };
                    self.raster_layers
                        .entities
                        .push(RasterLayerState::create(*id, &options));
                }
                self.session = SessionState::default();
                Ok(())
            }
        }
    }
}

impl CommandConsumer<Command> for CanvasState {
    fn apply(&mut self, command: &Command) -> Result<(), CommandError> {
        match command {
            Command::Canvas(command) => self.apply(command),
            Command::Session(command) => self.apply(command),
            Command::Generation(command) => {
                self.params.apply(command)?;
                if let params::commands::Command::ModelSelected(model) = command {
                    self.bbox.optimal_dimension = model.base_model.optimal_dimension();
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        color::RgbaColor,
        commands::{CanvasCommand, GenerationCommand},
        geometry::Coordinate,
        state::entity::{BrushLine, ImageObject, ImageRef, ObjectID},
    };

    fn image(name: &str) -> ImageRef {
        ImageRef {
            image_name: name.into(),
            width: 64,
            height: 32,
        }
    }
    fn add(state: &mut CanvasState, kind: EntityKind, is_selected: bool) -> EntityIdentifier {
        let identifier = EntityIdentifier::fresh(kind);
        state
            .apply(&Command::from(CanvasCommand::EntityAdded {
                identifier,
                options: EntityAddOptions {
                    is_selected,
                    ..Default::default()
                },
            }))
            .unwrap();
        identifier
    }
    fn line() -> BrushLine {
        BrushLine {
            id: ObjectID::default(),
            stroke_width: 10.0,
            points: vec![0.0, 0.0, 5.0, 5.0],
            color: RgbaColor::WHITE,
            clip: None,
        }
    }

    #[test]
    fn add_lands_in_matching_collection() {
        let mut state = CanvasState::default();
        let mask = add(&mut state, EntityKind::InpaintMask, true);
        let layer = add(&mut state, EntityKind::RasterLayer, false);
        assert_eq!(state.inpaint_masks.len(), 1);
        assert_eq!(state.raster_layers.len(), 1);
        assert_eq!(state.kind_of(mask.id), Some(EntityKind::InpaintMask));
        assert_eq!(state.selected_entity_identifier, Some(mask));
        assert_eq!(state.identifiers().collect::<Vec<_>>(), vec![layer, mask]);
    }
    #[test]
    fn duplicate_id_is_rejected_across_kinds() {
        let mut state = CanvasState::default();
        let layer = add(&mut state, EntityKind::RasterLayer, false);
        let clash = EntityIdentifier::new(layer.id, EntityKind::ControlLayer);
        let before = state.clone();
        assert_eq!(
            state.apply(&Command::from(CanvasCommand::EntityAdded {
                identifier: clash,
                options: EntityAddOptions::default(),
            })),
            Err(CommandError::DuplicateEntity)
        );
        assert_eq!(state, before);
    }
    #[test]
    fn selecting_wrong_kind_is_rejected() {
        let mut state = CanvasState::default();
        let layer = add(&mut state, EntityKind::RasterLayer, false);
        let wrong = EntityIdentifier::new(layer.id, EntityKind::InpaintMask);
        assert_eq!(
            state.apply(&Command::from(CanvasCommand::EntitySelected(wrong))),
            Err(CommandError::UnknownEntity)
        );
        assert_eq!(state.selected_entity_identifier, None);
    }
    #[test]
    fn deleting_selected_clears_selection() {
        let mut state = CanvasState::default();
        let region = add(&mut state, EntityKind::RegionalGuidance, true);
        state
            .apply(&Command::from(CanvasCommand::EntityDeleted(region)))
            .unwrap();
        assert!(state.regions.is_empty());
        assert_eq!(state.selected_entity_identifier, None);
        assert_eq!(
            state.apply(&Command::from(CanvasCommand::EntityDeleted(region))),
            Err(CommandError::UnknownEntity)
        );
    }
    #[test]
    fn draw_move_reset() {
        let mut state = CanvasState::default();
        let layer = add(&mut state, EntityKind::ControlLayer, false);
        state
            .apply(&Command::from(CanvasCommand::EntityBrushLineAdded {
                identifier: layer,
                line: line(),
            }))
            .unwrap();
        state
            .apply(&Command::from(CanvasCommand::EntityMoved {
                identifier: layer,
                position: Coordinate::new(4.0, 8.0),
            }))
            .unwrap();
        let common = state.entity_common(layer).unwrap();
        assert_eq!(common.objects.len(), 1);
        assert_eq!(common.position, Coordinate::new(4.0, 8.0));

        state
            .apply(&Command::from(CanvasCommand::EntityReset(layer)))
            .unwrap();
        let common = state.entity_common(layer).unwrap();
        assert!(common.objects.is_empty());
        assert_eq!(common.position, Coordinate::ORIGIN);
        // Nothing left to reset.
        assert_eq!(
            state.apply(&Command::from(CanvasCommand::EntityReset(layer))),
            Err(CommandError::NoOp)
        );
    }
    #[test]
    fn invalid_line_leaves_state_untouched() {
        let mut state = CanvasState::default();
        let layer = add(&mut state, EntityKind::RasterLayer, false);
        let before = state.clone();
        let mut bad = line();
        bad.stroke_width = 0.0;
        assert_eq!(
            state.apply(&Command::from(CanvasCommand::EntityBrushLineAdded {
                identifier: layer,
                line: bad,
            })),
            Err(CommandError::InvalidValue("object geometry"))
        );
        assert_eq!(state, before);
    }
    #[test]
    fn rasterize_replaces_objects() {
        let mut state = CanvasState::default();
        let layer = add(&mut state, EntityKind::RasterLayer, false);
        for _ in 0..3 {
            state
                .apply(&Command::from(CanvasCommand::EntityBrushLineAdded {
                    identifier: layer,
                    line: line(),
                }))
                .unwrap();
        }
        let object = ImageObject {
            id: ObjectID::default(),
            image: image("flat.png"),
        };
        state
            .apply(&Command::from(CanvasCommand::EntityRasterized {
                identifier: layer,
                image: object.clone(),
                position: Coordinate::new(-5.0, 2.0),
                replace_objects: true,
            }))
            .unwrap();
        let common = state.entity_common(layer).unwrap();
        assert_eq!(
            common.objects,
            vec![entity::CanvasObject::Image(object)]
        );
        assert_eq!(common.position, Coordinate::new(-5.0, 2.0));
    }
    #[test]
    fn tool_widths_must_be_positive() {
        let mut state = CanvasState::default();
        assert!(state
            .apply(&Command::from(CanvasCommand::BrushWidthChanged(-1.0)))
            .is_err());
        assert!(state
            .apply(&Command::from(CanvasCommand::EraserWidthChanged(f32::NAN)))
            .is_err());
        state
            .apply(&Command::from(CanvasCommand::BrushWidthChanged(12.0)))
            .unwrap();
        assert_eq!(state.tool.brush.width, 12.0);
        // Same width again changes nothing.
        assert!(matches!(
            state.apply(&Command::from(CanvasCommand::BrushWidthChanged(12.0))),
            Err(CommandError::NoOp)
        ));
        let eraser = state.tool.eraser.width;
        assert!(matches!(
            state.apply(&Command::from(CanvasCommand::EraserWidthChanged(eraser))),
            Err(CommandError::NoOp)
        ));
    }
    #[test]
    fn seeded_from_preferences() {
        let preferences = crate::config::Preferences {
            brush_width: 8.0,
            eraser_width: 90.0,
            fill: RgbaColor::new(1, 2, 3, 0.25).unwrap(),
            canvas: CanvasSettings {
                snap_to_grid: false,
                auto_save: true,
                ..Default::default()
            },
        };
        let state = CanvasState::from_preferences(&preferences);
        assert_eq!(state.tool.brush.width, 8.0);
        assert_eq!(state.tool.eraser.width, 90.0);
        assert_eq!(state.tool.fill, preferences.fill);
        assert_eq!(state.settings, preferences.canvas);
        // Everything else is a blank canvas.
        assert!(state.identifiers().next().is_none());
        assert_eq!(state.selected_entity_identifier, None);
        assert_eq!(state.bbox, BboxState::default());
    }
    #[test]
    fn model_selection_updates_bbox_dimension() {
        let mut state = CanvasState::default();
        state
            .apply(&Command::from(GenerationCommand::ModelSelected(
                params::ModelField {
                    model_name: "juggernaut".into(),
                    base_model: params::BaseModel::StableDiffusionXL,
                    format: params::ModelFormat::Main,
                },
            )))
            .unwrap();
        assert_eq!(state.bbox.optimal_dimension, 1024);
    }
    #[test]
    fn accepting_staged_image_adds_raster_layer() {
        let mut state = CanvasState::default();
        state
            .apply(&Command::from(SessionCommand::StagingStarted))
            .unwrap();
        state
            .apply(&Command::from(SessionCommand::ImageStaged(image("a.png"))))
            .unwrap();
        state
            .apply(&Command::from(SessionCommand::ImageStaged(image("b.png"))))
            .unwrap();
        state
            .apply(&Command::from(SessionCommand::StagedImageSelected(1)))
            .unwrap();
        assert!(state
            .apply(&Command::from(SessionCommand::StagedImageSelected(2)))
            .is_err());

        let id = EntityID::default();
        state
            .apply(&Command::from(SessionCommand::StagingFinished {
                accept_as: Some(id),
            }))
            .unwrap();
        assert!(!state.session.is_staging);
        let layer = state.raster_layers.get(id).unwrap();
        match layer.common.objects.as_slice() {
            [entity::CanvasObject::Image(object)] => assert_eq!(object.image.image_name, "b.png"),
            other => panic!("unexpected objects {other:?}"),
        }
    }
    #[test]
    fn staging_image_requires_active_session() {
        let mut state = CanvasState::default();
        assert_eq!(
            state.apply(&Command::from(SessionCommand::ImageStaged(image("a.png")))),
            Err(CommandError::InvalidValue("staging is not active"))
        );
    }
}
