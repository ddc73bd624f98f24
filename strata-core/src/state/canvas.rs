//! Reducer for commands which edit entities and canvas-wide tool state.

use super::{
    entity::{CanvasObject, EntityState, ImageObject},
    tool, CanvasState,
};
use crate::{
    commands::{CommandConsumer, CommandError},
    geometry::Coordinate,
};

pub mod commands {
    use crate::{
        color::RgbaColor,
        geometry::{Coordinate, Rect},
        state::{
            entity::{BrushLine, EntityAddOptions, EntityIdentifier, EraserLine, ImageObject, RectShape},
            tool::Tool,
            CanvasSettings,
        },
    };

    #[derive(Clone, Debug, PartialEq)]
    pub enum Command {
        EntityAdded {
            identifier: EntityIdentifier,
            options: EntityAddOptions,
        },
        EntityDeleted(EntityIdentifier),
        /// Clear all objects and return the entity to the origin.
        EntityReset(EntityIdentifier),
        EntityMoved {
            identifier: EntityIdentifier,
            /// New absolute position.
            position: Coordinate,
        },
        EntityBrushLineAdded {
            identifier: EntityIdentifier,
            line: BrushLine,
        },
        EntityEraserLineAdded {
            identifier: EntityIdentifier,
            line: EraserLine,
        },
        EntityRectAdded {
            identifier: EntityIdentifier,
            rect: RectShape,
        },
        EntityRasterized {
            identifier: EntityIdentifier,
            image: ImageObject,
            position: Coordinate,
            /// Replace every object with the image, rather than adding it on top.
            replace_objects: bool,
        },
        EntitySelected(EntityIdentifier),
        BboxChanged(Rect),
        BrushWidthChanged(f32),
        EraserWidthChanged(f32),
        ToolChanged(Tool),
        ToolBufferChanged(Option<Tool>),
        FillChanged(RgbaColor),
        SettingsChanged(CanvasSettings),
    }
}

impl CanvasState {
    /// Validate, then append an object to an entity.
    fn push_object(
        &mut self,
        identifier: super::entity::EntityIdentifier,
        object: CanvasObject,
    ) -> Result<(), CommandError> {
        if !object.is_valid() {
            return Err(CommandError::InvalidValue("object geometry"));
        }
        let common = self
            .entity_common_mut(identifier)
            .ok_or(CommandError::UnknownEntity)?;
        common.objects.push(object);
        Ok(())
    }
    fn add_entity_of<T: EntityState>(
        &mut self,
        id: super::entity::EntityID,
        options: &super::entity::EntityAddOptions,
    ) {
        T::collection_mut(self)
            .entities
            .push(T::create(id, options));
    }
    fn remove_entity_of<T: EntityState>(&mut self, id: super::entity::EntityID) -> bool {
        let collection = T::collection_mut(self);
        match collection.position_of(id) {
            Some(idx) => {
                collection.entities.remove(idx);
                true
            }
            None => false,
        }
    }
}

impl CommandConsumer<commands::Command> for CanvasState {
    fn apply(&mut self, command: &commands::Command) -> Result<(), CommandError> {
        use super::entity::{
            ControlLayerState, EntityKind, InpaintMaskState, RasterLayerState,
            RegionalGuidanceState,
        };
        use commands::Command;
        match command {
            Command::EntityAdded {
                identifier,
                options,
            } => {
                if self.kind_of(identifier.id).is_some() {
                    return Err(CommandError::DuplicateEntity);
                }
                if !options.position.is_finite() {
                    return Err(CommandError::InvalidValue("position"));
                }
                if options
                    .seed_image
                    .as_ref()
                    .is_some_and(|image| image.width == 0 || image.height == 0)
                {
                    return Err(CommandError::InvalidValue("seed image"));
                }
                match identifier.kind {
                    EntityKind::RasterLayer => {
                        self.add_entity_of::<RasterLayerState>(identifier.id, options);
                    }
                    EntityKind::ControlLayer => {
                        self.add_entity_of::<ControlLayerState>(identifier.id, options);
                    }
                    EntityKind::RegionalGuidance => {
                        self.add_entity_of::<RegionalGuidanceState>(identifier.id, options);
                    }
                    EntityKind::InpaintMask => {
                        self.add_entity_of::<InpaintMaskState>(identifier.id, options);
                    }
                }
                if options.is_selected {
                    self.selected_entity_identifier = Some(*identifier);
                }
                Ok(())
            }
            Command::EntityDeleted(identifier) => {
                let removed = match identifier.kind {
                    EntityKind::RasterLayer => {
                        self.remove_entity_of::<RasterLayerState>(identifier.id)
                    }
                    EntityKind::ControlLayer => {
                        self.remove_entity_of::<ControlLayerState>(identifier.id)
                    }
                    EntityKind::RegionalGuidance => {
                        self.remove_entity_of::<RegionalGuidanceState>(identifier.id)
                    }
                    EntityKind::InpaintMask => {
                        self.remove_entity_of::<InpaintMaskState>(identifier.id)
                    }
                };
                if !removed {
                    return Err(CommandError::UnknownEntity);
                }
                // Selection must never dangle.
                if self.selected_entity_identifier == Some(*identifier) {
                    self.selected_entity_identifier = None;
                }
                Ok(())
            }
            Command::EntityReset(identifier) => {
                let common = self
                    .entity_common_mut(*identifier)
                    .ok_or(CommandError::UnknownEntity)?;
                if common.objects.is_empty() && common.position == Coordinate::ORIGIN {
                    return Err(CommandError::NoOp);
                }
                common.objects.clear();
                common.position = Coordinate::ORIGIN;
                Ok(())
            }
            Command::EntityMoved {
                identifier,
                position,
            } => {
                if !position.is_finite() {
                    return Err(CommandError::InvalidValue("position"));
                }
                let common = self
                    .entity_common_mut(*identifier)
                    .ok_or(CommandError::UnknownEntity)?;
                if common.position == *position {
                    return Err(CommandError::NoOp);
                }
                common.position = *position;
                Ok(())
            }
            Command::EntityBrushLineAdded { identifier, line } => {
                self.push_object(*identifier, CanvasObject::BrushLine(line.clone()))
            }
            Command::EntityEraserLineAdded { identifier, line } => {
                self.push_object(*identifier, CanvasObject::EraserLine(line.clone()))
            }
            Command::EntityRectAdded { identifier, rect } => {
                self.push_object(*identifier, CanvasObject::Rect(rect.clone()))
            }
            Command::EntityRasterized {
                identifier,
                image,
                position,
                replace_objects,
            } => {
                if !position.is_finite() {
                    return Err(CommandError::InvalidValue("position"));
                }
                let object = CanvasObject::Image(ImageObject::clone(image));
                if !object.is_valid() {
                    return Err(CommandError::InvalidValue("rasterized image"));
                }
                let common = self
                    .entity_common_mut(*identifier)
                    .ok_or(CommandError::UnknownEntity)?;
                if *replace_objects {
                    common.objects.clear();
                    common.position = *position;
                }
                common.objects.push(object);
                Ok(())
            }
            Command::EntitySelected(identifier) => {
                if !self.contains_entity(*identifier) {
                    return Err(CommandError::UnknownEntity);
                }
                if self.selected_entity_identifier == Some(*identifier) {
                    return Err(CommandError::NoOp);
                }
                self.selected_entity_identifier = Some(*identifier);
                Ok(())
            }
            Command::BboxChanged(rect) => {
                if !rect.is_valid() {
                    return Err(CommandError::InvalidValue("bbox"));
                }
                if self.bbox.rect == *rect {
                    return Err(CommandError::NoOp);
                }
                self.bbox.rect = *rect;
                Ok(())
            }
            Command::BrushWidthChanged(width) => {
                if !tool::valid_width(*width) {
                    return Err(CommandError::InvalidValue("brush width"));
                }
                if self.tool.brush.width == *width {
                    return Err(CommandError::NoOp);
                }
                self.tool.brush.width = *width;
                Ok(())
            }
            Command::EraserWidthChanged(width) => {
                if !tool::valid_width(*width) {
                    return Err(CommandError::InvalidValue("eraser width"));
                }
                if self.tool.eraser.width == *width {
                    return Err(CommandError::NoOp);
                }
                self.tool.eraser.width = *width;
                Ok(())
            }
            Command::ToolChanged(tool) => {
                if self.tool.selected == *tool {
                    return Err(CommandError::NoOp);
                }
                self.tool.selected = *tool;
                Ok(())
            }
            Command::ToolBufferChanged(buffer) => {
                if self.tool.selected_buffer == *buffer {
                    return Err(CommandError::NoOp);
                }
                self.tool.selected_buffer = *buffer;
                Ok(())
            }
            Command::FillChanged(fill) => {
                if self.tool.fill == *fill {
                    return Err(CommandError::NoOp);
                }
                self.tool.fill = *fill;
                Ok(())
            }
            Command::SettingsChanged(settings) => {
                if self.settings == *settings {
                    return Err(CommandError::NoOp);
                }
                self.settings = settings.clone();
                Ok(())
            }
        }
    }
}
