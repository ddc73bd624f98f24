//! # Entities
//!
//! Entities are the addressable layers of the canvas. There are exactly four kinds, each stored in
//! its own ordered collection of the [`CanvasState`](super::CanvasState). The order of a collection is the
//! draw order, bottom to top.

use crate::{
    color::{Fill, FillStyle, RgbaColor},
    geometry::{Coordinate, Rect},
    util::UnitF32,
};

/// Namespace for [`EntityID`]. Never constructed.
pub enum Entity {}
pub type EntityID = crate::StrataID<Entity>;
pub type ObjectID = crate::StrataID<CanvasObject>;

#[derive(
    strum::AsRefStr,
    strum::Display,
    strum::EnumString,
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
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    RasterLayer,
    ControlLayer,
    RegionalGuidance,
    InpaintMask,
}
impl EntityKind {
    /// Masks draw in solid black and get their color from a compositing pass, rather than from their objects.
    #[must_use]
    pub fn is_mask(self) -> bool {
        matches!(self, Self::RegionalGuidance | Self::InpaintMask)
    }
}

/// Names one entity. The ID alone is unique, the kind says which collection to look in.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, serde::Serialize, serde::Deserialize)]
pub struct EntityIdentifier {
    pub id: EntityID,
    pub kind: EntityKind,
}
impl EntityIdentifier {
    #[must_use]
    pub fn new(id: EntityID, kind: EntityKind) -> Self {
        Self { id, kind }
    }
    /// Allocate a brand new identifier of the given kind.
    #[must_use]
    pub fn fresh(kind: EntityKind) -> Self {
        Self::new(EntityID::default(), kind)
    }
}
impl std::fmt::Display for EntityIdentifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.kind, self.id.id())
    }
}

/// A reference to an image held by the image service.
#[derive(Clone, PartialEq, Eq, Hash, Debug, serde::Serialize, serde::Deserialize)]
pub struct ImageRef {
    pub image_name: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Clone, PartialEq, Debug, serde::Serialize, serde::Deserialize)]
pub struct BrushLine {
    pub id: ObjectID,
    pub stroke_width: f32,
    /// Flattened `[x0, y0, x1, y1, ...]`, relative to the entity's position.
    pub points: Vec<f32>,
    pub color: RgbaColor,
    pub clip: Option<Rect>,
}
#[derive(Clone, PartialEq, Debug, serde::Serialize, serde::Deserialize)]
pub struct EraserLine {
    pub id: ObjectID,
    pub stroke_width: f32,
    /// Flattened `[x0, y0, x1, y1, ...]`, relative to the entity's position.
    pub points: Vec<f32>,
    pub clip: Option<Rect>,
}
#[derive(Clone, PartialEq, Debug, serde::Serialize, serde::Deserialize)]
pub struct RectShape {
    pub id: ObjectID,
    pub rect: Rect,
    pub color: RgbaColor,
}
#[derive(Clone, PartialEq, Debug, serde::Serialize, serde::Deserialize)]
pub struct ImageObject {
    pub id: ObjectID,
    pub image: ImageRef,
}

/// Something drawn into an entity.
#[derive(Clone, PartialEq, Debug, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CanvasObject {
    BrushLine(BrushLine),
    EraserLine(EraserLine),
    Rect(RectShape),
    Image(ImageObject),
}
impl CanvasObject {
    #[must_use]
    pub fn id(&self) -> ObjectID {
        match self {
            Self::BrushLine(BrushLine { id, .. })
            | Self::EraserLine(EraserLine { id, .. })
            | Self::Rect(RectShape { id, .. })
            | Self::Image(ImageObject { id, .. }) => *id,
        }
    }
    /// Check the geometry is drawable. Lines need a positive width and whole, finite points.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        fn line_ok(stroke_width: f32, points: &[f32]) -> bool {
            stroke_width.is_finite()
                && stroke_width > 0.0
                && points.len() % 2 == 0
                && points.iter().all(|p| p.is_finite())
        }
        match self {
            Self::BrushLine(line) => line_ok(line.stroke_width, &line.points),
            Self::EraserLine(line) => line_ok(line.stroke_width, &line.points),
            Self::Rect(rect) => rect.rect.is_valid(),
            Self::Image(image) => image.image.width > 0 && image.image.height > 0,
        }
    }
}

/// The fields every kind of entity has.
#[derive(Clone, PartialEq, Debug, serde::Serialize, serde::Deserialize)]
pub struct EntityCommon {
    pub id: EntityID,
    pub name: Option<String>,
    pub is_enabled: bool,
    /// Offset of the entity's objects in canvas space.
    pub position: Coordinate,
    pub opacity: UnitF32,
    pub objects: Vec<CanvasObject>,
}
impl EntityCommon {
    #[must_use]
    pub fn new(id: EntityID) -> Self {
        Self {
            id,
            name: None,
            is_enabled: true,
            position: Coordinate::ORIGIN,
            opacity: UnitF32::ONE,
            objects: Vec::new(),
        }
    }
}

#[derive(Clone, PartialEq, Debug, serde::Serialize, serde::Deserialize)]
pub struct RasterLayerState {
    #[serde(flatten)]
    pub common: EntityCommon,
}

#[derive(Copy, Clone, PartialEq, Debug, serde::Serialize, serde::Deserialize)]
pub struct ControlAdapter {
    pub weight: f32,
    /// Fraction of the denoising steps, `[begin, end]`.
    pub begin_end_step_pct: [f32; 2],
}
impl Default for ControlAdapter {
    fn default() -> Self {
        Self {
            weight: 1.0,
            begin_end_step_pct: [0.0, 0.75],
        }
    }
}
#[derive(Clone, PartialEq, Debug, serde::Serialize, serde::Deserialize)]
pub struct ControlLayerState {
    #[serde(flatten)]
    pub common: EntityCommon,
    /// Render dark pixels as transparent, so the control image can be seen through.
    pub with_transparency_effect: bool,
    pub control: ControlAdapter,
}

#[derive(Clone, PartialEq, Debug, serde::Serialize, serde::Deserialize)]
pub struct RegionalReferenceImage {
    pub id: ObjectID,
    /// Empty until the user drops an image into the slot.
    pub image: Option<ImageRef>,
    pub weight: f32,
}
#[derive(Clone, PartialEq, Debug, serde::Serialize, serde::Deserialize)]
pub struct RegionalGuidanceState {
    #[serde(flatten)]
    pub common: EntityCommon,
    pub fill: Fill,
    pub positive_prompt: Option<String>,
    pub negative_prompt: Option<String>,
    pub reference_images: Vec<RegionalReferenceImage>,
}

#[derive(Clone, PartialEq, Debug, serde::Serialize, serde::Deserialize)]
pub struct InpaintMaskState {
    #[serde(flatten)]
    pub common: EntityCommon,
    pub fill: Fill,
}

/// Creation parameters for a new entity.
#[derive(Clone, PartialEq, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct EntityAddOptions {
    /// Select the new entity once added.
    pub is_selected: bool,
    /// Seed the entity with this image as its only object.
    pub seed_image: Option<ImageRef>,
    pub position: Coordinate,
    /// Only meaningful for regional guidance - start with an empty reference image slot.
    pub with_reference_image: bool,
}

pub const DEFAULT_INPAINT_MASK_FILL: Fill = Fill {
    style: FillStyle::Diagonal,
    color: RgbaColor::rgb(224, 117, 117),
};
pub const DEFAULT_REGION_FILL: Fill = Fill {
    style: FillStyle::Solid,
    color: RgbaColor::rgb(121, 157, 219),
};

/// An ordered collection of one kind of entity.
#[derive(Clone, PartialEq, Debug, serde::Serialize, serde::Deserialize)]
#[serde(bound(
    serialize = "T: serde::Serialize",
    deserialize = "T: serde::Deserialize<'de>"
))]
pub struct EntityCollection<T> {
    pub is_hidden: bool,
    pub entities: Vec<T>,
}
impl<T> Default for EntityCollection<T> {
    fn default() -> Self {
        Self {
            is_hidden: false,
            entities: Vec::new(),
        }
    }
}
impl<T: EntityState> EntityCollection<T> {
    /// Index of the entity with this ID, if present.
    #[must_use]
    pub fn position_of(&self, id: EntityID) -> Option<usize> {
        self.entities
            .iter()
            .position(|entity| entity.common().id == id)
    }
    #[must_use]
    pub fn get(&self, id: EntityID) -> Option<&T> {
        self.entities
            .iter()
            .find(|entity| entity.common().id == id)
    }
    pub fn get_mut(&mut self, id: EntityID) -> Option<&mut T> {
        self.entities
            .iter_mut()
            .find(|entity| entity.common().id == id)
    }
    #[must_use]
    pub fn contains(&self, id: EntityID) -> bool {
        self.position_of(id).is_some()
    }
    pub fn ids(&self) -> impl Iterator<Item = EntityID> + '_ {
        self.entities.iter().map(|entity| entity.common().id)
    }
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

/// Implemented by the four entity state structs, tying each to its kind and its collection.
pub trait EntityState: Clone + Send + Sync + 'static {
    const KIND: EntityKind;
    fn common(&self) -> &EntityCommon;
    fn common_mut(&mut self) -> &mut EntityCommon;
    fn collection(state: &super::CanvasState) -> &EntityCollection<Self>;
    fn collection_mut(state: &mut super::CanvasState) -> &mut EntityCollection<Self>;
    /// Build a fresh entity from creation options.
    fn create(id: EntityID, options: &EntityAddOptions) -> Self;
    /// The compositing fill, for masks.
    fn mask_fill(&self) -> Option<&Fill> {
        None
    }
    #[must_use]
    fn identifier(&self) -> EntityIdentifier {
        EntityIdentifier::new(self.common().id, Self::KIND)
    }
}

/// Shared by every kind: position and seed image from the options.
fn common_from_options(id: EntityID, options: &EntityAddOptions) -> EntityCommon {
    let mut common = EntityCommon::new(id);
    common.position = options.position;
    if let Some(image) = &options.seed_image {
        common.objects.push(CanvasObject::Image(ImageObject {
            id: ObjectID::default(),
            image: image.clone(),
        }));
    }
    common
}

macro_rules! entity_common_accessors {
    ($field:ident) => {
        fn common(&self) -> &EntityCommon {
            &self.common
        }
        fn common_mut(&mut self) -> &mut EntityCommon {
            &mut self.common
        }
        fn collection(state: &super::CanvasState) -> &EntityCollection<Self> {
            &state.$field
        }
        fn collection_mut(state: &mut super::CanvasState) -> &mut EntityCollection<Self> {
            &mut state.$field
        }
    };
}

impl EntityState for RasterLayerState {
    const KIND: EntityKind = EntityKind::RasterLayer;
    entity_common_accessors!(raster_layers);
    fn create(id: EntityID, options: &EntityAddOptions) -> Self {
        Self {
            common: common_from_options(id, options),
        }
    }
}
impl EntityState for ControlLayerState {
    const KIND: EntityKind = EntityKind::ControlLayer;
    entity_common_accessors!(control_layers);
    fn create(id: EntityID, options: &EntityAddOptions) -> Self {
        Self {
            common: common_from_options(id, options),
            with_transparency_effect: true,
            control: ControlAdapter::default(),
        }
    }
}
impl EntityState for RegionalGuidanceState {
    const KIND: EntityKind = EntityKind::RegionalGuidance;
    entity_common_accessors!(regions);
    fn create(id: EntityID, options: &EntityAddOptions) -> Self {
        let reference_images = if options.with_reference_image {
            vec![RegionalReferenceImage {
                id: ObjectID::default(),
                image: None,
                weight: 1.0,
            }]
        } else {
            Vec::new()
        };
        Self {
            common: common_from_options(id, options),
            fill: DEFAULT_REGION_FILL,
            positive_prompt: None,
            negative_prompt: None,
            reference_images,
        }
    }
    fn mask_fill(&self) -> Option<&Fill> {
        Some(&self.fill)
    }
}
impl EntityState for InpaintMaskState {
    const KIND: EntityKind = EntityKind::InpaintMask;
    entity_common_accessors!(inpaint_masks);
    fn create(id: EntityID, options: &EntityAddOptions) -> Self {
        Self {
            common: common_from_options(id, options),
            fill: DEFAULT_INPAINT_MASK_FILL,
        }
    }
    fn mask_fill(&self) -> Option<&Fill> {
        Some(&self.fill)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    #[test]
    fn kind_names_round_trip_through_strings() {
        use std::str::FromStr;
        for kind in <EntityKind as strum::IntoEnumIterator>::iter() {
            assert_eq!(EntityKind::from_str(kind.as_ref()), Ok(kind));
        }
        assert_eq!(EntityKind::InpaintMask.as_ref(), "inpaint_mask");
        assert!(EntityKind::from_str("reference_image").is_err());
    }
    #[test]
    fn mask_kinds() {
        assert!(EntityKind::InpaintMask.is_mask());
        assert!(EntityKind::RegionalGuidance.is_mask());
        assert!(!EntityKind::RasterLayer.is_mask());
        assert!(!EntityKind::ControlLayer.is_mask());
    }
    #[test]
    fn seed_image_becomes_only_object() {
        let image = ImageRef {
            image_name: "init.png".into(),
            width: 64,
            height: 64,
        };
        let options = EntityAddOptions {
            seed_image: Some(image.clone()),
            ..Default::default()
        };
        let layer = RasterLayerState::create(EntityID::default(), &options);
        match layer.common.objects.as_slice() {
            [CanvasObject::Image(object)] => assert_eq!(object.image, image),
            other => panic!("unexpected objects {other:?}"),
        }
    }
    #[test]
    fn reference_image_slot_only_for_regions() {
        let options = EntityAddOptions {
            with_reference_image: true,
            ..Default::default()
        };
        let region = RegionalGuidanceState::create(EntityID::default(), &options);
        assert_eq!(region.reference_images.len(), 1);
        assert!(region.reference_images[0].image.is_none());
        assert_eq!(region.mask_fill(), Some(&DEFAULT_REGION_FILL));
    }
    #[test]
    fn rejects_odd_point_lists() {
        let line = CanvasObject::BrushLine(BrushLine {
            id: ObjectID::default(),
            stroke_width: 4.0,
            points: vec![0.0, 0.0, 1.0],
            color: RgbaColor::BLACK,
            clip: None,
        });
        assert!(!line.is_valid());
    }
}
