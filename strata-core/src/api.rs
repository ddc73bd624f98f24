//! # Canvas state API
//!
//! The single front door the canvas tools, renderer, and UI use to read and change the document. Setters forward
//! straight to the [store](CanvasStore) as commands, getters read the latest snapshot, and entities are paired with
//! their live [adapters](crate::adapters) on request.
//!
//! It also owns a handful of derived [cells](crate::cells::Atom), refreshed from the store, for observers which
//! would rather be called back than poll.

use std::sync::Arc;

use crate::{
    adapters::{CanvasAdapters, EntityAdapter, LayerAdapter, MaskAdapter},
    cells::{Atom, InteractionCells},
    color::{Fill, RgbaColor},
    commands::CanvasCommand,
    geometry::{Coordinate, Rect},
    policy::EntityTypeEnablement,
    queue::{BatchConfig, QueueService, ENQUEUE_BATCH_CACHE_KEY},
    state::{
        entity::{
            BrushLine, ControlLayerState, EntityAddOptions, EntityCollection, EntityCommon,
            EntityID, EntityIdentifier, EntityKind, EntityState, EraserLine, ImageObject,
            InpaintMaskState, RasterLayerState, RectShape, RegionalGuidanceState,
        },
        BboxState, CanvasSettings, CanvasState, SessionState, Tool, ToolState,
    },
    store::{CanvasStore, Projection, StoreMessage},
};

/// An entity's state, paired with the adapter drawing it.
#[derive(Clone)]
pub enum EntityStateAndAdapter {
    RasterLayer {
        state: RasterLayerState,
        adapter: Arc<dyn LayerAdapter>,
    },
    ControlLayer {
        state: ControlLayerState,
        adapter: Arc<dyn LayerAdapter>,
    },
    RegionalGuidance {
        state: RegionalGuidanceState,
        adapter: Arc<dyn MaskAdapter>,
    },
    InpaintMask {
        state: InpaintMaskState,
        adapter: Arc<dyn MaskAdapter>,
    },
}
impl EntityStateAndAdapter {
    #[must_use]
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::RasterLayer { .. } => EntityKind::RasterLayer,
            Self::ControlLayer { .. } => EntityKind::ControlLayer,
            Self::RegionalGuidance { .. } => EntityKind::RegionalGuidance,
            Self::InpaintMask { .. } => EntityKind::InpaintMask,
        }
    }
    #[must_use]
    pub fn identifier(&self) -> EntityIdentifier {
        EntityIdentifier::new(self.common().id, self.kind())
    }
    #[must_use]
    pub fn common(&self) -> &EntityCommon {
        match self {
            Self::RasterLayer { state, .. } => state.common(),
            Self::ControlLayer { state, .. } => state.common(),
            Self::RegionalGuidance { state, .. } => state.common(),
            Self::InpaintMask { state, .. } => state.common(),
        }
    }
    /// The compositing fill, for mask kinds.
    #[must_use]
    pub fn mask_fill(&self) -> Option<&Fill> {
        match self {
            Self::RasterLayer { .. } | Self::ControlLayer { .. } => None,
            Self::RegionalGuidance { state, .. } => state.mask_fill(),
            Self::InpaintMask { state, .. } => state.mask_fill(),
        }
    }
}
/// Equal when the states are equal and both sides hold the very same adapter.
impl PartialEq for EntityStateAndAdapter {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                Self::RasterLayer { state, adapter },
                Self::RasterLayer {
                    state: other_state,
                    adapter: other_adapter,
                },
            ) => state == other_state && Arc::ptr_eq(adapter, other_adapter),
            (
                Self::ControlLayer { state, adapter },
                Self::ControlLayer {
                    state: other_state,
                    adapter: other_adapter,
                },
            ) => state == other_state && Arc::ptr_eq(adapter, other_adapter),
            (
                Self::RegionalGuidance { state, adapter },
                Self::RegionalGuidance {
                    state: other_state,
                    adapter: other_adapter,
                },
            ) => state == other_state && Arc::ptr_eq(adapter, other_adapter),
            (
                Self::InpaintMask { state, adapter },
                Self::InpaintMask {
                    state: other_state,
                    adapter: other_adapter,
                },
            ) => state == other_state && Arc::ptr_eq(adapter, other_adapter),
            _ => false,
        }
    }
}
impl std::fmt::Debug for EntityStateAndAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityStateAndAdapter")
            .field("identifier", &self.identifier())
            .finish_non_exhaustive()
    }
}

/// Pair a state with the adapter under the same ID, provided the adapter agrees on who it's drawing.
fn join<T: EntityState, A: ?Sized + EntityAdapter>(
    identifier: EntityIdentifier,
    state: Option<&T>,
    adapter: Option<Arc<A>>,
) -> Option<(T, Arc<A>)> {
    let (state, adapter) = (state?, adapter?);
    if adapter.identifier() != identifier || state.identifier() != identifier {
        log::warn!(
            "Adapter for {identifier} reports {}, refusing to pair",
            adapter.identifier()
        );
        return None;
    }
    Some((state.clone(), adapter))
}

pub struct CanvasStateApi {
    store: Arc<CanvasStore>,
    adapters: Arc<CanvasAdapters>,
    queue: Arc<dyn QueueService>,
    /// Pointer, keyboard, and transform state, written by input handlers.
    pub interaction: Arc<InteractionCells>,
    pub tool_state: Atom<ToolState>,
    /// See [`Self::get_current_fill`].
    pub current_fill: Atom<RgbaColor>,
    pub selected_entity_identifier: Atom<Option<EntityIdentifier>>,
    /// See [`Self::get_selected_entity`].
    pub selected_entity: Atom<Option<EntityStateAndAdapter>>,
    /// Sampled by the color picker tool.
    pub color_under_cursor: Atom<Option<RgbaColor>>,
}

impl CanvasStateApi {
    #[must_use]
    pub fn new(
        store: Arc<CanvasStore>,
        adapters: Arc<CanvasAdapters>,
        queue: Arc<dyn QueueService>,
        interaction: Arc<InteractionCells>,
    ) -> Self {
        let state = store.get_state();
        let this = Self {
            tool_state: Atom::new(state.tool),
            current_fill: Atom::new(state.tool.fill),
            selected_entity_identifier: Atom::new(state.selected_entity_identifier),
            selected_entity: Atom::new(None),
            color_under_cursor: Atom::new(None),
            store,
            adapters,
            queue,
            interaction,
        };
        this.sync_derived_cells();
        this
    }
    #[must_use]
    pub fn store(&self) -> &Arc<CanvasStore> {
        &self.store
    }
    #[must_use]
    pub fn adapters(&self) -> &Arc<CanvasAdapters> {
        &self.adapters
    }

    pub fn reset_entity(&self, identifier: EntityIdentifier) {
        self.store.dispatch(CanvasCommand::EntityReset(identifier));
    }
    /// Move the entity to an absolute canvas position.
    pub fn set_entity_position(&self, identifier: EntityIdentifier, position: Coordinate) {
        self.store.dispatch(CanvasCommand::EntityMoved {
            identifier,
            position,
        });
    }
    pub fn add_brush_line(&self, identifier: EntityIdentifier, line: BrushLine) {
        self.store
            .dispatch(CanvasCommand::EntityBrushLineAdded { identifier, line });
    }
    pub fn add_eraser_line(&self, identifier: EntityIdentifier, line: EraserLine) {
        self.store
            .dispatch(CanvasCommand::EntityEraserLineAdded { identifier, line });
    }
    pub fn add_rect(&self, identifier: EntityIdentifier, rect: RectShape) {
        self.store
            .dispatch(CanvasCommand::EntityRectAdded { identifier, rect });
    }
    pub fn rasterize_entity(
        &self,
        identifier: EntityIdentifier,
        image: ImageObject,
        position: Coordinate,
        replace_objects: bool,
    ) {
        self.store.dispatch(CanvasCommand::EntityRasterized {
            identifier,
            image,
            position,
            replace_objects,
        });
    }
    pub fn set_selected_entity(&self, identifier: EntityIdentifier) {
        self.store.dispatch(CanvasCommand::EntitySelected(identifier));
    }
    pub fn set_generation_bbox(&self, rect: Rect) {
        self.store.dispatch(CanvasCommand::BboxChanged(rect));
    }
    pub fn set_brush_width(&self, width: f32) {
        self.store.dispatch(CanvasCommand::BrushWidthChanged(width));
    }
    pub fn set_eraser_width(&self, width: f32) {
        self.store.dispatch(CanvasCommand::EraserWidthChanged(width));
    }
    pub fn set_tool(&self, tool: Tool) {
        self.store.dispatch(CanvasCommand::ToolChanged(tool));
    }
    pub fn set_tool_buffer(&self, tool: Option<Tool>) {
        self.store.dispatch(CanvasCommand::ToolBufferChanged(tool));
    }
    pub fn set_fill(&self, fill: RgbaColor) {
        self.store.dispatch(CanvasCommand::FillChanged(fill));
    }
    /// Create an entity of the given kind under a fresh ID.
    pub fn add_entity(&self, kind: EntityKind, options: EntityAddOptions) -> EntityIdentifier {
        let identifier = EntityIdentifier::fresh(kind);
        self.store.dispatch(CanvasCommand::EntityAdded {
            identifier,
            options,
        });
        identifier
    }
    /// Create a selected entity seeded with the current initial image, placed at the generation box.
    /// With no initial image, the entity starts empty.
    pub fn add_entity_from_initial_image(&self, kind: EntityKind) -> EntityIdentifier {
        let state = self.get_state();
        let bbox = state.bbox.rect;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let fallback_size = [(bbox.width as u32).max(1), (bbox.height as u32).max(1)];
        let options = EntityAddOptions {
            is_selected: true,
            seed_image: state
                .params
                .initial_image
                .as_ref()
                .map(|image| image.to_image_ref(fallback_size)),
            position: bbox.origin(),
            with_reference_image: false,
        };
        self.add_entity(kind, options)
    }
    /// Submit a batch for generation. Repeated submissions share one cache key, so the queue's record of
    /// "the canvas batch" is always the most recent one.
    pub fn enqueue_batch(&self, batch: BatchConfig) {
        self.queue.enqueue_batch(batch, ENQUEUE_BATCH_CACHE_KEY);
    }

    #[must_use]
    pub fn get_state(&self) -> Arc<CanvasState> {
        self.store.get_state()
    }
    #[must_use]
    pub fn get_bbox(&self) -> Projection<BboxState> {
        Projection::new(self.get_state(), |state| &state.bbox)
    }
    #[must_use]
    pub fn get_tool_state(&self) -> Projection<ToolState> {
        Projection::new(self.get_state(), |state| &state.tool)
    }
    #[must_use]
    pub fn get_settings(&self) -> Projection<CanvasSettings> {
        Projection::new(self.get_state(), |state| &state.settings)
    }
    #[must_use]
    pub fn get_regions_state(&self) -> Projection<EntityCollection<RegionalGuidanceState>> {
        Projection::new(self.get_state(), |state| &state.regions)
    }
    #[must_use]
    pub fn get_raster_layers_state(&self) -> Projection<EntityCollection<RasterLayerState>> {
        Projection::new(self.get_state(), |state| &state.raster_layers)
    }
    #[must_use]
    pub fn get_control_layers_state(&self) -> Projection<EntityCollection<ControlLayerState>> {
        Projection::new(self.get_state(), |state| &state.control_layers)
    }
    #[must_use]
    pub fn get_inpaint_masks_state(&self) -> Projection<EntityCollection<InpaintMaskState>> {
        Projection::new(self.get_state(), |state| &state.inpaint_masks)
    }
    #[must_use]
    pub fn get_session(&self) -> Projection<SessionState> {
        Projection::new(self.get_state(), |state| &state.session)
    }
    #[must_use]
    pub fn get_is_selected(&self, id: EntityID) -> bool {
        self.get_state()
            .selected_entity_identifier
            .is_some_and(|selected| selected.id == id)
    }

    /// Pair an entity's state with its adapter. `None` unless both exist and agree.
    #[must_use]
    pub fn get_entity(&self, identifier: EntityIdentifier) -> Option<EntityStateAndAdapter> {
        self.entity_in(&self.get_state(), identifier)
    }
    fn entity_in(
        &self,
        state: &CanvasState,
        identifier: EntityIdentifier,
    ) -> Option<EntityStateAndAdapter> {
        let id = identifier.id;
        let adapters = &self.adapters;
        match identifier.kind {
            EntityKind::RasterLayer => join(
                identifier,
                state.raster_layers.get(id),
                adapters.raster_layers.get(id),
            )
            .map(|(state, adapter)| EntityStateAndAdapter::RasterLayer { state, adapter }),
            EntityKind::ControlLayer => join(
                identifier,
                state.control_layers.get(id),
                adapters.control_layers.get(id),
            )
            .map(|(state, adapter)| EntityStateAndAdapter::ControlLayer { state, adapter }),
            EntityKind::RegionalGuidance => join(
                identifier,
                state.regions.get(id),
                adapters.region_masks.get(id),
            )
            .map(|(state, adapter)| EntityStateAndAdapter::RegionalGuidance { state, adapter }),
            EntityKind::InpaintMask => join(
                identifier,
                state.inpaint_masks.get(id),
                adapters.inpaint_masks.get(id),
            )
            .map(|(state, adapter)| EntityStateAndAdapter::InpaintMask { state, adapter }),
        }
    }
    #[must_use]
    pub fn get_selected_entity(&self) -> Option<EntityStateAndAdapter> {
        let state = self.get_state();
        self.entity_in(&state, state.selected_entity_identifier?)
    }
    /// The color new objects are drawn with.
    ///
    /// Masks are drawn in black, their visible color comes from compositing their fill over it.
    #[must_use]
    pub fn get_current_fill(&self) -> RgbaColor {
        let state = self.get_state();
        match state
            .selected_entity_identifier
            .and_then(|selected| self.entity_in(&state, selected))
        {
            Some(entity) if entity.kind().is_mask() => RgbaColor::BLACK,
            _ => state.tool.fill,
        }
    }
    /// The color of the brush cursor. For masks, their fill at full opacity.
    #[must_use]
    pub fn get_brush_preview_fill(&self) -> RgbaColor {
        let state = self.get_state();
        state
            .selected_entity_identifier
            .and_then(|selected| self.entity_in(&state, selected))
            .and_then(|entity| entity.mask_fill().map(|fill| fill.color.opaque()))
            .unwrap_or(state.tool.fill)
    }
    /// Whether the canvas is in the middle of something that shouldn't be interrupted by new entities.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.get_state().session.is_staging
            || self.interaction.transforming_entity.get().is_some()
            || self.interaction.is_processing_transform.get()
    }
    #[must_use]
    pub fn entity_type_enablement(&self) -> EntityTypeEnablement {
        let state = self.get_state();
        EntityTypeEnablement::for_model(state.params.model.as_ref().map(|model| model.base_model))
    }

    /// Bring the derived cells up to date with the store.
    pub fn sync_derived_cells(&self) {
        let state = self.get_state();
        self.tool_state.set(state.tool);
        self.selected_entity_identifier
            .set(state.selected_entity_identifier);
        self.selected_entity.set(self.get_selected_entity());
        self.current_fill.set(self.get_current_fill());
    }
    /// Drain pending store notifications, syncing the derived cells if there were any.
    /// Returns how many were drained.
    pub fn pump(&self, listener: &mut bus::BusReader<StoreMessage>) -> usize {
        let drained = std::iter::from_fn(|| listener.try_recv().ok()).count();
        if drained > 0 {
            self.sync_derived_cells();
        }
        drained
    }
}

#[cfg(test)]
mod test {
    use super::{CanvasStateApi, EntityStateAndAdapter};
    use crate::{
        adapters::{
            test_support::{NullAdapter, NullFactory},
            CanvasAdapters, EntityAdapter, LayerAdapter,
        },
        cells::InteractionCells,
        color::RgbaColor,
        commands::{Command, CommandConsumer, GenerationCommand, SessionCommand},
        queue::{Batch, BatchConfig, Graph, InMemoryQueue, ENQUEUE_BATCH_CACHE_KEY},
        state::{
            entity::{
                EntityAddOptions, EntityID, EntityIdentifier, EntityKind, EntityState,
                ImageRef, InpaintMaskState,
            },
            params::{BaseModel, InitialImage, ModelField, ModelFormat},
            CanvasState, Tool,
        },
        store::CanvasStore,
    };
    use std::sync::Arc;

    fn api_over(state: CanvasState) -> (CanvasStateApi, Arc<InMemoryQueue>) {
        let queue = Arc::new(InMemoryQueue::new());
        let api = CanvasStateApi::new(
            Arc::new(CanvasStore::new(state)),
            Arc::new(CanvasAdapters::default()),
            queue.clone(),
            Arc::new(InteractionCells::new()),
        );
        (api, queue)
    }
    fn api() -> CanvasStateApi {
        api_over(CanvasState::default()).0
    }
    /// Give every entity an adapter, as the renderer would.
    fn mount(api: &CanvasStateApi) {
        api.adapters()
            .reconcile(&api.get_state(), &mut NullFactory::default());
    }

    #[test]
    fn entity_requires_both_halves() {
        let api = api();
        let layer = api.add_entity(EntityKind::RasterLayer, EntityAddOptions::default());
        // State, but no adapter yet.
        assert!(api.get_entity(layer).is_none());
        mount(&api);
        let entity = api.get_entity(layer).unwrap();
        assert_eq!(entity.kind(), EntityKind::RasterLayer);
        assert_eq!(entity.identifier(), layer);

        // Adapter, but the state is gone.
        let adapter = api.adapters().raster_layers.get(layer.id).unwrap();
        api.store()
            .dispatch(crate::commands::CanvasCommand::EntityDeleted(layer));
        assert_eq!(adapter.identifier(), layer);
        assert!(api.get_entity(layer).is_none());
    }
    #[test]
    fn wrong_kind_never_pairs() {
        let api = api();
        let layer = api.add_entity(EntityKind::RasterLayer, EntityAddOptions::default());
        mount(&api);
        // Same ID, asked for as a different kind.
        let wrong = EntityIdentifier::new(layer.id, EntityKind::ControlLayer);
        assert!(api.get_entity(wrong).is_none());
    }
    #[test]
    fn adapter_disagreeing_on_kind_is_refused() {
        let _ = env_logger::builder().is_test(true).try_init();
        let api = api();
        let layer = api.add_entity(EntityKind::RasterLayer, EntityAddOptions::default());
        let impostor = NullAdapter::new(EntityIdentifier::new(layer.id, EntityKind::ControlLayer));
        api.adapters()
            .raster_layers
            .insert(impostor as Arc<dyn LayerAdapter>);
        assert!(api.adapters().raster_layers.contains(layer.id));
        assert!(api.get_entity(layer).is_none());
    }
    #[test]
    fn every_kind_pairs_with_matching_kind() {
        use strum::IntoEnumIterator;
        let api = api();
        let added: Vec<_> = EntityKind::iter()
            .map(|kind| api.add_entity(kind, EntityAddOptions::default()))
            .collect();
        mount(&api);
        for identifier in added {
            let entity = api.get_entity(identifier).unwrap();
            assert_eq!(entity.kind(), identifier.kind);
            assert_eq!(entity.mask_fill().is_some(), identifier.kind.is_mask());
        }
    }
    #[test]
    fn selection() {
        let api = api();
        // Nothing selected yet.
        assert!(!api.get_is_selected(EntityID::default()));
        assert!(api.get_selected_entity().is_none());
        let region = api.add_entity(
            EntityKind::RegionalGuidance,
            EntityAddOptions {
                is_selected: true,
                ..Default::default()
            },
        );
        let other = api.add_entity(EntityKind::RasterLayer, EntityAddOptions::default());
        assert!(api.get_is_selected(region.id));
        assert!(!api.get_is_selected(other.id));
        assert!(!api.get_is_selected(EntityID::default()));

        api.set_selected_entity(other);
        assert!(api.get_is_selected(other.id));
        // Not mounted, so nothing to pair with.
        assert!(api.get_selected_entity().is_none());
        mount(&api);
        assert_eq!(
            api.get_selected_entity().map(|entity| entity.identifier()),
            Some(other)
        );
    }
    #[test]
    fn mask_fill_scenario() {
        // An inpaint mask with a translucent black fill, selected, over a translucent tool color.
        let mut state = CanvasState::default();
        let m1 = EntityIdentifier::fresh(EntityKind::InpaintMask);
        let mut mask = InpaintMaskState::create(m1.id, &EntityAddOptions::default());
        mask.fill.color = RgbaColor::new(0, 0, 0, 0.8).unwrap();
        state.inpaint_masks.entities.push(mask);
        state.selected_entity_identifier = Some(m1);
        state.tool.fill = RgbaColor::new(10, 20, 30, 0.5).unwrap();

        let (api, _) = api_over(state);
        mount(&api);
        assert_eq!(api.get_current_fill(), RgbaColor::BLACK);
        assert_eq!(api.get_brush_preview_fill(), RgbaColor::rgb(0, 0, 0));
        assert_eq!(api.get_brush_preview_fill().alpha(), 1.0);
    }
    #[test]
    fn layers_use_tool_fill() {
        let api = api();
        let fill = RgbaColor::new(10, 20, 30, 0.5).unwrap();
        api.set_fill(fill);
        // No selection.
        assert_eq!(api.get_current_fill(), fill);
        assert_eq!(api.get_brush_preview_fill(), fill);

        api.add_entity(
            EntityKind::ControlLayer,
            EntityAddOptions {
                is_selected: true,
                ..Default::default()
            },
        );
        mount(&api);
        assert_eq!(api.get_current_fill(), fill);
        assert_eq!(api.get_brush_preview_fill(), fill);
    }
    #[test]
    fn region_preview_uses_its_fill() {
        let api = api();
        let region = api.add_entity(
            EntityKind::RegionalGuidance,
            EntityAddOptions {
                is_selected: true,
                ..Default::default()
            },
        );
        mount(&api);
        let expected = api.get_regions_state().get(region.id).unwrap().fill.color;
        assert_eq!(api.get_brush_preview_fill(), expected.opaque());
        assert_eq!(api.get_current_fill(), RgbaColor::BLACK);
    }
    #[test]
    fn projections_read_latest_at_call_time() {
        let api = api();
        let before = api.get_tool_state();
        api.set_tool(Tool::Bbox);
        api.set_brush_width(7.0);
        assert_eq!(before.selected, Tool::Brush);
        let after = api.get_tool_state();
        assert_eq!(after.selected, Tool::Bbox);
        assert_eq!(after.brush.width, 7.0);
        assert!(api.get_raster_layers_state().is_empty());
        assert!(!api.get_session().is_staging);
        assert_eq!(api.get_bbox().optimal_dimension, 512);
        assert!(api.get_settings().show_hud);
    }
    #[test]
    fn busy_while_staging_or_transforming() {
        let api = api();
        assert!(!api.is_busy());
        api.store().dispatch(SessionCommand::StagingStarted);
        assert!(api.is_busy());
        api.store()
            .dispatch(SessionCommand::StagingFinished { accept_as: None });
        assert!(!api.is_busy());

        api.interaction.is_processing_transform.set(true);
        assert!(api.is_busy());
        api.interaction.is_processing_transform.set(false);
        api.interaction
            .transforming_entity
            .set(Some(EntityIdentifier::fresh(EntityKind::RasterLayer)));
        assert!(api.is_busy());
    }
    #[test]
    fn enablement_follows_model() {
        let api = api();
        assert!(api.entity_type_enablement().regional_guidance);
        api.store()
            .dispatch(GenerationCommand::ModelSelected(ModelField {
                model_name: "flux-dev".into(),
                base_model: BaseModel::Flux,
                format: ModelFormat::Main,
            }));
        assert!(!api.entity_type_enablement().regional_guidance);
        assert!(api.entity_type_enablement().control_layer);
    }
    #[test]
    fn enqueue_uses_fixed_cache_key() {
        let (api, queue) = api_over(CanvasState::default());
        let config = BatchConfig {
            batch: Batch {
                graph: Graph::default(),
                runs: 1,
                origin: "canvas".into(),
                destination: "canvas".into(),
            },
            prepend: false,
        };
        api.enqueue_batch(config.clone());
        api.enqueue_batch(config.clone());
        let latest = queue.latest(ENQUEUE_BATCH_CACHE_KEY).unwrap();
        assert_eq!(latest.config, config);
        assert_eq!(queue.pending_len(), 2);
    }
    #[test]
    fn initial_image_seeds_new_layer() {
        let api = api();
        api.store()
            .dispatch(GenerationCommand::InitialImageSelected(Some(
                InitialImage::Name("init.png".into()),
            )));
        let layer = api.add_entity_from_initial_image(EntityKind::ControlLayer);
        mount(&api);
        let Some(EntityStateAndAdapter::ControlLayer { state, .. }) = api.get_entity(layer) else {
            panic!("control layer not paired");
        };
        assert!(api.get_is_selected(layer.id));
        match state.common.objects.as_slice() {
            [crate::state::entity::CanvasObject::Image(object)] => assert_eq!(
                object.image,
                ImageRef {
                    image_name: "init.png".into(),
                    width: 512,
                    height: 512,
                }
            ),
            other => panic!("unexpected objects {other:?}"),
        }
    }
    #[test]
    fn pump_syncs_derived_cells() {
        let api = api();
        let mut listener = api.store().change_listener();
        let mask = api.add_entity(
            EntityKind::InpaintMask,
            EntityAddOptions {
                is_selected: true,
                ..Default::default()
            },
        );
        mount(&api);
        api.set_tool(Tool::Eraser);
        // Cells lag until pumped.
        assert_eq!(api.tool_state.get().selected, Tool::Brush);
        assert_eq!(api.pump(&mut listener), 2);
        assert_eq!(api.tool_state.get().selected, Tool::Eraser);
        assert_eq!(api.selected_entity_identifier.get(), Some(mask));
        assert_eq!(api.selected_entity.get(), api.get_selected_entity());
        assert_eq!(
            api.selected_entity.get().map(|entity| entity.identifier()),
            Some(mask)
        );
        assert_eq!(api.current_fill.get(), RgbaColor::BLACK);
        assert_eq!(api.pump(&mut listener), 0);
    }
    #[test]
    fn selected_entity_cell_tracks_adapter() {
        let api = api();
        let mut listener = api.store().change_listener();
        let layer = api.add_entity(
            EntityKind::RasterLayer,
            EntityAddOptions {
                is_selected: true,
                ..Default::default()
            },
        );
        api.pump(&mut listener);
        // Selected, but nothing to pair with until mounted.
        assert_eq!(api.selected_entity.get(), None);
        mount(&api);
        api.sync_derived_cells();
        let paired = api.selected_entity.get().unwrap();
        assert_eq!(paired.identifier(), layer);

        // Same state, different adapter instance.
        let replacement = NullAdapter::new(layer);
        api.adapters()
            .raster_layers
            .insert(replacement as Arc<dyn LayerAdapter>);
        let repaired = api.get_selected_entity().unwrap();
        assert_ne!(paired, repaired);
        assert!(api.selected_entity.set(Some(repaired.clone())));
        assert_eq!(api.selected_entity.get(), Some(repaired));
    }
    #[test]
    fn tiny_bbox_still_seeds_entity() {
        let _ = env_logger::builder().is_test(true).try_init();
        let api = api();
        api.set_generation_bbox(crate::geometry::Rect::new(4.0, 4.0, 0.5, 0.5));
        api.store()
            .dispatch(GenerationCommand::InitialImageSelected(Some(
                InitialImage::Name("init.png".into()),
            )));
        let layer = api.add_entity_from_initial_image(EntityKind::RasterLayer);
        assert!(api.get_state().contains_entity(layer));
        let common = api.get_state().entity_common(layer).cloned().unwrap();
        match common.objects.as_slice() {
            [crate::state::entity::CanvasObject::Image(object)] => {
                assert_eq!((object.image.width, object.image.height), (1, 1));
            }
            other => panic!("unexpected objects {other:?}"),
        }
    }
    #[test]
    fn rejected_setters_are_silent() {
        let _ = env_logger::builder().is_test(true).try_init();
        let api = api();
        let mut state = (*api.get_state()).clone();
        api.set_brush_width(-3.0);
        api.reset_entity(EntityIdentifier::fresh(EntityKind::InpaintMask));
        assert_eq!(*api.get_state(), state);
        assert_eq!(api.store().revision(), 0);
        // Directly applying the same command agrees.
        assert!(state
            .apply(&Command::from(crate::commands::CanvasCommand::BrushWidthChanged(-3.0)))
            .is_err());
    }
}
