//! # Adapters
//!
//! Adapters are the live, rendering-side halves of entities. They hold whatever the renderer needs to draw an entity
//! (GPU resources, cached rasterizations...), and so are neither serializable nor part of the document.
//!
//! The renderer owns them, via [`CanvasAdapters`], one registry per entity kind. They are only ever paired with
//! their entity state by ID - see [`crate::api::CanvasStateApi::get_entity`].

use std::sync::Arc;

use crate::state::{
    entity::{EntityID, EntityIdentifier, EntityKind},
    CanvasState,
};

/// Anything paired with an entity.
pub trait EntityAdapter: Send + Sync {
    /// The entity this adapter draws. Must never change over the adapter's life.
    fn identifier(&self) -> EntityIdentifier;
    /// Called once, when the adapter is removed from its registry. Release resources here.
    fn destroy(&self) {}
}
/// Draws raster and control layers.
pub trait LayerAdapter: EntityAdapter {}
/// Draws inpaint masks and regional guidance, with its own compositing pass for the mask fill.
pub trait MaskAdapter: EntityAdapter {}

/// Builds adapters for entities that have just appeared.
pub trait AdapterFactory {
    fn layer_adapter(&mut self, identifier: EntityIdentifier) -> Arc<dyn LayerAdapter>;
    fn mask_adapter(&mut self, identifier: EntityIdentifier) -> Arc<dyn MaskAdapter>;
}

/// Adapters of one kind, by entity ID.
pub struct AdapterRegistry<A: ?Sized> {
    adapters: parking_lot::RwLock<hashbrown::HashMap<EntityID, Arc<A>>>,
}
impl<A: ?Sized> Default for AdapterRegistry<A> {
    fn default() -> Self {
        Self {
            adapters: parking_lot::RwLock::default(),
        }
    }
}
impl<A: ?Sized + EntityAdapter> AdapterRegistry<A> {
    #[must_use]
    pub fn get(&self, id: EntityID) -> Option<Arc<A>> {
        self.adapters.read().get(&id).cloned()
    }
    /// Register an adapter under its entity's ID. If one already existed, it is destroyed and replaced.
    pub fn insert(&self, adapter: Arc<A>) {
        let id = adapter.identifier().id;
        if let Some(old) = self.adapters.write().insert(id, adapter) {
            old.destroy();
        }
    }
    /// Remove and destroy the adapter for this ID. Returns whether one existed.
    pub fn remove(&self, id: EntityID) -> bool {
        // Don't hold the lock while destroying.
        let removed = self.adapters.write().remove(&id);
        removed.map(|adapter| adapter.destroy()).is_some()
    }
    #[must_use]
    pub fn contains(&self, id: EntityID) -> bool {
        self.adapters.read().contains_key(&id)
    }
    #[must_use]
    pub fn len(&self) -> usize {
        self.adapters.read().len()
    }
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.adapters.read().is_empty()
    }
    /// Drop every adapter whose ID isn't `wanted`, then create adapters for any `wanted` ID that lacks one.
    fn reconcile(
        &self,
        wanted: impl Iterator<Item = EntityID>,
        mut create: impl FnMut(EntityID) -> Arc<A>,
        report: &mut ReconcileReport,
    ) {
        let wanted: hashbrown::HashSet<EntityID> = wanted.collect();
        let stale: Vec<Arc<A>> = {
            let mut write = self.adapters.write();
            let stale_ids: Vec<EntityID> = write
                .keys()
                .filter(|id| !wanted.contains(*id))
                .copied()
                .collect();
            stale_ids
                .into_iter()
                .filter_map(|id| write.remove(&id))
                .collect()
        };
        for adapter in stale {
            report.destroyed.push(adapter.identifier());
            adapter.destroy();
        }
        for id in wanted {
            if !self.contains(id) {
                let adapter = create(id);
                report.created.push(adapter.identifier());
                self.insert(adapter);
            }
        }
    }
}

#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct ReconcileReport {
    pub created: Vec<EntityIdentifier>,
    pub destroyed: Vec<EntityIdentifier>,
}
impl ReconcileReport {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.destroyed.is_empty()
    }
}

/// The renderer's adapters for every entity currently mounted for drawing.
#[derive(Default)]
pub struct CanvasAdapters {
    pub raster_layers: AdapterRegistry<dyn LayerAdapter>,
    pub control_layers: AdapterRegistry<dyn LayerAdapter>,
    pub region_masks: AdapterRegistry<dyn MaskAdapter>,
    pub inpaint_masks: AdapterRegistry<dyn MaskAdapter>,
}
impl CanvasAdapters {
    /// Bring the registries in line with a document snapshot: entities that vanished lose their adapter,
    /// new entities get one from the factory.
    pub fn reconcile(
        &self,
        state: &CanvasState,
        factory: &mut impl AdapterFactory,
    ) -> ReconcileReport {
        let mut report = ReconcileReport::default();
        let of = |kind: EntityKind| move |id: EntityID| EntityIdentifier::new(id, kind);

        self.raster_layers.reconcile(
            state.raster_layers.ids(),
            |id| factory.layer_adapter(of(EntityKind::RasterLayer)(id)),
            &mut report,
        );
        self.control_layers.reconcile(
            state.control_layers.ids(),
            |id| factory.layer_adapter(of(EntityKind::ControlLayer)(id)),
            &mut report,
        );
        self.region_masks.reconcile(
            state.regions.ids(),
            |id| factory.mask_adapter(of(EntityKind::RegionalGuidance)(id)),
            &mut report,
        );
        self.inpaint_masks.reconcile(
            state.inpaint_masks.ids(),
            |id| factory.mask_adapter(of(EntityKind::InpaintMask)(id)),
            &mut report,
        );

        if !report.is_empty() {
            log::debug!(
                "Reconciled adapters: {} created, {} destroyed",
                report.created.len(),
                report.destroyed.len()
            );
        }
        report
    }
}
