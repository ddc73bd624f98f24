//! # Store
//!
//! The store is the ground truth for the document. It holds the latest [`CanvasState`] snapshot, and
//! replaces it whenever a [`Command`] is dispatched. Snapshots are immutable and shared - a reader holding one
//! keeps seeing exactly that point in time, while new readers see the latest.
//!
//! Dispatches are serialized and applied strictly in call order. After every dispatch that changed something,
//! a [`StoreMessage`] is broadcast to any change listeners.

use std::sync::Arc;

use crate::{
    commands::{Command, CommandConsumer, CommandError},
    state::CanvasState,
};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StoreMessage {
    /// A command was applied, producing this revision.
    Changed { revision: u64 },
}

struct StoreInner {
    snapshot: Arc<CanvasState>,
    /// Bumped on every applied command.
    revision: u64,
}

pub struct CanvasStore {
    inner: parking_lot::RwLock<StoreInner>,
    on_change: parking_lot::Mutex<bus::Bus<StoreMessage>>,
}
impl Default for CanvasStore {
    fn default() -> Self {
        Self::new(CanvasState::default())
    }
}
impl CanvasStore {
    /// Listeners further behind than this start missing notifications.
    const BUS_CAPACITY: usize = 256;
    #[must_use]
    pub fn new(initial: CanvasState) -> Self {
        Self {
            inner: StoreInner {
                snapshot: Arc::new(initial),
                revision: 0,
            }
            .into(),
            on_change: bus::Bus::new(Self::BUS_CAPACITY).into(),
        }
    }
    /// The latest snapshot.
    #[must_use]
    pub fn get_state(&self) -> Arc<CanvasState> {
        self.inner.read().snapshot.clone()
    }
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.inner.read().revision
    }
    /// Apply a command. Rejected commands are logged and otherwise ignored.
    pub fn dispatch(&self, command: impl Into<Command>) {
        let command = command.into();
        match self.try_dispatch(&command) {
            Ok(_) | Err(CommandError::NoOp) => (),
            Err(e) => log::warn!("Rejected {command:?}: {e}"),
        }
    }
    /// Apply a command, returning the new revision or why the command was rejected.
    /// On error, the state is unchanged and no listeners are notified.
    pub fn try_dispatch(&self, command: &Command) -> Result<u64, CommandError> {
        log::trace!("Dispatching {command:?}");
        let mut inner = self.inner.write();
        // Copy-on-write. Only clones if a reader is still holding the current snapshot.
        // The reducer leaves the state untouched on error, so a failed apply needs no rollback.
        Arc::make_mut(&mut inner.snapshot).apply(command)?;
        inner.revision += 1;
        let revision = inner.revision;

        // Still under the state lock, so notifications go out in dispatch order.
        if self
            .on_change
            .lock()
            .try_broadcast(StoreMessage::Changed { revision })
            .is_err()
        {
            log::warn!("Store change bus full, a listener is lagging. Dropped revision {revision}");
        }
        Ok(revision)
    }
    /// Get a reciever of change notifications.
    /// Does not recieve old messages, use [`Self::get_state`] to get up-to-date!
    pub fn change_listener(&self) -> bus::BusReader<StoreMessage> {
        self.on_change.lock().add_rx()
    }
}

/// A read-only view of one part of a snapshot, without cloning it out.
pub struct Projection<T: ?Sized + 'static> {
    snapshot: Arc<CanvasState>,
    project: fn(&CanvasState) -> &T,
}
impl<T: ?Sized + 'static> Projection<T> {
    #[must_use]
    pub fn new(snapshot: Arc<CanvasState>, project: fn(&CanvasState) -> &T) -> Self {
        Self { snapshot, project }
    }
    /// The whole snapshot this view was taken from.
    #[must_use]
    pub fn snapshot(&self) -> &Arc<CanvasState> {
        &self.snapshot
    }
}
impl<T: ?Sized + 'static> std::ops::Deref for Projection<T> {
    type Target = T;
    fn deref(&self) -> &T {
        (self.project)(&self.snapshot)
    }
}
impl<T: ?Sized + std::fmt::Debug + 'static> std::fmt::Debug for Projection<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        <T as std::fmt::Debug>::fmt(self, f)
    }
}
