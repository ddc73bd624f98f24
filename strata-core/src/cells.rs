//! # Cells
//!
//! Small pieces of ephemeral, observable state that are not part of the document - whether the mouse is down,
//! which modifier keys are held, the last reported progress, etc. None of it is saved or undoable, and it may be
//! written from any thread.

use std::sync::{Arc, Weak};

use crate::{
    geometry::{Coordinate, Rect},
    state::entity::EntityIdentifier,
};

type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Subscribers<T> {
    next_key: u64,
    /// Keys only ever increase, so iteration is subscription order.
    callbacks: std::collections::BTreeMap<u64, Callback<T>>,
}

/// A single observable value.
pub struct Atom<T> {
    value: parking_lot::RwLock<T>,
    subscribers: Arc<parking_lot::Mutex<Subscribers<T>>>,
}
impl<T: Default> Default for Atom<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}
impl<T> Atom<T> {
    pub fn new(value: T) -> Self {
        Self {
            value: value.into(),
            subscribers: Arc::new(
                Subscribers {
                    next_key: 0,
                    callbacks: std::collections::BTreeMap::new(),
                }
                .into(),
            ),
        }
    }
    pub fn read(&self) -> parking_lot::RwLockReadGuard<'_, T> {
        self.value.read()
    }
    /// Call `callback` with the new value after every change, until the returned [`Subscription`] is dropped.
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe(&self, callback: impl Fn(&T) + Send + Sync + 'static) -> Subscription
    where
        T: 'static,
    {
        let mut subscribers = self.subscribers.lock();
        let key = subscribers.next_key;
        subscribers.next_key += 1;
        subscribers.callbacks.insert(key, Arc::new(callback));

        let weak: Weak<parking_lot::Mutex<Subscribers<T>>> = Arc::downgrade(&self.subscribers);
        Subscription {
            unsubscribe: Some(Box::new(move || {
                if let Some(subscribers) = weak.upgrade() {
                    subscribers.lock().callbacks.remove(&key);
                }
            })),
        }
    }
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().callbacks.len()
    }
    /// Forget every subscriber. Outstanding [`Subscription`]s become inert.
    pub fn clear_subscribers(&self) {
        self.subscribers.lock().callbacks.clear();
    }
    fn notify(&self, value: &T) {
        // Collected first, so callbacks are free to subscribe or unsubscribe.
        let callbacks: smallvec::SmallVec<[Callback<T>; 4]> =
            self.subscribers.lock().callbacks.values().cloned().collect();
        for callback in callbacks {
            callback(value);
        }
    }
}
impl<T: Clone + PartialEq> Atom<T> {
    #[must_use]
    pub fn get(&self) -> T {
        self.value.read().clone()
    }
    /// Replace the value, notifying subscribers if it differs. Returns whether it changed.
    pub fn set(&self, value: T) -> bool {
        {
            let mut write = self.value.write();
            if *write == value {
                return false;
            }
            *write = value.clone();
        }
        self.notify(&value);
        true
    }
    /// Replace the value with a function of the old one, atomically.
    pub fn update(&self, f: impl FnOnce(&T) -> T) -> bool {
        let new = {
            let mut write = self.value.write();
            let new = f(&write);
            if *write == new {
                return false;
            }
            *write = new.clone();
            new
        };
        self.notify(&new);
        true
    }
}
impl<T: std::fmt::Debug> std::fmt::Debug for Atom<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Atom").field(&*self.value.read()).finish()
    }
}

/// Keeps an [`Atom`] callback alive. Unsubscribes on drop.
pub struct Subscription {
    unsubscribe: Option<Box<dyn FnOnce() + Send + Sync>>,
}
impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }
}

#[derive(Clone, PartialEq, Debug, Default)]
pub struct ProgressEvent {
    pub message: String,
    /// `None` for indeterminate progress.
    pub percentage: Option<f32>,
    pub image: Option<crate::state::entity::ImageRef>,
}

/// Pan and zoom of the stage.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct StageAttrs {
    pub view: Rect,
    pub scale: f32,
}
impl Default for StageAttrs {
    fn default() -> Self {
        Self {
            view: Rect::new(0.0, 0.0, 0.0, 0.0),
            scale: 1.0,
        }
    }
}

/// Per-canvas interaction state.
#[derive(Default, Debug)]
pub struct InteractionCells {
    pub is_drawing: Atom<bool>,
    pub is_mouse_down: Atom<bool>,
    pub last_added_point: Atom<Option<Coordinate>>,
    pub last_mouse_down_pos: Atom<Option<Coordinate>>,
    pub last_cursor_pos: Atom<Option<Coordinate>>,
    pub last_progress_event: Atom<Option<ProgressEvent>>,
    pub space_key: Atom<bool>,
    pub alt_key: Atom<bool>,
    pub ctrl_key: Atom<bool>,
    pub meta_key: Atom<bool>,
    pub shift_key: Atom<bool>,
    pub should_show_staged_image: Atom<bool>,
    pub stage_attrs: Atom<StageAttrs>,
    /// The entity currently under the transform gizmo, if any.
    pub transforming_entity: Atom<Option<EntityIdentifier>>,
    pub is_processing_transform: Atom<bool>,
}
impl InteractionCells {
    #[must_use]
    pub fn new() -> Self {
        Self {
            should_show_staged_image: Atom::new(true),
            ..Default::default()
        }
    }
    /// Teardown. Return every cell to its initial value and drop all subscribers.
    pub fn reset(&self) {
        self.clear_subscribers();
        let initial = Self::new();
        self.is_drawing.set(initial.is_drawing.get());
        self.is_mouse_down.set(initial.is_mouse_down.get());
        self.last_added_point.set(initial.last_added_point.get());
        self.last_mouse_down_pos.set(initial.last_mouse_down_pos.get());
        self.last_cursor_pos.set(initial.last_cursor_pos.get());
        self.last_progress_event.set(initial.last_progress_event.get());
        self.space_key.set(initial.space_key.get());
        self.alt_key.set(initial.alt_key.get());
        self.ctrl_key.set(initial.ctrl_key.get());
        self.meta_key.set(initial.meta_key.get());
        self.shift_key.set(initial.shift_key.get());
        self.should_show_staged_image
            .set(initial.should_show_staged_image.get());
        self.stage_attrs.set(initial.stage_attrs.get());
        self.transforming_entity.set(initial.transforming_entity.get());
        self.is_processing_transform
            .set(initial.is_processing_transform.get());
    }
    fn clear_subscribers(&self) {
        self.is_drawing.clear_subscribers();
        self.is_mouse_down.clear_subscribers();
        self.last_added_point.clear_subscribers();
        self.last_mouse_down_pos.clear_subscribers();
        self.last_cursor_pos.clear_subscribers();
        self.last_progress_event.clear_subscribers();
        self.space_key.clear_subscribers();
        self.alt_key.clear_subscribers();
        self.ctrl_key.clear_subscribers();
        self.meta_key.clear_subscribers();
        self.shift_key.clear_subscribers();
        self.should_show_staged_image.clear_subscribers();
        self.stage_attrs.clear_subscribers();
        self.transforming_entity.clear_subscribers();
        self.is_processing_transform.clear_subscribers();
    }
}
