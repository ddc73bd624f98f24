//! # IDs
//! Entities, documents and queue submissions all need identifiers that are unique within a run of the program.
//! This is implemented via the `StrataID<T>` type, which hands out unique IDs namespaced by the type T.
//! Order of IDs is not guaranteed.
//!
//! Unlike a purely process-local ID, these are serializable - entity states are saved and loaded, and their IDs with them.
//! Deserializing an ID *claims* it, bumping the namespace's counter past it so freshly allocated IDs can't collide
//! with loaded ones.

// Per-namespace counters. Holds the *next* ID to hand out.
static ID_SERVER: parking_lot::RwLock<
    std::collections::BTreeMap<std::any::TypeId, std::sync::atomic::AtomicU64>,
> = parking_lot::const_rwlock(std::collections::BTreeMap::new());

/// Run `f` on the counter for namespace `T`, creating it (starting at 1) if needed.
fn with_counter<T: std::any::Any, R>(f: impl FnOnce(&std::sync::atomic::AtomicU64) -> R) -> R {
    let ty = std::any::TypeId::of::<T>();
    let read = ID_SERVER.upgradable_read();
    if let Some(atomic) = read.get(&ty) {
        f(atomic)
    } else {
        // Only happens once per namespace.
        let mut write = parking_lot::RwLockUpgradableReadGuard::upgrade(read);
        let atomic = write
            .entry(ty)
            .or_insert_with(|| std::sync::atomic::AtomicU64::new(1));
        f(atomic)
    }
}

/// ID that is unique within this execution of the program, within the namespace `T`.
/// IDs with different namespaces may share a value but can't be compared.
pub struct StrataID<T: std::any::Any> {
    id: std::num::NonZeroU64,
    _phantom: std::marker::PhantomData<fn() -> T>,
}
impl<T: std::any::Any> Clone for StrataID<T> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<T: std::any::Any> Copy for StrataID<T> {}
impl<T: std::any::Any> PartialEq for StrataID<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}
impl<T: std::any::Any> Eq for StrataID<T> {}
impl<T: std::any::Any> PartialOrd for StrataID<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl<T: std::any::Any> Ord for StrataID<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.id.cmp(&other.id)
    }
}
impl<T: std::any::Any> std::hash::Hash for StrataID<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<T: std::any::Any> StrataID<T> {
    /// Largest raw ID accepted by [`Self::claim`]. Half the space stays free for allocation.
    pub const CLAIM_LIMIT: u64 = u64::MAX / 2;
    /// Get the raw numeric value of this ID.
    /// IDs from differing namespaces may share the same numeric ID!
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id.get()
    }
    /// Allocate many IDs at once, without re-taking the namespace lock for each.
    ///
    /// IDs are assigned eagerly - dropping the returned iterator early does *not* recycle the unused IDs.
    ///
    /// # Panics
    /// If the namespace runs out of IDs.
    pub fn many(count: usize) -> impl ExactSizeIterator<Item = Self> {
        // Usize is always <= 64bits
        let count_u64 = count as u64;
        let start_id = with_counter::<T, _>(|atomic| {
            atomic.fetch_add(count_u64, std::sync::atomic::Ordering::Relaxed)
        });
        assert!(
            start_id.checked_add(count_u64).is_some(),
            "{} ID overflow!",
            std::any::type_name::<T>()
        );

        (0..count).map(move |idx| Self {
            // Counter starts at one and only goes up.
            id: std::num::NonZeroU64::new(start_id + idx as u64).unwrap(),
            _phantom: std::marker::PhantomData,
        })
    }
    /// Take ownership of a raw ID from outside this process (ie. a loaded document), ensuring
    /// no future allocation in this namespace returns it.
    ///
    /// `None` if the ID is above [`Self::CLAIM_LIMIT`], as claiming it would exhaust the namespace.
    #[must_use]
    pub fn claim(raw: std::num::NonZeroU64) -> Option<Self> {
        if raw.get() > Self::CLAIM_LIMIT {
            return None;
        }
        with_counter::<T, _>(|atomic| {
            atomic.fetch_max(raw.get() + 1, std::sync::atomic::Ordering::Relaxed)
        });
        Some(Self {
            id: raw,
            _phantom: std::marker::PhantomData,
        })
    }
}
impl<T: std::any::Any> Default for StrataID<T> {
    fn default() -> Self {
        Self::many(1).next().unwrap()
    }
}
impl<T: std::any::Any> std::fmt::Display for StrataID<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // rsplit always yields at least one element, even for empty strings.
        write!(
            f,
            "{}#{}",
            std::any::type_name::<T>().rsplit("::").next().unwrap(),
            self.id
        )
    }
}
impl<T: std::any::Any> std::fmt::Debug for StrataID<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        <Self as std::fmt::Display>::fmt(self, f)
    }
}
impl<T: std::any::Any> serde::Serialize for StrataID<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_u64(self.id.get())
    }
}
impl<'de, T: std::any::Any> serde::Deserialize<'de> for StrataID<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = <std::num::NonZeroU64 as serde::Deserialize<'de>>::deserialize(deserializer)?;
        Self::claim(raw).ok_or_else(|| {
            <D::Error as serde::de::Error>::custom(format!(
                "{} ID {raw} is out of range",
                std::any::type_name::<T>()
            ))
        })
    }
}
