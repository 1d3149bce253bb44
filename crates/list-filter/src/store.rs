//! The shared source collection.
//!
//! An [`ItemStore`] holds the current items as one immutable snapshot. It is
//! only ever replaced wholesale; every replacement emits
//! [`items_changed`](ItemStore::items_changed), even when the new collection
//! happens to equal the old one.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use list_filter_core::logging::targets;
use list_filter_core::{Property, Signal};

struct StoreInner<T> {
    items: Property<Arc<Vec<T>>>,
    items_changed: Signal<Arc<Vec<T>>>,
    revision: AtomicU64,
}

/// A cloneable handle to a source collection.
///
/// Clones share the same collection and the same change signal.
pub struct ItemStore<T> {
    inner: Arc<StoreInner<T>>,
}

impl<T: Send + Sync + 'static> ItemStore<T> {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::with_items(Vec::new())
    }

    /// Create a store holding `items`.
    pub fn with_items(items: Vec<T>) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                items: Property::new(Arc::new(items)),
                items_changed: Signal::new(),
                revision: AtomicU64::new(0),
            }),
        }
    }

    /// The current snapshot.
    pub fn items(&self) -> Arc<Vec<T>> {
        self.inner.items.get()
    }

    pub fn len(&self) -> usize {
        self.inner.items.get().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Replace the whole collection and notify observers.
    ///
    /// Observers run on the calling thread.
    pub fn replace(&self, items: Vec<T>) {
        let items = Arc::new(items);
        self.inner.items.set_silent(items.clone());
        let revision = self.inner.revision.fetch_add(1, Ordering::AcqRel) + 1;
        tracing::debug!(
            target: targets::STORE,
            revision,
            count = items.len(),
            "item collection replaced"
        );
        self.inner.items_changed.emit(items);
    }

    /// Number of replacements so far.
    pub fn revision(&self) -> u64 {
        self.inner.revision.load(Ordering::Acquire)
    }

    /// Signal emitted with the new snapshot after every replacement.
    pub fn items_changed(&self) -> &Signal<Arc<Vec<T>>> {
        &self.inner.items_changed
    }
}

impl<T: Send + Sync + 'static> Default for ItemStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for ItemStore<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Send + Sync + 'static> fmt::Debug for ItemStore<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ItemStore")
            .field("len", &self.len())
            .field("revision", &self.revision())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[test]
    fn test_replace_notifies_every_time() {
        let store = ItemStore::with_items(vec![1, 2, 3]);
        let seen = Arc::new(Mutex::new(Vec::new()));

        let seen_clone = seen.clone();
        store.items_changed().connect(move |items: &Arc<Vec<i32>>| {
            seen_clone.lock().push(items.len());
        });

        store.replace(vec![1, 2, 3]);
        store.replace(Vec::new());

        assert_eq!(*seen.lock(), vec![3, 0]);
        assert_eq!(store.revision(), 2);
        assert!(store.is_empty());
    }

    #[test]
    fn test_clones_share_collection() {
        let store = ItemStore::new();
        let other = store.clone();
        other.replace(vec!["a"]);
        assert_eq!(*store.items(), vec!["a"]);
    }

    #[test]
    fn test_snapshot_survives_replace() {
        let store = ItemStore::with_items(vec![1]);
        let snapshot = store.items();
        store.replace(vec![2, 3]);
        assert_eq!(*snapshot, vec![1]);
        assert_eq!(store.len(), 2);
    }
}
