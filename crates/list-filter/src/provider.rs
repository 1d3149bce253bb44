//! Sample item generation.
//!
//! The [`ItemProvider`] fills an [`ItemStore`] with generated items. Reloads
//! generate on the rayon pool and hand the finished collection to the
//! interaction thread, where the store is replaced in one step.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use list_filter_core::EventLoopHandle;
use list_filter_core::logging::targets;
use rayon::prelude::*;

use crate::error::Result;
use crate::item::Item;
use crate::store::ItemStore;

/// Number of items a provider generates by default.
pub const DEFAULT_ITEM_COUNT: usize = 6000;

/// Configuration for an [`ItemProvider`].
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// How many items each load generates.
    pub item_count: usize,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            item_count: DEFAULT_ITEM_COUNT,
        }
    }
}

impl ProviderConfig {
    pub fn with_item_count(item_count: usize) -> Self {
        Self { item_count }
    }
}

/// Generate `count` items with fresh identifiers, in parallel.
pub fn generate_items(count: usize) -> Vec<Item> {
    (0..count).into_par_iter().map(|_| Item::new()).collect()
}

/// Owns a store of generated items and reloads it off the interaction thread.
#[derive(Debug)]
pub struct ItemProvider {
    store: ItemStore<Item>,
    handle: EventLoopHandle,
    config: ProviderConfig,
    /// Latest reload issued; older reloads finishing late are dropped.
    latest_reload: Arc<AtomicU64>,
}

impl ItemProvider {
    /// Create a provider with an empty store and the default configuration.
    pub fn new(handle: EventLoopHandle) -> Self {
        Self::with_config(handle, ProviderConfig::default())
    }

    pub fn with_config(handle: EventLoopHandle, config: ProviderConfig) -> Self {
        Self {
            store: ItemStore::new(),
            handle,
            config,
            latest_reload: Arc::new(AtomicU64::new(0)),
        }
    }

    /// The store this provider fills.
    pub fn store(&self) -> &ItemStore<Item> {
        &self.store
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// Generate and install a collection synchronously on the calling thread.
    pub fn load_now(&self) {
        self.latest_reload.fetch_add(1, Ordering::AcqRel);
        self.store.replace(generate_items(self.config.item_count));
    }

    /// Regenerate the collection in the background.
    ///
    /// The replacement is applied on the interaction thread. Returns the
    /// reload's sequence number.
    ///
    /// # Errors
    ///
    /// Returns an error if the event loop has already exited.
    pub fn reload(&self) -> Result<u64> {
        if self.handle.has_exited() {
            return Err(list_filter_core::CoreError::EventLoopExited.into());
        }

        let reload = self.latest_reload.fetch_add(1, Ordering::AcqRel) + 1;
        let count = self.config.item_count;
        let store = self.store.clone();
        let handle = self.handle.clone();
        let latest = self.latest_reload.clone();

        tracing::debug!(target: targets::PROVIDER, reload, count, "reload started");
        rayon::spawn(move || {
            let items = generate_items(count);
            let posted = handle.post(move || {
                if latest.load(Ordering::Acquire) != reload {
                    tracing::debug!(target: targets::PROVIDER, reload, "stale reload dropped");
                    return;
                }
                store.replace(items);
            });
            if posted.is_err() {
                tracing::debug!(target: targets::PROVIDER, reload, "event loop exited before reload finished");
            }
        });

        Ok(reload)
    }
}
