//! A debounced, off-thread filter and sort pipeline for item lists.
//!
//! [`LazyFilter`] keeps a derived view, `sort(filter(items, query), rule)`,
//! in sync with three inputs while typing stays responsive:
//!
//! - **Debounce**: bursts of input changes collapse into one recomputation
//!   after a quiet period (200 ms by default)
//! - **Off-thread work**: filtering and sorting run on a dedicated worker
//! - **Latest wins**: results are tagged with a generation and only the
//!   newest one is published, on the event loop thread
//!
//! The supporting pieces are usable on their own: [`ItemStore`] and
//! [`ItemProvider`] for the source collection, [`SortRule`] and
//! [`title_contains`] for ordering and matching, and the [`collation`]
//! helpers for locale-aware comparison.
//!
//! # Example
//!
//! ```
//! use list_filter::{ItemProvider, LazyFilter, ProviderConfig, SortRule, title_contains};
//! use list_filter_core::EventLoop;
//! use std::time::Duration;
//!
//! let event_loop = EventLoop::new();
//! let provider = ItemProvider::with_config(event_loop.handle(), ProviderConfig::with_item_count(100));
//! provider.load_now();
//!
//! let filter = LazyFilter::new(
//!     provider.store().clone(),
//!     title_contains,
//!     SortRule::TitleDescending,
//!     event_loop.handle(),
//! )
//! .unwrap();
//!
//! filter
//!     .subscribe(|view| println!("{} items (generation {})", view.len(), view.generation()))
//!     .unwrap();
//!
//! assert!(event_loop.run_until(Duration::from_secs(2), || filter.item_count() == 100));
//! filter.dispose();
//! ```

pub mod collation;
mod error;
mod item;
mod pipeline;
mod predicate;
mod provider;
mod sort;
mod store;
mod view;

pub use error::{FilterError, Result};
pub use item::{Item, Titled};
pub use pipeline::{
    DEFAULT_DEBOUNCE, LazyFilter, LazyFilterBuilder, LazyFilterConfig, PipelineStats, Predicate,
    RecomputeFailure,
};
pub use predicate::title_contains;
pub use provider::{DEFAULT_ITEM_COUNT, ItemProvider, ProviderConfig, generate_items};
pub use sort::{Comparator, SortRule};
pub use store::ItemStore;
pub use view::DerivedView;
