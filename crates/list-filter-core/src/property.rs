//! Input cells for the filter pipeline.
//!
//! A [`Property<T>`] holds one input of the pipeline, such as the query text,
//! the sort rule or the current item collection. Writers call
//! [`set`](Property::set), which compares against the stored value and
//! reports whether anything changed; only a real change should fire the
//! owner's change signal and re-arm the debounce. Collections that are
//! swapped wholesale skip the comparison with
//! [`set_silent`](Property::set_silent).
//!
//! # Example
//!
//! ```
//! use list_filter_core::{Property, Signal};
//!
//! let query = Property::new(String::new());
//! let query_changed = Signal::<String>::new();
//!
//! for typed in ["a", "ap", "ap"] {
//!     if query.set(typed.to_string()) {
//!         query_changed.emit(typed.to_string());
//!     }
//! }
//! assert_eq!(query.get(), "ap");
//! ```

use std::fmt;

use parking_lot::RwLock;

/// A thread-safe value cell whose setter reports real changes.
///
/// Readers clone the value out, so large values are best stored behind an
/// `Arc`.
pub struct Property<T> {
    value: RwLock<T>,
}

impl<T: Clone> Property<T> {
    pub fn new(value: T) -> Self {
        Self {
            value: RwLock::new(value),
        }
    }

    /// A clone of the stored value.
    pub fn get(&self) -> T {
        self.value.read().clone()
    }

    /// Store `value` unconditionally.
    ///
    /// For values whose equality is costly or meaningless, like a whole item
    /// collection that is always treated as new.
    pub fn set_silent(&self, value: T) {
        *self.value.write() = value;
    }
}

impl<T: Clone + PartialEq> Property<T> {
    /// Store `value` if it differs from the current one.
    ///
    /// Returns `true` when the value changed.
    pub fn set(&self, value: T) -> bool {
        let mut current = self.value.write();
        if *current == value {
            return false;
        }
        *current = value;
        true
    }
}

impl<T: Clone + fmt::Debug> fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Property").field(&*self.value.read()).finish()
    }
}

static_assertions::assert_impl_all!(Property<String>: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_retyping_same_query_is_not_a_change() {
        let query = Property::new(String::new());

        assert!(!query.set(String::new()));
        assert!(query.set("ap".to_string()));
        assert!(!query.set("ap".to_string()));
        assert!(query.set("a".to_string()));
        assert_eq!(query.get(), "a");
    }

    #[test]
    fn test_collection_swap_skips_comparison() {
        let items = Property::new(Arc::new(vec!["Apple", "banana"]));
        let before = items.get();

        items.set_silent(Arc::new(vec!["Apple", "banana"]));

        let after = items.get();
        assert_eq!(before, after);
        assert!(!Arc::ptr_eq(&before, &after));
    }

    #[test]
    fn test_debug_shows_value() {
        let rule = Property::new("Title, Ascending");
        assert_eq!(format!("{rule:?}"), "Property(\"Title, Ascending\")");
    }

    #[test]
    fn test_concurrent_setters_report_one_change_per_value() {
        let query = Arc::new(Property::new(String::new()));

        let changes: usize = (0..8)
            .map(|_| {
                let query = query.clone();
                std::thread::spawn(move || usize::from(query.set("ban".to_string())))
            })
            .collect::<Vec<_>>()
            .into_iter()
            .map(|h| h.join().unwrap())
            .sum();

        assert_eq!(changes, 1);
        assert_eq!(query.get(), "ban");
    }
}
