//! Published snapshots of the filtered, sorted list.

use std::ops::Deref;
use std::sync::Arc;

/// One published result of the pipeline.
///
/// Views are immutable and cheap to clone. `generation` identifies the
/// recomputation that produced it; the empty view before the first
/// publication has generation 0.
#[derive(Debug)]
pub struct DerivedView<T> {
    items: Arc<[T]>,
    generation: u64,
}

impl<T> DerivedView<T> {
    pub fn new(items: Vec<T>, generation: u64) -> Self {
        Self {
            items: Arc::from(items),
            generation,
        }
    }

    /// The view shown before anything has been computed.
    pub fn empty() -> Self {
        Self::new(Vec::new(), 0)
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }
}

impl<T: Clone> DerivedView<T> {
    pub fn to_vec(&self) -> Vec<T> {
        self.items.to_vec()
    }
}

impl<T> Clone for DerivedView<T> {
    fn clone(&self) -> Self {
        Self {
            items: self.items.clone(),
            generation: self.generation,
        }
    }
}

impl<T> Default for DerivedView<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T> Deref for DerivedView<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.items
    }
}

impl<T: PartialEq> PartialEq for DerivedView<T> {
    fn eq(&self, other: &Self) -> bool {
        self.generation == other.generation && self.items == other.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_view() {
        let view = DerivedView::<u32>::empty();
        assert!(view.is_empty());
        assert_eq!(view.generation(), 0);
    }

    #[test]
    fn test_clone_shares_items() {
        let view = DerivedView::new(vec![1, 2, 3], 4);
        let clone = view.clone();
        assert_eq!(view, clone);
        assert_eq!(clone.len(), 3);
        assert!(std::ptr::eq(view.items().as_ptr(), clone.items().as_ptr()));
    }
}
