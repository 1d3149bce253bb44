//! Deferred invocations executed on the event loop thread.
//!
//! A [`QueuedInvocation`] wraps a closure produced on any thread (a worker
//! delivering a result, a generator publishing a new collection) so that the
//! event loop can run it later on the interaction thread.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Global invocation counter for unique IDs.
static NEXT_INVOCATION_ID: AtomicU64 = AtomicU64::new(1);

/// A type-erased queued invocation that can be executed later.
pub struct QueuedInvocation {
    id: u64,
    invoke: Box<dyn FnOnce() + Send>,
}

impl QueuedInvocation {
    /// Create a new queued invocation.
    pub fn new<F>(invoke: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            id: NEXT_INVOCATION_ID.fetch_add(1, Ordering::Relaxed),
            invoke: Box::new(invoke),
        }
    }

    /// The unique identifier of this invocation, used in trace output.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Execute the invocation.
    pub fn execute(self) {
        (self.invoke)();
    }
}

impl fmt::Debug for QueuedInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueuedInvocation")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::AtomicBool;

    #[test]
    fn test_execute() {
        let executed = Arc::new(AtomicBool::new(false));

        let executed_clone = executed.clone();
        let invocation = QueuedInvocation::new(move || {
            executed_clone.store(true, Ordering::SeqCst);
        });

        invocation.execute();
        assert!(executed.load(Ordering::SeqCst));
    }

    #[test]
    fn test_ids_are_unique() {
        let a = QueuedInvocation::new(|| {});
        let b = QueuedInvocation::new(|| {});
        assert_ne!(a.id(), b.id());
        assert!(format!("{a:?}").contains("QueuedInvocation"));
    }
}
