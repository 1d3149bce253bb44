//! Signal/slot system.
//!
//! A [`Signal`] notifies connected slots (callbacks) when something changes.
//! Slots run directly on the emitting thread, in the order they were
//! connected. Cross-thread delivery is explicit: emitters that are not on the
//! interaction thread post the emission through an
//! [`EventLoopHandle`](crate::EventLoopHandle) instead.
//!
//! # Key Types
//!
//! - [`Signal<Args>`] - The signal type for emitting notifications
//! - [`ConnectionId`] - Unique identifier returned when connecting a slot
//!
//! # Example
//!
//! ```
//! use list_filter_core::Signal;
//!
//! let text_changed = Signal::<String>::new();
//!
//! let conn_id = text_changed.connect(|text| {
//!     println!("Text changed to: {}", text);
//! });
//!
//! text_changed.emit("Hello, World!".to_string());
//! text_changed.disconnect(conn_id);
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use slotmap::{SlotMap, new_key_type};

use crate::logging::targets;

new_key_type! {
    /// A unique identifier for a signal-slot connection.
    ///
    /// Use this ID to disconnect a specific connection via [`Signal::disconnect`].
    pub struct ConnectionId;
}

type Slot<Args> = Arc<dyn Fn(&Args) + Send + Sync>;

/// Internal storage for a single connection.
struct Connection<Args> {
    slot: Slot<Args>,
    /// Connection order; slot map iteration order is not insertion order.
    sequence: u64,
}

/// A type-safe signal that can have multiple connected slots.
///
/// # Thread Safety
///
/// `Signal<Args>` is `Send + Sync`. The connection list is locked only while
/// it is read or modified, never while slots run, so a slot may connect or
/// disconnect slots (including itself) on the same signal.
pub struct Signal<Args> {
    connections: Mutex<SlotMap<ConnectionId, Connection<Args>>>,
    next_sequence: AtomicU64,
}

impl<Args: Clone + Send + 'static> Default for Signal<Args> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Args: Clone + Send + 'static> Signal<Args> {
    /// Create a new signal with no connections.
    pub fn new() -> Self {
        Self {
            connections: Mutex::new(SlotMap::with_key()),
            next_sequence: AtomicU64::new(0),
        }
    }

    /// Connect a slot (closure) to this signal.
    ///
    /// Returns a `ConnectionId` that can be used to disconnect the slot later.
    pub fn connect<F>(&self, slot: F) -> ConnectionId
    where
        F: Fn(&Args) + Send + Sync + 'static,
    {
        let connection = Connection {
            slot: Arc::new(slot),
            sequence: self.next_sequence.fetch_add(1, Ordering::Relaxed),
        };
        self.connections.lock().insert(connection)
    }

    /// Disconnect a specific slot by its connection ID.
    ///
    /// Returns `true` if the connection was found and removed, `false` otherwise.
    pub fn disconnect(&self, id: ConnectionId) -> bool {
        self.connections.lock().remove(id).is_some()
    }

    /// Disconnect all slots from this signal.
    pub fn disconnect_all(&self) {
        self.connections.lock().clear();
    }

    /// Get the number of connected slots.
    pub fn connection_count(&self) -> usize {
        self.connections.lock().len()
    }

    /// Check if a connection is still live.
    pub fn is_connected(&self, id: ConnectionId) -> bool {
        self.connections.lock().contains_key(id)
    }

    /// Emit the signal, invoking all connected slots in connection order.
    ///
    /// Slots connected while an emission is running are first called on the
    /// next emission.
    #[tracing::instrument(skip_all, target = "list_filter_core::signal", level = "trace")]
    pub fn emit(&self, args: Args) {
        let slots = self.snapshot();
        tracing::trace!(target: targets::SIGNAL, connection_count = slots.len(), "emitting signal");

        for (id, slot) in slots {
            // A slot earlier in this emission may have disconnected this one.
            if self.is_connected(id) {
                slot(&args);
            }
        }
    }

    /// Connected slots, in connection order.
    fn snapshot(&self) -> Vec<(ConnectionId, Slot<Args>)> {
        let connections = self.connections.lock();
        let mut slots: Vec<(u64, ConnectionId, Slot<Args>)> = connections
            .iter()
            .map(|(id, conn)| (conn.sequence, id, conn.slot.clone()))
            .collect();
        drop(connections);

        slots.sort_unstable_by_key(|(sequence, _, _)| *sequence);
        slots.into_iter().map(|(_, id, slot)| (id, slot)).collect()
    }
}

static_assertions::assert_impl_all!(Signal<String>: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;

    #[test]
    fn test_signal_connect_emit() {
        let signal = Signal::<i32>::new();
        let received = Arc::new(Mutex::new(Vec::new()));

        let received_clone = received.clone();
        signal.connect(move |&value| {
            received_clone.lock().push(value);
        });

        signal.emit(42);
        signal.emit(100);

        let values = received.lock();
        assert_eq!(*values, vec![42, 100]);
    }

    #[test]
    fn test_signal_disconnect() {
        let signal = Signal::<i32>::new();
        let received = Arc::new(Mutex::new(Vec::new()));

        let received_clone = received.clone();
        let conn_id = signal.connect(move |&value| {
            received_clone.lock().push(value);
        });

        signal.emit(1);
        assert!(signal.disconnect(conn_id));
        assert!(!signal.disconnect(conn_id));
        signal.emit(2);

        let values = received.lock();
        assert_eq!(*values, vec![1]);
    }

    #[test]
    fn test_slots_run_in_connection_order() {
        let signal = Signal::<()>::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        let mut ids = Vec::new();
        for i in 0..4 {
            let order_clone = order.clone();
            ids.push(signal.connect(move |_| order_clone.lock().push(i)));
        }

        // Removing and re-adding reuses a slot map slot; order must still hold.
        signal.disconnect(ids[1]);
        let order_clone = order.clone();
        signal.connect(move |_| order_clone.lock().push(4));

        signal.emit(());
        assert_eq!(*order.lock(), vec![0, 2, 3, 4]);
    }

    #[test]
    fn test_slot_may_disconnect_itself() {
        let signal = Arc::new(Signal::<i32>::new());
        let received = Arc::new(Mutex::new(Vec::new()));
        let own_id = Arc::new(Mutex::new(None));

        let weak = Arc::downgrade(&signal);
        let received_clone = received.clone();
        let own_id_clone = own_id.clone();
        let id = signal.connect(move |&value| {
            received_clone.lock().push(value);
            if let (Some(signal), Some(id)) = (weak.upgrade(), *own_id_clone.lock()) {
                signal.disconnect(id);
            }
        });
        *own_id.lock() = Some(id);

        signal.emit(1);
        signal.emit(2);
        assert_eq!(*received.lock(), vec![1]);
        assert_eq!(signal.connection_count(), 0);
    }

    #[test]
    fn test_disconnected_during_emit_is_skipped() {
        let signal = Arc::new(Signal::<()>::new());
        let called = Arc::new(AtomicBool::new(false));
        let victim = Arc::new(Mutex::new(None));

        let weak = Arc::downgrade(&signal);
        let victim_clone = victim.clone();
        signal.connect(move |_| {
            if let (Some(signal), Some(id)) = (weak.upgrade(), *victim_clone.lock()) {
                signal.disconnect(id);
            }
        });
        let called_clone = called.clone();
        *victim.lock() = Some(signal.connect(move |_| called_clone.store(true, Ordering::SeqCst)));

        signal.emit(());
        assert!(!called.load(Ordering::SeqCst));
    }

    #[test]
    fn test_disconnect_all() {
        let signal = Signal::<()>::new();

        for _ in 0..5 {
            signal.connect(|_| {});
        }

        assert_eq!(signal.connection_count(), 5);
        signal.disconnect_all();
        assert_eq!(signal.connection_count(), 0);
    }

    #[test]
    fn test_cross_thread_emit_runs_on_emitting_thread() {
        let signal = Arc::new(Signal::<i32>::new());
        let slot_thread = Arc::new(Mutex::new(None));

        let slot_thread_clone = slot_thread.clone();
        signal.connect(move |_| {
            *slot_thread_clone.lock() = Some(std::thread::current().id());
        });

        let emitter = signal.clone();
        let emitter_thread = std::thread::spawn(move || {
            emitter.emit(7);
            std::thread::current().id()
        })
        .join()
        .unwrap();

        assert_eq!(*slot_thread.lock(), Some(emitter_thread));
    }
}
