//! Timer system for the event loop.
//!
//! Provides one-shot timers whose callbacks run on the event loop thread.
//! Debouncing is built from these: stop the pending timer, start a new one.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fmt;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use slotmap::{SlotMap, new_key_type};

use crate::error::{Result, TimerError};
use crate::logging::targets;

new_key_type! {
    /// A unique identifier for a timer.
    pub struct TimerId;
}

/// A boxed timer callback.
pub(crate) type TimerCallback = Box<dyn FnOnce() + Send + 'static>;

/// Internal timer data.
struct TimerData {
    /// When this timer should fire.
    fire_time: Instant,
    /// The callback to run when the timer fires.
    callback: TimerCallback,
}

impl fmt::Debug for TimerData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerData")
            .field("fire_time", &self.fire_time)
            .finish_non_exhaustive()
    }
}

/// An entry in the timer queue (min-heap by fire time).
#[derive(Debug, Clone, Copy)]
struct TimerQueueEntry {
    id: TimerId,
    fire_time: Instant,
}

impl PartialEq for TimerQueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.fire_time == other.fire_time
    }
}

impl Eq for TimerQueueEntry {}

impl PartialOrd for TimerQueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TimerQueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse order for min-heap (BinaryHeap is max-heap by default).
        other.fire_time.cmp(&self.fire_time)
    }
}

/// Manages all timers of one event loop.
#[derive(Debug, Default)]
pub struct TimerManager {
    /// All pending timers.
    timers: SlotMap<TimerId, TimerData>,
    /// Priority queue of pending timer fires (min-heap by fire time).
    queue: BinaryHeap<TimerQueueEntry>,
}

impl TimerManager {
    /// Start a one-shot timer that fires after the specified duration.
    ///
    /// Returns the timer ID that can be used to cancel the timer.
    pub(crate) fn start_one_shot(&mut self, duration: Duration, callback: TimerCallback) -> TimerId {
        let fire_time = Instant::now() + duration;
        let id = self.timers.insert(TimerData {
            fire_time,
            callback,
        });
        self.queue.push(TimerQueueEntry { id, fire_time });
        id
    }

    /// Stop and remove a timer.
    ///
    /// Returns `Ok(())` if the timer was pending, or an error if it already
    /// fired or was never started.
    pub fn stop(&mut self, id: TimerId) -> Result<()> {
        // The heap entry stays behind and is skipped when it surfaces.
        self.timers
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| TimerError::InvalidTimerId.into())
    }

    /// Check if a timer is still pending.
    pub fn is_active(&self, id: TimerId) -> bool {
        self.timers.contains_key(id)
    }

    /// Get the duration until the next timer fires, if any.
    ///
    /// Returns `None` if there are no pending timers.
    pub fn time_until_next(&mut self) -> Option<Duration> {
        // Clean up any stopped timers from the front of the queue.
        while let Some(entry) = self.queue.peek() {
            if self.timers.contains_key(entry.id) {
                break;
            }
            self.queue.pop();
        }

        self.queue
            .peek()
            .map(|entry| entry.fire_time.saturating_duration_since(Instant::now()))
    }

    /// Remove every timer that should fire now and return its callback.
    ///
    /// Callbacks are returned in fire-time order and must be run by the
    /// caller after releasing any lock around the manager.
    #[tracing::instrument(skip(self), target = "list_filter_core::timer", level = "trace")]
    pub(crate) fn take_expired(&mut self) -> Vec<(TimerId, TimerCallback)> {
        let now = Instant::now();
        let mut expired = Vec::new();

        while let Some(entry) = self.queue.peek() {
            if entry.fire_time > now {
                break;
            }
            let Some(entry) = self.queue.pop() else {
                break;
            };

            // Stopped timers leave their entry behind; skip it.
            let Some(timer) = self.timers.remove(entry.id) else {
                continue;
            };

            tracing::trace!(target: targets::TIMER, id = ?entry.id, "timer fired");
            expired.push((entry.id, timer.callback));
        }

        expired
    }

    /// Get the number of pending timers.
    pub fn active_count(&self) -> usize {
        self.timers.len()
    }
}

/// A thread-safe wrapper around `TimerManager` shared by a loop and its handles.
#[derive(Debug, Default)]
pub(crate) struct SharedTimerManager {
    inner: Mutex<TimerManager>,
}

impl SharedTimerManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_one_shot(&self, duration: Duration, callback: TimerCallback) -> TimerId {
        self.inner.lock().start_one_shot(duration, callback)
    }

    pub fn stop(&self, id: TimerId) -> Result<()> {
        self.inner.lock().stop(id)
    }

    pub fn is_active(&self, id: TimerId) -> bool {
        self.inner.lock().is_active(id)
    }

    pub fn time_until_next(&self) -> Option<Duration> {
        self.inner.lock().time_until_next()
    }

    pub fn take_expired(&self) -> Vec<(TimerId, TimerCallback)> {
        self.inner.lock().take_expired()
    }

    pub fn active_count(&self) -> usize {
        self.inner.lock().active_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

    fn noop() -> TimerCallback {
        Box::new(|| {})
    }

    #[test]
    fn test_start_and_stop() {
        let mut manager = TimerManager::default();

        let id = manager.start_one_shot(Duration::from_millis(100), noop());
        assert!(manager.is_active(id));
        assert_eq!(manager.active_count(), 1);

        manager.stop(id).unwrap();
        assert!(!manager.is_active(id));
        assert!(manager.stop(id).is_err());
        assert!(manager.time_until_next().is_none());
    }

    #[test]
    fn test_expired_in_fire_order() {
        let mut manager = TimerManager::default();
        let late = manager.start_one_shot(Duration::from_millis(20), noop());
        let early = manager.start_one_shot(Duration::ZERO, noop());

        std::thread::sleep(Duration::from_millis(30));

        let fired: Vec<TimerId> = manager.take_expired().into_iter().map(|(id, _)| id).collect();
        assert_eq!(fired, vec![early, late]);
        assert_eq!(manager.active_count(), 0);
    }

    #[test]
    fn test_stopped_timer_never_fires() {
        let manager = SharedTimerManager::new();
        let count = Arc::new(AtomicUsize::new(0));

        let count_clone = count.clone();
        let id = manager.start_one_shot(
            Duration::ZERO,
            Box::new(move || {
                count_clone.fetch_add(1, AtomicOrdering::SeqCst);
            }),
        );
        manager.stop(id).unwrap();

        for (_, callback) in manager.take_expired() {
            callback();
        }
        assert_eq!(count.load(AtomicOrdering::SeqCst), 0);
    }

    #[test]
    fn test_time_until_next() {
        let manager = SharedTimerManager::new();
        assert!(manager.time_until_next().is_none());

        manager.start_one_shot(Duration::from_secs(10), noop());
        let wait = manager.time_until_next().unwrap();
        assert!(wait <= Duration::from_secs(10));
        assert!(wait > Duration::from_secs(5));
        assert_eq!(manager.active_count(), 1);
    }
}
