//! The interaction-thread event loop.
//!
//! An [`EventLoop`] belongs to the thread that created it. Other threads talk
//! to it through an [`EventLoopHandle`]: they post closures, start and stop
//! timers, or ask it to quit. Everything posted runs on the loop thread in
//! FIFO order, which is what lets background results be published without
//! locks visible to the presentation layer.
//!
//! # Example
//!
//! ```
//! use list_filter_core::EventLoop;
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicBool, Ordering};
//! use std::time::Duration;
//!
//! let event_loop = EventLoop::new();
//! let handle = event_loop.handle();
//!
//! let fired = Arc::new(AtomicBool::new(false));
//! let fired_clone = fired.clone();
//! handle.start_timer(Duration::from_millis(10), move || {
//!     fired_clone.store(true, Ordering::SeqCst);
//! });
//!
//! assert!(event_loop.run_until(Duration::from_secs(1), || fired.load(Ordering::SeqCst)));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, unbounded};

use crate::error::{CoreError, Result};
use crate::event::LoopEvent;
use crate::invocation::QueuedInvocation;
use crate::logging::targets;
use crate::thread_check::ThreadAffinity;
use crate::timer::{SharedTimerManager, TimerId};

/// State shared between the loop and all of its handles.
struct LoopShared {
    /// Sender side of the event queue.
    sender: Sender<LoopEvent>,
    /// Timer manager (thread-safe).
    timers: SharedTimerManager,
    /// The thread that owns the loop.
    affinity: ThreadAffinity,
    /// Flag indicating `run()` should return.
    should_quit: AtomicBool,
    /// Set when the `EventLoop` is dropped.
    exited: AtomicBool,
}

/// An event loop bound to the thread that created it.
///
/// The loop is driven explicitly: a shell calls [`run`](Self::run), while
/// tests usually call [`run_until`](Self::run_until) or
/// [`process_pending`](Self::process_pending).
pub struct EventLoop {
    shared: Arc<LoopShared>,
    receiver: Receiver<LoopEvent>,
}

impl EventLoop {
    /// Create an event loop owned by the current thread.
    pub fn new() -> Self {
        let (sender, receiver) = unbounded();
        let shared = Arc::new(LoopShared {
            sender,
            timers: SharedTimerManager::new(),
            affinity: ThreadAffinity::current(),
            should_quit: AtomicBool::new(false),
            exited: AtomicBool::new(false),
        });
        tracing::debug!(target: targets::EVENT_LOOP, "event loop created");
        Self { shared, receiver }
    }

    /// Get a handle that can be cloned and sent to other threads.
    pub fn handle(&self) -> EventLoopHandle {
        EventLoopHandle {
            shared: self.shared.clone(),
        }
    }

    /// Run the loop until [`EventLoopHandle::quit`] is called.
    ///
    /// A quit request is permanent: once requested, every entry point returns
    /// promptly.
    ///
    /// # Errors
    ///
    /// Currently infallible; the `Result` mirrors the other loop entry points.
    #[tracing::instrument(skip(self), target = "list_filter_core::event_loop", level = "debug")]
    pub fn run(&self) -> Result<()> {
        self.shared.affinity.assert_same_thread();
        tracing::info!(target: targets::EVENT_LOOP, "starting event loop");

        while !self.should_quit() {
            self.wait_and_dispatch(None);
        }

        tracing::info!(target: targets::EVENT_LOOP, "event loop stopped");
        Ok(())
    }

    /// Fire expired timers and run the events queued so far, without blocking.
    ///
    /// Events posted by the handlers that run here are left for the next call.
    /// Returns the number of timers and events processed.
    pub fn process_pending(&self) -> usize {
        self.shared.affinity.assert_same_thread();

        let mut processed = self.process_timers();
        for _ in 0..self.receiver.len() {
            match self.receiver.try_recv() {
                Ok(event) => {
                    self.dispatch(event);
                    processed += 1;
                }
                Err(_) => break,
            }
        }
        processed
    }

    /// Run the loop for a fixed amount of time.
    ///
    /// Returns the number of timers and events processed.
    pub fn run_for(&self, duration: Duration) -> usize {
        self.shared.affinity.assert_same_thread();

        let deadline = Instant::now() + duration;
        let mut processed = self.process_pending();
        while Instant::now() < deadline && !self.should_quit() {
            processed += self.wait_and_dispatch(Some(deadline));
        }
        processed
    }

    /// Run the loop until `condition` holds or `timeout` elapses.
    ///
    /// The condition is checked on the loop thread after every event, so it
    /// may read state that is only published there. Returns the final value of
    /// the condition.
    pub fn run_until<F>(&self, timeout: Duration, mut condition: F) -> bool
    where
        F: FnMut() -> bool,
    {
        self.shared.affinity.assert_same_thread();

        let deadline = Instant::now() + timeout;
        self.process_pending();
        loop {
            if condition() {
                return true;
            }
            if Instant::now() >= deadline || self.should_quit() {
                return false;
            }
            self.wait_and_dispatch(Some(deadline));
        }
    }

    /// Request the loop to quit. Same as [`EventLoopHandle::quit`].
    pub fn quit(&self) {
        self.handle().quit();
    }

    /// Check if a quit has been requested.
    pub fn should_quit(&self) -> bool {
        self.shared.should_quit.load(Ordering::SeqCst)
    }

    // -------------------------------------------------------------------------
    // Internal methods
    // -------------------------------------------------------------------------

    /// Block for the next event or timer, bounded by `deadline`, then dispatch.
    fn wait_and_dispatch(&self, deadline: Option<Instant>) -> usize {
        let timer_wait = self.shared.timers.time_until_next();
        let deadline_wait = deadline.map(|d| d.saturating_duration_since(Instant::now()));

        let wait = match (timer_wait, deadline_wait) {
            (Some(t), Some(d)) => Some(t.min(d)),
            (Some(t), None) => Some(t),
            (None, Some(d)) => Some(d),
            (None, None) => None,
        };

        let mut processed = 0;
        let received = match wait {
            Some(timeout) => self.receiver.recv_timeout(timeout),
            None => self
                .receiver
                .recv()
                .map_err(|_| RecvTimeoutError::Disconnected),
        };

        match received {
            Ok(event) => {
                self.dispatch(event);
                processed += 1;
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                // Unreachable while `shared` owns a sender; stop spinning anyway.
                self.shared.should_quit.store(true, Ordering::SeqCst);
            }
        }

        processed + self.process_timers()
    }

    /// Run the callbacks of all expired timers.
    fn process_timers(&self) -> usize {
        let expired = self.shared.timers.take_expired();
        let count = expired.len();
        if count > 0 {
            tracing::trace!(target: targets::EVENT_LOOP, count, "processing timer callbacks");
        }
        for (_, callback) in expired {
            callback();
        }
        count
    }

    fn dispatch(&self, event: LoopEvent) {
        tracing::trace!(target: targets::EVENT_LOOP, kind = event.kind(), "received loop event");
        match event {
            LoopEvent::Invoke(invocation) => {
                tracing::trace!(
                    target: targets::EVENT_LOOP,
                    invocation_id = invocation.id(),
                    "executing queued invocation"
                );
                invocation.execute();
            }
            LoopEvent::WakeUp => {
                // Only wakes the wait; timers are processed after dispatch.
            }
            LoopEvent::Quit => {
                tracing::debug!(target: targets::EVENT_LOOP, "processing quit event");
                self.shared.should_quit.store(true, Ordering::SeqCst);
            }
        }
    }
}

impl Default for EventLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for EventLoop {
    fn drop(&mut self) {
        self.shared.exited.store(true, Ordering::SeqCst);
        let pending = self.receiver.len();
        if pending > 0 {
            tracing::debug!(target: targets::EVENT_LOOP, pending, "dropping unprocessed events");
        }
    }
}

/// A cloneable, thread-safe handle to an [`EventLoop`].
#[derive(Clone)]
pub struct EventLoopHandle {
    shared: Arc<LoopShared>,
}

impl EventLoopHandle {
    /// Post a closure to run on the loop thread.
    ///
    /// This is thread-safe and can be called from any thread, including the
    /// loop thread itself (the closure then runs on a later iteration).
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::EventLoopExited`] if the loop has been dropped.
    pub fn post<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        self.send(LoopEvent::Invoke(QueuedInvocation::new(f)))
    }

    /// Start a one-shot timer whose callback runs on the loop thread.
    pub fn start_timer<F>(&self, delay: Duration, callback: F) -> TimerId
    where
        F: FnOnce() + Send + 'static,
    {
        let id = self.shared.timers.start_one_shot(delay, Box::new(callback));
        // The loop may be blocked with a longer timeout; make it re-check.
        if !self.is_loop_thread() {
            let _ = self.send(LoopEvent::WakeUp);
        }
        id
    }

    /// Stop a pending timer.
    ///
    /// # Errors
    ///
    /// Returns a timer error if the timer already fired or was stopped.
    pub fn stop_timer(&self, id: TimerId) -> Result<()> {
        self.shared.timers.stop(id)
    }

    /// Check if a timer is still pending.
    pub fn is_timer_active(&self, id: TimerId) -> bool {
        self.shared.timers.is_active(id)
    }

    /// Number of pending timers on the loop.
    pub fn active_timer_count(&self) -> usize {
        self.shared.timers.active_count()
    }

    /// Check if the caller is running on the loop thread.
    pub fn is_loop_thread(&self) -> bool {
        self.shared.affinity.is_same_thread()
    }

    /// Check if the loop has been dropped.
    pub fn has_exited(&self) -> bool {
        self.shared.exited.load(Ordering::SeqCst)
    }

    /// Request the loop to quit.
    ///
    /// `run()` returns after the current iteration. The quit is not immediate.
    pub fn quit(&self) {
        tracing::info!(target: targets::EVENT_LOOP, "quit requested");
        self.shared.should_quit.store(true, Ordering::SeqCst);
        let _ = self.send(LoopEvent::Quit);
    }

    fn send(&self, event: LoopEvent) -> Result<()> {
        if self.has_exited() {
            return Err(CoreError::EventLoopExited);
        }
        self.shared
            .sender
            .send(event)
            .map_err(|_| CoreError::EventLoopExited)
    }
}

impl std::fmt::Debug for EventLoopHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventLoopHandle")
            .field("thread", &self.shared.affinity.thread_id())
            .field("exited", &self.has_exited())
            .finish()
    }
}

static_assertions::assert_impl_all!(EventLoopHandle: Send, Sync, Clone);
