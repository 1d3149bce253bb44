//! A dedicated background thread with its own task queue.
//!
//! A [`Worker`] runs tasks one at a time, in submission order, on a single
//! named thread. Results travel back to the interaction thread through the
//! [`EventLoopHandle`] the worker was built with, so callbacks never run
//! concurrently with the code that owns the published state.
//!
//! # Example
//!
//! ```
//! use list_filter_core::{EventLoop, Worker};
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::time::Duration;
//!
//! let event_loop = EventLoop::new();
//! let worker = Worker::<usize>::new(event_loop.handle()).unwrap();
//!
//! let delivered = Arc::new(AtomicUsize::new(0));
//! let delivered_clone = delivered.clone();
//! worker
//!     .send_with_callback(
//!         || (1..=10).sum(),
//!         move |sum| delivered_clone.store(sum, Ordering::SeqCst),
//!     )
//!     .unwrap();
//!
//! assert!(event_loop.run_until(Duration::from_secs(1), || delivered.load(Ordering::SeqCst) == 55));
//! worker.stop();
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TrySendError, bounded};

use crate::error::{CoreError, Result};
use crate::event_loop::EventLoopHandle;
use crate::logging::targets;

/// Default capacity for the worker's task queue.
const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// How often an idle worker re-checks for cancellation.
const IDLE_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// A cooperative cancellation flag shared between a worker and its tasks.
///
/// Long-running tasks should poll [`is_cancelled`](Self::is_cancelled) and
/// return early once it reports `true`.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a new, non-cancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if cancellation has been requested.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }
}

/// Configuration for creating a Worker.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Name for the worker thread.
    pub name: String,
    /// Capacity of the task queue.
    pub queue_capacity: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            name: "list-filter-worker".to_string(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

/// Builder for creating Workers with custom configuration.
#[derive(Debug, Default)]
pub struct WorkerBuilder {
    config: WorkerConfig,
}

impl WorkerBuilder {
    /// Create a new WorkerBuilder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the thread name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    /// Set the task queue capacity.
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.config.queue_capacity = capacity;
        self
    }

    /// Spawn the worker thread.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::WorkerSpawn`] if the thread cannot be created.
    pub fn build<T: Send + 'static>(self, handle: EventLoopHandle) -> Result<Worker<T>> {
        Worker::with_config(handle, self.config)
    }
}

/// Internal state shared between the Worker handle and worker thread.
struct WorkerState {
    /// Whether the worker accepts new tasks.
    running: AtomicBool,
    /// Cancellation token for cooperative shutdown.
    cancellation: CancellationToken,
    /// Count of queued or executing tasks.
    pending_tasks: AtomicUsize,
}

impl WorkerState {
    fn new() -> Self {
        Self {
            running: AtomicBool::new(true),
            cancellation: CancellationToken::new(),
            pending_tasks: AtomicUsize::new(0),
        }
    }
}

/// A task sent to the worker.
enum WorkerTask<T> {
    /// Execute a task and deliver the result via callback on the loop thread.
    Deliver {
        task: Box<dyn FnOnce() -> T + Send>,
        callback: Box<dyn FnOnce(T) + Send>,
    },
    /// Shutdown signal.
    Shutdown,
}

/// A dedicated worker thread with its own task queue.
///
/// # Type Parameter
///
/// - `T`: The result type produced by tasks.
///
/// # Thread Safety
///
/// `Worker<T>` is `Send + Sync`; multiple threads can send tasks concurrently.
/// Stopping or dropping the worker never blocks; the thread drains what was
/// already queued and exits on its own.
pub struct Worker<T: Send + 'static> {
    /// Channel sender for submitting tasks.
    task_sender: Sender<WorkerTask<T>>,
    /// Shared state with the worker thread.
    state: Arc<WorkerState>,
    name: String,
}

impl<T: Send + 'static> Worker<T> {
    /// Create a worker with default configuration.
    ///
    /// The worker thread starts immediately.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::WorkerSpawn`] if the thread cannot be created.
    pub fn new(handle: EventLoopHandle) -> Result<Self> {
        Self::with_config(handle, WorkerConfig::default())
    }

    /// Create a worker with custom configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::WorkerSpawn`] if the thread cannot be created.
    pub fn with_config(handle: EventLoopHandle, config: WorkerConfig) -> Result<Self> {
        let (sender, receiver) = bounded(config.queue_capacity.max(1));
        let state = Arc::new(WorkerState::new());

        let thread_state = state.clone();
        thread::Builder::new()
            .name(config.name.clone())
            .spawn(move || {
                worker_loop(receiver, &thread_state, &handle);
                thread_state.running.store(false, Ordering::Release);
            })
            .map_err(|err| CoreError::WorkerSpawn(err.to_string()))?;

        tracing::debug!(
            target: targets::WORKER,
            name = %config.name,
            queue_capacity = config.queue_capacity,
            "worker started"
        );

        Ok(Self {
            task_sender: sender,
            state,
            name: config.name,
        })
    }

    /// The worker thread's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Check if the worker still accepts tasks.
    pub fn is_running(&self) -> bool {
        self.state.running.load(Ordering::Acquire)
    }

    /// Get the number of queued or executing tasks.
    pub fn pending_tasks(&self) -> usize {
        self.state.pending_tasks.load(Ordering::Acquire)
    }

    /// Send a task whose result is delivered to `callback` on the loop thread.
    ///
    /// If the event loop has exited by the time the task finishes, the result
    /// is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::WorkerUnavailable`] if the worker has been stopped
    /// or its queue is full.
    pub fn send_with_callback<F, C>(&self, task: F, callback: C) -> Result<()>
    where
        F: FnOnce() -> T + Send + 'static,
        C: FnOnce(T) + Send + 'static,
    {
        self.enqueue(WorkerTask::Deliver {
            task: Box::new(task),
            callback: Box::new(callback),
        })
    }

    /// Request the worker to stop after draining the tasks already queued.
    ///
    /// Non-blocking. The cancellation token is tripped so running tasks can
    /// bail out early.
    pub fn stop(&self) {
        if !self.state.running.swap(false, Ordering::AcqRel) {
            return;
        }
        tracing::debug!(target: targets::WORKER, name = %self.name, "worker stop requested");
        self.state.cancellation.cancel();
        // A full queue still drains; the idle poll notices the cancellation.
        let _ = self.task_sender.try_send(WorkerTask::Shutdown);
    }

    /// Get the cancellation token for this worker.
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.state.cancellation
    }

    fn enqueue(&self, task: WorkerTask<T>) -> Result<()> {
        if !self.is_running() {
            return Err(CoreError::WorkerUnavailable);
        }

        self.state.pending_tasks.fetch_add(1, Ordering::AcqRel);
        match self.task_sender.try_send(task) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => {
                self.state.pending_tasks.fetch_sub(1, Ordering::AcqRel);
                tracing::warn!(target: targets::WORKER, name = %self.name, "task rejected");
                Err(CoreError::WorkerUnavailable)
            }
        }
    }
}

impl<T: Send + 'static> Drop for Worker<T> {
    fn drop(&mut self) {
        self.stop();
    }
}

impl<T: Send + 'static> std::fmt::Debug for Worker<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Worker")
            .field("name", &self.name)
            .field("running", &self.is_running())
            .field("pending_tasks", &self.pending_tasks())
            .finish()
    }
}

static_assertions::assert_impl_all!(Worker<String>: Send, Sync);

/// The main worker loop that processes tasks.
fn worker_loop<T: Send + 'static>(
    receiver: Receiver<WorkerTask<T>>,
    state: &WorkerState,
    handle: &EventLoopHandle,
) {
    loop {
        match receiver.recv_timeout(IDLE_POLL_INTERVAL) {
            Ok(WorkerTask::Shutdown) => {
                // Finish what was queued before the shutdown request.
                while let Ok(task) = receiver.try_recv() {
                    run_task(task, state, handle);
                }
                break;
            }
            Ok(task) => run_task(task, state, handle),
            Err(RecvTimeoutError::Timeout) => {
                if state.cancellation.is_cancelled()
                    && state.pending_tasks.load(Ordering::Acquire) == 0
                {
                    break;
                }
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    tracing::debug!(target: targets::WORKER, "worker loop exited");
}

fn run_task<T: Send + 'static>(task: WorkerTask<T>, state: &WorkerState, handle: &EventLoopHandle) {
    match task {
        WorkerTask::Deliver { task, callback } => {
            let result = task();
            if handle.post(move || callback(result)).is_err() {
                tracing::debug!(
                    target: targets::WORKER,
                    "event loop exited; dropping task result"
                );
            }
        }
        WorkerTask::Shutdown => return,
    }
    state.pending_tasks.fetch_sub(1, Ordering::AcqRel);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_loop::EventLoop;
    use parking_lot::Mutex;
    use std::sync::atomic::AtomicI32;

    #[test]
    fn test_worker_creation() {
        let event_loop = EventLoop::new();
        let worker = Worker::<i32>::new(event_loop.handle()).unwrap();
        assert!(worker.is_running());
        assert_eq!(worker.pending_tasks(), 0);
        assert_eq!(worker.name(), "list-filter-worker");
        worker.stop();
        assert!(!worker.is_running());
    }

    #[test]
    fn test_builder_names_the_thread() {
        let event_loop = EventLoop::new();
        let worker = WorkerBuilder::new()
            .name("recompute-test")
            .queue_capacity(8)
            .build::<String>(event_loop.handle())
            .unwrap();
        let received = Arc::new(Mutex::new(None));

        let received_clone = received.clone();
        worker
            .send_with_callback(
                || thread::current().name().unwrap_or_default().to_string(),
                move |name| *received_clone.lock() = Some(name),
            )
            .unwrap();

        assert!(event_loop.run_until(Duration::from_secs(2), || received.lock().is_some()));
        assert_eq!(received.lock().as_deref(), Some("recompute-test"));
        worker.stop();
    }

    #[test]
    fn test_callback_runs_on_loop_thread() {
        let event_loop = EventLoop::new();
        let worker = Worker::<String>::new(event_loop.handle()).unwrap();
        let received = Arc::new(Mutex::new(None));
        let loop_thread = thread::current().id();

        let received_clone = received.clone();
        worker
            .send_with_callback(
                || "hello".to_string(),
                move |result| {
                    *received_clone.lock() = Some((result, thread::current().id()));
                },
            )
            .unwrap();

        assert!(event_loop.run_until(Duration::from_secs(2), || received.lock().is_some()));
        assert_eq!(*received.lock(), Some(("hello".to_string(), loop_thread)));

        worker.stop();
    }

    #[test]
    fn test_stop_drains_queued_tasks() {
        let event_loop = EventLoop::new();
        let worker = Worker::<i32>::new(event_loop.handle()).unwrap();
        let delivered = Arc::new(AtomicI32::new(0));

        for _ in 0..5 {
            let delivered_clone = delivered.clone();
            worker
                .send_with_callback(
                    || {
                        thread::sleep(Duration::from_millis(10));
                        1
                    },
                    move |n| {
                        delivered_clone.fetch_add(n, Ordering::SeqCst);
                    },
                )
                .unwrap();
        }

        worker.stop();
        assert!(event_loop.run_until(Duration::from_secs(2), || delivered.load(Ordering::SeqCst) == 5));
    }

    #[test]
    fn test_sequential_processing() {
        let event_loop = EventLoop::new();
        let worker = Worker::<i32>::new(event_loop.handle()).unwrap();
        let delivered = Arc::new(Mutex::new(Vec::new()));

        for i in 0..10 {
            let delivered_clone = delivered.clone();
            worker
                .send_with_callback(move || i, move |value| delivered_clone.lock().push(value))
                .unwrap();
        }

        assert!(event_loop.run_until(Duration::from_secs(2), || delivered.lock().len() == 10));
        assert_eq!(*delivered.lock(), (0..10).collect::<Vec<_>>());

        worker.stop();
    }

    #[test]
    fn test_send_after_stop() {
        let event_loop = EventLoop::new();
        let worker = Worker::<i32>::new(event_loop.handle()).unwrap();
        worker.stop();

        assert_eq!(
            worker.send_with_callback(|| 42, |_| {}),
            Err(CoreError::WorkerUnavailable)
        );
    }

    #[test]
    fn test_full_queue_rejects_task() {
        let event_loop = EventLoop::new();
        let worker = WorkerBuilder::new()
            .queue_capacity(1)
            .build::<i32>(event_loop.handle())
            .unwrap();
        let release = Arc::new(AtomicBool::new(false));
        let started = Arc::new(AtomicBool::new(false));

        let release_clone = release.clone();
        let started_clone = started.clone();
        worker
            .send_with_callback(
                move || {
                    started_clone.store(true, Ordering::SeqCst);
                    while !release_clone.load(Ordering::SeqCst) {
                        thread::sleep(Duration::from_millis(1));
                    }
                    1
                },
                |_| {},
            )
            .unwrap();
        while !started.load(Ordering::SeqCst) {
            thread::sleep(Duration::from_millis(1));
        }

        worker.send_with_callback(|| 2, |_| {}).unwrap();
        assert_eq!(
            worker.send_with_callback(|| 3, |_| {}),
            Err(CoreError::WorkerUnavailable)
        );

        release.store(true, Ordering::SeqCst);
        worker.stop();
    }

    #[test]
    fn test_cooperative_cancellation() {
        let event_loop = EventLoop::new();
        let worker = Worker::<String>::new(event_loop.handle()).unwrap();
        let iterations = Arc::new(AtomicI32::new(0));
        let outcome = Arc::new(Mutex::new(None));

        assert!(!worker.cancellation_token().is_cancelled());

        let token = worker.cancellation_token().clone();
        let iter_clone = iterations.clone();
        let outcome_clone = outcome.clone();
        worker
            .send_with_callback(
                move || {
                    for i in 0..100 {
                        if token.is_cancelled() {
                            return format!("cancelled at {i}");
                        }
                        iter_clone.fetch_add(1, Ordering::SeqCst);
                        thread::sleep(Duration::from_millis(10));
                    }
                    "completed".to_string()
                },
                move |result| *outcome_clone.lock() = Some(result),
            )
            .unwrap();

        thread::sleep(Duration::from_millis(50));
        worker.stop();
        assert!(worker.cancellation_token().is_cancelled());

        assert!(event_loop.run_until(Duration::from_secs(2), || outcome.lock().is_some()));
        assert!(outcome.lock().as_deref().is_some_and(|o| o.starts_with("cancelled")));
        assert!(iterations.load(Ordering::SeqCst) < 100);
    }

    #[test]
    fn test_result_dropped_after_loop_exit() {
        let event_loop = EventLoop::new();
        let worker = Worker::<i32>::new(event_loop.handle()).unwrap();
        drop(event_loop);

        let ran = Arc::new(AtomicBool::new(false));
        let delivered = Arc::new(AtomicBool::new(false));
        let ran_clone = ran.clone();
        let delivered_clone = delivered.clone();
        worker
            .send_with_callback(
                move || {
                    ran_clone.store(true, Ordering::SeqCst);
                    1
                },
                move |_| delivered_clone.store(true, Ordering::SeqCst),
            )
            .unwrap();

        while !ran.load(Ordering::SeqCst) {
            thread::sleep(Duration::from_millis(1));
        }
        worker.stop();
        assert!(!delivered.load(Ordering::SeqCst));
    }
}
