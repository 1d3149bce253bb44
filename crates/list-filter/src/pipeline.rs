//! The debounced filter/sort pipeline.
//!
//! A [`LazyFilter`] watches three inputs: the items in an [`ItemStore`], a
//! query string and a sort rule. Any change re-arms a trailing-edge debounce
//! timer on the event loop. When the timer fires, the loop takes a snapshot
//! of all three inputs, tags it with a new generation and hands it to a
//! dedicated worker thread, which computes `sort(filter(items, query), rule)`.
//! The result comes back to the loop thread and is published only if its
//! generation is still the latest one issued.
//!
//! ```text
//!  set_query / set_sort_rule / store.replace
//!          |
//!          v
//!  [debounce timer, re-armed on every trigger]      (loop thread)
//!          | fires: snapshot + generation N
//!          v
//!  [job slot: N overwrites any unclaimed snapshot]
//!          |
//!          v
//!  [worker: take newest, filter, sort, abort if stale] (worker thread)
//!          |
//!          v
//!  [publish if N == latest, notify subscribers]     (loop thread)
//! ```
//!
//! # Example
//!
//! ```
//! use list_filter::{Item, ItemStore, LazyFilter, SortRule, title_contains};
//! use list_filter_core::EventLoop;
//! use std::time::Duration;
//!
//! let event_loop = EventLoop::new();
//! let store = ItemStore::with_items(vec![
//!     Item::with_title("Apple"),
//!     Item::with_title("banana"),
//!     Item::with_title("Apricot"),
//! ]);
//!
//! let filter = LazyFilter::new(store, title_contains, SortRule::TitleAscending, event_loop.handle())
//!     .unwrap();
//! filter.set_query("ap").unwrap();
//!
//! assert!(event_loop.run_until(Duration::from_secs(2), || filter.item_count() == 2));
//! let titles: Vec<_> = filter.current_view().iter().map(|i| i.title().to_string()).collect();
//! assert_eq!(titles, ["Apple", "Apricot"]);
//! ```

use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use list_filter_core::{
    CancellationToken, ConnectionId, EventLoopHandle, PerfSpan, Property, Signal, TimerId, Worker,
    WorkerBuilder,
};
use list_filter_core::logging::targets;
use parking_lot::{Mutex, RwLock};

use crate::error::{FilterError, Result};
use crate::sort::{Comparator, SortRule};
use crate::store::ItemStore;
use crate::view::DerivedView;

/// Default quiet period before a recomputation starts.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(200);

/// A shared filter predicate: `(query, item) -> keep`.
pub type Predicate<T> = Arc<dyn Fn(&str, &T) -> bool + Send + Sync>;

/// Configuration for a [`LazyFilter`].
#[derive(Debug, Clone)]
pub struct LazyFilterConfig {
    /// Trailing-edge debounce window.
    pub debounce: Duration,
    /// Name of the recompute worker thread.
    pub worker_name: String,
    /// Capacity of the worker's task queue. At most one drain task is
    /// queued at a time, so any capacity of one or more behaves the same.
    pub queue_capacity: usize,
}

impl Default for LazyFilterConfig {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            worker_name: "lazy-filter".to_string(),
            queue_capacity: 64,
        }
    }
}

/// Counters describing what the pipeline has done so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    /// Input changes seen, including the initial snapshot.
    pub triggers: u64,
    /// Recomputations the worker actually started.
    pub recomputations: u64,
    /// Snapshots replaced before the worker took them, plus recomputations
    /// abandoned because a newer snapshot was issued.
    pub superseded: u64,
    /// Finished results dropped on arrival because they were stale.
    pub discarded: u64,
    /// Views published to subscribers.
    pub publications: u64,
    /// Recomputations that panicked.
    pub failures: u64,
}

/// A failed recomputation, reported through
/// [`LazyFilter::subscribe_failures`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecomputeFailure {
    /// Generation of the snapshot that failed.
    pub generation: u64,
    /// Panic payload, when it was a string.
    pub message: String,
}

impl From<RecomputeFailure> for FilterError {
    fn from(failure: RecomputeFailure) -> Self {
        FilterError::Recompute {
            generation: failure.generation,
            message: failure.message,
        }
    }
}

/// Builder for [`LazyFilter`].
#[derive(Debug, Default)]
pub struct LazyFilterBuilder {
    config: LazyFilterConfig,
}

impl LazyFilterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the debounce window. Zero still defers to the next loop turn.
    pub fn debounce(mut self, debounce: Duration) -> Self {
        self.config.debounce = debounce;
        self
    }

    pub fn worker_name(mut self, name: impl Into<String>) -> Self {
        self.config.worker_name = name.into();
        self
    }

    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.config.queue_capacity = capacity;
        self
    }

    /// Build the pipeline and schedule the initial recomputation.
    ///
    /// # Errors
    ///
    /// Returns an error if the worker thread cannot be spawned.
    pub fn build<T, R, P>(
        self,
        store: ItemStore<T>,
        predicate: P,
        rule: R,
        handle: EventLoopHandle,
    ) -> Result<LazyFilter<T, R>>
    where
        T: Clone + Send + Sync + 'static,
        R: Comparator<T> + Clone + PartialEq + fmt::Debug,
        P: Fn(&str, &T) -> bool + Send + Sync + 'static,
    {
        LazyFilter::with_config(store, Arc::new(predicate), rule, handle, self.config)
    }
}

/// What the worker hands back for one drain.
enum JobOutcome<T> {
    Computed { generation: u64, items: Vec<T> },
    Superseded { generation: u64 },
    Cancelled,
    Failed(RecomputeFailure),
    /// An earlier drain already took the snapshot.
    Idle,
}

/// One snapshot of the inputs, tagged with its generation.
struct Job<T, R> {
    generation: u64,
    items: Arc<Vec<T>>,
    query: String,
    rule: R,
}

/// Single-slot mailbox between the loop thread and the worker.
///
/// Only the newest snapshot is worth computing, so a new one overwrites any
/// snapshot the worker has not taken yet. At most one drain task is queued
/// on the worker at a time; it takes whatever is newest when it runs.
struct JobSlot<T, R> {
    job: Mutex<Option<Job<T, R>>>,
    drain_queued: AtomicBool,
}

impl<T, R> JobSlot<T, R> {
    fn new() -> Self {
        Self {
            job: Mutex::new(None),
            drain_queued: AtomicBool::new(false),
        }
    }

    /// Store `job`. Returns `true` if it replaced an untaken snapshot.
    fn put(&self, job: Job<T, R>) -> bool {
        self.job.lock().replace(job).is_some()
    }

    /// Returns `true` if the caller must queue a drain task.
    fn claim_drain(&self) -> bool {
        !self.drain_queued.swap(true, Ordering::AcqRel)
    }

    fn release_drain(&self) {
        self.drain_queued.store(false, Ordering::Release);
    }

    /// Run by the drain task. The flag is cleared before the take, so a
    /// `put` that lands after the take always queues a fresh drain.
    fn take(&self) -> Option<Job<T, R>> {
        self.release_drain();
        self.job.lock().take()
    }
}

#[derive(Default)]
struct Counters {
    triggers: AtomicU64,
    recomputations: AtomicU64,
    superseded: AtomicU64,
    discarded: AtomicU64,
    publications: AtomicU64,
    failures: AtomicU64,
}

impl Counters {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> PipelineStats {
        PipelineStats {
            triggers: self.triggers.load(Ordering::Relaxed),
            recomputations: self.recomputations.load(Ordering::Relaxed),
            superseded: self.superseded.load(Ordering::Relaxed),
            discarded: self.discarded.load(Ordering::Relaxed),
            publications: self.publications.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }
}

#[derive(Default)]
struct Debounce {
    timer: Option<TimerId>,
    /// Bumped on every trigger; a timer callback only fires if it is still current.
    armed: u64,
}

/// A view subscriber that never sees a generation older than one it has seen.
struct Subscriber<T> {
    callback: Box<dyn Fn(&DerivedView<T>) + Send + Sync>,
    /// One past the highest generation delivered, 0 before the first delivery.
    next_generation: AtomicU64,
}

impl<T> Subscriber<T> {
    fn deliver(&self, view: &DerivedView<T>) {
        let next = view.generation() + 1;
        if self.next_generation.fetch_max(next, Ordering::AcqRel) < next {
            (self.callback)(view);
        }
    }
}

struct Shared<T: Send + 'static, R> {
    handle: EventLoopHandle,
    store: ItemStore<T>,
    predicate: Predicate<T>,
    query: Property<String>,
    rule: Property<R>,
    debounce_window: Duration,
    debounce: Mutex<Debounce>,
    /// Latest generation issued to the worker.
    latest: Arc<AtomicU64>,
    slot: Arc<JobSlot<T, R>>,
    view: RwLock<DerivedView<T>>,
    /// Held shared while subscribers run, exclusively while disposing.
    emit_gate: RwLock<()>,
    view_changed: Signal<DerivedView<T>>,
    failed: Signal<RecomputeFailure>,
    query_changed: Signal<String>,
    sort_rule_changed: Signal<R>,
    store_connection: Mutex<Option<ConnectionId>>,
    worker: Worker<JobOutcome<T>>,
    counters: Arc<Counters>,
    disposed: AtomicBool,
}

/// A reactive, debounced, off-thread filter and sort over an [`ItemStore`].
///
/// All mutators are non-blocking and may be called from any thread. Views
/// are published, and subscribers notified, on the event loop thread only.
///
/// After [`dispose`](Self::dispose), every mutator and `subscribe` returns
/// [`FilterError::Disposed`]; reads keep returning the last published view.
/// Dropping the filter disposes it.
pub struct LazyFilter<T: Clone + Send + Sync + 'static, R: Comparator<T> + Clone + PartialEq + fmt::Debug = SortRule> {
    shared: Arc<Shared<T, R>>,
}

impl<T, R> LazyFilter<T, R>
where
    T: Clone + Send + Sync + 'static,
    R: Comparator<T> + Clone + PartialEq + fmt::Debug,
{
    /// Create a pipeline with the default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the worker thread cannot be spawned.
    pub fn new<P>(store: ItemStore<T>, predicate: P, rule: R, handle: EventLoopHandle) -> Result<Self>
    where
        P: Fn(&str, &T) -> bool + Send + Sync + 'static,
    {
        Self::with_config(store, Arc::new(predicate), rule, handle, LazyFilterConfig::default())
    }

    /// Create a pipeline with an explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the worker thread cannot be spawned.
    pub fn with_config(
        store: ItemStore<T>,
        predicate: Predicate<T>,
        rule: R,
        handle: EventLoopHandle,
        config: LazyFilterConfig,
    ) -> Result<Self> {
        let worker = WorkerBuilder::new()
            .name(config.worker_name.clone())
            .queue_capacity(config.queue_capacity)
            .build::<JobOutcome<T>>(handle.clone())?;

        let shared = Arc::new(Shared {
            handle,
            store,
            predicate,
            query: Property::new(String::new()),
            rule: Property::new(rule),
            debounce_window: config.debounce,
            debounce: Mutex::new(Debounce::default()),
            latest: Arc::new(AtomicU64::new(0)),
            slot: Arc::new(JobSlot::new()),
            view: RwLock::new(DerivedView::empty()),
            emit_gate: RwLock::new(()),
            view_changed: Signal::new(),
            failed: Signal::new(),
            query_changed: Signal::new(),
            sort_rule_changed: Signal::new(),
            store_connection: Mutex::new(None),
            worker,
            counters: Arc::new(Counters::default()),
            disposed: AtomicBool::new(false),
        });

        let weak = Arc::downgrade(&shared);
        let connection = shared.store.items_changed().connect(move |_| {
            if let Some(shared) = weak.upgrade() {
                Shared::trigger(&shared);
            }
        });
        *shared.store_connection.lock() = Some(connection);

        tracing::debug!(
            target: targets::PIPELINE,
            debounce_ms = config.debounce.as_millis() as u64,
            worker = %config.worker_name,
            "lazy filter created"
        );

        // The initial snapshot counts as a change, like combine-latest.
        Shared::trigger(&shared);

        Ok(Self { shared })
    }

    /// Replace the query. Setting the current value again is not a change.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::Disposed`] after `dispose()`.
    pub fn set_query(&self, query: impl Into<String>) -> Result<()> {
        self.ensure_live()?;
        let query = query.into();
        if self.shared.query.set(query.clone()) {
            tracing::trace!(target: targets::PIPELINE, query = %query, "query changed");
            self.shared.query_changed.emit(query);
            Shared::trigger(&self.shared);
        }
        Ok(())
    }

    /// Replace the sort rule. Setting the current rule again is not a change.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::Disposed`] after `dispose()`.
    pub fn set_sort_rule(&self, rule: R) -> Result<()> {
        self.ensure_live()?;
        if self.shared.rule.set(rule.clone()) {
            tracing::trace!(target: targets::PIPELINE, rule = ?rule, "sort rule changed");
            self.shared.sort_rule_changed.emit(rule);
            Shared::trigger(&self.shared);
        }
        Ok(())
    }

    pub fn query(&self) -> String {
        self.shared.query.get()
    }

    pub fn sort_rule(&self) -> R {
        self.shared.rule.get()
    }

    /// The last published view.
    pub fn current_view(&self) -> DerivedView<T> {
        self.shared.view.read().clone()
    }

    /// Number of items in the last published view.
    pub fn item_count(&self) -> usize {
        self.shared.view.read().len()
    }

    /// The source store this filter observes.
    pub fn store(&self) -> &ItemStore<T> {
        &self.shared.store
    }

    pub fn stats(&self) -> PipelineStats {
        self.shared.counters.snapshot()
    }

    /// Register a callback for published views.
    ///
    /// The current view is replayed to the new subscriber right away when
    /// called on the loop thread, or on the loop's next turn otherwise.
    /// Subscribers run in registration order and never see a view older than
    /// one they have already seen.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::Disposed`] after `dispose()`, or a core error
    /// if the event loop has exited.
    pub fn subscribe<F>(&self, callback: F) -> Result<ConnectionId>
    where
        F: Fn(&DerivedView<T>) + Send + Sync + 'static,
    {
        self.ensure_live()?;

        let subscriber = Arc::new(Subscriber {
            callback: Box::new(callback),
            next_generation: AtomicU64::new(0),
        });

        let slot_subscriber = subscriber.clone();
        let id = self
            .shared
            .view_changed
            .connect(move |view| slot_subscriber.deliver(view));

        if self.shared.handle.is_loop_thread() {
            self.shared.replay(&subscriber);
        } else {
            let weak: Weak<Shared<T, R>> = Arc::downgrade(&self.shared);
            let replay = self.shared.handle.post(move || {
                if let Some(shared) = weak.upgrade() {
                    shared.replay(&subscriber);
                }
            });
            if let Err(err) = replay {
                self.shared.view_changed.disconnect(id);
                return Err(err.into());
            }
        }

        Ok(id)
    }

    /// Remove a view subscriber. Returns `false` if it was not connected.
    pub fn unsubscribe(&self, id: ConnectionId) -> bool {
        self.shared.view_changed.disconnect(id)
    }

    /// Register a callback for recomputations that panicked.
    ///
    /// The last good view stays published; the next input change retries.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::Disposed`] after `dispose()`.
    pub fn subscribe_failures<F>(&self, callback: F) -> Result<ConnectionId>
    where
        F: Fn(&RecomputeFailure) + Send + Sync + 'static,
    {
        self.ensure_live()?;
        Ok(self.shared.failed.connect(callback))
    }

    pub fn unsubscribe_failures(&self, id: ConnectionId) -> bool {
        self.shared.failed.disconnect(id)
    }

    /// Emitted with the new query whenever it changes.
    pub fn query_changed(&self) -> &Signal<String> {
        &self.shared.query_changed
    }

    /// Emitted with the new rule whenever it changes.
    pub fn sort_rule_changed(&self) -> &Signal<R> {
        &self.shared.sort_rule_changed
    }

    pub fn is_disposed(&self) -> bool {
        self.shared.disposed.load(Ordering::Acquire)
    }

    /// Tear the pipeline down. Idempotent.
    ///
    /// Stops observing the store, cancels the pending debounce, stops the
    /// worker and drops every subscriber. A recomputation in flight may run
    /// on, but its result is never published.
    ///
    /// Called off the loop thread, this waits for a publication that is
    /// being delivered right now, so no subscriber runs once it returns.
    pub fn dispose(&self) {
        // Subscribers only run on the loop thread; there the gate would be
        // taken re-entrantly by a subscriber that disposes.
        let _gate = (!self.shared.handle.is_loop_thread()).then(|| self.shared.emit_gate.write());
        if self.shared.disposed.swap(true, Ordering::AcqRel) {
            return;
        }

        if let Some(connection) = self.shared.store_connection.lock().take() {
            self.shared.store.items_changed().disconnect(connection);
        }
        if let Some(timer) = self.shared.debounce.lock().timer.take() {
            let _ = self.shared.handle.stop_timer(timer);
        }
        self.shared.worker.stop();
        self.shared.view_changed.disconnect_all();
        self.shared.failed.disconnect_all();

        tracing::debug!(
            target: targets::PIPELINE,
            stats = ?self.stats(),
            "lazy filter disposed"
        );
    }

    fn ensure_live(&self) -> Result<()> {
        if self.is_disposed() {
            Err(FilterError::Disposed)
        } else {
            Ok(())
        }
    }
}

impl<T, R> LazyFilter<T, R>
where
    T: Clone + Send + Sync + 'static,
    R: Comparator<T> + Clone + PartialEq + fmt::Debug + FromStr<Err = FilterError>,
{
    /// Select a sort rule by name.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::InvalidSortRule`] for unknown names and
    /// [`FilterError::Disposed`] after `dispose()`.
    pub fn set_sort_rule_named(&self, name: &str) -> Result<()> {
        self.ensure_live()?;
        self.set_sort_rule(name.parse()?)
    }
}

impl<T, R> Drop for LazyFilter<T, R>
where
    T: Clone + Send + Sync + 'static,
    R: Comparator<T> + Clone + PartialEq + fmt::Debug,
{
    fn drop(&mut self) {
        self.dispose();
    }
}

impl<T, R> fmt::Debug for LazyFilter<T, R>
where
    T: Clone + Send + Sync + 'static,
    R: Comparator<T> + Clone + PartialEq + fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyFilter")
            .field("query", &self.query())
            .field("sort_rule", &self.sort_rule())
            .field("item_count", &self.item_count())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

impl<T, R> Shared<T, R>
where
    T: Clone + Send + Sync + 'static,
    R: Comparator<T> + Clone + PartialEq + fmt::Debug,
{
    /// An input changed: re-arm the debounce timer.
    fn trigger(this: &Arc<Self>) {
        if this.disposed.load(Ordering::Acquire) {
            return;
        }
        Counters::bump(&this.counters.triggers);
        Shared::arm(this);
    }

    fn arm(this: &Arc<Self>) {
        let mut debounce = this.debounce.lock();
        if let Some(timer) = debounce.timer.take() {
            // Fails only if the timer already fired; `armed` makes it a no-op then.
            let _ = this.handle.stop_timer(timer);
        }
        debounce.armed += 1;

        let armed = debounce.armed;
        let weak = Arc::downgrade(this);
        debounce.timer = Some(this.handle.start_timer(this.debounce_window, move || {
            if let Some(shared) = weak.upgrade() {
                Shared::fire(&shared, armed);
            }
        }));
    }

    /// Debounce elapsed: snapshot the inputs and hand them to the worker.
    fn fire(this: &Arc<Self>, armed: u64) {
        {
            let mut debounce = this.debounce.lock();
            if debounce.armed != armed {
                return;
            }
            debounce.timer = None;
        }
        if this.disposed.load(Ordering::Acquire) {
            return;
        }

        let job = Job {
            generation: this.latest.fetch_add(1, Ordering::AcqRel) + 1,
            items: this.store.items(),
            query: this.query.get(),
            rule: this.rule.get(),
        };
        let generation = job.generation;
        tracing::debug!(
            target: targets::PIPELINE,
            generation,
            items = job.items.len(),
            query = %job.query,
            rule = ?job.rule,
            "recompute scheduled"
        );

        if this.slot.put(job) {
            Counters::bump(&this.counters.superseded);
            tracing::trace!(target: targets::PIPELINE, generation, "unclaimed snapshot replaced");
        }
        if !this.slot.claim_drain() {
            // The queued drain will take this snapshot.
            return;
        }

        let slot = this.slot.clone();
        let predicate = this.predicate.clone();
        let latest = this.latest.clone();
        let counters = this.counters.clone();
        let token = this.worker.cancellation_token().clone();
        let weak = Arc::downgrade(this);

        let sent = this.worker.send_with_callback(
            move || match slot.take() {
                Some(job) => recompute(job, &*predicate, &latest, &counters, &token),
                None => JobOutcome::Idle,
            },
            move |outcome| {
                if let Some(shared) = weak.upgrade() {
                    shared.complete(outcome);
                }
            },
        );
        if let Err(err) = sent {
            this.slot.release_drain();
            if this.disposed.load(Ordering::Acquire) || !this.worker.is_running() {
                return;
            }
            // The snapshot stays in the slot; try again after another window.
            tracing::warn!(
                target: targets::PIPELINE,
                generation,
                error = %err,
                "recompute not scheduled, retrying"
            );
            Shared::arm(this);
        }
    }

    /// Worker result arrived on the loop thread.
    fn complete(&self, outcome: JobOutcome<T>) {
        let _gate = self.emit_gate.read_recursive();
        if self.disposed.load(Ordering::Acquire) {
            tracing::trace!(target: targets::PIPELINE, "result after dispose dropped");
            return;
        }

        let latest = self.latest.load(Ordering::Acquire);
        match outcome {
            JobOutcome::Computed { generation, items } if generation == latest => {
                self.publish(DerivedView::new(items, generation));
            }
            JobOutcome::Computed { generation, .. } => {
                Counters::bump(&self.counters.discarded);
                tracing::debug!(target: targets::PIPELINE, generation, latest, "stale result discarded");
            }
            JobOutcome::Superseded { generation } => {
                Counters::bump(&self.counters.superseded);
                tracing::trace!(target: targets::PIPELINE, generation, latest, "recompute superseded");
            }
            JobOutcome::Cancelled | JobOutcome::Idle => {}
            JobOutcome::Failed(failure) if failure.generation == latest => {
                Counters::bump(&self.counters.failures);
                tracing::warn!(
                    target: targets::PIPELINE,
                    generation = failure.generation,
                    message = %failure.message,
                    "recompute failed"
                );
                self.failed.emit(failure);
            }
            JobOutcome::Failed(failure) => {
                Counters::bump(&self.counters.discarded);
                tracing::debug!(
                    target: targets::PIPELINE,
                    generation = failure.generation,
                    "stale failure discarded"
                );
            }
        }
    }

    /// Hand the current view to a new subscriber.
    fn replay(&self, subscriber: &Subscriber<T>) {
        let _gate = self.emit_gate.read_recursive();
        if self.disposed.load(Ordering::Acquire) {
            return;
        }
        let view = self.view.read().clone();
        subscriber.deliver(&view);
    }

    fn publish(&self, view: DerivedView<T>) {
        *self.view.write() = view.clone();
        Counters::bump(&self.counters.publications);
        tracing::debug!(
            target: targets::PIPELINE,
            generation = view.generation(),
            count = view.len(),
            "view published"
        );
        self.view_changed.emit(view);
    }
}

/// Run one job on the worker thread.
fn recompute<T, R>(
    job: Job<T, R>,
    predicate: &(dyn Fn(&str, &T) -> bool + Send + Sync),
    latest: &AtomicU64,
    counters: &Counters,
    token: &CancellationToken,
) -> JobOutcome<T>
where
    T: Clone,
    R: Comparator<T>,
{
    let generation = job.generation;
    let is_stale = || latest.load(Ordering::Acquire) != generation;

    if token.is_cancelled() {
        return JobOutcome::Cancelled;
    }
    if is_stale() {
        return JobOutcome::Superseded { generation };
    }

    Counters::bump(&counters.recomputations);
    let _span = PerfSpan::new("recompute");

    let computed = catch_unwind(AssertUnwindSafe(|| {
        let mut kept = Vec::new();
        for item in job.items.iter() {
            if token.is_cancelled() {
                return None;
            }
            if is_stale() {
                return Some(Err(()));
            }
            if predicate(&job.query, item) {
                kept.push(item.clone());
            }
        }
        job.rule.sort(&mut kept);
        Some(Ok(kept))
    }));

    match computed {
        Ok(Some(Ok(items))) => JobOutcome::Computed { generation, items },
        Ok(Some(Err(()))) => JobOutcome::Superseded { generation },
        Ok(None) => JobOutcome::Cancelled,
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "recompute panicked".to_string());
            JobOutcome::Failed(RecomputeFailure { generation, message })
        }
    }
}

static_assertions::assert_impl_all!(LazyFilter<crate::item::Item>: Send, Sync);
