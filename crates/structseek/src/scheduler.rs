//! Parallel search over a resource corpus.
//!
//! A [`SearchScheduler`] owns a fixed-size worker pool. Each
//! [`run`](SearchScheduler::run) snapshots the resources of the filter set's
//! type and submits one task per resource. Submission is throttled so that
//! at most `queue_capacity` tasks are in flight, then the scheduler waits
//! for completion until the run's deadline.
//!
//! Tasks are never interrupted. When the deadline passes, the result sink
//! is sealed: tasks still running keep going in the background, but
//! whatever they produce afterwards is dropped.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex, RwLock};
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::{debug, trace, warn};

use crate::combine::{evaluate_resource, EvalContext};
use crate::error::{Result, SearchError};
use crate::filter_set::FilterSet;
use crate::hit::{sort_hits, Hit, HitSummary};
use crate::resource::{ResourceId, ResourceSource};

/// Wall-clock budget of a run when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Pool and admission settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Worker threads in the pool.
    pub workers: usize,
    /// Maximum number of submitted but unfinished tasks.
    pub queue_capacity: usize,
    /// Deadline of a run, measured from its start.
    pub timeout: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        let workers = thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        SchedulerConfig {
            workers,
            queue_capacity: workers * 4,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl SchedulerConfig {
    /// Sets the worker count; the queue capacity follows at four tasks per
    /// worker.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self.queue_capacity = self.workers * 4;
        self
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Terminal state of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Every resource was evaluated.
    Completed,
    /// The deadline passed first; results are partial.
    TimedOut,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Completed => f.write_str("completed"),
            RunStatus::TimedOut => f.write_str("timed out"),
        }
    }
}

/// Resources evaluated so far out of the run's corpus snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Progress {
    pub done: usize,
    pub total: usize,
}

impl Progress {
    pub fn is_complete(&self) -> bool {
        self.done >= self.total
    }
}

/// What a run produced.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub status: RunStatus,
    /// Hits in published order.
    pub hits: Vec<Hit>,
    pub progress: Progress,
    /// Resources that failed to load or panicked during evaluation.
    pub faults: usize,
    pub elapsed: Duration,
}

impl SearchOutcome {
    pub fn summary(&self) -> HitSummary {
        HitSummary::of(&self.hits)
    }

    pub fn is_partial(&self) -> bool {
        self.status == RunStatus::TimedOut
    }
}

type ProgressCallback = Arc<dyn Fn(Progress) + Send + Sync>;

#[derive(Debug, Default)]
struct ProgressCounter {
    done: AtomicUsize,
    total: AtomicUsize,
}

impl ProgressCounter {
    fn with_total(total: usize) -> Self {
        ProgressCounter {
            done: AtomicUsize::new(0),
            total: AtomicUsize::new(total),
        }
    }

    fn advance(&self) -> Progress {
        let done = self.done.fetch_add(1, Ordering::AcqRel) + 1;
        Progress {
            done,
            total: self.total.load(Ordering::Acquire),
        }
    }

    fn snapshot(&self) -> Progress {
        Progress {
            done: self.done.load(Ordering::Acquire),
            total: self.total.load(Ordering::Acquire),
        }
    }
}

/// Hits and faults accepted from finished tasks. Closed once the run ends.
struct Sink {
    open: bool,
    hits: Vec<Hit>,
    faults: usize,
}

/// State shared between one run and its tasks.
struct RunState {
    sink: Mutex<Sink>,
    in_flight: Mutex<usize>,
    finished: Condvar,
    progress: Arc<ProgressCounter>,
}

impl RunState {
    fn new(progress: Arc<ProgressCounter>) -> Self {
        RunState {
            sink: Mutex::new(Sink {
                open: true,
                hits: Vec::new(),
                faults: 0,
            }),
            in_flight: Mutex::new(0),
            finished: Condvar::new(),
            progress,
        }
    }

    /// Blocks while `in_flight > limit`, or until `deadline`. Returns
    /// `false` on timeout.
    fn wait_below(&self, limit: usize, deadline: Instant) -> bool {
        let mut in_flight = self.in_flight.lock();
        while *in_flight > limit {
            if self.finished.wait_until(&mut in_flight, deadline).timed_out() {
                return *in_flight <= limit;
            }
        }
        true
    }

    fn task_submitted(&self) {
        *self.in_flight.lock() += 1;
    }

    fn task_finished(&self) {
        let mut in_flight = self.in_flight.lock();
        *in_flight = in_flight.saturating_sub(1);
        self.finished.notify_all();
    }

    fn seal(&self) -> (Vec<Hit>, usize) {
        let mut sink = self.sink.lock();
        sink.open = false;
        (std::mem::take(&mut sink.hits), sink.faults)
    }
}

/// Resets the running flag when a run leaves, normally or by unwinding.
struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Runs filter sets over a corpus with bounded parallelism.
///
/// A scheduler runs one search at a time and can be reused once a run has
/// returned.
pub struct SearchScheduler {
    pool: ThreadPool,
    config: SchedulerConfig,
    running: AtomicBool,
    progress: RwLock<Arc<ProgressCounter>>,
    on_progress: Option<ProgressCallback>,
}

impl SearchScheduler {
    pub fn new(config: SchedulerConfig) -> Result<Self> {
        let workers = config.workers.max(1);
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("structseek-worker-{i}"))
            .build()?;
        debug!(workers, queue = config.queue_capacity, timeout = ?config.timeout, "search scheduler ready");
        Ok(SearchScheduler {
            pool,
            config,
            running: AtomicBool::new(false),
            progress: RwLock::new(Arc::new(ProgressCounter::default())),
            on_progress: None,
        })
    }

    /// Registers a callback invoked on a worker thread after every
    /// evaluated resource.
    pub fn with_progress(mut self, callback: impl Fn(Progress) + Send + Sync + 'static) -> Self {
        self.on_progress = Some(Arc::new(callback));
        self
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Progress of the current or most recent run.
    pub fn progress(&self) -> Progress {
        self.progress.read().snapshot()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Searches every resource of `filters.resource_type()` in `source`.
    ///
    /// Fails with [`SearchError::Busy`] if another run is in progress on
    /// this scheduler. Per-resource failures do not fail the run; they are
    /// logged and counted in [`SearchOutcome::faults`].
    pub fn run(
        &self,
        source: Arc<dyn ResourceSource>,
        filters: Arc<FilterSet>,
    ) -> Result<SearchOutcome> {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(SearchError::Busy);
        }
        let _running = RunningGuard(&self.running);

        let started = Instant::now();
        let deadline = started + self.config.timeout;

        let corpus = source.resources_of_type(filters.resource_type());
        let counter = Arc::new(ProgressCounter::with_total(corpus.len()));
        *self.progress.write() = Arc::clone(&counter);
        let run = Arc::new(RunState::new(counter));

        debug!(
            resource_type = filters.resource_type(),
            resources = corpus.len(),
            filters = filters.len(),
            mode = %filters.mode(),
            "search started"
        );

        let capacity = self.config.queue_capacity.max(1);
        let mut admitted = true;
        for id in corpus {
            if !run.wait_below(capacity - 1, deadline) {
                admitted = false;
                break;
            }
            run.task_submitted();
            self.spawn_task(
                id,
                Arc::clone(&source),
                Arc::clone(&filters),
                Arc::clone(&run),
            );
        }

        let drained = admitted && run.wait_below(0, deadline);
        let (mut hits, faults) = run.seal();
        let progress = run.progress.snapshot();
        let status = if drained {
            RunStatus::Completed
        } else {
            warn!(
                done = progress.done,
                total = progress.total,
                "search timed out; results are partial"
            );
            RunStatus::TimedOut
        };

        sort_hits(&mut hits);
        let outcome = SearchOutcome {
            status,
            hits,
            progress,
            faults,
            elapsed: started.elapsed(),
        };
        debug!(
            status = %outcome.status,
            hits = outcome.hits.len(),
            faults,
            elapsed = ?outcome.elapsed,
            "search finished"
        );
        Ok(outcome)
    }

    fn spawn_task(
        &self,
        id: ResourceId,
        source: Arc<dyn ResourceSource>,
        filters: Arc<FilterSet>,
        run: Arc<RunState>,
    ) {
        let on_progress = self.on_progress.clone();
        self.pool.spawn(move || {
            let result = panic::catch_unwind(AssertUnwindSafe(|| {
                search_resource(source.as_ref(), &filters, &id)
            }));

            {
                let mut sink = run.sink.lock();
                match result {
                    Ok(Ok(hits)) => {
                        if sink.open {
                            sink.hits.extend(hits);
                        }
                    }
                    Ok(Err(err)) => {
                        warn!(resource = %id, error = %err, "resource skipped");
                        if sink.open {
                            sink.faults += 1;
                        }
                    }
                    Err(payload) => {
                        warn!(
                            resource = %id,
                            panic = %panic_message(payload.as_ref()),
                            "resource evaluation panicked"
                        );
                        if sink.open {
                            sink.faults += 1;
                        }
                    }
                }
            }

            let progress = run.progress.advance();
            if let Some(callback) = &on_progress {
                if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| callback(progress))) {
                    warn!(
                        panic = %panic_message(payload.as_ref()),
                        "progress callback panicked"
                    );
                }
            }
            run.task_finished();
        });
    }
}

/// Evaluates one resource. Non-record resources yield no hits.
fn search_resource(
    source: &dyn ResourceSource,
    filters: &FilterSet,
    id: &ResourceId,
) -> Result<Vec<Hit>> {
    let Some(tree) = source.load(id)? else {
        trace!(resource = %id, "not a structured resource");
        return Ok(Vec::new());
    };
    let alias = source.alias(id);
    let ctx = EvalContext::new(id, alias.as_deref(), &tree, source);
    let evaluation = evaluate_resource(&ctx, filters);
    trace!(
        resource = %id,
        satisfied = evaluation.satisfied,
        verdict = evaluation.verdict,
        hits = evaluation.hits.len(),
        "resource evaluated"
    );
    Ok(evaluation.hits)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "task panicked".to_string()
    }
}
