//! The `MockExecutor` implementation.

use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::executor::config::{DrainPolicy, ExecutorConfig};
use crate::executor::work::{Work, WorkFailure, WorkId, WorkInfo, WorkItem};
use crate::executor::Executor;

/// An executor double that captures work instead of running it.
///
/// Work handed to [`Executor::execute`] is queued in submission order and
/// only runs when the test calls [`drain_all`], [`step`] or
/// [`run_until_idle`], always on the calling thread.
///
/// Clones share the same queue and shutdown flag, so a clone can be handed
/// to the code under test while the test keeps another to drive it.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use parking_lot::Mutex;
/// use testkit_executor::executor::{Executor, MockExecutor};
///
/// let executor = MockExecutor::new();
/// let log = Arc::new(Mutex::new(Vec::new()));
///
/// for marker in ["a", "b", "c"] {
///     let log = Arc::clone(&log);
///     executor.execute(Box::new(move || log.lock().push(marker)));
/// }
///
/// // Nothing has run yet
/// assert_eq!(executor.pending_count(), 3);
/// assert!(log.lock().is_empty());
///
/// executor.drain_all().unwrap();
/// assert_eq!(*log.lock(), vec!["a", "b", "c"]);
/// assert_eq!(executor.pending_count(), 0);
/// ```
///
/// [`drain_all`]: MockExecutor::drain_all
/// [`step`]: MockExecutor::step
/// [`run_until_idle`]: MockExecutor::run_until_idle
#[derive(Clone)]
pub struct MockExecutor {
    inner: Arc<ExecutorInner>,
}

struct ExecutorInner {
    /// Work waiting for a drain, oldest first.
    queue: Mutex<VecDeque<WorkItem>>,
    /// Set once by `shutdown`, never cleared.
    shutdown: AtomicBool,
    /// Items run so far, failed ones included.
    executed: AtomicUsize,
    config: ExecutorConfig,
}

impl MockExecutor {
    /// Creates a new executor with an empty queue.
    ///
    /// # Example
    ///
    /// ```rust
    /// use testkit_executor::executor::{Executor, MockExecutor};
    ///
    /// let executor = MockExecutor::new();
    /// assert_eq!(executor.pending_count(), 0);
    /// assert!(!executor.is_shutdown());
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ExecutorConfig::default())
    }

    /// Creates a new executor with the given drain failure policy.
    #[must_use]
    pub fn with_policy(policy: DrainPolicy) -> Self {
        Self::with_config(ExecutorConfig::new().drain_policy(policy))
    }

    /// Creates a new executor from a full configuration.
    #[must_use]
    pub fn with_config(config: ExecutorConfig) -> Self {
        Self {
            inner: Arc::new(ExecutorInner {
                queue: Mutex::new(VecDeque::new()),
                shutdown: AtomicBool::new(false),
                executed: AtomicUsize::new(0),
                config,
            }),
        }
    }

    /// Returns the configuration in use.
    #[must_use]
    pub fn config(&self) -> &ExecutorConfig {
        &self.inner.config
    }

    /// Queues work under a name that shows up in [`pending`](Self::pending)
    /// and in failure reports.
    pub fn execute_named<F>(&self, name: &str, work: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.enqueue(WorkItem::new(Some(name.to_string()), work));
    }

    /// Queues fallible work. An `Err` returned while draining is reported
    /// like a panic would be.
    ///
    /// # Example
    ///
    /// ```rust
    /// use testkit_executor::executor::MockExecutor;
    ///
    /// let executor = MockExecutor::new();
    /// executor.try_execute(|| Err::<(), _>("connection refused"));
    ///
    /// let err = executor.drain_all().unwrap_err();
    /// assert_eq!(err.work_failures()[0].message, "connection refused");
    /// ```
    pub fn try_execute<F, E>(&self, work: F)
    where
        F: FnOnce() -> std::result::Result<(), E> + Send + 'static,
        E: fmt::Display,
    {
        self.enqueue(WorkItem::fallible(None, work));
    }

    /// Returns the number of queued work items.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.inner.queue.lock().len()
    }

    /// Returns true if nothing is queued.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.pending_count() == 0
    }

    /// Returns information about the queued items, oldest first.
    #[must_use]
    pub fn pending(&self) -> Vec<WorkInfo> {
        self.inner.queue.lock().iter().map(WorkItem::info).collect()
    }

    /// Returns how many items have been run, failed ones included.
    #[must_use]
    pub fn executed_count(&self) -> usize {
        self.inner.executed.load(Ordering::SeqCst)
    }

    /// Runs every item queued at the time of the call, oldest first.
    ///
    /// Items stay in the queue until their turn, so running work sees the
    /// items still waiting behind it. Work submitted by the running items is
    /// left queued for the next drain. Returns the number of items that ran.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DrainFailed`] if any item panicked or returned an
    /// error. Under [`DrainPolicy::StopOnFirstFailure`] the drain stops at
    /// that item and the items after it stay at the front of the queue;
    /// under [`DrainPolicy::ContinueOnFailure`] every item runs and
    /// all failures are reported.
    ///
    /// # Example
    ///
    /// ```rust
    /// use testkit_executor::executor::{Executor, MockExecutor};
    ///
    /// let executor = MockExecutor::new();
    /// executor.execute(Box::new(|| {}));
    /// executor.execute(Box::new(|| {}));
    ///
    /// assert_eq!(executor.drain_all().unwrap(), 2);
    /// // Draining an empty queue is a no-op
    /// assert_eq!(executor.drain_all().unwrap(), 0);
    /// ```
    pub fn drain_all(&self) -> Result<usize> {
        let (boundary, queued) = {
            let queue = self.inner.queue.lock();
            match queue.back() {
                Some(last) => (last.id, queue.len()),
                None => return Ok(0),
            }
        };
        debug!(count = queued, "draining queued work");

        let mut ran = 0;
        let mut failures = Vec::new();
        while let Some(item) = self.pop_through(boundary) {
            ran += 1;
            if let Err(failure) = self.run_item(item) {
                failures.push(failure);
                if self.inner.config.drain_policy == DrainPolicy::StopOnFirstFailure {
                    break;
                }
            }
        }

        if failures.is_empty() {
            Ok(ran)
        } else {
            Err(Error::DrainFailed { failures })
        }
    }

    /// Runs only the oldest queued item.
    ///
    /// Returns `false` if the queue was empty.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DrainFailed`] if the item failed. The item is
    /// consumed either way.
    ///
    /// # Example
    ///
    /// ```rust
    /// use testkit_executor::executor::{Executor, MockExecutor};
    ///
    /// let executor = MockExecutor::new();
    /// executor.execute(Box::new(|| {}));
    ///
    /// assert!(executor.step().unwrap());
    /// assert!(!executor.step().unwrap());
    /// ```
    pub fn step(&self) -> Result<bool> {
        let next = self.inner.queue.lock().pop_front();
        match next {
            Some(item) => self
                .run_item(item)
                .map(|()| true)
                .map_err(|failure| Error::DrainFailed {
                    failures: vec![failure],
                }),
            None => Ok(false),
        }
    }

    /// Drains repeatedly until no work is queued, so work that schedules
    /// more work is followed to the end.
    ///
    /// Returns the total number of items run.
    ///
    /// # Errors
    ///
    /// Propagates the first failing drain, or returns
    /// [`Error::DrainLimitExceeded`] if the queue is still not empty after
    /// [`ExecutorConfig::max_drain_rounds`] drains.
    pub fn run_until_idle(&self) -> Result<usize> {
        let limit = self.inner.config.max_drain_rounds;
        let mut total = 0;
        for round in 0..limit {
            if self.is_idle() {
                return Ok(total);
            }
            trace!(round, "drain round");
            total += self.drain_all()?;
        }
        if self.is_idle() {
            Ok(total)
        } else {
            Err(Error::DrainLimitExceeded(limit))
        }
    }

    /// Drops every queued item without running it.
    ///
    /// Returns the number of items dropped.
    pub fn clear(&self) -> usize {
        let dropped = std::mem::take(&mut *self.inner.queue.lock()).len();
        debug!(dropped, "cleared queued work");
        dropped
    }

    /// Marks the executor as shut down and returns the work that never ran.
    ///
    /// The returned list is always empty: queued items are not reported and
    /// stay queued, so they can still be drained.
    #[must_use]
    pub fn shutdown_now(&self) -> Vec<WorkInfo> {
        self.shutdown();
        Vec::new()
    }

    /// Returns true once shut down. There are no background workers, so
    /// this is the same as [`Executor::is_shutdown`].
    #[must_use]
    pub fn is_terminated(&self) -> bool {
        self.is_shutdown()
    }

    /// Not supported: the work is neither queued nor run and no result is
    /// ever produced. Use [`Executor::execute`] with [`drain_all`] instead.
    ///
    /// [`drain_all`]: MockExecutor::drain_all
    pub fn submit<F, T>(&self, work: F) -> Option<T>
    where
        F: FnOnce() -> T + Send + 'static,
    {
        drop(work);
        warn!("submit is not supported by MockExecutor; the work was dropped");
        None
    }

    /// Not supported: the work is neither queued nor run and the returned
    /// list is always empty.
    pub fn invoke_all<I, F, T>(&self, tasks: I) -> Vec<T>
    where
        I: IntoIterator<Item = F>,
        F: FnOnce() -> T + Send + 'static,
    {
        let dropped = tasks.into_iter().count();
        warn!(dropped, "invoke_all is not supported by MockExecutor; the work was dropped");
        Vec::new()
    }

    /// Not supported: the work is neither queued nor run and no result is
    /// ever produced.
    pub fn invoke_any<I, F, T>(&self, tasks: I) -> Option<T>
    where
        I: IntoIterator<Item = F>,
        F: FnOnce() -> T + Send + 'static,
    {
        let dropped = tasks.into_iter().count();
        warn!(dropped, "invoke_any is not supported by MockExecutor; the work was dropped");
        None
    }

    fn enqueue(&self, item: WorkItem) {
        trace!(id = %item.id, name = item.name.as_deref(), "work queued");
        self.inner.queue.lock().push_back(item);
    }

    fn run_item(&self, item: WorkItem) -> std::result::Result<(), WorkFailure> {
        trace!(id = %item.id, "running work");
        self.inner.executed.fetch_add(1, Ordering::SeqCst);
        item.run().map_err(|failure| {
            warn!(%failure, "work failed");
            failure
        })
    }

    /// Pops the oldest item if it was queued no later than `boundary`.
    ///
    /// The lock is released before the item runs, so running work can
    /// inspect and extend the queue.
    fn pop_through(&self, boundary: WorkId) -> Option<WorkItem> {
        let mut queue = self.inner.queue.lock();
        if queue.front().is_some_and(|item| item.id <= boundary) {
            queue.pop_front()
        } else {
            None
        }
    }
}

impl Executor for MockExecutor {
    fn execute(&self, work: Work) {
        self.enqueue(WorkItem::new(None, work));
    }

    fn shutdown(&self) {
        if !self.inner.shutdown.swap(true, Ordering::SeqCst) {
            debug!(pending = self.pending_count(), "executor shut down");
        }
    }

    fn is_shutdown(&self) -> bool {
        self.inner.shutdown.load(Ordering::SeqCst)
    }

    fn await_termination(&self, _timeout: Duration) -> bool {
        true
    }
}

impl Default for MockExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MockExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockExecutor")
            .field("pending", &self.pending_count())
            .field("executed", &self.executed_count())
            .field("shutdown", &self.is_shutdown())
            .finish()
    }
}
