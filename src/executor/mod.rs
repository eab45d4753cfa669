//! Deterministic task dispatch for tests
//!
//! Production code depends on the narrow [`Executor`] trait. Tests hand it a
//! [`MockExecutor`], which queues submitted work instead of running it, and
//! then decide when the queued work runs.
//!
//! # Example
//!
//! ```rust
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//! use testkit_executor::executor::{Executor, MockExecutor};
//!
//! // Code under test: fire-and-forget dispatch
//! fn record_visit(executor: &dyn Executor, visits: Arc<AtomicUsize>) {
//!     executor.execute(Box::new(move || {
//!         visits.fetch_add(1, Ordering::SeqCst);
//!     }));
//! }
//!
//! let executor = MockExecutor::new();
//! let visits = Arc::new(AtomicUsize::new(0));
//!
//! record_visit(&executor, Arc::clone(&visits));
//! record_visit(&executor, Arc::clone(&visits));
//!
//! // Scheduled, not run
//! assert_eq!(executor.pending_count(), 2);
//! assert_eq!(visits.load(Ordering::SeqCst), 0);
//!
//! executor.drain_all().unwrap();
//! assert_eq!(visits.load(Ordering::SeqCst), 2);
//! ```

use std::time::Duration;

mod config;
mod guard;
mod mock_executor;
mod work;

pub use config::{DrainPolicy, ExecutorConfig};
pub use guard::DrainGuard;
pub use mock_executor::MockExecutor;
pub use work::{FailureKind, Work, WorkFailure, WorkId, WorkInfo};

/// The dispatch surface code under test is written against.
///
/// Result-returning submission is not part of this trait; work reports back
/// through whatever state it captures.
pub trait Executor: Send + Sync {
    /// Accepts work for later execution.
    fn execute(&self, work: Work);

    /// Requests shutdown.
    ///
    /// Whether later submissions are rejected is up to the implementation.
    fn shutdown(&self);

    /// Returns true once [`shutdown`](Executor::shutdown) has been called.
    fn is_shutdown(&self) -> bool;

    /// Waits up to `timeout` for accepted work to finish after shutdown.
    ///
    /// Returns `true` if everything finished in time.
    fn await_termination(&self, timeout: Duration) -> bool;
}
