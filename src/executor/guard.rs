//! End-of-test check that no work was left behind.

use std::ops::Deref;

use crate::executor::MockExecutor;

/// Holds a [`MockExecutor`] and panics on drop if work is still queued.
///
/// The check is skipped while the thread is already panicking, so a failing
/// assertion inside the test is not masked by a second panic. An `Err`
/// returned by a test is not a panic, so this check still fires and the
/// error goes unreported; the panic message says so.
///
/// # Example
///
/// ```rust
/// use testkit_executor::executor::{DrainGuard, Executor, MockExecutor};
///
/// let executor = DrainGuard::new(MockExecutor::new());
/// executor.execute(Box::new(|| {}));
/// executor.drain_all().unwrap();
/// // Dropping here is fine: the queue is empty.
/// ```
#[derive(Debug)]
pub struct DrainGuard {
    executor: MockExecutor,
}

impl DrainGuard {
    /// Wraps an executor.
    #[must_use]
    pub fn new(executor: MockExecutor) -> Self {
        Self { executor }
    }

    /// Returns the guarded executor.
    #[must_use]
    pub fn executor(&self) -> &MockExecutor {
        &self.executor
    }
}

impl Deref for DrainGuard {
    type Target = MockExecutor;

    fn deref(&self) -> &MockExecutor {
        &self.executor
    }
}

impl Drop for DrainGuard {
    fn drop(&mut self) {
        if std::thread::panicking() {
            return;
        }
        let pending = self.executor.pending();
        assert!(
            pending.is_empty(),
            "{} work item(s) still pending at end of test: {:?} \
             (an error returned by the test, if any, is not shown)",
            pending.len(),
            pending
        );
    }
}
