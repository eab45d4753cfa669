//! Configuration for the mock executor.

use std::fmt;

/// What [`MockExecutor::drain_all`](super::MockExecutor::drain_all) does when
/// a work item fails.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DrainPolicy {
    /// Stop at the first failure, leaving the items that did not run at the
    /// front of the queue.
    #[default]
    StopOnFirstFailure,
    /// Run every queued item and report all failures afterwards.
    ContinueOnFailure,
}

impl fmt::Display for DrainPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DrainPolicy::StopOnFirstFailure => write!(f, "stop_on_failure"),
            DrainPolicy::ContinueOnFailure => write!(f, "continue_on_failure"),
        }
    }
}

/// Configuration for a [`MockExecutor`](super::MockExecutor).
///
/// # Example
///
/// ```rust
/// use testkit_executor::executor::{DrainPolicy, ExecutorConfig, MockExecutor};
///
/// let config = ExecutorConfig::new()
///     .drain_policy(DrainPolicy::ContinueOnFailure)
///     .max_drain_rounds(10);
///
/// let executor = MockExecutor::with_config(config);
/// assert_eq!(executor.config().max_drain_rounds, 10);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutorConfig {
    /// Failure handling during drains.
    pub drain_policy: DrainPolicy,
    /// Upper bound on drain rounds for
    /// [`run_until_idle`](super::MockExecutor::run_until_idle).
    pub max_drain_rounds: usize,
}

impl ExecutorConfig {
    /// Default limit for [`run_until_idle`](super::MockExecutor::run_until_idle).
    pub const DEFAULT_MAX_DRAIN_ROUNDS: usize = 1_000;

    /// Create a new default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the drain failure policy.
    #[must_use]
    pub fn drain_policy(mut self, policy: DrainPolicy) -> Self {
        self.drain_policy = policy;
        self
    }

    /// Set the drain round limit.
    #[must_use]
    pub fn max_drain_rounds(mut self, rounds: usize) -> Self {
        self.max_drain_rounds = rounds;
        self
    }
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            drain_policy: DrainPolicy::default(),
            max_drain_rounds: Self::DEFAULT_MAX_DRAIN_ROUNDS,
        }
    }
}
