//! Error definitions
//!
//! This module provides error types for testkit-executor.

use thiserror::Error;

use crate::executor::WorkFailure;

/// Main error type for testkit-executor
#[derive(Error, Debug)]
pub enum Error {
    /// One or more work items failed while draining the queue
    #[error("{count} work item(s) failed during drain, first: {first}", count = .failures.len(), first = first_failure(.failures))]
    DrainFailed {
        /// Every failure observed during the drain, in execution order.
        failures: Vec<WorkFailure>,
    },

    /// Work kept scheduling more work past the configured round limit
    #[error("Queue still not idle after {0} drain rounds")]
    DrainLimitExceeded(usize),

    /// No constructor with the requested parameter types
    #[error("No constructor {signature} declared on {class}")]
    NoSuchConstructor {
        /// Class that was searched.
        class: String,
        /// Requested parameter list.
        signature: String,
    },

    /// No method with the requested name and parameter types in the hierarchy
    #[error("No method {name}{signature} found on {class} or its ancestors")]
    NoSuchMethod {
        /// Class the lookup started from.
        class: String,
        /// Requested method name.
        name: String,
        /// Requested parameter list.
        signature: String,
    },

    /// No field with the requested name in the hierarchy
    #[error("No field {name} found on {class} or its ancestors")]
    NoSuchField {
        /// Class the lookup started from.
        class: String,
        /// Requested field name.
        name: String,
    },

    /// Receiver missing or of the wrong type
    #[error("Illegal access: {0}")]
    IllegalAccess(String),

    /// Argument missing or of the wrong type
    #[error("Illegal argument: {0}")]
    IllegalArgument(String),

    /// A member produced a value of an unexpected type
    #[error("Type mismatch: expected {expected} from {member}")]
    TypeMismatch {
        /// Member that produced the value.
        member: String,
        /// Type the caller asked for.
        expected: &'static str,
    },

    /// A member body reported an error
    #[error("Invocation failed: {0}")]
    Invocation(String),

    /// Enum class without constants
    #[error("Enum {0} declares no constants")]
    EmptyEnum(String),

    /// Assertion failed
    #[error("Assertion failed: {0}")]
    AssertionFailed(String),
}

fn first_failure(failures: &[WorkFailure]) -> String {
    failures
        .first()
        .map_or_else(|| "none".to_string(), ToString::to_string)
}

impl Error {
    /// Create an illegal access error.
    #[must_use]
    pub fn illegal_access(message: impl Into<String>) -> Self {
        Self::IllegalAccess(message.into())
    }

    /// Create an illegal argument error.
    #[must_use]
    pub fn illegal_argument(message: impl Into<String>) -> Self {
        Self::IllegalArgument(message.into())
    }

    /// Create an invocation error, for use inside registered member bodies.
    #[must_use]
    pub fn invocation(message: impl Into<String>) -> Self {
        Self::Invocation(message.into())
    }

    /// Returns the work failures carried by a [`Error::DrainFailed`].
    #[must_use]
    pub fn work_failures(&self) -> &[WorkFailure] {
        match self {
            Self::DrainFailed { failures } => failures,
            _ => &[],
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
