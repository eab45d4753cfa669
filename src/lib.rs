//! # testkit-executor
//!
//! > Deterministic executor double for unit tests
//!
//! Code that hands work to a background executor is hard to test: the work
//! runs "sometime later" on another thread. **testkit-executor** replaces the
//! executor with [`MockExecutor`](executor::MockExecutor), which captures
//! submitted work and runs it only when the test says so.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::atomic::{AtomicBool, Ordering};
//! use std::sync::Arc;
//! use testkit_executor::prelude::*;
//!
//! let executor = MockExecutor::new();
//! let sent = Arc::new(AtomicBool::new(false));
//!
//! let flag = Arc::clone(&sent);
//! executor.execute(Box::new(move || flag.store(true, Ordering::SeqCst)));
//!
//! assert_eq!(executor.pending_count(), 1);
//! assert!(!sent.load(Ordering::SeqCst));
//!
//! executor.drain_all().unwrap();
//! assert!(sent.load(Ordering::SeqCst));
//! ```
//!
//! ## Features
//!
//! - **Mock Executor** - Capture work, then drain it in submission order
//! - **Drain Policies** - Stop at the first failing item or run them all
//! - **Member Access** - Reach hidden constructors, methods and fields by name
//! - **Test Macro** - `#[testkit_executor::test]` injects a fresh executor

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod executor;
pub mod reflect;

/// Prelude for convenient imports
///
/// ```rust
/// use testkit_executor::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::executor::{
        DrainGuard, DrainPolicy, Executor, ExecutorConfig, MockExecutor, Work, WorkFailure,
        WorkId, WorkInfo,
    };
    pub use crate::reflect::{ArgType, Args, Class, ClassBuilder, Enumerated, Inherits};
}

// Re-exports
pub use error::{Error, Result};

// Re-export the test macro when macros feature is enabled
#[cfg(feature = "macros")]
pub use testkit_executor_macros::test;
