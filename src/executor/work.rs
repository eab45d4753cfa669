//! Work item types for the mock executor.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};

/// A unit of deferred work accepted by an [`Executor`](super::Executor).
pub type Work = Box<dyn FnOnce() + Send + 'static>;

/// Unique identifier for a submitted work item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WorkId(u64);

impl WorkId {
    /// Creates a new unique work ID.
    pub(crate) fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw ID value.
    #[must_use]
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for WorkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Work({})", self.0)
    }
}

/// Information about a queued work item.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkInfo {
    /// The item's unique identifier.
    pub id: WorkId,
    /// Optional name for debugging.
    pub name: Option<String>,
}

/// How a work item failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureKind {
    /// The work panicked.
    Panicked,
    /// Fallible work returned an error.
    Returned,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Panicked => write!(f, "panicked"),
            FailureKind::Returned => write!(f, "returned an error"),
        }
    }
}

/// A work item that failed while the queue was drained.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkFailure {
    /// The failed item's identifier.
    pub id: WorkId,
    /// The failed item's name, if it was given one.
    pub name: Option<String>,
    /// Whether the item panicked or returned an error.
    pub kind: FailureKind,
    /// Panic payload or error message.
    pub message: String,
}

impl WorkFailure {
    pub(crate) fn new(
        id: WorkId,
        name: Option<String>,
        kind: FailureKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name,
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for WorkFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{} ({name}) {}: {}", self.id, self.kind, self.message),
            None => write!(f, "{} {}: {}", self.id, self.kind, self.message),
        }
    }
}

type BoxedRun = Box<dyn FnOnce() -> Result<(), String> + Send + 'static>;

/// Internal work item representation.
pub(crate) struct WorkItem {
    pub id: WorkId,
    pub name: Option<String>,
    run: BoxedRun,
}

impl WorkItem {
    /// Wraps infallible work.
    pub fn new<F>(name: Option<String>, work: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self::fallible(name, move || {
            work();
            Ok::<(), String>(())
        })
    }

    /// Wraps work whose error is kept as its display text.
    pub fn fallible<F, E>(name: Option<String>, work: F) -> Self
    where
        F: FnOnce() -> Result<(), E> + Send + 'static,
        E: fmt::Display,
    {
        Self {
            id: WorkId::new(),
            name,
            run: Box::new(move || work().map_err(|e| e.to_string())),
        }
    }

    pub fn info(&self) -> WorkInfo {
        WorkInfo {
            id: self.id,
            name: self.name.clone(),
        }
    }

    /// Runs the item, converting a panic or an error into a [`WorkFailure`].
    pub fn run(self) -> Result<(), WorkFailure> {
        let Self { id, name, run } = self;
        match panic::catch_unwind(AssertUnwindSafe(run)) {
            Ok(Ok(())) => Ok(()),
            Ok(Err(message)) => Err(WorkFailure::new(id, name, FailureKind::Returned, message)),
            Err(payload) => Err(WorkFailure::new(
                id,
                name,
                FailureKind::Panicked,
                panic_message(&*payload),
            )),
        }
    }
}

impl fmt::Debug for WorkItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkItem")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
