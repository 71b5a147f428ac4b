//! Diagnostics sink boundary.
//!
//! Enumerators never log failures directly; every fault flows through
//! `IterationFailure` and a `DiagnosticsSink`, exactly once per fault.

use crate::{error::ErrorClass, value::KeyTuple};
use parking_lot::Mutex;
use std::fmt;

///
/// FailurePhase
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FailurePhase {
    /// Opening the row source or binding the plan to the cursor.
    Open,
    /// Advancing or materializing a root.
    MoveNext,
}

impl fmt::Display for FailurePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Open => "open",
            Self::MoveNext => "move_next",
        };
        write!(f, "{label}")
    }
}

///
/// IterationFailure
///
/// One fault of one enumeration, as reported to diagnostics.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct IterationFailure {
    pub context: String,
    pub phase: FailurePhase,
    pub class: ErrorClass,
    pub message: String,
    /// Outer key of the collection run being stitched when the fault hit.
    pub active_outer_key: Option<KeyTuple>,
}

impl fmt::Display for IterationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: iteration failed during {} ({}): {}",
            self.context, self.phase, self.class, self.message
        )?;

        if let Some(key) = &self.active_outer_key {
            write!(f, " [outer key {key}]")?;
        }

        Ok(())
    }
}

///
/// DiagnosticsSink
///

pub trait DiagnosticsSink: Send + Sync {
    fn report_iteration_failure(&self, failure: &IterationFailure);
}

///
/// LogDiagnosticsSink
///
/// Default sink: forwards failures to the `log` facade.
///

#[derive(Clone, Copy, Debug, Default)]
pub struct LogDiagnosticsSink;

impl DiagnosticsSink for LogDiagnosticsSink {
    fn report_iteration_failure(&self, failure: &IterationFailure) {
        log::error!(target: "rowshape", "{failure}");
    }
}

///
/// MemoryDiagnosticsSink
///
/// Keeps every reported failure in memory.
///

#[derive(Debug, Default)]
pub struct MemoryDiagnosticsSink {
    failures: Mutex<Vec<IterationFailure>>,
}

impl MemoryDiagnosticsSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn failures(&self) -> Vec<IterationFailure> {
        self.failures.lock().clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.failures.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.failures.lock().is_empty()
    }
}

impl DiagnosticsSink for MemoryDiagnosticsSink {
    fn report_iteration_failure(&self, failure: &IterationFailure) {
        self.failures.lock().push(failure.clone());
    }
}
