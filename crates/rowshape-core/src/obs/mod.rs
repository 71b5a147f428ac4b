//! Observability: iteration-failure diagnostics and enumeration counters.

mod sink;

#[cfg(test)]
mod tests;

use serde::Serialize;

// re-exports
pub use sink::{
    DiagnosticsSink, FailurePhase, IterationFailure, LogDiagnosticsSink, MemoryDiagnosticsSink,
};

///
/// EnumerationStats
///
/// Point-in-time counters for one enumeration.
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
pub struct EnumerationStats {
    pub rows_advanced: u64,
    pub roots_yielded: u64,
    pub duplicates_skipped: u64,
}
