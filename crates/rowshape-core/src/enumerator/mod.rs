//! Streaming enumerators: own the cursor lifetime and yield one materialized
//! root per `move_next`.
//!
//! Both modes share the lifecycle below and the same stitching future; they
//! differ only in how `open` and `advance` wait on the row source.

mod blocking;
mod suspending;


use crate::{
    error::MaterializeError,
    materialize::{Materialized, ResultCoordinator},
    obs::{DiagnosticsSink, EnumerationStats, FailurePhase, IterationFailure, LogDiagnosticsSink},
    options::MaterializeOptions,
    shape::{PlanError, ShapePlan},
    tracking::ChangeTracker,
};
use std::{fmt, sync::Arc};
use tokio_util::sync::CancellationToken;

// re-exports
pub use blocking::{Enumerator, ShapedQuery};
pub use suspending::{AsyncEnumerator, AsyncShapedQuery};

///
/// EnumeratorState
///
/// `NotStarted -> Active -> Exhausted`, with `Faulted` reachable from any
/// state. `Exhausted` and `Faulted` are terminal.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EnumeratorState {
    NotStarted,
    Active,
    Exhausted,
    Faulted,
}

impl EnumeratorState {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Exhausted | Self::Faulted)
    }
}

impl fmt::Display for EnumeratorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::NotStarted => "not_started",
            Self::Active => "active",
            Self::Exhausted => "exhausted",
            Self::Faulted => "faulted",
        };
        write!(f, "{label}")
    }
}

///
/// QueryContext
///
/// Everything a query needs besides its row source.
///

#[derive(Clone)]
pub(crate) struct QueryContext {
    pub(crate) plan: ShapePlan,
    pub(crate) options: MaterializeOptions,
    pub(crate) diagnostics: Arc<dyn DiagnosticsSink>,
    pub(crate) tracker: Option<Arc<dyn ChangeTracker>>,
    pub(crate) cancel: CancellationToken,
}

impl QueryContext {
    pub(crate) fn new(plan: ShapePlan) -> Self {
        Self {
            plan,
            options: MaterializeOptions::default(),
            diagnostics: Arc::new(LogDiagnosticsSink),
            tracker: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Tracker to stitch through, if tracking is on.
    pub(crate) fn active_tracker(&self) -> Result<Option<&dyn ChangeTracker>, PlanError> {
        if !self.options.tracking {
            return Ok(None);
        }

        self.tracker
            .as_deref()
            .map(Some)
            .ok_or(PlanError::TrackerRequired)
    }

    pub(crate) fn label(&self) -> &str {
        &self.options.context_label
    }
}

impl fmt::Debug for QueryContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryContext")
            .field("fingerprint", &self.plan.fingerprint())
            .field("options", &self.options)
            .field("tracker", &self.tracker.is_some())
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}

///
/// Handles
///
/// Mode-specific resources a `Lifecycle` closes on release.
///

pub(crate) trait Handles {
    fn context(&self) -> &QueryContext;

    /// Close and drop the cursor, if one is open.
    fn close_cursor(&mut self);

    fn close_connection(&mut self);
}

///
/// Lifecycle
///
/// Mode-independent enumeration state: transitions, fault reporting and
/// resource release. Each step runs to completion or the enumeration is
/// abandoned; a step whose future was dropped midway leaves `in_flight` set.
///

#[derive(Debug)]
pub(crate) struct Lifecycle {
    state: EnumeratorState,
    coordinator: ResultCoordinator,
    current: Option<Materialized>,
    roots_yielded: u64,
    connection_open: bool,
    in_flight: bool,
}

impl Lifecycle {
    pub(crate) fn new() -> Self {
        Self {
            state: EnumeratorState::NotStarted,
            coordinator: ResultCoordinator::new(),
            current: None,
            roots_yielded: 0,
            connection_open: false,
            in_flight: false,
        }
    }

    /// Start a step. Returns `false` if the previous step never finished.
    pub(crate) fn enter_step(&mut self) -> bool {
        if self.in_flight {
            return false;
        }
        self.in_flight = true;

        true
    }

    pub(crate) fn leave_step(&mut self) {
        self.in_flight = false;
    }

    /// Fault an enumeration whose previous step was dropped before it
    /// finished; its collection run is incomplete and cannot be resumed.
    pub(crate) fn abandon(&mut self, handles: &mut impl Handles) -> MaterializeError {
        let phase = if self.state == EnumeratorState::NotStarted {
            FailurePhase::Open
        } else {
            FailurePhase::MoveNext
        };
        self.in_flight = false;

        self.fail(handles, phase, MaterializeError::Cancelled)
    }

    /// Checks that run before the row source is opened.
    pub(crate) fn before_open(&mut self, handles: &mut impl Handles) -> Result<(), MaterializeError> {
        log::debug!(target: "rowshape", "{}: opening row source", handles.context().label());

        if let Err(err) = handles.context().active_tracker().map(|_| ()) {
            return Err(self.fail(handles, FailurePhase::Open, err.into()));
        }

        // from here on the connection must be closed
        self.connection_open = true;
        self.coordinator = ResultCoordinator::new();

        Ok(())
    }

    /// The cursor is open: go active and bind the plan to its width.
    pub(crate) fn after_open(
        &mut self,
        handles: &mut impl Handles,
        column_count: usize,
    ) -> Result<(), MaterializeError> {
        self.state = EnumeratorState::Active;

        let context = handles.context();
        let checked = if context.options.validate_columns {
            context.plan.validate_columns(column_count)
        } else {
            Ok(())
        };

        checked.map_err(|err| self.fail(handles, FailurePhase::Open, err.into()))
    }

    pub(crate) fn yield_root(&mut self, root: Materialized) {
        self.current = Some(root);
        self.roots_yielded += 1;
    }

    /// End of stream: log, release, and move to `Exhausted`.
    pub(crate) fn finish(&mut self, handles: &mut impl Handles) {
        if self.state == EnumeratorState::Active {
            log::debug!(
                target: "rowshape",
                "{}: exhausted after {} rows, {} roots",
                handles.context().label(),
                self.coordinator.rows_advanced(),
                self.roots_yielded
            );
        }

        self.dispose(handles);
    }

    /// Release resources and move to `Exhausted` unless already terminal.
    pub(crate) fn dispose(&mut self, handles: &mut impl Handles) {
        self.release(handles);

        self.current = None;
        if !self.state.is_terminal() {
            self.state = EnumeratorState::Exhausted;
        }
    }

    /// Move to `Faulted`, report once, release, and hand the error back.
    pub(crate) fn fail(
        &mut self,
        handles: &mut impl Handles,
        phase: FailurePhase,
        err: MaterializeError,
    ) -> MaterializeError {
        self.current = None;
        self.state = EnumeratorState::Faulted;

        let context = handles.context();
        let failure = IterationFailure {
            context: context.label().to_string(),
            phase,
            class: err.class(),
            message: err.to_string(),
            active_outer_key: self.coordinator.active_outer_key().cloned(),
        };
        context.diagnostics.report_iteration_failure(&failure);

        self.release(handles);

        err
    }

    /// Close the cursor, then the connection at most once.
    fn release(&mut self, handles: &mut impl Handles) {
        handles.close_cursor();

        if self.connection_open {
            self.connection_open = false;
            handles.close_connection();
            log::trace!(target: "rowshape", "{}: connection closed", handles.context().label());
        }
    }

    pub(crate) const fn state(&self) -> EnumeratorState {
        self.state
    }

    pub(crate) const fn current(&self) -> Option<&Materialized> {
        self.current.as_ref()
    }

    pub(crate) const fn coordinator_mut(&mut self) -> &mut ResultCoordinator {
        &mut self.coordinator
    }

    pub(crate) const fn is_exhausted(&self) -> bool {
        self.coordinator.is_exhausted()
    }

    pub(crate) const fn stats(&self) -> EnumerationStats {
        EnumerationStats {
            rows_advanced: self.coordinator.rows_advanced(),
            roots_yielded: self.roots_yielded,
            duplicates_skipped: self.coordinator.duplicates_skipped(),
        }
    }
}
