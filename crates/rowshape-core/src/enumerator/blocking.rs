use crate::{
    enumerator::{EnumeratorState, Handles, Lifecycle, QueryContext},
    error::MaterializeError,
    materialize::{Materialized, Materializer},
    obs::{DiagnosticsSink, EnumerationStats, FailurePhase},
    options::MaterializeOptions,
    shape::ShapePlan,
    source::{BlockingAccess, RowColumns, RowCursor, RowSource},
    tracking::ChangeTracker,
};
use futures::executor::block_on;
use std::{iter::FusedIterator, sync::Arc};
use tokio_util::sync::CancellationToken;

///
/// ShapedQuery
///
/// A compiled plan bound to a blocking row source. `iter` borrows the query
/// mutably, so at most one traversal is active at a time.
///

#[derive(Debug)]
pub struct ShapedQuery<S: RowSource> {
    source: S,
    context: QueryContext,
}

impl<S: RowSource> ShapedQuery<S> {
    #[must_use]
    pub fn new(plan: ShapePlan, source: S) -> Self {
        Self {
            source,
            context: QueryContext::new(plan),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: MaterializeOptions) -> Self {
        self.context.options = options;
        self
    }

    #[must_use]
    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn DiagnosticsSink>) -> Self {
        self.context.diagnostics = diagnostics;
        self
    }

    #[must_use]
    pub fn with_tracker(mut self, tracker: Arc<dyn ChangeTracker>) -> Self {
        self.context.tracker = Some(tracker);
        self
    }

    /// Cancel from another thread; checked before every advance.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.context.cancel = cancel;
        self
    }

    #[must_use]
    pub fn plan(&self) -> &ShapePlan {
        &self.context.plan
    }

    #[must_use]
    pub const fn options(&self) -> &MaterializeOptions {
        &self.context.options
    }

    #[must_use]
    pub const fn source(&self) -> &S {
        &self.source
    }

    /// Start a new traversal. Nothing is opened until the first `move_next`.
    pub fn iter(&mut self) -> Enumerator<'_, S> {
        Enumerator {
            handles: BlockingHandles {
                query: self,
                cursor: None,
            },
            life: Lifecycle::new(),
        }
    }
}

///
/// BlockingHandles
///

struct BlockingHandles<'q, S: RowSource> {
    query: &'q mut ShapedQuery<S>,
    cursor: Option<S::Cursor>,
}

impl<S: RowSource> Handles for BlockingHandles<'_, S> {
    fn context(&self) -> &QueryContext {
        &self.query.context
    }

    fn close_cursor(&mut self) {
        if let Some(mut cursor) = self.cursor.take() {
            cursor.close();
        }
    }

    fn close_connection(&mut self) {
        self.query.source.close();
    }
}

///
/// Enumerator
///
/// Blocking, forward-only traversal. Dropping it disposes it.
///

pub struct Enumerator<'q, S: RowSource> {
    handles: BlockingHandles<'q, S>,
    life: Lifecycle,
}

impl<S: RowSource> Enumerator<'_, S> {
    /// Advance to the next root. `Ok(false)` once exhausted, faulted or
    /// disposed.
    pub fn move_next(&mut self) -> Result<bool, MaterializeError> {
        if self.life.state().is_terminal() {
            return Ok(false);
        }
        if !self.life.enter_step() {
            return Err(self.life.abandon(&mut self.handles));
        }

        let advanced = self.step();
        self.life.leave_step();

        advanced
    }

    /// Root produced by the last successful `move_next`.
    #[must_use]
    pub const fn current(&self) -> Option<&Materialized> {
        self.life.current()
    }

    #[must_use]
    pub const fn state(&self) -> EnumeratorState {
        self.life.state()
    }

    #[must_use]
    pub const fn stats(&self) -> EnumerationStats {
        self.life.stats()
    }

    /// Release the cursor and close the connection. Safe to call repeatedly;
    /// a disposed enumerator yields nothing further.
    pub fn dispose(&mut self) {
        self.life.dispose(&mut self.handles);
    }

    /// Enumerators are forward-only.
    ///
    /// # Panics
    ///
    /// Always; rewinding is a programming error.
    #[allow(clippy::unused_self)]
    pub fn reset(&mut self) {
        panic!("enumerator is forward-only and cannot be reset");
    }

    fn step(&mut self) -> Result<bool, MaterializeError> {
        if self.life.state() == EnumeratorState::NotStarted {
            self.start()?;
        }

        if self.life.is_exhausted() {
            self.life.finish(&mut self.handles);
            return Ok(false);
        }

        match self.fetch_next() {
            Ok(Some(root)) => {
                self.life.yield_root(root);
                Ok(true)
            }
            Ok(None) => {
                self.life.finish(&mut self.handles);
                Ok(false)
            }
            Err(err) => Err(self.life.fail(&mut self.handles, FailurePhase::MoveNext, err)),
        }
    }

    fn start(&mut self) -> Result<(), MaterializeError> {
        self.life.before_open(&mut self.handles)?;

        let cursor = match self.handles.query.source.open() {
            Ok(cursor) => cursor,
            Err(err) => return Err(self.life.fail(&mut self.handles, FailurePhase::Open, err.into())),
        };
        let column_count = cursor.column_count();
        self.handles.cursor = Some(cursor);

        self.life.after_open(&mut self.handles, column_count)
    }

    fn fetch_next(&mut self) -> Result<Option<Materialized>, MaterializeError> {
        let Some(cursor) = self.handles.cursor.as_mut() else {
            return Ok(None);
        };
        let context = &self.handles.query.context;
        let materializer = Materializer::new(
            context.options.detailed_errors,
            context.active_tracker()?,
        );
        let mut access = BlockingAccess::new(cursor, &context.cancel);
        let coordinator = self.life.coordinator_mut();

        block_on(async {
            if !coordinator.next_row(&mut access).await? {
                return Ok(None);
            }
            coordinator.begin_root();

            materializer
                .materialize(context.plan.root(), &mut access, coordinator)
                .await
                .map(Some)
        })
    }
}

impl<S: RowSource> Drop for Enumerator<'_, S> {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl<S: RowSource> Iterator for Enumerator<'_, S> {
    type Item = Result<Materialized, MaterializeError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.move_next() {
            Ok(true) => self.life.current().cloned().map(Ok),
            Ok(false) => None,
            Err(err) => Some(Err(err)),
        }
    }
}

impl<S: RowSource> FusedIterator for Enumerator<'_, S> {}
