use crate::{
    enumerator::{EnumeratorState, Handles, Lifecycle, QueryContext},
    error::MaterializeError,
    materialize::{Materialized, Materializer},
    obs::{DiagnosticsSink, EnumerationStats, FailurePhase},
    options::MaterializeOptions,
    shape::ShapePlan,
    source::{AsyncRowCursor, AsyncRowSource, RowColumns, SuspendingAccess, run_cancellable},
    tracking::ChangeTracker,
};
use futures::{Stream, stream};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

///
/// AsyncShapedQuery
///
/// A compiled plan bound to a suspending row source. Opening and every
/// advance yield to the scheduler and observe the cancellation token.
///

#[derive(Debug)]
pub struct AsyncShapedQuery<S: AsyncRowSource> {
    source: S,
    context: QueryContext,
}

impl<S: AsyncRowSource> AsyncShapedQuery<S> {
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

    /// Token observed at every suspension point of this query.
    #[must_use]
    pub const fn cancellation_token(&self) -> &CancellationToken {
        &self.context.cancel
    }

    pub fn iter(&mut self) -> AsyncEnumerator<'_, S> {
        AsyncEnumerator {
            handles: SuspendingHandles {
                query: self,
                cursor: None,
            },
            life: Lifecycle::new(),
        }
    }
}

///
/// SuspendingHandles
///

struct SuspendingHandles<'q, S: AsyncRowSource> {
    query: &'q mut AsyncShapedQuery<S>,
    cursor: Option<S::Cursor>,
}

impl<S: AsyncRowSource> Handles for SuspendingHandles<'_, S> {
    fn context(&self) -> &QueryContext {
        &self.query.context
    }

    fn close_cursor(&mut self) {
        if let Some(mut cursor) = self.cursor.take() {
            AsyncRowCursor::close(&mut cursor);
        }
    }

    fn close_connection(&mut self) {
        self.query.source.close();
    }
}

///
/// AsyncEnumerator
///
/// Dropping a `move_next` future before it resolves abandons the traversal:
/// the next call faults with `Cancelled` instead of resuming a partial root.
///

pub struct AsyncEnumerator<'q, S: AsyncRowSource> {
    handles: SuspendingHandles<'q, S>,
    life: Lifecycle,
}

impl<S: AsyncRowSource> AsyncEnumerator<'_, S> {
    /// Advance to the next root. A cancellation observed while waiting fails
    /// this call; no partially stitched root is exposed.
    pub async fn move_next(&mut self) -> Result<bool, MaterializeError> {
        if self.life.state().is_terminal() {
            return Ok(false);
        }
        if !self.life.enter_step() {
            return Err(self.life.abandon(&mut self.handles));
        }

        let advanced = self.step().await;
        self.life.leave_step();

        advanced
    }

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

    /// Release the cursor and close the connection. Safe to call repeatedly.
    pub fn dispose(&mut self) {
        self.life.dispose(&mut self.handles);
    }

    /// # Panics
    ///
    /// Always; enumerators are forward-only.
    #[allow(clippy::unused_self)]
    pub fn reset(&mut self) {
        panic!("enumerator is forward-only and cannot be reset");
    }

    /// Turn the enumerator into a stream of roots. The stream ends after the
    /// first error.
    pub fn into_stream(self) -> impl Stream<Item = Result<Materialized, MaterializeError>> {
        stream::try_unfold(self, |mut enumerator| async move {
            let root = if enumerator.move_next().await? {
                enumerator.life.current().cloned()
            } else {
                None
            };

            Ok::<_, MaterializeError>(root.map(|root| (root, enumerator)))
        })
    }

    async fn step(&mut self) -> Result<bool, MaterializeError> {
        if self.life.state() == EnumeratorState::NotStarted {
            self.start().await?;
        }

        if self.life.is_exhausted() {
            self.life.finish(&mut self.handles);
            return Ok(false);
        }

        match self.fetch_next().await {
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

    async fn start(&mut self) -> Result<(), MaterializeError> {
        self.life.before_open(&mut self.handles)?;

        let query = &mut *self.handles.query;
        let opened = run_cancellable(&query.context.cancel, query.source.open()).await;
        let cursor = match opened {
            Ok(cursor) => cursor,
            Err(err) => return Err(self.life.fail(&mut self.handles, FailurePhase::Open, err)),
        };
        let column_count = cursor.column_count();
        self.handles.cursor = Some(cursor);

        self.life.after_open(&mut self.handles, column_count)
    }

    async fn fetch_next(&mut self) -> Result<Option<Materialized>, MaterializeError> {
        let Some(cursor) = self.handles.cursor.as_mut() else {
            return Ok(None);
        };
        let context = &self.handles.query.context;
        let materializer = Materializer::new(
            context.options.detailed_errors,
            context.active_tracker()?,
        );
        let mut access = SuspendingAccess::new(cursor, &context.cancel);
        let coordinator = self.life.coordinator_mut();

        if !coordinator.next_row(&mut access).await? {
            return Ok(None);
        }
        coordinator.begin_root();

        materializer
            .materialize(context.plan.root(), &mut access, coordinator)
            .await
            .map(Some)
    }
}

impl<S: AsyncRowSource> Drop for AsyncEnumerator<'_, S> {
    fn drop(&mut self) {
        self.dispose();
    }
}
