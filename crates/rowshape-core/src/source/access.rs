use crate::{
    error::MaterializeError,
    source::{AsyncRowCursor, RowColumns, RowCursor, RowSourceError},
};
use futures::future::{self, BoxFuture, Either};
use std::{future::Future, pin::pin};
use tokio_util::sync::CancellationToken;

///
/// RowAccess
///
/// One cursor surface over both driving modes. Stitching is written once
/// against this trait; only `advance` differs between modes.
///

pub(crate) trait RowAccess: Send {
    fn advance(&mut self) -> BoxFuture<'_, Result<bool, MaterializeError>>;

    fn columns(&self) -> &dyn RowColumns;
}

///
/// BlockingAccess
///
/// Advances block the calling thread; the returned future is always ready.
///

pub(crate) struct BlockingAccess<'c, C: RowCursor> {
    cursor: &'c mut C,
    cancel: &'c CancellationToken,
}

impl<'c, C: RowCursor> BlockingAccess<'c, C> {
    pub(crate) const fn new(cursor: &'c mut C, cancel: &'c CancellationToken) -> Self {
        Self { cursor, cancel }
    }
}

impl<C: RowCursor> RowAccess for BlockingAccess<'_, C> {
    fn advance(&mut self) -> BoxFuture<'_, Result<bool, MaterializeError>> {
        let outcome = if self.cancel.is_cancelled() {
            Err(MaterializeError::Cancelled)
        } else {
            self.cursor.advance().map_err(MaterializeError::from)
        };

        Box::pin(future::ready(outcome))
    }

    fn columns(&self) -> &dyn RowColumns {
        &*self.cursor
    }
}

///
/// SuspendingAccess
///
/// Advances yield to the scheduler and race the cancellation token.
///

pub(crate) struct SuspendingAccess<'c, C: AsyncRowCursor> {
    cursor: &'c mut C,
    cancel: &'c CancellationToken,
}

impl<'c, C: AsyncRowCursor> SuspendingAccess<'c, C> {
    pub(crate) const fn new(cursor: &'c mut C, cancel: &'c CancellationToken) -> Self {
        Self { cursor, cancel }
    }
}

impl<C: AsyncRowCursor> RowAccess for SuspendingAccess<'_, C> {
    fn advance(&mut self) -> BoxFuture<'_, Result<bool, MaterializeError>> {
        let cancel = self.cancel;

        Box::pin(run_cancellable(cancel, self.cursor.advance()))
    }

    fn columns(&self) -> &dyn RowColumns {
        &*self.cursor
    }
}

/// Drive one row-source future to completion unless `cancel` fires first.
///
/// Cancellation is checked before polling and raced while waiting; a
/// cancelled call drops the pending source future.
pub(crate) async fn run_cancellable<T>(
    cancel: &CancellationToken,
    operation: impl Future<Output = Result<T, RowSourceError>>,
) -> Result<T, MaterializeError> {
    if cancel.is_cancelled() {
        return Err(MaterializeError::Cancelled);
    }

    let operation = pin!(operation);
    let cancelled = pin!(cancel.cancelled());

    match future::select(operation, cancelled).await {
        Either::Left((outcome, _)) => outcome.map_err(MaterializeError::from),
        Either::Right(((), _)) => Err(MaterializeError::Cancelled),
    }
}
