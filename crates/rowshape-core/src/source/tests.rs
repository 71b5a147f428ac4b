use super::*;
use crate::error::MaterializeError;
use futures::executor::block_on;
use tokio_util::sync::CancellationToken;

fn source() -> MemoryRowSource {
    MemoryRowSource::new(
        2,
        vec![
            vec![Value::Int(1), Value::from("a")],
            vec![Value::Int(2)],
        ],
    )
}

#[test]
fn cursor_walks_rows_then_reports_end() {
    let mut source = source();
    let activity = source.activity();
    let mut cursor = RowSource::open(&mut source).unwrap();

    assert_eq!(cursor.read_column(0, ValueKind::Int), Err(RowSourceError::NoCurrentRow));

    assert!(RowCursor::advance(&mut cursor).unwrap());
    assert_eq!(cursor.read_column(1, ValueKind::Text), Ok(Value::from("a")));

    assert!(RowCursor::advance(&mut cursor).unwrap());
    assert_eq!(cursor.read_column(0, ValueKind::Int), Ok(Value::Int(2)));

    assert!(!RowCursor::advance(&mut cursor).unwrap());
    assert!(!RowCursor::advance(&mut cursor).unwrap());
    assert_eq!(activity.advances(), 4);
}

#[test]
fn short_rows_read_as_null() {
    let mut source = source();
    let mut cursor = RowSource::open(&mut source).unwrap();
    RowCursor::advance(&mut cursor).unwrap();
    RowCursor::advance(&mut cursor).unwrap();

    assert_eq!(cursor.is_null(1), Ok(true));
    assert_eq!(cursor.is_null(0), Ok(false));
}

#[test]
fn column_reads_are_bounds_checked() {
    let mut source = source();
    let mut cursor = RowSource::open(&mut source).unwrap();
    RowCursor::advance(&mut cursor).unwrap();

    assert_eq!(
        cursor.read_column(2, ValueKind::Int),
        Err(RowSourceError::ColumnOutOfRange {
            column: 2,
            column_count: 2,
        })
    );
}

#[test]
fn open_failure_is_counted() {
    let mut source = source().with_open_failure(RowSourceError::open("refused"));
    let activity = source.activity();

    let err = RowSource::open(&mut source).unwrap_err();

    assert_eq!(err, RowSourceError::open("refused"));
    assert_eq!(activity.opens(), 1);
}

#[test]
fn advance_failure_hits_the_requested_call() {
    let mut source = source().with_advance_failure(2, RowSourceError::advance("lost"));
    let mut cursor = RowSource::open(&mut source).unwrap();

    assert_eq!(RowCursor::advance(&mut cursor), Ok(true));
    assert_eq!(
        RowCursor::advance(&mut cursor),
        Err(RowSourceError::advance("lost"))
    );
}

#[test]
fn cursor_close_is_idempotent() {
    let mut source = source();
    let activity = source.activity();
    let mut cursor = RowSource::open(&mut source).unwrap();

    RowCursor::close(&mut cursor);
    RowCursor::close(&mut cursor);
    RowSource::close(&mut source);

    assert_eq!(activity.cursor_closes(), 1);
    assert_eq!(activity.closes(), 1);
}

#[test]
fn blocking_access_observes_cancellation_before_advancing() {
    let mut source = source();
    let activity = source.activity();
    let mut cursor = RowSource::open(&mut source).unwrap();
    let cancel = CancellationToken::new();
    let mut access = BlockingAccess::new(&mut cursor, &cancel);

    assert!(block_on(access.advance()).unwrap());

    cancel.cancel();
    let err = block_on(access.advance()).unwrap_err();

    assert!(matches!(err, MaterializeError::Cancelled));
    assert_eq!(activity.advances(), 1);
}

#[test]
fn suspending_access_forwards_cursor_outcomes() {
    let mut source = source();
    let mut cursor = block_on(AsyncRowSource::open(&mut source)).unwrap();
    let cancel = CancellationToken::new();
    let mut access = SuspendingAccess::new(&mut cursor, &cancel);

    assert!(block_on(access.advance()).unwrap());
    assert_eq!(
        access.columns().read_column(0, ValueKind::Int),
        Ok(Value::Int(1))
    );
    assert!(block_on(access.advance()).unwrap());
    assert!(!block_on(access.advance()).unwrap());
}

#[test]
fn run_cancellable_returns_cancelled_for_a_stalled_advance() {
    let mut source = source().with_stall_at(1);
    let activity = source.activity();
    let mut cursor = block_on(AsyncRowSource::open(&mut source)).unwrap();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let outcome = block_on(run_cancellable(&cancel, AsyncRowCursor::advance(&mut cursor)));

    assert!(matches!(outcome, Err(MaterializeError::Cancelled)));
    // cancelled before the stalled call was polled
    assert_eq!(activity.advances(), 0);
}
