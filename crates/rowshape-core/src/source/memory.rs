//! In-memory row source.
//!
//! Serves pre-built rows through the same forward-only contract as a real
//! connection, in both driving modes. Failures and stalls can be injected
//! at open or at a specific advance call, and a shared `SourceActivity`
//! records how the enumerator drove the source.

use crate::{
    source::{AsyncRowCursor, AsyncRowSource, RowColumns, RowCursor, RowSource, RowSourceError},
    value::{Value, ValueKind},
};
use async_trait::async_trait;
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

// Cells past the end of a short row read as NULL.
static NULL: Value = Value::Null;

///
/// SourceActivity
///
/// Shared counters observed by tests and callers after an enumeration.
///

#[derive(Clone, Debug, Default)]
pub struct SourceActivity {
    counters: Arc<ActivityCounts>,
}

#[derive(Debug, Default)]
struct ActivityCounts {
    opens: AtomicUsize,
    closes: AtomicUsize,
    cursor_closes: AtomicUsize,
    advances: AtomicUsize,
}

impl SourceActivity {
    /// Number of `open` attempts, including failed ones.
    #[must_use]
    pub fn opens(&self) -> usize {
        self.counters.opens.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn closes(&self) -> usize {
        self.counters.closes.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn cursor_closes(&self) -> usize {
        self.counters.cursor_closes.load(Ordering::Relaxed)
    }

    /// Number of `advance` calls, including the one that hit end of stream.
    #[must_use]
    pub fn advances(&self) -> usize {
        self.counters.advances.load(Ordering::Relaxed)
    }

    fn bump(counter: &AtomicUsize) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

///
/// MemoryRowSource
///

#[derive(Clone, Debug)]
pub struct MemoryRowSource {
    column_count: usize,
    rows: Arc<Vec<Vec<Value>>>,
    activity: SourceActivity,
    open_failure: Option<RowSourceError>,
    advance_failure: Option<(usize, RowSourceError)>,
    stall_at: Option<usize>,
}

impl MemoryRowSource {
    #[must_use]
    pub fn new(column_count: usize, rows: Vec<Vec<Value>>) -> Self {
        Self {
            column_count,
            rows: Arc::new(rows),
            activity: SourceActivity::default(),
            open_failure: None,
            advance_failure: None,
            stall_at: None,
        }
    }

    /// Fail every `open` with `err`.
    #[must_use]
    pub fn with_open_failure(mut self, err: RowSourceError) -> Self {
        self.open_failure = Some(err);
        self
    }

    /// Fail the `call`-th advance (1-based) with `err`.
    #[must_use]
    pub fn with_advance_failure(mut self, call: usize, err: RowSourceError) -> Self {
        self.advance_failure = Some((call, err));
        self
    }

    /// Never resolve the `call`-th advance (1-based) in async mode.
    #[must_use]
    pub const fn with_stall_at(mut self, call: usize) -> Self {
        self.stall_at = Some(call);
        self
    }

    #[must_use]
    pub fn activity(&self) -> SourceActivity {
        self.activity.clone()
    }

    fn open_cursor(&self) -> Result<MemoryCursor, RowSourceError> {
        SourceActivity::bump(&self.activity.counters.opens);

        if let Some(err) = &self.open_failure {
            return Err(err.clone());
        }

        Ok(MemoryCursor {
            column_count: self.column_count,
            rows: Arc::clone(&self.rows),
            activity: self.activity.clone(),
            position: Position::BeforeFirst,
            calls: 0,
            advance_failure: self.advance_failure.clone(),
            stall_at: self.stall_at,
            closed: false,
        })
    }
}

impl RowSource for MemoryRowSource {
    type Cursor = MemoryCursor;

    fn open(&mut self) -> Result<Self::Cursor, RowSourceError> {
        self.open_cursor()
    }

    fn close(&mut self) {
        SourceActivity::bump(&self.activity.counters.closes);
    }
}

#[async_trait]
impl AsyncRowSource for MemoryRowSource {
    type Cursor = MemoryCursor;

    async fn open(&mut self) -> Result<Self::Cursor, RowSourceError> {
        self.open_cursor()
    }

    fn close(&mut self) {
        SourceActivity::bump(&self.activity.counters.closes);
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Position {
    BeforeFirst,
    At(usize),
    AfterLast,
}

///
/// MemoryCursor
///

#[derive(Debug)]
pub struct MemoryCursor {
    column_count: usize,
    rows: Arc<Vec<Vec<Value>>>,
    activity: SourceActivity,
    position: Position,
    calls: usize,
    advance_failure: Option<(usize, RowSourceError)>,
    stall_at: Option<usize>,
    closed: bool,
}

impl MemoryCursor {
    fn step(&mut self) -> Result<bool, RowSourceError> {
        self.calls += 1;
        SourceActivity::bump(&self.activity.counters.advances);

        if let Some((call, err)) = &self.advance_failure
            && *call == self.calls
        {
            return Err(err.clone());
        }

        let next = match self.position {
            Position::BeforeFirst => 0,
            Position::At(index) => index + 1,
            Position::AfterLast => return Ok(false),
        };

        if next < self.rows.len() {
            self.position = Position::At(next);
            Ok(true)
        } else {
            self.position = Position::AfterLast;
            Ok(false)
        }
    }

    fn current(&self) -> Result<&[Value], RowSourceError> {
        match self.position {
            Position::At(index) => Ok(self.rows[index].as_slice()),
            Position::BeforeFirst | Position::AfterLast => Err(RowSourceError::NoCurrentRow),
        }
    }

    fn cell(&self, column: usize) -> Result<&Value, RowSourceError> {
        if column >= self.column_count {
            return Err(RowSourceError::ColumnOutOfRange {
                column,
                column_count: self.column_count,
            });
        }

        Ok(self.current()?.get(column).unwrap_or(&NULL))
    }
}

impl RowColumns for MemoryCursor {
    fn column_count(&self) -> usize {
        self.column_count
    }

    fn is_null(&self, column: usize) -> Result<bool, RowSourceError> {
        Ok(self.cell(column)?.is_null())
    }

    fn read_column(&self, column: usize, _hint: ValueKind) -> Result<Value, RowSourceError> {
        self.cell(column).cloned()
    }
}

impl RowCursor for MemoryCursor {
    fn advance(&mut self) -> Result<bool, RowSourceError> {
        self.step()
    }

    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            SourceActivity::bump(&self.activity.counters.cursor_closes);
        }
    }
}

#[async_trait]
impl AsyncRowCursor for MemoryCursor {
    async fn advance(&mut self) -> Result<bool, RowSourceError> {
        if self.stall_at == Some(self.calls + 1) {
            self.calls += 1;
            SourceActivity::bump(&self.activity.counters.advances);

            return futures::future::pending().await;
        }

        self.step()
    }

    fn close(&mut self) {
        RowCursor::close(self);
    }
}
