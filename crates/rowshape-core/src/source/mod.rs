//! Row-source collaborator contracts.
//!
//! A row source hands out one forward-only cursor per enumeration. Column
//! reads address the current row by index and never wait on I/O; only
//! `open` and `advance` may block (blocking mode) or suspend (async mode).

mod access;
pub mod memory;

#[cfg(test)]
mod tests;

use crate::value::{Value, ValueKind};
use async_trait::async_trait;
use thiserror::Error as ThisError;

// re-exports
pub(crate) use access::{BlockingAccess, RowAccess, SuspendingAccess, run_cancellable};
pub use memory::{MemoryCursor, MemoryRowSource, SourceActivity};

///
/// RowSourceError
///
/// Open, advance, and read failures reported by the row source.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum RowSourceError {
    #[error("cursor advance failed: {message}")]
    Advance { message: String },

    #[error("column {column} out of range ({column_count} columns)")]
    ColumnOutOfRange { column: usize, column_count: usize },

    #[error("cursor is not positioned on a row")]
    NoCurrentRow,

    #[error("row source open failed: {message}")]
    Open { message: String },

    #[error("column {column} read failed: {message}")]
    Read { column: usize, message: String },
}

impl RowSourceError {
    pub fn advance(message: impl Into<String>) -> Self {
        Self::Advance {
            message: message.into(),
        }
    }

    pub fn open(message: impl Into<String>) -> Self {
        Self::Open {
            message: message.into(),
        }
    }

    pub fn read(column: usize, message: impl Into<String>) -> Self {
        Self::Read {
            column,
            message: message.into(),
        }
    }
}

///
/// RowColumns
///
/// Column access on the current row. Shared by both cursor modes.
///

pub trait RowColumns {
    fn column_count(&self) -> usize;

    fn is_null(&self, column: usize) -> Result<bool, RowSourceError>;

    /// Read the provider-native value at `column`; `hint` is the kind the
    /// plan expects the provider to return.
    fn read_column(&self, column: usize, hint: ValueKind) -> Result<Value, RowSourceError>;
}

///
/// RowCursor
///
/// Blocking forward-only cursor.
///

pub trait RowCursor: RowColumns + Send {
    /// Move to the next row; `false` at end of stream.
    fn advance(&mut self) -> Result<bool, RowSourceError>;

    fn close(&mut self) {}
}

///
/// RowSource
///
/// Blocking row source (the connection side of a query).
///

pub trait RowSource {
    type Cursor: RowCursor;

    fn open(&mut self) -> Result<Self::Cursor, RowSourceError>;

    /// Release the underlying connection. Called on every exit path,
    /// including after a failed `open`.
    fn close(&mut self);
}

///
/// AsyncRowCursor
///
/// Suspending forward-only cursor.
///

#[async_trait]
pub trait AsyncRowCursor: RowColumns + Send {
    async fn advance(&mut self) -> Result<bool, RowSourceError>;

    fn close(&mut self) {}
}

///
/// AsyncRowSource
///

#[async_trait]
pub trait AsyncRowSource: Send {
    type Cursor: AsyncRowCursor;

    async fn open(&mut self) -> Result<Self::Cursor, RowSourceError>;

    fn close(&mut self);
}
