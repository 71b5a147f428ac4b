use crate::{
    materialize::ColumnReadError, model::ModelError, shape::PlanError, source::RowSourceError,
};
use std::fmt;
use thiserror::Error as ThisError;

///
/// MaterializeError
///
/// Every failure an enumeration can surface. Each variant keeps the
/// collaborator's original error untouched; all of them are fatal to the
/// enumeration that produced them and none are retried.
///

#[derive(Debug, ThisError)]
pub enum MaterializeError {
    #[error("enumeration cancelled")]
    Cancelled,

    #[error(transparent)]
    ColumnRead(#[from] ColumnReadError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error(transparent)]
    RowSource(#[from] RowSourceError),
}

impl MaterializeError {
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::Cancelled => ErrorClass::Cancelled,
            Self::ColumnRead(_) => ErrorClass::ColumnRead,
            Self::Model(_) => ErrorClass::Model,
            Self::Plan(_) => ErrorClass::Plan,
            Self::RowSource(_) => ErrorClass::RowSource,
        }
    }

    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    #[must_use]
    pub fn display_with_class(&self) -> String {
        format!("{}: {self}", self.class())
    }
}

///
/// ErrorClass
/// Error taxonomy reported to diagnostics.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorClass {
    Cancelled,
    ColumnRead,
    Model,
    Plan,
    RowSource,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Cancelled => "cancelled",
            Self::ColumnRead => "column_read",
            Self::Model => "model",
            Self::Plan => "plan",
            Self::RowSource => "row_source",
        };
        write!(f, "{label}")
    }
}
