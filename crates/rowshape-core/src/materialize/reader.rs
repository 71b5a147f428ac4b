use crate::{
    shape::{ConvertError, KeySelector, ValueBinding},
    source::{RowColumns, RowSourceError},
    value::{KeyTuple, TargetType, Value, ValueKind},
};
use thiserror::Error as ThisError;

///
/// ColumnReadError
///
/// A column did not match what the plan expected of it. Always fatal: the
/// plan is stale or was built against a different row source.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[error("column {column} read as {target} failed: {reason}")]
pub struct ColumnReadError {
    pub column: usize,
    pub target: TargetType,
    pub reason: ColumnReadReason,
}

///
/// ColumnReadReason
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum ColumnReadReason {
    #[error(transparent)]
    Source(RowSourceError),

    #[error("converter rejected value: {0}")]
    Convert(ConvertError),

    #[error("{}", describe_coerce(.found, .value))]
    Coerce {
        found: Option<ValueKind>,
        /// Raw value, kept only when detailed errors are enabled.
        value: Option<Value>,
    },

    #[error("unexpected NULL in a non-nullable column")]
    UnexpectedNull,
}

fn describe_coerce(found: &Option<ValueKind>, value: &Option<Value>) -> String {
    let found = found.map_or("null", ValueKind::label);

    match value {
        Some(value) => format!("cannot coerce {found} value {value}"),
        None => format!("cannot coerce {found} value"),
    }
}

/// Read one scalar from the current row.
///
/// A nullable binding that reads NULL yields the target default without
/// running the converter. Otherwise the provider value is read with the
/// converter's (or target's) kind as hint, converted, and coerced to the
/// target kind.
pub fn read_value(
    row: &dyn RowColumns,
    binding: &ValueBinding,
    detailed: bool,
) -> Result<Value, ColumnReadError> {
    let fail = |reason| ColumnReadError {
        column: binding.column,
        target: binding.target,
        reason,
    };

    if binding.nullable
        && row
            .is_null(binding.column)
            .map_err(|err| fail(ColumnReadReason::Source(err)))?
    {
        return Ok(binding.target.default_value());
    }

    let raw = row
        .read_column(binding.column, binding.provider_kind())
        .map_err(|err| fail(ColumnReadReason::Source(err)))?;

    let value = match &binding.converter {
        Some(converter) if !raw.is_null() => converter
            .from_provider(raw)
            .map_err(|err| fail(ColumnReadReason::Convert(err)))?,
        _ => raw,
    };

    if value.is_null() {
        return if binding.target.nullable {
            Ok(Value::Null)
        } else {
            Err(fail(ColumnReadReason::UnexpectedNull))
        };
    }

    value
        .coerce(binding.target.kind)
        .map_err(|value| {
            fail(ColumnReadReason::Coerce {
                found: value.kind(),
                value: detailed.then_some(value),
            })
        })
}

/// Read every column of a key selector into a tuple.
pub fn read_key(
    row: &dyn RowColumns,
    selector: &KeySelector,
    detailed: bool,
) -> Result<KeyTuple, ColumnReadError> {
    selector
        .columns
        .iter()
        .map(|binding| read_value(row, binding, detailed))
        .collect()
}
