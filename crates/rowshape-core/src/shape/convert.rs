use crate::value::{Value, ValueKind};
use std::fmt;
use thiserror::Error as ThisError;

///
/// ConvertError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[error("{message}")]
pub struct ConvertError {
    message: String,
}

impl ConvertError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

///
/// ValueConverter
///
/// Pure mapping from the provider representation of a column to its logical
/// representation. `provider_kind` is passed to the cursor as the read hint.
///

pub trait ValueConverter: Send + Sync {
    fn provider_kind(&self) -> ValueKind;

    fn from_provider(&self, value: Value) -> Result<Value, ConvertError>;
}

///
/// FnConverter
///
/// Converter backed by a closure.
///

pub struct FnConverter<F> {
    provider_kind: ValueKind,
    convert: F,
}

impl<F> FnConverter<F>
where
    F: Fn(Value) -> Result<Value, ConvertError> + Send + Sync,
{
    pub const fn new(provider_kind: ValueKind, convert: F) -> Self {
        Self {
            provider_kind,
            convert,
        }
    }
}

impl<F> ValueConverter for FnConverter<F>
where
    F: Fn(Value) -> Result<Value, ConvertError> + Send + Sync,
{
    fn provider_kind(&self) -> ValueKind {
        self.provider_kind
    }

    fn from_provider(&self, value: Value) -> Result<Value, ConvertError> {
        (self.convert)(value)
    }
}

impl<F> fmt::Debug for FnConverter<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnConverter")
            .field("provider_kind", &self.provider_kind)
            .finish_non_exhaustive()
    }
}

///
/// BoolFromInt
///
/// Providers without a boolean type store flags as 0/1 integers.
///

#[derive(Clone, Copy, Debug, Default)]
pub struct BoolFromInt;

impl ValueConverter for BoolFromInt {
    fn provider_kind(&self) -> ValueKind {
        ValueKind::Int
    }

    fn from_provider(&self, value: Value) -> Result<Value, ConvertError> {
        match value {
            Value::Int(0) | Value::Uint(0) => Ok(Value::Bool(false)),
            Value::Int(1) | Value::Uint(1) => Ok(Value::Bool(true)),
            Value::Null => Ok(Value::Null),
            other => Err(ConvertError::new(format!(
                "expected 0 or 1 for a boolean flag, found {other}"
            ))),
        }
    }
}
