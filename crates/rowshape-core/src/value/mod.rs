mod float;
mod key;
mod kind;

#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};
use std::fmt;
use ulid::Ulid;

// re-exports
pub use float::Float64;
pub use key::KeyTuple;
pub use kind::{TargetType, ValueKind};

///
/// CONSTANTS
///

const F64_SAFE_I64: i64 = 1i64 << 53;
const F64_SAFE_U64: u64 = 1u64 << 53;

///
/// Value
///
/// One scalar read from a row column, before or after conversion.
///
/// Null        → SQL NULL (no kind).
///

#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum Value {
    Blob(Vec<u8>),
    Bool(bool),
    Float64(Float64),
    Int(i64),
    Null,
    Text(String),
    Uint(u64),
    Ulid(Ulid),
}

impl Value {
    /// Kind of this value, `None` for `Null`.
    #[must_use]
    pub const fn kind(&self) -> Option<ValueKind> {
        match self {
            Self::Blob(_) => Some(ValueKind::Blob),
            Self::Bool(_) => Some(ValueKind::Bool),
            Self::Float64(_) => Some(ValueKind::Float64),
            Self::Int(_) => Some(ValueKind::Int),
            Self::Null => None,
            Self::Text(_) => Some(ValueKind::Text),
            Self::Uint(_) => Some(ValueKind::Uint),
            Self::Ulid(_) => Some(ValueKind::Ulid),
        }
    }

    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_uint(&self) -> Option<u64> {
        match self {
            Self::Uint(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(v) => Some(v.as_str()),
            _ => None,
        }
    }

    /// Build a float value; non-finite input becomes `Null`.
    #[must_use]
    pub fn float64(v: f64) -> Self {
        Float64::try_new(v).map_or(Self::Null, Self::Float64)
    }

    /// Coerce this value into `kind`.
    ///
    /// Matching kinds pass through. Integers widen losslessly between signed,
    /// unsigned and float (within the 2^53 safe range); text parses into a
    /// ulid and a ulid renders as text. Anything else hands the original
    /// value back as the error so callers can report what was found.
    pub fn coerce(self, kind: ValueKind) -> Result<Self, Self> {
        if self.kind() == Some(kind) {
            return Ok(self);
        }

        match (self, kind) {
            (Self::Int(v), ValueKind::Uint) => {
                u64::try_from(v).map(Self::Uint).map_err(|_| Self::Int(v))
            }
            (Self::Int(v), ValueKind::Float64) if (-F64_SAFE_I64..=F64_SAFE_I64).contains(&v) => {
                Ok(Self::float64(safe_i64_to_f64(v)))
            }
            (Self::Uint(v), ValueKind::Int) => {
                i64::try_from(v).map(Self::Int).map_err(|_| Self::Uint(v))
            }
            (Self::Uint(v), ValueKind::Float64) if v <= F64_SAFE_U64 => {
                Ok(Self::float64(safe_u64_to_f64(v)))
            }
            (Self::Text(v), ValueKind::Ulid) => match Ulid::from_string(&v) {
                Ok(ulid) => Ok(Self::Ulid(ulid)),
                Err(_) => Err(Self::Text(v)),
            },
            (Self::Ulid(v), ValueKind::Text) => Ok(Self::Text(v.to_string())),
            (other, _) => Err(other),
        }
    }
}

// Callers guarantee |v| <= 2^53, so the conversion is exact.
#[allow(clippy::cast_precision_loss)]
const fn safe_i64_to_f64(v: i64) -> f64 {
    v as f64
}

#[allow(clippy::cast_precision_loss)]
const fn safe_u64_to_f64(v: u64) -> f64 {
    v as f64
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Blob(v) => write!(f, "blob[{}]", v.len()),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Float64(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Null => f.write_str("null"),
            Self::Text(v) => write!(f, "'{v}'"),
            Self::Uint(v) => write!(f, "{v}"),
            Self::Ulid(v) => write!(f, "{v}"),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Self::Uint(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Self::Blob(v)
    }
}

impl From<Ulid> for Value {
    fn from(v: Ulid) -> Self {
        Self::Ulid(v)
    }
}

impl<T: Into<Self>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}
