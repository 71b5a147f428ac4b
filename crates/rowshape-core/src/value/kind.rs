use crate::value::{Float64, Value};
use serde::{Deserialize, Serialize};
use std::fmt;
use ulid::Ulid;

///
/// ValueKind
///
/// Non-null scalar kinds a column can carry.
/// Aligned with `Value` variants; `Null` has no kind.
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum ValueKind {
    Blob,
    Bool,
    Float64,
    Int,
    Text,
    Uint,
    Ulid,
}

impl ValueKind {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Blob => "blob",
            Self::Bool => "bool",
            Self::Float64 => "float64",
            Self::Int => "int",
            Self::Text => "text",
            Self::Uint => "uint",
            Self::Ulid => "ulid",
        }
    }

    /// Reference-like kinds default to `Null` rather than a zero value.
    #[must_use]
    pub const fn is_reference_like(self) -> bool {
        matches!(self, Self::Blob | Self::Text)
    }

    // Stable tag used by plan fingerprints.
    pub(crate) const fn tag(self) -> u8 {
        match self {
            Self::Blob => 0x01,
            Self::Bool => 0x02,
            Self::Float64 => 0x03,
            Self::Int => 0x04,
            Self::Text => 0x05,
            Self::Uint => 0x06,
            Self::Ulid => 0x07,
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

///
/// TargetType
///
/// Logical type a column binding is coerced into.
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct TargetType {
    pub kind: ValueKind,
    pub nullable: bool,
}

impl TargetType {
    #[must_use]
    pub const fn required(kind: ValueKind) -> Self {
        Self {
            kind,
            nullable: false,
        }
    }

    #[must_use]
    pub const fn nullable(kind: ValueKind) -> Self {
        Self {
            kind,
            nullable: true,
        }
    }

    /// Value produced when a nullable column reads SQL NULL.
    ///
    /// Nullable targets and reference-like kinds yield `Null`; value kinds
    /// yield their zero value.
    #[must_use]
    pub fn default_value(self) -> Value {
        if self.nullable || self.kind.is_reference_like() {
            return Value::Null;
        }

        match self.kind {
            ValueKind::Bool => Value::Bool(false),
            ValueKind::Float64 => Value::Float64(Float64::default()),
            ValueKind::Int => Value::Int(0),
            ValueKind::Uint => Value::Uint(0),
            ValueKind::Ulid => Value::Ulid(Ulid::nil()),
            ValueKind::Blob | ValueKind::Text => Value::Null,
        }
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.nullable {
            write!(f, "{}?", self.kind)
        } else {
            write!(f, "{}", self.kind)
        }
    }
}
