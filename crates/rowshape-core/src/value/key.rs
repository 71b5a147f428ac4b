use crate::value::Value;
use derive_more::Deref;
use std::fmt;

///
/// KeyTuple
///
/// Ordered key values read once per row for an outer or inner key selector.
/// Equality is structural across the whole tuple; instances are never
/// compared by identity.
///

#[derive(Clone, Debug, Default, Deref, Eq, Hash, PartialEq)]
pub struct KeyTuple(Vec<Value>);

impl KeyTuple {
    #[must_use]
    pub const fn new(values: Vec<Value>) -> Self {
        Self(values)
    }

    #[must_use]
    pub fn into_values(self) -> Vec<Value> {
        self.0
    }
}

impl From<Vec<Value>> for KeyTuple {
    fn from(values: Vec<Value>) -> Self {
        Self(values)
    }
}

impl FromIterator<Value> for KeyTuple {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for KeyTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, value) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{value}")?;
        }
        f.write_str(")")
    }
}
