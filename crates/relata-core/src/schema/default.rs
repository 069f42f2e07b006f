use std::fmt;

use crate::value::Value;

/// Value generators accepted in a field's `default`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DefaultGenerator {
    /// `autoincrement()`: next value of the field's sequence.
    AutoIncrement,
    /// `now()`: current time as RFC 3339 text.
    Now,
    /// `uuid()`: random v4 uuid.
    Uuid,
}

impl DefaultGenerator {
    pub fn parse(value: &Value) -> Option<Self> {
        match value.as_str()? {
            "autoincrement()" => Some(DefaultGenerator::AutoIncrement),
            "now()" => Some(DefaultGenerator::Now),
            "uuid()" => Some(DefaultGenerator::Uuid),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DefaultGenerator::AutoIncrement => "autoincrement()",
            DefaultGenerator::Now => "now()",
            DefaultGenerator::Uuid => "uuid()",
        }
    }
}

impl fmt::Display for DefaultGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldDefault<'a> {
    Literal(&'a Value),
    Generated(DefaultGenerator),
}
