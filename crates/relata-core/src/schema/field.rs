use std::fmt;

use serde::{Deserialize, Serialize};

use crate::schema::{
    default::{DefaultGenerator, FieldDefault},
    foreign_key::ForeignKeySyntax,
    names::FieldName,
    primary_key::PrimaryKeySyntax,
    str_or_bool::StrOrBoolOrArray,
};
use crate::value::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
#[serde(rename_all = "snake_case")]
pub struct FieldDef {
    pub name: FieldName,
    pub r#type: FieldType,
    #[serde(default)]
    pub nullable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_key: Option<PrimaryKeySyntax>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique: Option<StrOrBoolOrArray>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreign_key: Option<ForeignKeySyntax>,
}

impl FieldDef {
    /// A plain required field with no inline constraints.
    pub fn new(name: impl Into<FieldName>, r#type: FieldType) -> Self {
        Self {
            name: name.into(),
            r#type,
            nullable: false,
            default: None,
            primary_key: None,
            unique: None,
            foreign_key: None,
        }
    }

    /// How the field is filled when a write leaves it out.
    pub fn default_kind(&self) -> Option<FieldDefault<'_>> {
        let value = self.default.as_ref()?;
        Some(match DefaultGenerator::parse(value) {
            Some(generator) => FieldDefault::Generated(generator),
            None => FieldDefault::Literal(value),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
#[serde(rename_all = "snake_case", untagged)]
pub enum FieldType {
    Simple(SimpleFieldType),
    Complex(ComplexFieldType),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
#[serde(rename_all = "snake_case")]
pub enum SimpleFieldType {
    Integer,
    BigInt,
    Real,
    Text,
    Boolean,
    // RFC 3339 text
    Timestamp,
    Uuid,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ComplexFieldType {
    Varchar { length: u32 },
    Enum { name: String, values: Vec<String> },
}

impl FieldType {
    /// Returns true if this type supports auto_increment (integer types only)
    pub fn supports_auto_increment(&self) -> bool {
        matches!(
            self,
            FieldType::Simple(SimpleFieldType::Integer | SimpleFieldType::BigInt)
        )
    }

    /// Returns true if the generator can fill a field of this type.
    pub fn supports_generator(&self, generator: DefaultGenerator) -> bool {
        match generator {
            DefaultGenerator::AutoIncrement => self.supports_auto_increment(),
            DefaultGenerator::Now => matches!(
                self,
                FieldType::Simple(SimpleFieldType::Timestamp | SimpleFieldType::Text)
            ),
            DefaultGenerator::Uuid => match self {
                FieldType::Simple(SimpleFieldType::Uuid | SimpleFieldType::Text) => true,
                FieldType::Complex(ComplexFieldType::Varchar { length }) => *length >= 36,
                _ => false,
            },
        }
    }

    /// Check whether a non-null value conforms to this type.
    /// Null is always accepted here; nullability is a property of the field.
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) => true,
            (FieldType::Simple(ty), value) => match (ty, value) {
                (SimpleFieldType::Integer, Value::Int(i)) => i32::try_from(*i).is_ok(),
                (SimpleFieldType::BigInt, Value::Int(_)) => true,
                (SimpleFieldType::Real, Value::Int(_) | Value::Float(_)) => true,
                (SimpleFieldType::Text, Value::Text(_)) => true,
                (SimpleFieldType::Boolean, Value::Bool(_)) => true,
                (SimpleFieldType::Timestamp, Value::Text(s)) => {
                    chrono::DateTime::parse_from_rfc3339(s).is_ok()
                }
                (SimpleFieldType::Uuid, Value::Text(s)) => uuid::Uuid::parse_str(s).is_ok(),
                _ => false,
            },
            (FieldType::Complex(ComplexFieldType::Varchar { length }), Value::Text(s)) => {
                s.chars().count() <= *length as usize
            }
            (FieldType::Complex(ComplexFieldType::Enum { values, .. }), Value::Text(s)) => {
                values.iter().any(|v| v == s)
            }
            _ => false,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Simple(ty) => {
                let s = match ty {
                    SimpleFieldType::Integer => "integer",
                    SimpleFieldType::BigInt => "big_int",
                    SimpleFieldType::Real => "real",
                    SimpleFieldType::Text => "text",
                    SimpleFieldType::Boolean => "boolean",
                    SimpleFieldType::Timestamp => "timestamp",
                    SimpleFieldType::Uuid => "uuid",
                };
                f.write_str(s)
            }
            FieldType::Complex(ComplexFieldType::Varchar { length }) => {
                write!(f, "varchar({length})")
            }
            FieldType::Complex(ComplexFieldType::Enum { name, .. }) => write!(f, "enum({name})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn status_enum() -> FieldType {
        FieldType::Complex(ComplexFieldType::Enum {
            name: "enrollment_status".into(),
            values: vec!["ACTIVE".into(), "COMPLETED".into()],
        })
    }

    #[rstest]
    #[case(FieldType::Simple(SimpleFieldType::Integer), Value::Int(5), true)]
    #[case(FieldType::Simple(SimpleFieldType::Integer), Value::Int(i64::from(i32::MAX) + 1), false)]
    #[case(FieldType::Simple(SimpleFieldType::BigInt), Value::Int(i64::MAX), true)]
    #[case(FieldType::Simple(SimpleFieldType::Integer), Value::Text("5".into()), false)]
    #[case(FieldType::Simple(SimpleFieldType::Real), Value::Int(1), true)]
    #[case(FieldType::Simple(SimpleFieldType::Real), Value::Float(0.5), true)]
    #[case(FieldType::Simple(SimpleFieldType::Text), Value::Text("hi".into()), true)]
    #[case(FieldType::Simple(SimpleFieldType::Boolean), Value::Bool(false), true)]
    #[case(FieldType::Simple(SimpleFieldType::Boolean), Value::Int(0), false)]
    #[case(FieldType::Simple(SimpleFieldType::Timestamp), Value::Text("2024-01-02T03:04:05Z".into()), true)]
    #[case(FieldType::Simple(SimpleFieldType::Timestamp), Value::Text("yesterday".into()), false)]
    #[case(FieldType::Simple(SimpleFieldType::Uuid), Value::Text("67e55044-10b1-426f-9247-bb680e5fe0c8".into()), true)]
    #[case(FieldType::Simple(SimpleFieldType::Uuid), Value::Text("not-a-uuid".into()), false)]
    #[case(FieldType::Complex(ComplexFieldType::Varchar { length: 3 }), Value::Text("abc".into()), true)]
    #[case(FieldType::Complex(ComplexFieldType::Varchar { length: 3 }), Value::Text("abcd".into()), false)]
    #[case(status_enum(), Value::Text("ACTIVE".into()), true)]
    #[case(status_enum(), Value::Text("PAUSED".into()), false)]
    #[case(status_enum(), Value::Null, true)]
    fn test_accepts(#[case] ty: FieldType, #[case] value: Value, #[case] expected: bool) {
        assert_eq!(ty.accepts(&value), expected);
    }

    #[rstest]
    #[case(FieldType::Simple(SimpleFieldType::Integer), DefaultGenerator::AutoIncrement, true)]
    #[case(FieldType::Simple(SimpleFieldType::Text), DefaultGenerator::AutoIncrement, false)]
    #[case(FieldType::Simple(SimpleFieldType::Timestamp), DefaultGenerator::Now, true)]
    #[case(FieldType::Simple(SimpleFieldType::Boolean), DefaultGenerator::Now, false)]
    #[case(FieldType::Simple(SimpleFieldType::Uuid), DefaultGenerator::Uuid, true)]
    #[case(FieldType::Complex(ComplexFieldType::Varchar { length: 16 }), DefaultGenerator::Uuid, false)]
    #[case(FieldType::Complex(ComplexFieldType::Varchar { length: 36 }), DefaultGenerator::Uuid, true)]
    fn test_supports_generator(
        #[case] ty: FieldType,
        #[case] generator: DefaultGenerator,
        #[case] expected: bool,
    ) {
        assert_eq!(ty.supports_generator(generator), expected);
    }

    #[test]
    fn test_field_type_deserializes_simple_and_complex() {
        let simple: FieldType = serde_json::from_str("\"big_int\"").unwrap();
        assert_eq!(simple, FieldType::Simple(SimpleFieldType::BigInt));

        let complex: FieldType =
            serde_json::from_str(r#"{"kind": "varchar", "length": 255}"#).unwrap();
        assert_eq!(
            complex,
            FieldType::Complex(ComplexFieldType::Varchar { length: 255 })
        );
    }

    #[test]
    fn test_default_kind() {
        let mut field = FieldDef::new("progress", FieldType::Simple(SimpleFieldType::Integer));
        assert!(field.default_kind().is_none());

        field.default = Some(Value::Int(0));
        assert_eq!(field.default_kind(), Some(FieldDefault::Literal(&Value::Int(0))));

        field.default = Some(Value::Text("autoincrement()".into()));
        assert_eq!(
            field.default_kind(),
            Some(FieldDefault::Generated(DefaultGenerator::AutoIncrement))
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(FieldType::Simple(SimpleFieldType::BigInt).to_string(), "big_int");
        assert_eq!(
            FieldType::Complex(ComplexFieldType::Varchar { length: 8 }).to_string(),
            "varchar(8)"
        );
        assert_eq!(status_enum().to_string(), "enum(enrollment_status)");
    }
}
