//! Script literals
//!
//! Plain values a script manipulates directly. Every literal has a matching
//! host object kind (see [`HostObject`](crate::models::object::HostObject)),
//! and literals can be built from JSON so hosts can describe input tables in
//! configuration files.
//!
//! JSON mapping:
//! - integral numbers that fit in `i64` → `Int`, other numbers → `Float`
//! - strings → `Str`, arrays → `List`, objects → `Dict`
//! - `null` and booleans have no host kind and are rejected
//!
//! Vectors serialize back to JSON as plain arrays, so they come back as
//! `List` of `Float`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors converting between literals and other representations
#[derive(Debug, Error, PartialEq)]
pub enum ConversionError {
    #[error("Unsupported value kind: {kind}")]
    Unsupported { kind: String },

    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
}

/// Script-native value
///
/// # Example
/// ```
/// use zeno_script_bridge::Literal;
///
/// let v = Literal::from(5);
/// assert_eq!(v.as_int(), Some(5));
/// assert_eq!(v.as_float(), Some(5.0));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Literal {
    Int(i64),
    Float(f64),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    Str(String),
    List(Vec<Literal>),
    Dict(BTreeMap<String, Literal>),
}

impl Literal {
    pub fn type_name(&self) -> &'static str {
        match self {
            Literal::Int(_) => "int",
            Literal::Float(_) => "float",
            Literal::Vec2(_) => "vec2",
            Literal::Vec3(_) => "vec3",
            Literal::Vec4(_) => "vec4",
            Literal::Str(_) => "str",
            Literal::List(_) => "list",
            Literal::Dict(_) => "dict",
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Literal::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Float value; integers widen
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Literal::Float(v) => Some(*v),
            Literal::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Literal::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Build a literal from a JSON value
    ///
    /// # Errors
    /// Returns `ConversionError::Unsupported` for `null` and booleans,
    /// including when nested inside arrays or objects.
    pub fn from_json(value: &Value) -> Result<Self, ConversionError> {
        match value {
            Value::Null => Err(ConversionError::Unsupported {
                kind: "null".to_string(),
            }),
            Value::Bool(_) => Err(ConversionError::Unsupported {
                kind: "bool".to_string(),
            }),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Literal::Int(i))
                } else {
                    n.as_f64()
                        .map(Literal::Float)
                        .ok_or_else(|| ConversionError::Unsupported {
                            kind: format!("number {}", n),
                        })
                }
            }
            Value::String(s) => Ok(Literal::Str(s.clone())),
            Value::Array(items) => items
                .iter()
                .map(Literal::from_json)
                .collect::<Result<Vec<_>, ConversionError>>()
                .map(Literal::List),
            Value::Object(entries) => entries
                .iter()
                .map(|(k, v)| Ok((k.clone(), Literal::from_json(v)?)))
                .collect::<Result<BTreeMap<String, Literal>, ConversionError>>()
                .map(Literal::Dict),
        }
    }

    /// Render this literal as JSON
    ///
    /// Non-finite floats have no JSON form and become `null`.
    pub fn to_json(&self) -> Value {
        fn float(v: f64) -> Value {
            Number::from_f64(v).map(Value::Number).unwrap_or(Value::Null)
        }

        match self {
            Literal::Int(v) => Value::Number((*v).into()),
            Literal::Float(v) => float(*v),
            Literal::Vec2(v) => Value::Array(v.iter().map(|c| float(*c as f64)).collect()),
            Literal::Vec3(v) => Value::Array(v.iter().map(|c| float(*c as f64)).collect()),
            Literal::Vec4(v) => Value::Array(v.iter().map(|c| float(*c as f64)).collect()),
            Literal::Str(s) => Value::String(s.clone()),
            Literal::List(items) => Value::Array(items.iter().map(Literal::to_json).collect()),
            Literal::Dict(entries) => Value::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect::<Map<_, _>>(),
            ),
        }
    }
}

impl From<i32> for Literal {
    fn from(v: i32) -> Self {
        Literal::Int(v as i64)
    }
}

impl From<i64> for Literal {
    fn from(v: i64) -> Self {
        Literal::Int(v)
    }
}

impl From<f32> for Literal {
    fn from(v: f32) -> Self {
        Literal::Float(v as f64)
    }
}

impl From<f64> for Literal {
    fn from(v: f64) -> Self {
        Literal::Float(v)
    }
}

impl From<&str> for Literal {
    fn from(v: &str) -> Self {
        Literal::Str(v.to_string())
    }
}

impl From<String> for Literal {
    fn from(v: String) -> Self {
        Literal::Str(v)
    }
}

impl From<[f32; 2]> for Literal {
    fn from(v: [f32; 2]) -> Self {
        Literal::Vec2(v)
    }
}

impl From<[f32; 3]> for Literal {
    fn from(v: [f32; 3]) -> Self {
        Literal::Vec3(v)
    }
}

impl From<[f32; 4]> for Literal {
    fn from(v: [f32; 4]) -> Self {
        Literal::Vec4(v)
    }
}

impl From<Vec<Literal>> for Literal {
    fn from(v: Vec<Literal>) -> Self {
        Literal::List(v)
    }
}

impl From<BTreeMap<String, Literal>> for Literal {
    fn from(v: BTreeMap<String, Literal>) -> Self {
        Literal::Dict(v)
    }
}

impl TryFrom<Literal> for i64 {
    type Error = ConversionError;

    fn try_from(literal: Literal) -> Result<Self, Self::Error> {
        literal.as_int().ok_or(ConversionError::TypeMismatch {
            expected: "int",
            found: literal.type_name(),
        })
    }
}

impl TryFrom<Literal> for f64 {
    type Error = ConversionError;

    fn try_from(literal: Literal) -> Result<Self, Self::Error> {
        literal.as_float().ok_or(ConversionError::TypeMismatch {
            expected: "float",
            found: literal.type_name(),
        })
    }
}

impl TryFrom<Literal> for String {
    type Error = ConversionError;

    fn try_from(literal: Literal) -> Result<Self, Self::Error> {
        match literal {
            Literal::Str(s) => Ok(s),
            other => Err(ConversionError::TypeMismatch {
                expected: "str",
                found: other.type_name(),
            }),
        }
    }
}

impl TryFrom<Literal> for Vec<Literal> {
    type Error = ConversionError;

    fn try_from(literal: Literal) -> Result<Self, Self::Error> {
        match literal {
            Literal::List(items) => Ok(items),
            other => Err(ConversionError::TypeMismatch {
                expected: "list",
                found: other.type_name(),
            }),
        }
    }
}
