use core::fmt;

use serde::{Deserialize, Serialize};

/// The primitive kinds a namespace can hold.
///
/// Each kind corresponds to one leading type tag of a request path.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display,
)]
pub enum ValueKind {
    /// UTF-8 string, addressed with the `string` tag.
    #[display("string")]
    String,
    /// 32-bit signed integer, addressed with the `integer` tag.
    #[display("integer")]
    Int,
    /// 64-bit signed integer, addressed with the `long` tag.
    #[display("long")]
    Long,
    /// 32-bit float, addressed with the `float` tag.
    #[display("float")]
    Float,
    /// Boolean, addressed with the `boolean` tag.
    #[display("boolean")]
    Bool,
}

impl ValueKind {
    /// Parse the leading type tag of a request path.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "string" => Some(Self::String),
            "integer" => Some(Self::Int),
            "long" => Some(Self::Long),
            "float" => Some(Self::Float),
            "boolean" => Some(Self::Bool),
            _ => None,
        }
    }

    /// The value a typed read yields when the key is absent and the caller
    /// supplied no default.
    pub fn zero_value(&self) -> Value {
        match self {
            Self::String => Value::String(String::new()),
            Self::Int => Value::Int(0),
            Self::Long => Value::Long(0),
            Self::Float => Value::Float(0.0),
            Self::Bool => Value::Bool(false),
        }
    }
}

/// A single typed value, the unit of storage and of read results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// A UTF-8 string.
    String(String),
    /// A 32-bit signed integer.
    Int(i32),
    /// A 64-bit signed integer.
    Long(i64),
    /// A 32-bit float.
    Float(f32),
    /// A boolean.
    Bool(bool),
}

impl Value {
    /// The kind of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::String(_) => ValueKind::String,
            Self::Int(_) => ValueKind::Int,
            Self::Long(_) => ValueKind::Long,
            Self::Float(_) => ValueKind::Float,
            Self::Bool(_) => ValueKind::Bool,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Long(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Bool(v) => write!(f, "{v}"),
        }
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Long(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}
