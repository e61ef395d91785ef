use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A single table cell.
///
/// Dates, datetimes and times of day travel as ISO-8601 strings. Integers and
/// floats share one numeric domain: `Integer(3)` equals `Float(3.0)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

pub type Row = Vec<Value>;

/// Values from different domains never compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Domain {
    Null,
    Boolean,
    Number,
    String,
}

impl Value {
    pub fn domain(&self) -> Domain {
        match self {
            Value::Null => Domain::Null,
            Value::Boolean(_) => Domain::Boolean,
            Value::Integer(_) | Value::Float(_) => Domain::Number,
            Value::String(_) => Domain::String,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
        }
    }

    pub fn is_number(&self) -> bool {
        self.domain() == Domain::Number
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Ordering within a domain; `None` across domains, for nulls and for NaN.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
            (Value::Boolean(a), Value::Boolean(b)) => Some(a.cmp(b)),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (a, b) if a.is_number() && b.is_number() => {
                a.as_f64()?.partial_cmp(&b.as_f64()?)
            }
            _ => None,
        }
    }

    /// Equality used by list membership: same domain and equal, no coercion.
    pub fn matches(&self, other: &Value) -> bool {
        self.compare(other) == Some(Ordering::Equal)
    }

    /// `self - other` for numbers; integer operands stay integral.
    pub fn difference(&self, other: &Value) -> Option<Value> {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => a.checked_sub(*b).map(Value::Integer),
            (a, b) => Some(Value::Float(a.as_f64()? - b.as_f64()?)),
        }
    }

    /// Converts a JSON scalar. Arrays and objects have no cell form.
    pub fn from_json(value: &serde_json::Value) -> Option<Value> {
        match value {
            serde_json::Value::Null => Some(Value::Null),
            serde_json::Value::Bool(b) => Some(Value::Boolean(*b)),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Some(Value::Integer(i)),
                None => n.as_f64().map(Value::Float),
            },
            serde_json::Value::String(s) => Some(Value::String(s.clone())),
            serde_json::Value::Array(_) | serde_json::Value::Object(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::String(s) => write!(f, "{s:?}"),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(value.into())
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}
