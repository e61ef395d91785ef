//! Filter specifications: the untrusted JSON tree and its typed form.
//!
//! [`validate`] checks the shape of a JSON specification without consulting a
//! schema. [`FilterSpec::parse`] runs the same checks and returns the typed
//! tree that [`crate::Filter::compile`] binds to a column list. Trusted callers
//! may build a [`FilterSpec`] directly and skip the JSON layer.

use crate::value::Value;
use rowsift_common::{Result, RowsiftError};
use serde_json::{Map, Value as Json};
use std::fmt;

/// The five operator tokens, in the order error messages list them.
pub const OPERATORS: [&str; 5] = ["ALL", "ANY", "NONE", "IN_LIST", "IN_RANGE"];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operator {
    All,
    Any,
    None,
    InList,
    InRange,
}

impl Operator {
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "ALL" => Some(Operator::All),
            "ANY" => Some(Operator::Any),
            "NONE" => Some(Operator::None),
            "IN_LIST" => Some(Operator::InList),
            "IN_RANGE" => Some(Operator::InRange),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Operator::All => "ALL",
            Operator::Any => "ANY",
            Operator::None => "NONE",
            Operator::InList => "IN_LIST",
            Operator::InRange => "IN_RANGE",
        }
    }

    /// Fields a node with this operator must carry. Extra fields are ignored.
    pub fn required_fields(self) -> &'static [&'static str] {
        match self {
            Operator::All | Operator::Any | Operator::None => &["operator", "arguments"],
            Operator::InList => &["operator", "column", "values"],
            Operator::InRange => &["operator", "column", "min_val", "max_val"],
        }
    }

    fn combinator(self) -> Option<Combinator> {
        match self {
            Operator::All => Some(Combinator::All),
            Operator::Any => Some(Combinator::Any),
            Operator::None => Some(Combinator::None),
            Operator::InList | Operator::InRange => None,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a combinator folds the row sets of its arguments.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Combinator {
    /// Rows matched by every argument; no arguments matches every row.
    All,
    /// Rows matched by at least one argument; no arguments matches nothing.
    Any,
    /// Rows matched by no argument; no arguments matches every row.
    None,
}

impl Combinator {
    pub fn operator(self) -> Operator {
        match self {
            Combinator::All => Operator::All,
            Combinator::Any => Operator::Any,
            Combinator::None => Operator::None,
        }
    }
}

/// A leaf's column reference as written in a filter spec.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ColumnRef {
    Name(String),
    Integer(i128),
}

impl ColumnRef {
    /// Column names are strings, so an integer reference never names a column.
    pub fn names(&self, column: &str) -> bool {
        match self {
            ColumnRef::Name(name) => name == column,
            ColumnRef::Integer(_) => false,
        }
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnRef::Name(name) => f.write_str(name),
            ColumnRef::Integer(i) => write!(f, "{i}"),
        }
    }
}

impl From<&str> for ColumnRef {
    fn from(value: &str) -> Self {
        ColumnRef::Name(value.to_owned())
    }
}

/// Typed filter specification tree.
#[derive(Clone, Debug, PartialEq)]
pub enum FilterSpec {
    Combine {
        combinator: Combinator,
        arguments: Vec<FilterSpec>,
    },
    InList {
        column: ColumnRef,
        values: Vec<Value>,
    },
    InRange {
        column: ColumnRef,
        min_val: Value,
        max_val: Value,
    },
}

impl FilterSpec {
    pub fn all(arguments: Vec<FilterSpec>) -> Self {
        FilterSpec::Combine { combinator: Combinator::All, arguments }
    }

    pub fn any(arguments: Vec<FilterSpec>) -> Self {
        FilterSpec::Combine { combinator: Combinator::Any, arguments }
    }

    pub fn none(arguments: Vec<FilterSpec>) -> Self {
        FilterSpec::Combine { combinator: Combinator::None, arguments }
    }

    pub fn in_list<V: Into<Value>>(column: impl Into<ColumnRef>, values: Vec<V>) -> Self {
        FilterSpec::InList {
            column: column.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn in_range(column: impl Into<ColumnRef>, min_val: impl Into<Value>, max_val: impl Into<Value>) -> Self {
        FilterSpec::InRange {
            column: column.into(),
            min_val: min_val.into(),
            max_val: max_val.into(),
        }
    }

    pub fn operator(&self) -> Operator {
        match self {
            FilterSpec::Combine { combinator, .. } => combinator.operator(),
            FilterSpec::InList { .. } => Operator::InList,
            FilterSpec::InRange { .. } => Operator::InRange,
        }
    }

    /// Validate a JSON specification and build the typed tree.
    ///
    /// Fails on the first violation found depth-first.
    pub fn parse(spec: &Json) -> Result<Self> {
        let Json::Object(node) = spec else {
            return Err(RowsiftError::TypeMismatch(format!(
                "filter spec must be an object, not {}",
                json_type(spec)
            )));
        };
        let operator = match node.get("operator") {
            None => return Err(RowsiftError::MissingOperator(spec.to_string())),
            Some(Json::String(token)) => Operator::parse(token),
            Some(_) => None,
        };
        let Some(operator) = operator else {
            let token = match &node["operator"] {
                Json::String(s) => s.clone(),
                other => other.to_string(),
            };
            return Err(RowsiftError::UnknownOperator {
                operator: token,
                valid: format!("{{{}}}", OPERATORS.join(", ")),
            });
        };

        let missing: Vec<String> = operator
            .required_fields()
            .iter()
            .filter(|field| !node.contains_key(**field))
            .map(|field| field.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(RowsiftError::MissingFields {
                context: spec.to_string(),
                missing,
            });
        }

        if let Some(combinator) = operator.combinator() {
            let Json::Array(items) = &node["arguments"] else {
                return Err(RowsiftError::TypeMismatch(format!(
                    "The arguments field for {operator} must be a list, not {}",
                    json_type(&node["arguments"])
                )));
            };
            let arguments = items.iter().map(FilterSpec::parse).collect::<Result<Vec<_>>>()?;
            return Ok(FilterSpec::Combine { combinator, arguments });
        }

        let column = parse_column(operator, &node["column"])?;
        match operator {
            Operator::InList => {
                let values = parse_values(&node["values"])?;
                Ok(FilterSpec::InList { column, values })
            }
            _ => {
                let max_val = parse_bound(node, "max_val")?;
                let min_val = parse_bound(node, "min_val")?;
                Ok(FilterSpec::InRange { column, min_val, max_val })
            }
        }
    }
}

/// Check that `spec` is a well-formed filter specification.
pub fn validate(spec: &Json) -> Result<()> {
    FilterSpec::parse(spec).map(|_| ())
}

fn parse_column(operator: Operator, column: &Json) -> Result<ColumnRef> {
    match column {
        Json::String(name) => Ok(ColumnRef::Name(name.clone())),
        Json::Number(n) if !n.is_f64() => n
            .as_i64()
            .map(i128::from)
            .or_else(|| n.as_u64().map(i128::from))
            .map(ColumnRef::Integer)
            .ok_or_else(|| RowsiftError::TypeMismatch(format!("The column argument to {operator} is not an int: {n}"))),
        other => Err(RowsiftError::TypeMismatch(format!(
            "The column argument to {operator} must be a string or an int, not {}",
            json_type(other)
        ))),
    }
}

fn parse_values(values: &Json) -> Result<Vec<Value>> {
    let Json::Array(items) = values else {
        return Err(RowsiftError::TypeMismatch(format!(
            "The values argument to IN_LIST must be a list, not {}",
            json_type(values)
        )));
    };
    let invalid: Vec<String> = items
        .iter()
        .filter(|item| !matches!(item, Json::String(_) | Json::Number(_)))
        .map(|item| item.to_string())
        .collect();
    if !invalid.is_empty() {
        return Err(RowsiftError::InvalidValues { values: invalid });
    }
    Ok(items.iter().filter_map(Value::from_json).collect())
}

fn parse_bound(node: &Map<String, Json>, field: &str) -> Result<Value> {
    match &node[field] {
        number @ Json::Number(_) => Value::from_json(number).ok_or_else(|| {
            RowsiftError::TypeMismatch(format!("The {field} for IN_RANGE is not representable"))
        }),
        other => Err(RowsiftError::TypeMismatch(format!(
            "The type of {field} for IN_RANGE must be a number, not {}",
            json_type(other)
        ))),
    }
}

fn json_type(value: &Json) -> &'static str {
    match value {
        Json::Null => "null",
        Json::Bool(_) => "boolean",
        Json::Number(n) if n.is_f64() => "float",
        Json::Number(_) => "int",
        Json::String(_) => "string",
        Json::Array(_) => "list",
        Json::Object(_) => "object",
    }
}
