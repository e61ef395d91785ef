use crate::value::{Row, Value};
use rowsift_common::{Result, RowsiftError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Declared column type, using the dashboard table wire names.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    String,
    Number,
    Boolean,
    Date,
    Datetime,
    #[serde(rename = "timeofday")]
    TimeOfDay,
}

impl ColumnType {
    pub fn as_str(self) -> &'static str {
        match self {
            ColumnType::String => "string",
            ColumnType::Number => "number",
            ColumnType::Boolean => "boolean",
            ColumnType::Date => "date",
            ColumnType::Datetime => "datetime",
            ColumnType::TimeOfDay => "timeofday",
        }
    }

    /// Whether a cell may appear in a column of this type. Nulls fit anywhere;
    /// temporal cells are ISO strings.
    pub fn accepts(self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) => true,
            (ColumnType::Number, v) => v.is_number(),
            (ColumnType::Boolean, Value::Boolean(_)) => true,
            (
                ColumnType::String | ColumnType::Date | ColumnType::Datetime | ColumnType::TimeOfDay,
                Value::String(_),
            ) => true,
            _ => false,
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Column {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
}

impl Column {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
        }
    }
}

pub fn column_names(schema: &[Column]) -> Vec<&str> {
    schema.iter().map(|c| c.name.as_str()).collect()
}

/// First column with the given name.
pub fn find_column<'a>(schema: &'a [Column], name: &str) -> Option<(usize, &'a Column)> {
    schema.iter().enumerate().find(|(_, c)| c.name == name)
}

/// Check that every row has one cell per column and each cell fits its column.
pub fn check_rows(schema: &[Column], rows: &[Row]) -> Result<()> {
    for (i, row) in rows.iter().enumerate() {
        if row.len() != schema.len() {
            return Err(RowsiftError::TypeMismatch(format!(
                "All rows must have length {}, row {i} has length {}",
                schema.len(),
                row.len()
            )));
        }
        for (column, value) in schema.iter().zip(row) {
            if !column.column_type.accepts(value) {
                return Err(RowsiftError::TypeMismatch(format!(
                    "row {i}: column {} is of type {}, found {} {value}",
                    column.name,
                    column.column_type,
                    value.type_name()
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> Vec<Column> {
        vec![
            Column::new("name", ColumnType::String),
            Column::new("votes", ColumnType::Number),
            Column::new("won", ColumnType::Boolean),
        ]
    }

    #[test]
    fn column_serializes_with_wire_names() {
        let json = serde_json::to_string(&Column::new("t", ColumnType::TimeOfDay)).unwrap();
        assert_eq!(json, r#"{"name":"t","type":"timeofday"}"#);
        let back: Column = serde_json::from_str(r#"{"name":"d","type":"datetime"}"#).unwrap();
        assert_eq!(back.column_type, ColumnType::Datetime);
    }

    #[test]
    fn find_column_returns_first_match() {
        let mut s = schema();
        s.push(Column::new("votes", ColumnType::String));
        let (idx, col) = find_column(&s, "votes").unwrap();
        assert_eq!(idx, 1);
        assert_eq!(col.column_type, ColumnType::Number);
        assert!(find_column(&s, "missing").is_none());
    }

    #[test]
    fn check_rows_accepts_conforming_rows_and_nulls() {
        let rows = vec![
            vec![Value::from("a"), Value::Integer(3), Value::Boolean(true)],
            vec![Value::Null, Value::Float(2.5), Value::Null],
        ];
        assert!(check_rows(&schema(), &rows).is_ok());
    }

    #[test]
    fn check_rows_rejects_short_rows_and_wrong_types() {
        let short = vec![vec![Value::from("a")]];
        assert!(matches!(check_rows(&schema(), &short), Err(RowsiftError::TypeMismatch(_))));
        let wrong = vec![vec![Value::from("a"), Value::from("3"), Value::Boolean(false)]];
        let err = check_rows(&schema(), &wrong).unwrap_err();
        assert!(err.to_string().contains("votes"));
    }
}
