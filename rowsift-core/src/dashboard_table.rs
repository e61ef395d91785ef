//! Tables stored as dashboard JSON files:
//! `{"name": ..., "table": {"columns": [{"name", "type"}], "rows": [[...]]}}`.

use crate::schema::{check_rows, Column};
use crate::source::DataSource;
use crate::value::Row;
use rowsift_common::{Result, RowsiftError};
use serde_json::{Map, Value as Json};
use std::path::{Path, PathBuf};

/// A JSON table file. The file is re-read on every `rows()` call.
#[derive(Debug, Clone)]
pub struct JsonTableFile {
    path: PathBuf,
    name: String,
    schema: Vec<Column>,
}

impl JsonTableFile {
    pub fn open(path: &Path) -> Result<Self> {
        let (name, schema, _) = read_table(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            name,
            schema,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DataSource for JsonTableFile {
    fn schema(&self) -> &[Column] {
        &self.schema
    }

    fn rows(&self) -> Result<Vec<Row>> {
        let (_, schema, rows) = read_table(&self.path)?;
        if schema != self.schema {
            return Err(RowsiftError::TypeMismatch(format!(
                "schema of {} changed since it was loaded",
                self.path.display()
            )));
        }
        Ok(rows)
    }
}

/// Parse the JSON form of a table.
pub fn parse_table(text: &str) -> Result<(String, Vec<Column>, Vec<Row>)> {
    let json: Json = serde_json::from_str(text)?;
    let outer = object(&json, "JSON form of table")?;
    require(outer, &["name", "table"], "JSON form of table")?;
    let name = outer["name"]
        .as_str()
        .ok_or_else(|| RowsiftError::TypeMismatch("table name must be a string".into()))?
        .to_owned();

    let table = object(&outer["table"], "table")?;
    require(table, &["columns", "rows"], "table")?;
    let schema: Vec<Column> = serde_json::from_value(table["columns"].clone())?;
    let rows: Vec<Row> = serde_json::from_value(table["rows"].clone())?;
    check_rows(&schema, &rows)?;
    Ok((name, schema, rows))
}

fn read_table(path: &Path) -> Result<(String, Vec<Column>, Vec<Row>)> {
    parse_table(&std::fs::read_to_string(path)?)
}

fn object<'a>(json: &'a Json, context: &str) -> Result<&'a Map<String, Json>> {
    json.as_object()
        .ok_or_else(|| RowsiftError::TypeMismatch(format!("{context} must be an object")))
}

fn require(map: &Map<String, Json>, fields: &[&str], context: &str) -> Result<()> {
    let missing: Vec<String> = fields
        .iter()
        .filter(|f| !map.contains_key(**f))
        .map(|f| (*f).to_owned())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(RowsiftError::MissingFields {
            context: context.to_owned(),
            missing,
        })
    }
}
