//! Table data sources: a fixed schema plus a row supplier.

use crate::filter::Filter;
use crate::schema::{check_rows, column_names, find_column, Column, ColumnType};
use crate::spec::FilterSpec;
use crate::summary::{distinct_values, numeric_spec, NumericSpec};
use crate::value::{Row, Value};
use rowsift_common::{Result, RowsiftError};

/// Anything that can serve a table.
///
/// `rows` is called afresh for every request, so live sources see updates.
pub trait DataSource: Send + Sync {
    fn schema(&self) -> &[Column];

    fn rows(&self) -> Result<Vec<Row>>;

    fn column_names(&self) -> Vec<&str> {
        column_names(self.schema())
    }

    fn column_types(&self) -> Vec<ColumnType> {
        self.schema().iter().map(|c| c.column_type).collect()
    }

    fn column_type(&self, name: &str) -> Option<ColumnType> {
        find_column(self.schema(), name).map(|(_, c)| c.column_type)
    }

    /// Sorted distinct values of `name`.
    fn all_values(&self, name: &str) -> Result<Vec<Value>> {
        let (idx, _) = find_column(self.schema(), name).ok_or_else(|| {
            RowsiftError::UnknownColumn(format!("{name} is not a column of this table"))
        })?;
        distinct_values(&self.rows()?, idx)
    }

    /// Range and increment of a `number` column.
    fn numeric_spec(&self, name: &str) -> Result<NumericSpec> {
        match self.column_type(name) {
            Some(ColumnType::Number) => {
                let values = self.all_values(name).map_err(|e| match e {
                    RowsiftError::Incomparable { .. } => {
                        RowsiftError::InsufficientData(format!("Bad data in column {name}"))
                    }
                    other => other,
                })?;
                numeric_spec(name, &values)
            }
            Some(other) => Err(RowsiftError::TypeMismatch(format!(
                "The type of {name} must be number, not {other}"
            ))),
            None => Err(RowsiftError::UnknownColumn(format!(
                "{name} is not a column of this table"
            ))),
        }
    }

    fn filtered_rows(&self, spec: &FilterSpec) -> Result<Vec<Row>> {
        let filter = Filter::compile(spec, &self.column_names())?;
        filter.retain(self.rows()?)
    }
}

type RowSupplier = Box<dyn Fn() -> Result<Vec<Row>> + Send + Sync>;

/// Schema plus a row-producing closure.
pub struct TableServer {
    schema: Vec<Column>,
    supplier: RowSupplier,
}

impl TableServer {
    pub fn new<F>(schema: Vec<Column>, supplier: F) -> Self
    where
        F: Fn() -> Result<Vec<Row>> + Send + Sync + 'static,
    {
        Self {
            schema,
            supplier: Box::new(supplier),
        }
    }
}

impl DataSource for TableServer {
    fn schema(&self) -> &[Column] {
        &self.schema
    }

    fn rows(&self) -> Result<Vec<Row>> {
        (self.supplier)()
    }
}

impl std::fmt::Debug for TableServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableServer")
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

/// Fixed rows held in memory.
#[derive(Debug, Clone)]
pub struct MemoryTable {
    schema: Vec<Column>,
    rows: Vec<Row>,
}

impl MemoryTable {
    pub fn new(schema: Vec<Column>, rows: Vec<Row>) -> Result<Self> {
        check_rows(&schema, &rows)?;
        Ok(Self { schema, rows })
    }
}

impl DataSource for MemoryTable {
    fn schema(&self) -> &[Column] {
        &self.schema
    }

    fn rows(&self) -> Result<Vec<Row>> {
        Ok(self.rows.clone())
    }
}
