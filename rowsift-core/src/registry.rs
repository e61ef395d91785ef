//! Registry of table servers keyed by table name and optional dashboard.
//!
//! This is the request-handling layer: each method takes the parameters of
//! one request, answers it from the registered sources, and logs requests it
//! rejects. Transport is left to the caller.

use crate::filter::Filter;
use crate::observability::{log_error, log_info, log_warn};
use crate::schema::{Column, ColumnType};
use crate::source::DataSource;
use crate::spec::FilterSpec;
use crate::summary::{merge_values, NumericSpec};
use crate::value::{Row, Value};
use rowsift_common::{Result, RowsiftError};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TableKey {
    pub dashboard: Option<String>,
    pub table: String,
}

impl TableKey {
    pub fn new(table: &str, dashboard: Option<&str>) -> Result<Self> {
        if table.is_empty() {
            return Err(RowsiftError::BadRequest("table_name must be supplied".into()));
        }
        Ok(Self {
            dashboard: dashboard.map(str::to_owned),
            table: table.to_owned(),
        })
    }
}

impl fmt::Display for TableKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.dashboard {
            Some(d) => write!(f, "({d}, {})", self.table),
            None => f.write_str(&self.table),
        }
    }
}

#[derive(Default)]
pub struct TableRegistry {
    tables: BTreeMap<TableKey, Arc<dyn DataSource>>,
}

impl TableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `server` under `table` (and `dashboard`). Re-registering a
    /// key replaces the previous server.
    pub fn register(
        &mut self,
        table: &str,
        dashboard: Option<&str>,
        server: Arc<dyn DataSource>,
    ) -> Result<()> {
        let key = TableKey::new(table, dashboard)?;
        log_info!(event = "table_registered", key = %key, columns = server.schema().len());
        self.tables.insert(key, server);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn server(&self, table: &str, dashboard: Option<&str>) -> Result<Arc<dyn DataSource>> {
        let key = TableKey::new(table, dashboard)?;
        self.tables
            .get(&key)
            .cloned()
            .ok_or_else(|| RowsiftError::UnknownTable(key.to_string()))
    }

    /// The servers a column query consults: the named table only, or every
    /// table of `dashboard`, or every table when neither is given.
    pub fn servers(
        &self,
        table: Option<&str>,
        dashboard: Option<&str>,
    ) -> Result<Vec<(TableKey, Arc<dyn DataSource>)>> {
        if let Some(table) = table {
            let server = self.server(table, dashboard)?;
            return Ok(vec![(TableKey::new(table, dashboard)?, server)]);
        }
        let found: Vec<_> = self
            .tables
            .iter()
            .filter(|(key, _)| dashboard.is_none() || key.dashboard.as_deref() == dashboard)
            .map(|(key, server)| (key.clone(), Arc::clone(server)))
            .collect();
        if found.is_empty() {
            return Err(RowsiftError::NoTables(match dashboard {
                Some(d) => format!("No tables found for {d}"),
                None => "No tables found".into(),
            }));
        }
        Ok(found)
    }

    /// Rows of `table` matching the JSON filter spec, in source order. With no
    /// spec every row is returned.
    pub fn filtered_rows(
        &self,
        table: &str,
        dashboard: Option<&str>,
        spec: Option<&str>,
    ) -> Result<Vec<Row>> {
        let result = self.server(table, dashboard).and_then(|server| match spec {
            None => server.rows(),
            Some(text) => {
                let json: serde_json::Value = serde_json::from_str(text).map_err(|e| {
                    RowsiftError::BadRequest(format!(
                        "Bad Filter Specification: {text}.  Error {e}"
                    ))
                })?;
                let filter = Filter::compile(&FilterSpec::parse(&json)?, &server.column_names())?;
                filter.retain(server.rows()?)
            }
        });
        self.logged("filtered_rows", result)
    }

    /// Union of the distinct values of `column` across the consulted tables.
    pub fn all_values(
        &self,
        column: &str,
        table: Option<&str>,
        dashboard: Option<&str>,
    ) -> Result<Vec<Value>> {
        let result = self.servers(table, dashboard).and_then(|servers| {
            let lists = servers
                .iter()
                .filter(|(_, s)| s.column_type(column).is_some())
                .map(|(_, s)| s.all_values(column))
                .collect::<Result<Vec<_>>>()?;
            if lists.is_empty() {
                return Err(RowsiftError::BadRequest(format!(
                    "found no columns of name {column}"
                )));
            }
            merge_values(lists)
        });
        self.logged("all_values", result)
    }

    /// Numeric spec of `column` merged across the tables declaring it `number`.
    pub fn numeric_spec(
        &self,
        column: &str,
        table: Option<&str>,
        dashboard: Option<&str>,
    ) -> Result<NumericSpec> {
        let result = self.servers(table, dashboard).and_then(|servers| {
            let mut merged: Option<NumericSpec> = None;
            for (_, server) in &servers {
                if server.column_type(column) != Some(ColumnType::Number) {
                    continue;
                }
                let spec = server.numeric_spec(column)?;
                match merged.as_mut() {
                    Some(m) => m.merge(&spec),
                    None => merged = Some(spec),
                }
            }
            merged.ok_or_else(|| {
                RowsiftError::BadRequest(format!("found no numeric columns of name {column}"))
            })
        });
        self.logged("numeric_spec", result)
    }

    /// Every registered key with its schema.
    pub fn tables(&self) -> Vec<(TableKey, Vec<Column>)> {
        self.tables
            .iter()
            .map(|(key, server)| (key.clone(), server.schema().to_vec()))
            .collect()
    }

    fn logged<T>(&self, request: &str, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            if e.is_client_error() {
                log_warn!(event = "request_rejected", request, error = %e);
            } else {
                log_error!(event = "request_failed", request, error = %e);
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{MemoryTable, TableServer};

    fn table(rows: Vec<Row>) -> Arc<dyn DataSource> {
        let schema = vec![
            Column::new("Year", ColumnType::Number),
            Column::new("Party", ColumnType::String),
        ];
        Arc::new(MemoryTable::new(schema, rows).unwrap())
    }

    fn row(year: i64, party: &str) -> Row {
        vec![Value::Integer(year), Value::from(party)]
    }

    fn registry() -> TableRegistry {
        let mut r = TableRegistry::new();
        r.register("elections", Some("history"), table(vec![row(1828, "Democratic"), row(1836, "Whig")]))
            .unwrap();
        r.register("later", Some("history"), table(vec![row(1840, "Whig"), row(1842, "Liberty")]))
            .unwrap();
        let labels = vec![Column::new("Party", ColumnType::String)];
        r.register("labels", None, Arc::new(MemoryTable::new(labels, vec![vec![Value::from("Free Soil")]]).unwrap()))
            .unwrap();
        r
    }

    #[test]
    fn empty_table_name_is_rejected() {
        let mut r = TableRegistry::new();
        let err = r.register("", None, table(vec![])).unwrap_err();
        assert_eq!(err.to_string(), "table_name must be supplied");
        assert!(r.is_empty());
    }

    #[test]
    fn keys_include_the_dashboard() {
        let r = registry();
        assert!(r.server("elections", Some("history")).is_ok());
        let err = r.server("elections", None).err().unwrap();
        assert_eq!(err.to_string(), "No handler defined for table elections");
        assert_eq!(r.len(), 3);
    }

    #[test]
    fn filtered_rows_with_and_without_spec() {
        let r = registry();
        assert_eq!(r.filtered_rows("elections", Some("history"), None).unwrap().len(), 2);
        let spec = r#"{"operator": "IN_LIST", "column": "Party", "values": ["Whig"]}"#;
        let rows = r.filtered_rows("elections", Some("history"), Some(spec)).unwrap();
        assert_eq!(rows, vec![row(1836, "Whig")]);
    }

    #[test]
    fn bad_json_is_a_client_error() {
        let r = registry();
        let err = r.filtered_rows("elections", Some("history"), Some("{not json")).unwrap_err();
        assert!(err.to_string().starts_with("Bad Filter Specification: {not json."));
        assert!(err.is_client_error());
    }

    #[test]
    fn invalid_specs_and_columns_are_rejected() {
        let r = registry();
        let err = r
            .filtered_rows("elections", Some("history"), Some(r#"{"operator": "IN_LIST", "column": "Party"}"#))
            .unwrap_err();
        assert!(matches!(err, RowsiftError::MissingFields { .. }));
        let err = r
            .filtered_rows("elections", Some("history"), Some(r#"{"operator": "IN_LIST", "column": "Winner", "values": []}"#))
            .unwrap_err();
        assert_eq!(err.to_string(), "Winner is not a valid column");
    }

    #[test]
    fn all_values_merge_across_dashboard() {
        let r = registry();
        let values = r.all_values("Party", None, Some("history")).unwrap();
        assert_eq!(values, vec![Value::from("Democratic"), Value::from("Liberty"), Value::from("Whig")]);
        let everywhere = r.all_values("Party", None, None).unwrap();
        assert_eq!(everywhere.len(), 4);
        let one = r.all_values("Party", Some("labels"), None).unwrap();
        assert_eq!(one, vec![Value::from("Free Soil")]);
    }

    #[test]
    fn column_queries_need_a_matching_column() {
        let r = registry();
        let err = r.all_values("Winner", None, None).unwrap_err();
        assert_eq!(err.to_string(), "found no columns of name Winner");
        let err = r.numeric_spec("Party", None, None).unwrap_err();
        assert_eq!(err.to_string(), "found no numeric columns of name Party");
        let err = r.all_values("Party", None, Some("nowhere")).unwrap_err();
        assert_eq!(err.to_string(), "No tables found for nowhere");
    }

    #[test]
    fn numeric_specs_merge() {
        let r = registry();
        let spec = r.numeric_spec("Year", None, Some("history")).unwrap();
        assert_eq!(
            spec,
            NumericSpec { min_val: Value::Integer(1828), max_val: Value::Integer(1842), increment: Value::Integer(2) }
        );
    }

    #[test]
    fn store_failures_are_not_client_errors() {
        let mut r = TableRegistry::new();
        let broken = TableServer::new(vec![Column::new("n", ColumnType::Number)], || {
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into())
        });
        r.register("broken", None, Arc::new(broken)).unwrap();
        let err = r.filtered_rows("broken", None, None).unwrap_err();
        assert!(!err.is_client_error());
    }

    #[test]
    fn tables_lists_every_schema() {
        let tables = registry().tables();
        let names: Vec<String> = tables.iter().map(|(k, _)| k.to_string()).collect();
        assert_eq!(names, vec!["labels", "(history, elections)", "(history, later)"]);
        assert_eq!(tables[0].1, vec![Column::new("Party", ColumnType::String)]);
    }
}
