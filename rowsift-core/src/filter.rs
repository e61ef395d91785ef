use crate::observability::log_debug;
use crate::row_set::{row_id, RowSet};
use crate::spec::{ColumnRef, Combinator, FilterSpec};
use crate::value::{Row, Value};
use rowsift_common::{Result, RowsiftError};
use std::cmp::Ordering;

// --- compiled filter tree ---

/// A filter specification bound to a column list.
///
/// Column references are resolved to positions once, at [`Filter::compile`];
/// evaluation never looks at column names again. A compiled filter holds no
/// per-call state and may be shared between threads.
#[derive(Clone, Debug, PartialEq)]
pub enum Filter {
    Combine {
        combinator: Combinator,
        arguments: Vec<Filter>,
    },
    InList {
        column: usize,
        values: Vec<Value>,
    },
    InRange {
        column: usize,
        min_val: Value,
        max_val: Value,
    },
}

impl Filter {
    /// Bind `spec` to `columns`. Every leaf column must name one of `columns`
    /// (first match wins); otherwise this fails with `UnknownColumn`.
    ///
    /// Does not validate `spec`; callers holding untrusted JSON go through
    /// [`Filter::from_json`] or [`FilterSpec::parse`] first.
    pub fn compile<S: AsRef<str>>(spec: &FilterSpec, columns: &[S]) -> Result<Self> {
        match spec {
            FilterSpec::Combine { combinator, arguments } => Ok(Filter::Combine {
                combinator: *combinator,
                arguments: arguments
                    .iter()
                    .map(|argument| Filter::compile(argument, columns))
                    .collect::<Result<Vec<_>>>()?,
            }),
            FilterSpec::InList { column, values } => Ok(Filter::InList {
                column: resolve(column, columns)?,
                values: values.clone(),
            }),
            FilterSpec::InRange { column, min_val, max_val } => Ok(Filter::InRange {
                column: resolve(column, columns)?,
                min_val: min_val.clone(),
                max_val: max_val.clone(),
            }),
        }
    }

    /// Validate a JSON specification, then compile it.
    pub fn from_json<S: AsRef<str>>(spec: &serde_json::Value, columns: &[S]) -> Result<Self> {
        Filter::compile(&FilterSpec::parse(spec)?, columns)
    }

    /// Positions of the rows that pass the filter.
    pub fn index(&self, rows: &[Row]) -> Result<RowSet> {
        let universe = RowSet::full(rows.len())?;
        self.index_within(rows, &universe)
    }

    fn index_within(&self, rows: &[Row], universe: &RowSet) -> Result<RowSet> {
        match self {
            Filter::Combine { combinator, arguments } => {
                let mut child_sets = arguments.iter().map(|argument| argument.index_within(rows, universe));
                match combinator {
                    Combinator::All => child_sets.try_fold(universe.clone(), |acc, set| Ok(acc.intersect(&set?))),
                    Combinator::Any => child_sets.try_fold(RowSet::new(), |acc, set| Ok(acc.union(&set?))),
                    Combinator::None => {
                        let matched = child_sets.try_fold(RowSet::new(), |acc, set| Ok::<_, RowsiftError>(acc.union(&set?)))?;
                        Ok(universe.difference(&matched))
                    }
                }
            }
            Filter::InList { column, values } => {
                let mut set = RowSet::new();
                for (i, row) in rows.iter().enumerate() {
                    let value = cell(row, i, *column)?;
                    if values.iter().any(|v| value.matches(v)) {
                        set.insert(row_id(i)?);
                    }
                }
                Ok(set)
            }
            Filter::InRange { column, min_val, max_val } => {
                let mut set = RowSet::new();
                for (i, row) in rows.iter().enumerate() {
                    let value = cell(row, i, *column)?;
                    let above_min = ordering(value, min_val)? != Ordering::Less;
                    let below_max = ordering(value, max_val)? != Ordering::Greater;
                    if above_min && below_max {
                        set.insert(row_id(i)?);
                    }
                }
                Ok(set)
            }
        }
    }

    /// The rows that pass the filter, in input order.
    pub fn apply(&self, rows: &[Row]) -> Result<Vec<Row>> {
        let index = self.index(rows)?;
        Ok(index.iter().map(|i| rows[i as usize].clone()).collect())
    }

    /// Like [`Filter::apply`] but consumes `rows` instead of cloning matches.
    pub fn retain(&self, rows: Vec<Row>) -> Result<Vec<Row>> {
        let index = self.index(&rows)?;
        log_debug!(event = "filter_applied", rows = rows.len(), matched = index.len());
        Ok(rows
            .into_iter()
            .enumerate()
            .filter(|(i, _)| index.contains(*i as u32))
            .map(|(_, row)| row)
            .collect())
    }
}

fn resolve<S: AsRef<str>>(column: &ColumnRef, columns: &[S]) -> Result<usize> {
    columns
        .iter()
        .position(|name| column.names(name.as_ref()))
        .ok_or_else(|| RowsiftError::UnknownColumn(column.to_string()))
}

fn cell(row: &Row, position: usize, column: usize) -> Result<&Value> {
    row.get(column).ok_or(RowsiftError::RowShape {
        row: position,
        len: row.len(),
        column,
    })
}

fn ordering(cell: &Value, bound: &Value) -> Result<Ordering> {
    cell.compare(bound).ok_or_else(|| RowsiftError::Incomparable {
        left: format!("{} {cell}", cell.type_name()),
        right: format!("{} {bound}", bound.type_name()),
    })
}
