use crate::value::{Domain, Row, Value};
use rowsift_common::{Result, RowsiftError};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Range and step of a numeric column, as consumed by slider widgets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericSpec {
    pub min_val: Value,
    pub max_val: Value,
    pub increment: Value,
}

impl NumericSpec {
    /// Widen to cover `other`: min of mins, max of maxes, min of increments.
    pub fn merge(&mut self, other: &NumericSpec) {
        if less(&other.min_val, &self.min_val) {
            self.min_val = other.min_val.clone();
        }
        if less(&self.max_val, &other.max_val) {
            self.max_val = other.max_val.clone();
        }
        if less(&other.increment, &self.increment) {
            self.increment = other.increment.clone();
        }
    }
}

fn less(a: &Value, b: &Value) -> bool {
    a.compare(b) == Some(Ordering::Less)
}

/// Sort ascending and drop duplicates. All values must share a domain.
pub fn sorted_distinct(mut values: Vec<Value>) -> Result<Vec<Value>> {
    if let Some(first) = values.first() {
        let domain = first.domain();
        if let Some(odd) = values.iter().find(|v| v.domain() != domain) {
            return Err(RowsiftError::Incomparable {
                left: format!("{} {first}", first.type_name()),
                right: format!("{} {odd}", odd.type_name()),
            });
        }
    }
    values.sort_by(total_order);
    values.dedup_by(|a, b| a.matches(b) || (a.domain() == Domain::Null && b.domain() == Domain::Null));
    Ok(values)
}

// callers guarantee a single domain
fn total_order(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Boolean(x), Value::Boolean(y)) => x.cmp(y),
        (Value::Integer(x), Value::Integer(y)) => x.cmp(y),
        _ => match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => x.total_cmp(&y),
            _ => Ordering::Equal,
        },
    }
}

/// Distinct values of one column, ascending.
pub fn distinct_values(rows: &[Row], column: usize) -> Result<Vec<Value>> {
    let projected = rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            row.get(column).cloned().ok_or(RowsiftError::RowShape {
                row: i,
                len: row.len(),
                column,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    sorted_distinct(projected)
}

/// Union of several distinct-value lists, re-sorted.
pub fn merge_values(lists: Vec<Vec<Value>>) -> Result<Vec<Value>> {
    sorted_distinct(lists.into_iter().flatten().collect())
}

/// Numeric spec from a column's sorted distinct values.
///
/// The increment is the smallest strictly positive gap between neighbours.
pub fn numeric_spec(column_name: &str, values: &[Value]) -> Result<NumericSpec> {
    let bad_data = || RowsiftError::InsufficientData(format!("Bad data in column {column_name}"));
    if values.iter().any(|v| v.as_f64().map_or(true, f64::is_nan)) {
        return Err(bad_data());
    }
    let (Some(first), Some(last)) = (values.first(), values.last()) else {
        return Err(too_few(column_name));
    };
    let zero = Value::Integer(0);
    let mut increment: Option<Value> = None;
    for pair in values.windows(2) {
        let diff = pair[1].difference(&pair[0]).ok_or_else(bad_data)?;
        if less(&zero, &diff) && increment.as_ref().map_or(true, |inc| less(&diff, inc)) {
            increment = Some(diff);
        }
    }
    let increment = increment.ok_or_else(|| too_few(column_name))?;
    Ok(NumericSpec {
        min_val: first.clone(),
        max_val: last.clone(),
        increment,
    })
}

fn too_few(column_name: &str) -> RowsiftError {
    RowsiftError::InsufficientData(format!(
        "column {column_name} needs at least two distinct values to compute an increment"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(values: &[i64]) -> Vec<Value> {
        values.iter().map(|v| Value::Integer(*v)).collect()
    }

    #[test]
    fn distinct_values_sorts_and_dedupes() {
        let rows: Vec<Row> = ["b", "a", "c", "a"].iter().map(|s| vec![Value::from(*s)]).collect();
        let values = distinct_values(&rows, 0).unwrap();
        assert_eq!(values, vec![Value::from("a"), Value::from("b"), Value::from("c")]);
    }

    #[test]
    fn numbers_dedupe_across_int_and_float() {
        let values = sorted_distinct(vec![Value::Float(3.0), Value::Integer(1), Value::Integer(3), Value::Float(2.5)]).unwrap();
        assert_eq!(values, vec![Value::Integer(1), Value::Float(2.5), Value::Float(3.0)]);
    }

    #[test]
    fn large_integers_sort_exactly() {
        let big = 1_i64 << 53;
        let values = sorted_distinct(ints(&[big + 1, big])).unwrap();
        assert_eq!(values, ints(&[big, big + 1]));
        let spec = numeric_spec("n", &values).unwrap();
        assert_eq!(spec.max_val, Value::Integer(big + 1));
        assert_eq!(spec.increment, Value::Integer(1));
    }

    #[test]
    fn mixed_domains_cannot_be_sorted() {
        let err = sorted_distinct(vec![Value::Integer(1), Value::from("1")]).unwrap_err();
        assert!(matches!(err, RowsiftError::Incomparable { .. }));
        assert!(sorted_distinct(vec![Value::Null, Value::Integer(2)]).is_err());
        assert_eq!(sorted_distinct(vec![Value::Null, Value::Null]).unwrap(), vec![Value::Null]);
    }

    #[test]
    fn numeric_spec_finds_smallest_positive_gap() {
        let values = sorted_distinct(ints(&[1840, 1828, 1836, 1832, 1848])).unwrap();
        let spec = numeric_spec("Year", &values).unwrap();
        assert_eq!(spec, NumericSpec { min_val: Value::Integer(1828), max_val: Value::Integer(1848), increment: Value::Integer(4) });
    }

    #[test]
    fn numeric_spec_with_floats() {
        let values = sorted_distinct(vec![Value::Float(0.5), Value::Integer(2), Value::Float(0.75)]).unwrap();
        let spec = numeric_spec("x", &values).unwrap();
        assert_eq!(spec.increment, Value::Float(0.25));
        assert_eq!(spec.min_val, Value::Float(0.5));
        assert_eq!(spec.max_val, Value::Integer(2));
    }

    #[test]
    fn numeric_spec_needs_two_numeric_values() {
        assert!(matches!(numeric_spec("x", &ints(&[5])), Err(RowsiftError::InsufficientData(_))));
        assert!(matches!(numeric_spec("x", &[]), Err(RowsiftError::InsufficientData(_))));
        let strings = vec![Value::from("a"), Value::from("b")];
        assert!(matches!(numeric_spec("x", &strings), Err(RowsiftError::InsufficientData(_))));
        let nan = vec![Value::Float(1.0), Value::Float(f64::NAN)];
        assert!(matches!(numeric_spec("x", &nan), Err(RowsiftError::InsufficientData(_))));
    }

    #[test]
    fn merge_widens_range_and_narrows_step() {
        let mut spec = NumericSpec { min_val: Value::Integer(10), max_val: Value::Integer(20), increment: Value::Integer(5) };
        spec.merge(&NumericSpec { min_val: Value::Integer(0), max_val: Value::Integer(15), increment: Value::Float(2.5) });
        assert_eq!(spec, NumericSpec { min_val: Value::Integer(0), max_val: Value::Integer(20), increment: Value::Float(2.5) });
    }

    #[test]
    fn merge_values_unions_lists() {
        let merged = merge_values(vec![ints(&[1, 3]), ints(&[2, 3, 4])]).unwrap();
        assert_eq!(merged, ints(&[1, 2, 3, 4]));
    }
}
