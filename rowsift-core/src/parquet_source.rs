use crate::schema::{Column, ColumnType};
use crate::source::DataSource;
use crate::value::{Row, Value};
use arrow::array::{
    Array, BooleanArray, Float32Array, Float64Array, Int16Array, Int32Array, Int64Array,
    Int8Array, LargeStringArray, StringArray, UInt16Array, UInt32Array, UInt64Array, UInt8Array,
};
use arrow::datatypes::{DataType, Schema};
use arrow::util::display::{ArrayFormatter, FormatOptions};
use bytes::Bytes;
use memmap2::Mmap;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use rowsift_common::{Result, RowsiftError};
use std::path::{Path, PathBuf};

/// A parquet file served as a table. Rows are decoded on every request.
#[derive(Debug, Clone)]
pub struct ParquetTable {
    path: PathBuf,
    schema: Vec<Column>,
}

impl ParquetTable {
    pub fn open(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        // footer and schema are read from a memory map of the file
        let mmap: Mmap = unsafe { Mmap::map(&file)? };
        let bytes = Bytes::copy_from_slice(&mmap);
        let builder = ParquetRecordBatchReaderBuilder::try_new(bytes)?;
        Ok(Self {
            path: path.to_path_buf(),
            schema: table_schema(builder.schema()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DataSource for ParquetTable {
    fn schema(&self) -> &[Column] {
        &self.schema
    }

    fn rows(&self) -> Result<Vec<Row>> {
        let file = std::fs::File::open(&self.path)?;
        let reader = ParquetRecordBatchReaderBuilder::try_new(file)?
            .with_batch_size(8192)
            .build()?;
        let mut rows = Vec::new();
        for batch in reader {
            let batch = batch?;
            let columns = batch
                .columns()
                .iter()
                .map(|array| column_values(array.as_ref()))
                .collect::<Result<Vec<_>>>()?;
            for i in 0..batch.num_rows() {
                rows.push(columns.iter().map(|col| col[i].clone()).collect());
            }
        }
        Ok(rows)
    }
}

pub fn table_schema(schema: &Schema) -> Vec<Column> {
    schema
        .fields()
        .iter()
        .map(|f| Column::new(f.name().clone(), column_type(f.data_type())))
        .collect()
}

/// Nested and exotic types are served as their display strings.
pub fn column_type(data_type: &DataType) -> ColumnType {
    match data_type {
        DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::Int64
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32
        | DataType::UInt64
        | DataType::Float32
        | DataType::Float64 => ColumnType::Number,
        DataType::Boolean => ColumnType::Boolean,
        DataType::Date32 | DataType::Date64 => ColumnType::Date,
        DataType::Timestamp(_, _) => ColumnType::Datetime,
        DataType::Time32(_) | DataType::Time64(_) => ColumnType::TimeOfDay,
        _ => ColumnType::String,
    }
}

fn downcast<'a, T: 'static>(array: &'a dyn Array) -> Result<&'a T> {
    array.as_any().downcast_ref::<T>().ok_or_else(|| {
        RowsiftError::TypeMismatch(format!("unexpected array layout for {}", array.data_type()))
    })
}

fn collect<F>(array: &dyn Array, cell: F) -> Vec<Value>
where
    F: Fn(usize) -> Value,
{
    (0..array.len())
        .map(|i| if array.is_null(i) { Value::Null } else { cell(i) })
        .collect()
}

fn column_values(array: &dyn Array) -> Result<Vec<Value>> {
    let values = match array.data_type() {
        DataType::Int8 => {
            let a = downcast::<Int8Array>(array)?;
            collect(array, |i| Value::Integer(a.value(i).into()))
        }
        DataType::Int16 => {
            let a = downcast::<Int16Array>(array)?;
            collect(array, |i| Value::Integer(a.value(i).into()))
        }
        DataType::Int32 => {
            let a = downcast::<Int32Array>(array)?;
            collect(array, |i| Value::Integer(a.value(i).into()))
        }
        DataType::Int64 => {
            let a = downcast::<Int64Array>(array)?;
            collect(array, |i| Value::Integer(a.value(i)))
        }
        DataType::UInt8 => {
            let a = downcast::<UInt8Array>(array)?;
            collect(array, |i| Value::Integer(a.value(i).into()))
        }
        DataType::UInt16 => {
            let a = downcast::<UInt16Array>(array)?;
            collect(array, |i| Value::Integer(a.value(i).into()))
        }
        DataType::UInt32 => {
            let a = downcast::<UInt32Array>(array)?;
            collect(array, |i| Value::Integer(a.value(i).into()))
        }
        DataType::UInt64 => {
            let a = downcast::<UInt64Array>(array)?;
            collect(array, |i| match i64::try_from(a.value(i)) {
                Ok(v) => Value::Integer(v),
                Err(_) => Value::Float(a.value(i) as f64),
            })
        }
        DataType::Float32 => {
            let a = downcast::<Float32Array>(array)?;
            collect(array, |i| Value::Float(a.value(i).into()))
        }
        DataType::Float64 => {
            let a = downcast::<Float64Array>(array)?;
            collect(array, |i| Value::Float(a.value(i)))
        }
        DataType::Utf8 => {
            let a = downcast::<StringArray>(array)?;
            collect(array, |i| Value::String(a.value(i).to_owned()))
        }
        DataType::LargeUtf8 => {
            let a = downcast::<LargeStringArray>(array)?;
            collect(array, |i| Value::String(a.value(i).to_owned()))
        }
        DataType::Boolean => {
            let a = downcast::<BooleanArray>(array)?;
            collect(array, |i| Value::Boolean(a.value(i)))
        }
        _ => {
            let formatter = ArrayFormatter::try_new(array, &FormatOptions::default())?;
            collect(array, |i| Value::String(formatter.value(i).to_string()))
        }
    };
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{ArrayRef, Date32Array};
    use arrow::datatypes::Field;
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;
    use std::sync::Arc;

    fn write_fixture(path: &Path) {
        let schema = Arc::new(Schema::new(vec![
            Field::new("id", DataType::Int32, false),
            Field::new("score", DataType::Float64, true),
            Field::new("name", DataType::Utf8, true),
            Field::new("day", DataType::Date32, false),
        ]));
        let columns: Vec<ArrayRef> = vec![
            Arc::new(Int32Array::from(vec![1, 2, 3])),
            Arc::new(Float64Array::from(vec![Some(0.5), None, Some(2.0)])),
            Arc::new(StringArray::from(vec![Some("a"), Some("b"), None])),
            Arc::new(Date32Array::from(vec![0, 1, 19723])),
        ];
        let batch = RecordBatch::try_new(schema.clone(), columns).unwrap();
        let file = std::fs::File::create(path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();
    }

    #[test]
    fn schema_maps_arrow_types() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.parquet");
        write_fixture(&path);
        let table = ParquetTable::open(&path).unwrap();
        assert_eq!(
            table.column_types(),
            vec![ColumnType::Number, ColumnType::Number, ColumnType::String, ColumnType::Date]
        );
    }

    #[test]
    fn rows_decode_with_nulls_and_iso_dates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.parquet");
        write_fixture(&path);
        let rows = ParquetTable::open(&path).unwrap().rows().unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(
            rows[0],
            vec![Value::Integer(1), Value::Float(0.5), Value::from("a"), Value::from("1970-01-01")]
        );
        assert_eq!(rows[1][1], Value::Null);
        assert_eq!(rows[2][2], Value::Null);
        assert_eq!(rows[2][3], Value::from("2024-01-01"));
    }

    #[test]
    fn timestamps_are_datetimes() {
        use arrow::datatypes::TimeUnit;
        assert_eq!(column_type(&DataType::Timestamp(TimeUnit::Millisecond, None)), ColumnType::Datetime);
        assert_eq!(column_type(&DataType::Time64(TimeUnit::Microsecond)), ColumnType::TimeOfDay);
    }
}
