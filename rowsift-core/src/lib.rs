mod observability;

pub mod dashboard_table;
pub mod filter;
pub mod parquet_source;
pub mod registry;
pub mod row_set;
pub mod scanner;
pub mod schema;
pub mod source;
pub mod spec;
pub mod summary;
pub mod value;

pub use dashboard_table::JsonTableFile;
pub use filter::Filter;
pub use parquet_source::ParquetTable;
pub use registry::{TableKey, TableRegistry};
pub use row_set::{RowId, RowSet};
pub use rowsift_common::{Result, RowsiftError};
pub use scanner::{open_table, resolve_table_paths, LoadedTable};
pub use schema::{Column, ColumnType};
pub use source::{DataSource, MemoryTable, TableServer};
pub use spec::{validate, ColumnRef, Combinator, FilterSpec, Operator};
pub use summary::NumericSpec;
pub use value::{Row, Value};
