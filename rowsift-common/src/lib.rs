pub mod config;
pub use config::{Config, LoggingConfig, OutputConfig, TableConfig};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RowsiftError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),
    #[error("Config error: {0}")]
    Config(String),
    #[error("{0}")]
    TypeMismatch(String),
    #[error("There is no operator in {0}")]
    MissingOperator(String),
    #[error("{operator} is not a valid operator. Valid operators are {valid}")]
    UnknownOperator { operator: String, valid: String },
    #[error("{context} is missing required fields {}", .missing.join(", "))]
    MissingFields { context: String, missing: Vec<String> },
    #[error("Invalid values {} for IN_LIST", .values.join(", "))]
    InvalidValues { values: Vec<String> },
    #[error("{0} is not a valid column")]
    UnknownColumn(String),
    #[error("{0}")]
    InsufficientData(String),
    #[error("cannot compare {left} with {right}")]
    Incomparable { left: String, right: String },
    #[error("row {row} has {len} values, no value at column index {column}")]
    RowShape { row: usize, len: usize, column: usize },
    #[error("No handler defined for table {0}")]
    UnknownTable(String),
    #[error("{0}")]
    NoTables(String),
    #[error("{0}")]
    BadRequest(String),
}

impl RowsiftError {
    /// True for errors caused by the request or the data it names, as opposed
    /// to failures of the backing store. Serving layers map these to 4xx.
    pub fn is_client_error(&self) -> bool {
        !matches!(
            self,
            RowsiftError::Io(_)
                | RowsiftError::Json(_)
                | RowsiftError::Parquet(_)
                | RowsiftError::Arrow(_)
                | RowsiftError::Config(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, RowsiftError>;
