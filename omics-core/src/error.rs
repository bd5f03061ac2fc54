use thiserror::Error;

/// Per-request failures. Both are recoverable and map to client-visible responses.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("required columns not found in data file: {}", missing.join(", "))]
    ColumnsMissing { missing: Vec<String> },
    #[error("gene not found: {symbol}")]
    GeneNotFound { symbol: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    #[error("header row {header_row} is past the end of the sheet ({rows} rows)")]
    HeaderRowOutOfRange { header_row: usize, rows: usize },
}
