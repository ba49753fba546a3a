use thiserror::Error;

/// Errors raised while loading or summarizing a suppression dataset.
///
/// `Schema`, `TypeConversion` and the I/O family are fatal to the current
/// load. `EmptyResult` and `DivisionByZero` are raised by individual
/// computations and are expected to be caught by the caller.
#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("Missing required column(s): {}", missing.join(", "))]
    Schema { missing: Vec<String> },

    #[error("Column '{column}' has a non-numeric value {value:?} on row {row}")]
    TypeConversion {
        column: String,
        row: usize,
        value: String,
    },

    #[error("No rows matched: {0}")]
    EmptyResult(String),

    #[error("Latest-week total for brand '{brand}' is zero")]
    DivisionByZero { brand: String },

    #[error("Unsupported input format: {0}")]
    UnsupportedFormat(String),

    #[error("Workbook error: {0}")]
    Workbook(String),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
