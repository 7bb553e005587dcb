//! Data error types

/// Errors raised while interpreting record values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DataError {
    /// A date/time column holds a value that is not a calendar timestamp.
    #[error("Column '{column}' contains an invalid date/time value: {value}")]
    InvalidDateTime { column: String, value: String },
}
