use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("Empty input: {0}")]
    EmptyInput(String),

    #[error("Invariant violated: {0}")]
    Invariant(String),

    #[error("Invalid vector dimension: expected {expected}, got {actual}")]
    InvalidDimension { expected: usize, actual: usize },

    #[error("Customer not found: {0}")]
    NotFound(String),

    #[error("Row index {index} out of range for {len} rows")]
    OutOfRange { index: usize, len: usize },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Query cancelled before it ran")]
    Cancelled,
}

impl Error {
    /// Per-query errors that a batch isolates to their own entry.
    /// Everything else aborts the stage that raised it.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::NotFound(_) | Error::Cancelled)
    }
}

/// Errors raised while reading columns out of tabular input
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    #[error("missing required column '{0}'")]
    MissingColumn(String),

    #[error("invalid value in column '{column}' at row {row}: {reason}")]
    InvalidValue {
        column: String,
        row: usize,
        reason: String,
    },

    #[error("column count mismatch: expected {expected}, got {actual}")]
    WidthMismatch { expected: usize, actual: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_errors() {
        assert!(Error::NotFound("C0001".to_string()).is_recoverable());
        assert!(Error::Cancelled.is_recoverable());
        assert!(!Error::EmptyInput("transactions".to_string()).is_recoverable());
        assert!(!Error::InvalidArgument("k".to_string()).is_recoverable());
    }

    #[test]
    fn test_schema_error_converts() {
        let err: Error = SchemaError::MissingColumn("Region".to_string()).into();
        assert_eq!(err.to_string(), "Schema error: missing required column 'Region'");
    }
}
