//! Query execution error types

/// Errors reported by a query executor.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    /// The executor rejected or failed to run the query.
    #[error("Query execution failed: {message}")]
    Execution { message: String },

    /// The query uses a construct the executor cannot evaluate.
    #[error("Unsupported query construct: {0}")]
    Unsupported(String),
}

impl QueryError {
    /// Creates an execution error.
    pub fn execution(message: impl Into<String>) -> Self {
        Self::Execution {
            message: message.into(),
        }
    }
}
