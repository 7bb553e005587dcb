//! Error types

mod configuration;
mod data;
mod query;
mod storage;

pub use configuration::*;
pub use data::*;
pub use query::*;
pub use storage::*;

/// Umbrella error for a list render or action pass.
///
/// Any variant aborts the whole pass; nothing is rendered partially.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The list or one of its columns is misconfigured.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// A record value could not be interpreted for its column type.
    #[error(transparent)]
    Data(#[from] DataError),

    /// The query executor failed.
    #[error(transparent)]
    Query(#[from] QueryError),

    /// Preference or session storage failed.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// A template context could not be built.
    #[error("Failed to build render context: {0}")]
    Render(#[from] serde_json::Error),
}

impl Error {
    /// Returns `true` if this is a configuration error.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Error::Configuration(_))
    }

    /// Returns `true` if this is a data error.
    pub fn is_data(&self) -> bool {
        matches!(self, Error::Data(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_context_failure_is_an_error() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let error = Error::from(source);
        assert!(matches!(error, Error::Render(_)));
        assert!(!error.is_configuration());
        assert!(error.to_string().starts_with("Failed to build render context"));
    }
}
