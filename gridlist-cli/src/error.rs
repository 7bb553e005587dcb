use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Failed to read '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse '{path}': {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Record fixture '{path}' must be a JSON array")]
    NotAnArray { path: PathBuf },

    #[error("Failed to create '{path}': {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to encode response: {0}")]
    Encode(#[from] serde_json::Error),

    #[error(transparent)]
    List(#[from] gridlist_lib::error::Error),

    #[error(transparent)]
    Storage(#[from] gridlist_lib::error::StorageError),
}
