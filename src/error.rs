//! Error types for the mapping resolution system
//!
//! These are operational failures (I/O, malformed metadata, bad configuration).
//! Problems found in the user's mapping declarations are not errors in this
//! sense; they are reported as [`crate::diagnostics::Diagnostic`] values.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for loading metadata and running resolution
#[derive(Error, Debug)]
pub enum MapError {
    /// File system errors
    #[error("Failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write file '{path}': {source}")]
    FileWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Metadata document errors
    #[error("Failed to parse metadata document '{path}': {reason}")]
    MetadataParse { path: PathBuf, reason: String },

    #[error("Type '{name}' is described more than once in the metadata document")]
    DuplicateType { name: String },

    #[error("Type '{name}' not found in the metadata document")]
    TypeNotFound { name: String },

    /// Configuration errors
    #[error("Invalid configuration: {reason}")]
    ConfigError { reason: String },

    #[error("Failed to build resolution thread pool: {reason}")]
    ThreadPool { reason: String },

    #[error("Failed to serialize output: {0}")]
    Serialize(#[from] serde_json::Error),

    /// General errors for cases where we need to preserve existing behavior
    #[error("{0}")]
    General(String),
}

impl MapError {
    /// Get a stable status code for this error type.
    ///
    /// Returns a string identifier that can be used in JSON responses
    /// for programmatic error handling.
    pub fn status_code(&self) -> String {
        match self {
            Self::FileRead { .. } => "FILE_READ_ERROR",
            Self::FileWrite { .. } => "FILE_WRITE_ERROR",
            Self::MetadataParse { .. } => "METADATA_PARSE_ERROR",
            Self::DuplicateType { .. } => "DUPLICATE_TYPE",
            Self::TypeNotFound { .. } => "TYPE_NOT_FOUND",
            Self::ConfigError { .. } => "CONFIG_ERROR",
            Self::ThreadPool { .. } => "THREAD_POOL_ERROR",
            Self::Serialize(_) => "SERIALIZE_ERROR",
            Self::General(_) => "GENERAL_ERROR",
        }
        .to_string()
    }

    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            Self::FileRead { .. } => vec![
                "Check that the file exists and you have read permissions",
                "Ensure the metadata exporter finished writing the document",
            ],
            Self::MetadataParse { .. } => vec![
                "Re-export the metadata document from your build",
                "Type references must be objects like {\"named\": \"App.Models.User\"}",
            ],
            Self::DuplicateType { .. } => vec![
                "Each fully qualified type name may appear only once",
                "Partial declarations must be merged before export",
            ],
            Self::ConfigError { .. } => vec![
                "Run 'mapweave config' to inspect the effective settings",
                "Run 'mapweave init --force' to regenerate .mapweave/settings.toml",
            ],
            Self::ThreadPool { .. } => {
                vec!["Set resolution.parallel_threads = 1 to resolve on a single thread"]
            }
            _ => vec![],
        }
    }
}

/// Result type alias for mapping operations
pub type MapResult<T> = Result<T, MapError>;

/// Helper trait for adding context to errors
pub trait ErrorContext<T> {
    /// Add context to an error
    fn context(self, msg: &str) -> Result<T, MapError>;
}

impl<T, E> ErrorContext<T> for Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn context(self, msg: &str) -> Result<T, MapError> {
        self.map_err(|e| MapError::General(format!("{msg}: {e}")))
    }
}
