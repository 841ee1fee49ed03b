//! Error types for the documentation site core.

use std::path::PathBuf;
use thiserror::Error;

use crate::config::ConfigError;

/// Errors raised by a persistence backend.
#[derive(Error, Debug)]
pub enum StorageError {
    /// I/O error while reading or writing a storage file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// No storage location could be determined
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// The backend refused the write (quota, privacy mode, ...)
    #[error("Storage write rejected: {0}")]
    WriteRejected(String),
}

/// Errors raised while parsing or producing an image document.
#[derive(Error, Debug)]
pub enum DocumentError {
    /// The text is not valid JSON of the expected shape
    #[error("Invalid image document: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised while turning an uploaded file into an image entry.
#[derive(Error, Debug)]
pub enum UploadError {
    /// The file could not be read
    #[error("Failed to read {path:?}: {source}")]
    Read {
        /// File that failed
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// The file was empty
    #[error("File {name} is empty")]
    Empty {
        /// File name as selected
        name: String,
    },

    /// The browser reader produced no usable result
    #[error("File reader failed for {name}: {message}")]
    Reader {
        /// File name as selected
        name: String,
        /// Reader error description
        message: String,
    },
}

/// Top-level error for fallible site operations.
#[derive(Error, Debug)]
pub enum DocsError {
    /// Catalog could not be parsed
    #[error("Invalid catalog: {0}")]
    Catalog(#[source] serde_json::Error),

    /// Unknown parameter key
    #[error("Unknown parameter key: {0}")]
    UnknownKey(String),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Export target could not be written
    #[error("Export failed: {0}")]
    Export(String),

    /// An input file could not be read
    #[error("Failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A fragment matched nothing within the retry budget
    #[error("No section or card matches '{fragment}' (gave up after {retries} retries)")]
    Unresolved { fragment: String, retries: u32 },
}

impl DocsError {
    /// Create an unknown key error.
    pub fn unknown_key(key: impl Into<String>) -> Self {
        Self::UnknownKey(key.into())
    }

    /// Read a whole text file, attaching the path to failures.
    pub fn read_to_string(path: &std::path::Path) -> Result<String, Self> {
        std::fs::read_to_string(path).map_err(|source| Self::Read {
            path: path.to_path_buf(),
            source,
        })
    }
}
