//! Error types for storage operations

use std::fmt;
use std::path::PathBuf;

/// Result type alias for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations
#[derive(Debug)]
pub enum StorageError {
    /// Writing a file failed; the record would be lost
    WriteFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// An existing file could not be read
    ReadFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// An existing file does not contain what we wrote there
    Corrupt { path: PathBuf, message: String },

    /// Result serialization/deserialization error
    SerializationError(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::WriteFailed { path, source } => {
                write!(f, "failed to write {}: {}", path.display(), source)
            }
            StorageError::ReadFailed { path, source } => {
                write!(f, "failed to read {}: {}", path.display(), source)
            }
            StorageError::Corrupt { path, message } => {
                write!(f, "corrupt data in {}: {}", path.display(), message)
            }
            StorageError::SerializationError(msg) => {
                write!(f, "result serialization error: {}", msg)
            }
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageError::WriteFailed { source, .. } | StorageError::ReadFailed { source, .. } => {
                Some(source)
            }
            _ => None,
        }
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::SerializationError(err.to_string())
    }
}

impl StorageError {
    /// Whether this error came from reading existing data.
    ///
    /// Read errors degrade to empty history, everything else is fatal.
    pub fn is_read_error(&self) -> bool {
        matches!(
            self,
            StorageError::ReadFailed { .. } | StorageError::Corrupt { .. }
        )
    }
}
