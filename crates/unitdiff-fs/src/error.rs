//! Error types for file system access.

use std::path::PathBuf;

use crate::file_system::OpenMode;

/// Errors raised by [`crate::FileSystem`] implementations.
///
/// Existence checks never produce these; absence is a normal `false` result.
#[derive(Debug, thiserror::Error)]
pub enum FsError {
    /// The path has no entry in the active snapshot.
    #[error("no entry for '{}' in snapshot", .path.display())]
    NotFound {
        /// The requested path.
        path: PathBuf,
    },

    /// The path resolves to a directory or other non-file entry.
    #[error("'{}' is not a blob", .path.display())]
    NotABlob {
        /// The requested path.
        path: PathBuf,
    },

    /// A write-capable open mode was requested.
    #[error("cannot open '{}' with mode {mode:?}: file system is read-only", .path.display())]
    UnsupportedMode {
        /// The requested path.
        path: PathBuf,
        /// The rejected mode.
        mode: OpenMode,
    },

    /// The operation has no meaning for a snapshot-backed path.
    #[error("{operation} is not supported for '{}'", .path.display())]
    Unsupported {
        /// Name of the rejected operation.
        operation: &'static str,
        /// The requested path.
        path: PathBuf,
    },

    /// A search pattern could not be compiled.
    #[error("invalid search pattern '{pattern}': {reason}")]
    InvalidPattern {
        /// The rejected pattern.
        pattern: String,
        /// Description of the compile failure.
        reason: String,
    },

    /// File content is not valid UTF-8.
    #[error("'{}' is not valid UTF-8", .path.display())]
    Encoding {
        /// The file that failed to decode.
        path: PathBuf,
    },

    /// Registering a preloaded project with the evaluation engine failed.
    #[error("failed to preload project '{}': {reason}", .path.display())]
    Preload {
        /// The project file path.
        path: PathBuf,
        /// Description of the failure.
        reason: String,
    },

    /// An I/O error from the live file system.
    #[error("I/O error at '{}': {source}", .path.display())]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },
}

impl FsError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        FsError::Io {
            path: path.into(),
            source,
        }
    }
}
