//! Centralized error types for eml2pdf.

use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the eml2pdf library.
#[derive(Error, Debug)]
pub enum ConvertError {
    /// I/O error with the associated file path.
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The input directory does not exist.
    #[error("Input directory not found: {0}")]
    InputDirNotFound(PathBuf),

    /// The specified message file does not exist.
    #[error("Message file not found: {0}")]
    FileNotFound(PathBuf),

    /// A MIME decoding error.
    #[error("MIME decoding error: {0}")]
    MimeError(String),

    /// An external tool could not be spawned.
    #[error("Failed to run '{tool}': {source}")]
    ToolSpawn {
        tool: String,
        source: std::io::Error,
    },

    /// An external tool exited with a failure status.
    #[error("'{tool}' failed with status {status}: {detail}")]
    ToolFailed {
        tool: String,
        status: String,
        detail: String,
    },

    /// A required external tool is not installed.
    #[error("Required tool '{tool}' not found. {hint}")]
    ToolMissing { tool: String, hint: String },

    /// The PDF engine completed but produced no output file.
    #[error("PDF engine produced no output for '{0}'")]
    NoPdfOutput(PathBuf),

    /// An invalid path was provided.
    #[error("Invalid path: {0}")]
    InvalidPath(String),
}

/// Convenience alias for `Result<T, ConvertError>`.
pub type Result<T> = std::result::Result<T, ConvertError>;

impl ConvertError {
    /// Create an `Io` variant from a path and an `io::Error`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Allow `?` on `std::io::Error` inside functions returning `ConvertError`
/// when no path context is available (rare — prefer `ConvertError::io`).
impl From<std::io::Error> for ConvertError {
    fn from(source: std::io::Error) -> Self {
        Self::Io {
            path: PathBuf::from("<unknown>"),
            source,
        }
    }
}
