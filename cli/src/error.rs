//! Error types for the `forgefetch` CLI.

use camino::Utf8PathBuf;
use forgefetch::FetchError;
use thiserror::Error;

/// Errors reported by the CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// A pipeline operation failed.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The configuration file could not be read.
    #[error("failed to read configuration {path}: {source}")]
    ConfigRead {
        /// Path of the configuration file.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML or has unknown keys.
    #[error("invalid configuration {path}: {reason}")]
    ConfigParse {
        /// Path of the configuration file.
        path: Utf8PathBuf,
        /// Parser message.
        reason: String,
    },

    /// A configuration value is out of range.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// Description of the problem.
        reason: String,
    },

    /// A local input file or directory could not be read.
    #[error("failed to read {path}: {source}")]
    ReadInput {
        /// Path that failed.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// An output file could not be written.
    #[error("failed to write {path}: {source}")]
    WriteOutput {
        /// Path that failed.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A path is not valid UTF-8.
    #[error("path is not valid UTF-8: {path}")]
    NonUtf8Path {
        /// Lossy rendering of the path.
        path: String,
    },
}

/// Convenience alias for CLI results.
pub type Result<T> = std::result::Result<T, CliError>;
