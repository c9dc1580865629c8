//! Error types for release resolution, transport, and extraction.
//!
//! Every component reports failures through [`FetchError`]. Callers that
//! only need the coarse classification (for example, to decide whether to
//! tell the user the forge is unreachable or that the release lacks the
//! requested file) use [`FetchError::kind`].

use thiserror::Error;

/// Coarse classification of a [`FetchError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Connection, DNS, timeout, cancellation, or unexpected HTTP status.
    Network,
    /// Malformed JSON or archive structure.
    Decode,
    /// A release, asset, or archive entry does not exist.
    NotFound,
    /// The caller supplied an unusable argument.
    InvalidInput,
}

/// Errors that can occur while fetching release files.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The request could not be completed at the transport layer.
    #[error("request to {url} failed: {reason}")]
    Network {
        /// The URL that was requested.
        url: String,
        /// Description of the failure.
        reason: String,
    },

    /// The host fetch primitive rejected the request.
    #[error("net/http: {message}")]
    Host {
        /// The translated host error message, including one level of cause.
        message: String,
    },

    /// The request deadline elapsed before the operation completed.
    #[error("request timed out")]
    DeadlineExceeded,

    /// The request was cancelled by the caller.
    #[error("request cancelled")]
    Cancelled,

    /// The server answered with a status the caller cannot use.
    #[error("invalid status code {status} for {url}")]
    UnexpectedStatus {
        /// The URL that was requested.
        url: String,
        /// The HTTP status code returned.
        status: u16,
    },

    /// A response or archive could not be decoded.
    #[error("failed to decode {what}: {reason}")]
    Decode {
        /// What was being decoded (for example, `release metadata`).
        what: &'static str,
        /// Description of the decode failure.
        reason: String,
    },

    /// The requested item does not exist.
    #[error("{what} not found")]
    NotFound {
        /// Description of the missing item.
        what: String,
    },

    /// The caller supplied an invalid argument.
    #[error("invalid input: {reason}")]
    InvalidInput {
        /// Description of the rejected input.
        reason: String,
    },
}

impl FetchError {
    /// Return the coarse classification of this error.
    ///
    /// Timeouts, cancellation, host rejections, and unexpected statuses all
    /// count as network failures.
    ///
    /// # Examples
    ///
    /// ```
    /// use forgefetch::error::{ErrorKind, FetchError};
    ///
    /// assert_eq!(FetchError::DeadlineExceeded.kind(), ErrorKind::Network);
    /// ```
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Network { .. }
            | Self::Host { .. }
            | Self::DeadlineExceeded
            | Self::Cancelled
            | Self::UnexpectedStatus { .. } => ErrorKind::Network,
            Self::Decode { .. } => ErrorKind::Decode,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::InvalidInput { .. } => ErrorKind::InvalidInput,
        }
    }

    /// Returns true when the error came from a context deadline or an
    /// explicit cancellation rather than from the network itself.
    #[must_use]
    pub const fn is_cancellation(&self) -> bool {
        matches!(self, Self::DeadlineExceeded | Self::Cancelled)
    }

    pub(crate) fn network(url: &str, reason: impl std::fmt::Display) -> Self {
        Self::Network {
            url: url.to_owned(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    pub(crate) fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }
}

/// Result type alias using [`FetchError`].
pub type Result<T> = std::result::Result<T, FetchError>;
