//! Error types for the listing engine.
//!
//! [`ListingError`] is the crate-wide error and [`Result`] its alias. Failures
//! that must be handed to several waiters at once (a de-duplicated list
//! request resolves every caller with the same outcome) are carried as the
//! cloneable [`FetchFailure`] summary instead.

use thiserror::Error;

/// The main error type for listing operations.
///
/// Transport and status variants come from the REST boundary; storage, I/O
/// and configuration variants come from the local side (filter snapshots,
/// config files, themes).
///
/// # Examples
///
/// ```
/// use erp_listing::ListingError;
///
/// let err = ListingError::Status { status: 404, message: "Not found.".into() };
/// assert_eq!(err.status(), Some(404));
/// ```
#[derive(Debug, Error)]
pub enum ListingError {
    /// The HTTP request could not be sent or its body could not be read.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The collection endpoint answered with a non-2xx status.
    ///
    /// `message` is the `detail`/`message` field of the JSON error body when
    /// present, otherwise the raw body.
    #[error("Request failed with status {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Server-provided description.
        message: String,
    },

    /// A response body did not match the expected `{ count, results }` shape.
    #[error("Decode error: {0}")]
    Decode(String),

    /// Reading or writing the filter snapshot failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Filesystem or I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration is invalid or could not be loaded.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A background fetch task failed or was dropped before answering.
    #[error("Worker error: {0}")]
    Worker(String),

    /// Theme parsing failed.
    #[error("Theme error: {0}")]
    Theme(String),

    /// A shared list request failed; every waiter receives the same summary.
    #[error("{0}")]
    Fetch(FetchFailure),
}

impl ListingError {
    /// Returns the HTTP status attached to this error, if any.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Fetch(failure) => failure.status,
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ListingError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ListingError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

/// Cloneable summary of a failed list request.
///
/// Stored in the cache and handed to the view, which only needs something to
/// show to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchFailure {
    /// HTTP status if the server answered at all.
    pub status: Option<u16>,
    /// Human-readable description.
    pub message: String,
}

impl std::fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.status {
            Some(status) => write!(f, "{} ({status})", self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl From<&ListingError> for FetchFailure {
    fn from(err: &ListingError) -> Self {
        match err {
            ListingError::Status { status, message } => Self {
                status: Some(*status),
                message: message.clone(),
            },
            ListingError::Fetch(failure) => failure.clone(),
            other => Self {
                status: None,
                message: other.to_string(),
            },
        }
    }
}

impl From<ListingError> for FetchFailure {
    fn from(err: ListingError) -> Self {
        Self::from(&err)
    }
}

/// A specialized `Result` type for listing operations.
pub type Result<T> = std::result::Result<T, ListingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_errors_keep_code_in_failure_summary() {
        let err = ListingError::Status {
            status: 400,
            message: "Invalid page.".to_string(),
        };
        let failure = FetchFailure::from(&err);
        assert_eq!(failure.status, Some(400));
        assert_eq!(failure.message, "Invalid page.");
        assert_eq!(failure.to_string(), "Invalid page. (400)");
    }

    #[test]
    fn transport_errors_have_no_status() {
        let failure = FetchFailure::from(ListingError::Transport("connection refused".into()));
        assert_eq!(failure.status, None);
        assert!(failure.message.contains("connection refused"));
    }
}
