//! Failure taxonomy for catalog operations. Every transport maps its own
//! failures into [`CatalogError`] so the client and the UI can treat the
//! network and bridge paths identically.

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    /// A required field was blank. Raised before any transport is contacted.
    #[error("Please fill all fields ({0} is missing).")]
    MissingField(&'static str),

    /// The request never produced a response (connection refused, broken
    /// body, undecodable JSON).
    #[error("transport failure: {0}")]
    Transport(String),

    /// The collaborator answered with a non-success status.
    #[error("request rejected with status {status}")]
    Rejected { status: u16 },

    #[error("book {0} not found")]
    NotFound(i64),

    /// The embedded bridge raised an error while serving a request.
    #[error("bridge error: {0}")]
    Bridge(String),

    #[error("{operation} timed out after {}s", .after.as_secs())]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    /// The transport could not be bound at startup.
    #[error("failed to initialize {transport} transport: {reason}")]
    Init {
        transport: &'static str,
        reason: String,
    },
}

impl CatalogError {
    /// Failures that leave the view stale and can be retried by reloading.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CatalogError::Transport(_) | CatalogError::Timeout { .. } | CatalogError::Bridge(_)
        )
    }
}

impl From<reqwest::Error> for CatalogError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            CatalogError::Rejected {
                status: status.as_u16(),
            }
        } else {
            CatalogError::Transport(err.to_string())
        }
    }
}

pub type CatalogResult<T> = Result<T, CatalogError>;
