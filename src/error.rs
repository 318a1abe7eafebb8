//! Errors surfaced by the repository pipeline.
//!
//! Only fetch failures reach callers. Cache failures have their own type in
//! [`crate::cache::CacheError`] and never leave the cache store.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FolioError {
    /// The API refused the request because the caller is throttled.
    #[error("GitHub API rate limit exceeded. Please try again later.")]
    RateLimited,

    /// Any other non-success response, unreadable body, or connection failure.
    /// `status` is `None` when no HTTP response was received.
    #[error("GitHub API error: {message}")]
    Transport {
        status: Option<u16>,
        message: String,
    },
}

impl FolioError {
    pub fn transport(status: Option<u16>, message: impl Into<String>) -> Self {
        FolioError::Transport {
            status,
            message: message.into(),
        }
    }

    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            FolioError::RateLimited => None,
            FolioError::Transport { status, .. } => *status,
        }
    }
}

impl From<reqwest::Error> for FolioError {
    fn from(err: reqwest::Error) -> Self {
        FolioError::transport(err.status().map(|s| s.as_u16()), err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, FolioError>;
