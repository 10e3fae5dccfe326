//! Error types for skillsync-sync.

use std::path::PathBuf;

use thiserror::Error;

use skillsync_core::{CoreError, RepoKey};

/// Failures talking to the remote content store. Every variant carries the
/// repository it was raised for so the message can be attributed to a group.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// HTTP 404: repository, branch, or object does not exist.
    #[error("Repository or branch not found: {coordinate}")]
    NotFound { coordinate: RepoKey },

    /// HTTP 403: request quota exhausted.
    #[error("GitHub API rate limit exceeded ({coordinate})")]
    RateLimited { coordinate: RepoKey },

    /// Timeout, connection failure, or any unexpected HTTP status.
    #[error("Network error for {coordinate}: {reason}")]
    Network { coordinate: RepoKey, reason: String },

    /// The response arrived but its body could not be decoded.
    #[error("invalid response for {coordinate}: {reason}")]
    InvalidResponse { coordinate: RepoKey, reason: String },
}

impl FetchError {
    pub fn coordinate(&self) -> &RepoKey {
        match self {
            FetchError::NotFound { coordinate }
            | FetchError::RateLimited { coordinate }
            | FetchError::Network { coordinate, .. }
            | FetchError::InvalidResponse { coordinate, .. } => coordinate,
        }
    }
}

/// All errors that can arise from diff, scheduling and update operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// An error from manifest loading or skill scanning.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Walking a skill directory failed part way.
    #[error("failed to walk {path}: {reason}")]
    Walk { path: PathBuf, reason: String },

    /// A skill path that would escape its directory.
    #[error("refusing to write outside skill directory: {path}")]
    UnsafePath { path: String },

    /// Remote fetch failure surfaced outside the per-skill result.
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}
