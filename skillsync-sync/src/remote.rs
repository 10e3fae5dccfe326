//! Seams between the sync engine and the remote content store.
//!
//! The scheduler only needs a [`TreeFetcher`]; the update executor only needs a
//! [`ContentSource`]. [`crate::GitHubClient`] implements both; tests swap in
//! in-memory fakes.

use std::collections::HashMap;

use skillsync_core::SourceCoordinate;

use crate::error::FetchError;

/// Repository-relative posix path → blob hash, files only.
pub type RemoteTree = HashMap<String, String>;

/// Retrieves the recursive file listing of a repository branch.
pub trait TreeFetcher: Send + Sync {
    /// Only `owner`, `repo` and `branch` of `coord` are significant.
    fn fetch_tree(&self, coord: &SourceCoordinate) -> Result<RemoteTree, FetchError>;
}

/// Retrieves file content for the update executor.
pub trait ContentSource {
    /// Content of the blob with hash `sha`.
    fn fetch_blob(&self, coord: &SourceCoordinate, sha: &str) -> Result<Vec<u8>, FetchError>;

    /// Content of the file at repository-relative `path` on `coord.branch`.
    fn fetch_file(&self, coord: &SourceCoordinate, path: &str) -> Result<Vec<u8>, FetchError>;
}
