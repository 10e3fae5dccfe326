//! GitHub REST client for tree listings and blob content.
//!
//! Endpoints:
//!
//! ```text
//! GET /repos/{owner}/{repo}/git/trees/{branch}?recursive=1
//! GET /repos/{owner}/{repo}/git/blobs/{sha}
//! GET /repos/{owner}/{repo}/contents/{path}?ref={branch}
//! ```
//!
//! There is no retry at this layer; each request is bounded by the configured
//! timeout.

use base64::Engine as _;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;

use skillsync_core::{RepoKey, SourceCoordinate};

use crate::config::SyncConfig;
use crate::error::FetchError;
use crate::remote::{ContentSource, RemoteTree, TreeFetcher};

const ACCEPT: &str = "application/vnd.github+json";

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(crate) struct TreeResponse {
    #[serde(default)]
    pub tree: Vec<TreeEntry>,
    #[serde(default)]
    pub truncated: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TreeEntry {
    pub path: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub sha: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BlobResponse {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub encoding: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ContentsResponse {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub encoding: Option<String>,
    #[serde(default)]
    pub sha: Option<String>,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Blocking client over a shared `ureq` agent.
pub struct GitHubClient {
    agent: ureq::Agent,
    config: SyncConfig,
}

impl GitHubClient {
    pub fn new(config: SyncConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build();
        Self { agent, config }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// `{api_base}/repos/{owner}/{repo}/{tail..}` with every segment
    /// percent-encoded. A path prefix on the base (GitHub Enterprise) is kept.
    fn endpoint(&self, key: &RepoKey, tail: &[&str]) -> Result<Url, FetchError> {
        let base = &self.config.api_base;
        let invalid = |reason: String| FetchError::Network {
            coordinate: key.clone(),
            reason,
        };
        let mut url =
            Url::parse(base).map_err(|e| invalid(format!("invalid API base {base}: {e}")))?;
        url.path_segments_mut()
            .map_err(|()| invalid(format!("invalid API base {base}: cannot carry a path")))?
            .pop_if_empty()
            .extend(["repos", key.owner.as_str(), key.repo.as_str()])
            .extend(tail.iter().copied());
        Ok(url)
    }

    fn get_json<T: DeserializeOwned>(&self, key: &RepoKey, url: &Url) -> Result<T, FetchError> {
        tracing::debug!("GET {url}");
        let mut request = self.agent.get(url.as_str()).set("Accept", ACCEPT);
        if let Some(token) = self.config.token.as_deref() {
            request = request.set("Authorization", &format!("Bearer {token}"));
        }
        let response = request.call().map_err(|e| classify(key, e))?;
        response
            .into_json::<T>()
            .map_err(|e| FetchError::InvalidResponse {
                coordinate: key.clone(),
                reason: e.to_string(),
            })
    }
}

impl TreeFetcher for GitHubClient {
    fn fetch_tree(&self, coord: &SourceCoordinate) -> Result<RemoteTree, FetchError> {
        let key = coord.repo_key();
        let mut url = self.endpoint(&key, &["git", "trees", key.branch.as_str()])?;
        url.query_pairs_mut().append_pair("recursive", "1");
        let response: TreeResponse = self.get_json(&key, &url)?;
        if response.truncated {
            tracing::warn!("tree listing for {key} is truncated; some files may be reported missing");
        }
        let tree = tree_from_response(response);
        tracing::info!("fetched tree for {key} ({} files)", tree.len());
        Ok(tree)
    }
}

impl ContentSource for GitHubClient {
    fn fetch_blob(&self, coord: &SourceCoordinate, sha: &str) -> Result<Vec<u8>, FetchError> {
        let key = coord.repo_key();
        let url = self.endpoint(&key, &["git", "blobs", sha])?;
        let blob: BlobResponse = self.get_json(&key, &url)?;
        decode_content(&key, &blob.content, blob.encoding.as_deref())
    }

    fn fetch_file(&self, coord: &SourceCoordinate, path: &str) -> Result<Vec<u8>, FetchError> {
        let key = coord.repo_key();
        let mut tail = vec!["contents"];
        tail.extend(path.split('/').filter(|s| !s.is_empty()));
        let mut url = self.endpoint(&key, &tail)?;
        url.query_pairs_mut().append_pair("ref", &key.branch);
        let contents: ContentsResponse = self.get_json(&key, &url)?;
        match (contents.content, contents.sha) {
            // Large files come back without inline content; resolve by hash.
            (Some(content), _) if !content.trim().is_empty() => {
                decode_content(&key, &content, contents.encoding.as_deref())
            }
            (_, Some(sha)) => self.fetch_blob(coord, &sha),
            (Some(_), None) => Ok(Vec::new()),
            (None, None) => Err(FetchError::InvalidResponse {
                coordinate: key,
                reason: format!("no content or sha for {path}"),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Keep blob entries only; directories (`tree`) and submodules (`commit`) drop out.
pub(crate) fn tree_from_response(response: TreeResponse) -> RemoteTree {
    response
        .tree
        .into_iter()
        .filter(|entry| entry.kind == "blob")
        .map(|entry| (entry.path, entry.sha))
        .collect()
}

/// Map an HTTP status onto the fetch taxonomy.
pub(crate) fn status_error(key: &RepoKey, code: u16) -> FetchError {
    match code {
        404 => FetchError::NotFound {
            coordinate: key.clone(),
        },
        403 | 429 => FetchError::RateLimited {
            coordinate: key.clone(),
        },
        other => FetchError::Network {
            coordinate: key.clone(),
            reason: format!("GitHub API error: HTTP {other}"),
        },
    }
}

fn classify(key: &RepoKey, err: ureq::Error) -> FetchError {
    match err {
        ureq::Error::Status(code, _) => status_error(key, code),
        ureq::Error::Transport(transport) => FetchError::Network {
            coordinate: key.clone(),
            reason: transport.to_string(),
        },
    }
}

/// Decode API content. Base64 payloads are wrapped at 60 columns, so
/// whitespace is stripped first.
pub(crate) fn decode_content(
    key: &RepoKey,
    content: &str,
    encoding: Option<&str>,
) -> Result<Vec<u8>, FetchError> {
    match encoding {
        Some("utf-8") | Some("utf8") => Ok(content.as_bytes().to_vec()),
        _ => {
            let compact: String = content.chars().filter(|c| !c.is_whitespace()).collect();
            base64::engine::general_purpose::STANDARD
                .decode(compact)
                .map_err(|e| FetchError::InvalidResponse {
                    coordinate: key.clone(),
                    reason: format!("invalid base64 content: {e}"),
                })
        }
    }
}
