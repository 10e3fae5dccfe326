//! Domain types for installed skills and their remote sources.
//!
//! All path fields use `PathBuf`; remote paths are posix-style `String`s
//! relative to the repository root.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A strongly-typed name for an installed skill.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SkillName(pub String);

impl fmt::Display for SkillName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for SkillName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SkillName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Source coordinates
// ---------------------------------------------------------------------------

/// A location within a remote repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceCoordinate {
    pub owner: String,
    pub repo: String,
    pub branch: String,
    /// Directory inside the repository; empty for the repository root.
    pub subpath: String,
}

/// Identity of a remote tree: the subpath does not change which tree is fetched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RepoKey {
    pub owner: String,
    pub repo: String,
    pub branch: String,
}

impl fmt::Display for RepoKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}@{}", self.owner, self.repo, self.branch)
    }
}

impl SourceCoordinate {
    pub fn repo_key(&self) -> RepoKey {
        RepoKey {
            owner: self.owner.clone(),
            repo: self.repo.clone(),
            branch: self.branch.clone(),
        }
    }

    /// Map a skill-relative path onto the repository: `subpath/relative`,
    /// or just `relative` at the root. Backslashes are normalised to `/`.
    pub fn remote_path(&self, relative: &str) -> String {
        let relative = relative.replace('\\', "/");
        let relative = relative.trim_start_matches('/');
        let base = self.subpath.trim_matches('/');
        if base.is_empty() {
            relative.to_string()
        } else {
            format!("{base}/{relative}")
        }
    }
}

impl fmt::Display for SourceCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}@{}", self.owner, self.repo, self.branch)?;
        if !self.subpath.is_empty() {
            write!(f, ":{}", self.subpath)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Skills
// ---------------------------------------------------------------------------

/// A file a skill explicitly declares interest in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedFile {
    /// Path relative to the skill directory.
    pub path: String,
    /// Last known local blob hash; refreshed from disk on scan.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_hash: Option<String>,
}

/// A locally installed skill directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Skill {
    pub name: SkillName,
    /// Absolute path to the skill directory.
    pub dir: PathBuf,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Presence marks the skill as remote-tracked.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github_hash: Option<String>,
    /// `None` means the whole directory is diffed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracked_files: Option<Vec<TrackedFile>>,
}

impl Skill {
    pub fn is_remote_tracked(&self) -> bool {
        self.github_url.is_some()
    }

    /// Tracked files, treating an empty declared list the same as none.
    pub fn declared_files(&self) -> Option<&[TrackedFile]> {
        match self.tracked_files.as_deref() {
            Some(files) if !files.is_empty() => Some(files),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
