//! Per-skill comparison of local content against a remote tree.
//!
//! Status rules, per file:
//! 1. no remote hash at the mapped path → `MissingRemote`
//! 2. remote hash differs from local hash → `Outdated`
//! 3. otherwise → `Current`
//!
//! A skill is `Outdated` when any file is outdated, or when it declares
//! tracked files and one of them is missing remotely. Local-only files in a
//! full-directory scan are reported but never change the overall status.

use std::path::Path;

use serde::Serialize;
use walkdir::WalkDir;

use skillsync_core::{hash_file, Skill, SourceCoordinate, MANIFEST_FILE, UNKNOWN_HASH};

use crate::error::SyncError;
use crate::remote::RemoteTree;

pub const MSG_UP_TO_DATE: &str = "Up to date";
pub const MSG_NOTHING_TO_CHECK: &str = "No files to check";
pub const MSG_CHANGES: &str = "File changes detected";

/// Classification of a single file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    Current,
    Outdated,
    MissingRemote,
}

/// Overall classification of a skill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    Current,
    Outdated,
    Error,
}

/// Comparison result for one file of a skill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileDiff {
    /// Path relative to the skill directory, `/`-separated.
    pub path: String,
    pub local_hash: String,
    pub remote_hash: Option<String>,
    pub status: FileStatus,
}

/// Outcome of evaluating one skill against its tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    pub status: SyncStatus,
    pub message: String,
    pub file_diffs: Vec<FileDiff>,
}

/// Final per-skill result of a check run.
#[derive(Debug, Clone, Serialize)]
pub struct SkillSyncResult {
    #[serde(flatten)]
    pub skill: Skill,
    pub status: SyncStatus,
    pub message: String,
    #[serde(rename = "files")]
    pub file_diffs: Vec<FileDiff>,
}

impl SkillSyncResult {
    pub fn error(skill: Skill, message: impl Into<String>) -> Self {
        Self {
            skill,
            status: SyncStatus::Error,
            message: message.into(),
            file_diffs: Vec::new(),
        }
    }

    pub fn from_evaluation(skill: Skill, evaluation: Evaluation) -> Self {
        Self {
            skill,
            status: evaluation.status,
            message: evaluation.message,
            file_diffs: evaluation.file_diffs,
        }
    }

    /// Diffs whose remote content differs from the local copy.
    pub fn outdated_files(&self) -> impl Iterator<Item = &FileDiff> {
        self.file_diffs
            .iter()
            .filter(|d| d.status == FileStatus::Outdated)
    }
}

/// Compare `skill` against `tree`, mapping paths through `coord.subpath`.
///
/// Declared tracked files are compared using their recorded hashes; otherwise
/// the skill directory is walked and hashed live. Fails only if the directory
/// walk itself fails.
pub fn evaluate(
    skill: &Skill,
    coord: &SourceCoordinate,
    tree: &RemoteTree,
) -> Result<Evaluation, SyncError> {
    let declared = skill.declared_files();
    let check_set: Vec<(String, String)> = match declared {
        Some(files) => files
            .iter()
            .map(|f| {
                let hash = f
                    .local_hash
                    .clone()
                    .unwrap_or_else(|| UNKNOWN_HASH.to_string());
                (f.path.replace('\\', "/"), hash)
            })
            .collect(),
        None => local_files(&skill.dir)?,
    };

    if check_set.is_empty() {
        return Ok(Evaluation {
            status: SyncStatus::Current,
            message: MSG_NOTHING_TO_CHECK.to_string(),
            file_diffs: Vec::new(),
        });
    }

    let mut changed = false;
    let mut file_diffs = Vec::with_capacity(check_set.len());
    for (path, local_hash) in check_set {
        let remote_path = coord.remote_path(&path);
        let remote_hash = tree.get(&remote_path).cloned();
        let status = match remote_hash.as_deref() {
            None => {
                if declared.is_some() {
                    changed = true;
                }
                FileStatus::MissingRemote
            }
            Some(remote) if remote != local_hash => {
                changed = true;
                FileStatus::Outdated
            }
            Some(_) => FileStatus::Current,
        };
        tracing::debug!("{}: {path} -> {status:?}", skill.name);
        file_diffs.push(FileDiff {
            path,
            local_hash,
            remote_hash,
            status,
        });
    }

    let (status, message) = if changed {
        (SyncStatus::Outdated, MSG_CHANGES)
    } else {
        (SyncStatus::Current, MSG_UP_TO_DATE)
    };
    Ok(Evaluation {
        status,
        message: message.to_string(),
        file_diffs,
    })
}

/// Every payload file under `dir` with its live blob hash. Hidden entries and
/// the top-level manifest are excluded.
///
/// Only an unreadable `dir` fails the walk. Entries that cannot be listed are
/// skipped with a warning; anything that is not a directory is hashed, so
/// unreadable files and dangling links come out as [`UNKNOWN_HASH`].
fn local_files(dir: &Path) -> Result<Vec<(String, String)>, SyncError> {
    std::fs::read_dir(dir).map_err(|e| SyncError::Walk {
        path: dir.to_path_buf(),
        reason: e.to_string(),
    })?;

    let walker = WalkDir::new(dir)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'));

    let mut files = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                let path = err.path().unwrap_or(dir);
                tracing::warn!("skipping unreadable entry {}: {err}", path.display());
                continue;
            }
        };
        if entry.file_type().is_dir() {
            continue;
        }
        if entry.depth() == 1 && entry.file_name() == MANIFEST_FILE {
            continue;
        }
        let relative = entry.path().strip_prefix(dir).unwrap_or(entry.path());
        let relative = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/");
        files.push((relative, hash_file(entry.path())));
    }
    Ok(files)
}
