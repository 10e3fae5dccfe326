//! Download and write changed files for one skill.
//!
//! ## Per-file protocol
//!
//! 1. Reject paths that would leave the skill directory.
//! 2. Fetch by blob hash when one is known, else by branch + remote path.
//! 3. Write to a hidden sibling `.<name>.skillsync.tmp`.
//! 4. Rename to the final path (atomic on POSIX).
//!
//! A failure at any step is counted against that file only; the remaining
//! files are still processed.

use std::path::{Component, Path, PathBuf};

use serde::Serialize;

use skillsync_core::{Skill, SourceCoordinate};

use crate::diff::FileDiff;
use crate::error::{io_err, SyncError};
use crate::remote::ContentSource;

const TMP_SUFFIX: &str = "skillsync.tmp";

/// A file to re-download, taken from a prior diff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingUpdate {
    /// Path relative to the skill directory.
    pub path: String,
    pub remote_hash: Option<String>,
}

impl From<&FileDiff> for PendingUpdate {
    fn from(diff: &FileDiff) -> Self {
        Self {
            path: diff.path.clone(),
            remote_hash: diff.remote_hash.clone(),
        }
    }
}

/// A file that could not be updated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileFailure {
    pub path: String,
    pub reason: String,
}

/// Per-batch outcome counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UpdateTally {
    pub succeeded: usize,
    pub failed: usize,
    pub failures: Vec<FileFailure>,
}

/// Download each of `updates` from `source` and write it under `skill.dir`.
///
/// Files are processed sequentially so every failure is attributable.
pub fn update_files(
    skill: &Skill,
    coord: &SourceCoordinate,
    updates: &[PendingUpdate],
    source: &dyn ContentSource,
) -> UpdateTally {
    let mut tally = UpdateTally::default();
    for update in updates {
        tracing::info!("{}: downloading {}", skill.name, update.path);
        match update_one(skill, coord, update, source) {
            Ok(target) => {
                tracing::info!("wrote: {}", target.display());
                tally.succeeded += 1;
            }
            Err(err) => {
                tracing::warn!("{}: failed to update {}: {err}", skill.name, update.path);
                tally.failed += 1;
                tally.failures.push(FileFailure {
                    path: update.path.clone(),
                    reason: err.to_string(),
                });
            }
        }
    }
    tally
}

fn update_one(
    skill: &Skill,
    coord: &SourceCoordinate,
    update: &PendingUpdate,
    source: &dyn ContentSource,
) -> Result<PathBuf, SyncError> {
    let target = resolve_target(&skill.dir, &update.path)?;
    let content = match update.remote_hash.as_deref().filter(|h| !h.is_empty()) {
        Some(sha) => source.fetch_blob(coord, sha)?,
        None => source.fetch_file(coord, &coord.remote_path(&update.path))?,
    };
    atomic_write(&target, &content)?;
    Ok(target)
}

/// Join `relative` onto `dir`, refusing absolute paths and `..` components.
fn resolve_target(dir: &Path, relative: &str) -> Result<PathBuf, SyncError> {
    let relative_path = Path::new(relative);
    let safe = !relative.is_empty()
        && relative_path
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
    if !safe {
        return Err(SyncError::UnsafePath {
            path: relative.to_string(),
        });
    }
    Ok(dir.join(relative_path))
}

/// Write `content` to `path` via a sibling temp file and rename.
pub(crate) fn atomic_write(path: &Path, content: &[u8]) -> Result<(), SyncError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }

    // Hidden, so a leftover from a crash is skipped by the directory walk.
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp = path.with_file_name(format!(".{file_name}.{TMP_SUFFIX}"));
    if let Err(e) = std::fs::write(&tmp, content) {
        let _ = std::fs::remove_file(&tmp);
        return Err(io_err(&tmp, e));
    }
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(io_err(path, e));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::fs;

    use skillsync_core::SkillName;
    use tempfile::TempDir;

    use super::*;
    use crate::error::FetchError;

    /// Serves blobs by hash and files by remote path, recording every request.
    #[derive(Default)]
    struct FakeSource {
        blobs: HashMap<String, Vec<u8>>,
        files: HashMap<String, Vec<u8>>,
        requests: RefCell<Vec<String>>,
    }

    fn not_found(coord: &SourceCoordinate) -> FetchError {
        FetchError::NotFound {
            coordinate: coord.repo_key(),
        }
    }

    impl ContentSource for FakeSource {
        fn fetch_blob(&self, coord: &SourceCoordinate, sha: &str) -> Result<Vec<u8>, FetchError> {
            self.requests.borrow_mut().push(format!("blob:{sha}"));
            self.blobs.get(sha).cloned().ok_or_else(|| not_found(coord))
        }

        fn fetch_file(&self, coord: &SourceCoordinate, path: &str) -> Result<Vec<u8>, FetchError> {
            self.requests.borrow_mut().push(format!("file:{path}"));
            self.files.get(path).cloned().ok_or_else(|| not_found(coord))
        }
    }

    fn coord() -> SourceCoordinate {
        SourceCoordinate {
            owner: "o".into(),
            repo: "r".into(),
            branch: "main".into(),
            subpath: "skills/demo".into(),
        }
    }

    fn skill(dir: &Path) -> Skill {
        Skill {
            name: SkillName::from("demo"),
            dir: dir.to_path_buf(),
            version: "0.0.0".into(),
            description: None,
            github_url: Some("https://github.com/o/r/tree/main/skills/demo".into()),
            github_hash: None,
            tracked_files: None,
        }
    }

    fn pending(path: &str, sha: Option<&str>) -> PendingUpdate {
        PendingUpdate {
            path: path.into(),
            remote_hash: sha.map(String::from),
        }
    }

    #[test]
    fn failed_download_does_not_stop_batch() {
        let tmp = TempDir::new().unwrap();
        let mut source = FakeSource::default();
        source.blobs.insert("h1".into(), b"first\n".to_vec());
        source.blobs.insert("h3".into(), b"third\n".to_vec());

        let updates = vec![
            pending("a.txt", Some("h1")),
            pending("b.txt", Some("h2")),
            pending("nested/c.txt", Some("h3")),
        ];
        let tally = update_files(&skill(tmp.path()), &coord(), &updates, &source);

        assert_eq!(tally.succeeded, 2);
        assert_eq!(tally.failed, 1);
        assert_eq!(tally.failures[0].path, "b.txt");
        assert_eq!(fs::read(tmp.path().join("a.txt")).unwrap(), b"first\n");
        assert_eq!(fs::read(tmp.path().join("nested/c.txt")).unwrap(), b"third\n");
        assert!(!tmp.path().join("b.txt").exists());
    }

    #[test]
    fn falls_back_to_path_when_hash_unknown() {
        let tmp = TempDir::new().unwrap();
        let mut source = FakeSource::default();
        source
            .files
            .insert("skills/demo/scripts/run.py".into(), b"print()\n".to_vec());

        let updates = vec![pending("scripts/run.py", None), pending("x.md", Some(""))];
        let tally = update_files(&skill(tmp.path()), &coord(), &updates, &source);

        assert_eq!(tally.succeeded, 1);
        assert_eq!(tally.failed, 1);
        assert_eq!(
            *source.requests.borrow(),
            vec![
                "file:skills/demo/scripts/run.py".to_string(),
                "file:skills/demo/x.md".to_string(),
            ]
        );
        assert_eq!(fs::read(tmp.path().join("scripts/run.py")).unwrap(), b"print()\n");
    }

    #[test]
    fn overwrites_existing_file_and_cleans_tmp() {
        let tmp = TempDir::new().unwrap();
        let target = tmp.path().join("a.txt");
        fs::write(&target, b"old\n").unwrap();
        let mut source = FakeSource::default();
        source.blobs.insert("h1".into(), b"new\n".to_vec());

        let tally = update_files(
            &skill(tmp.path()),
            &coord(),
            &[pending("a.txt", Some("h1"))],
            &source,
        );

        assert_eq!(tally.succeeded, 1);
        assert_eq!(fs::read(&target).unwrap(), b"new\n");
        assert!(!tmp.path().join(".a.txt.skillsync.tmp").exists());
    }

    #[test]
    fn failed_rename_leaves_no_temp_and_keeps_siblings() {
        let tmp = TempDir::new().unwrap();
        // A directory in the way makes the final rename fail.
        fs::create_dir_all(tmp.path().join("a.txt/inner")).unwrap();
        fs::write(tmp.path().join("b.txt"), b"sibling\n").unwrap();
        let mut source = FakeSource::default();
        source.blobs.insert("h1".into(), b"new\n".to_vec());

        let tally = update_files(
            &skill(tmp.path()),
            &coord(),
            &[pending("a.txt", Some("h1"))],
            &source,
        );

        assert_eq!(tally.failed, 1);
        assert_eq!(tally.succeeded, 0);
        assert!(tmp.path().join("a.txt").is_dir());
        assert!(!tmp.path().join(".a.txt.skillsync.tmp").exists());
        let leftovers: Vec<_> = fs::read_dir(tmp.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(TMP_SUFFIX))
            .collect();
        assert!(leftovers.is_empty());
        assert_eq!(fs::read(tmp.path().join("b.txt")).unwrap(), b"sibling\n");
    }

    #[test]
    fn escaping_paths_are_rejected_without_fetching() {
        let tmp = TempDir::new().unwrap();
        let source = FakeSource::default();
        let updates = vec![
            pending("../outside.txt", Some("h1")),
            pending("/etc/passwd", Some("h1")),
        ];

        let tally = update_files(&skill(tmp.path()), &coord(), &updates, &source);

        assert_eq!(tally.failed, 2);
        assert_eq!(tally.succeeded, 0);
        assert!(source.requests.borrow().is_empty());
        assert!(tally.failures[0].reason.contains("outside skill directory"));
    }

    #[test]
    fn write_failure_is_counted() {
        let tmp = TempDir::new().unwrap();
        // A regular file where a parent directory is needed.
        fs::write(tmp.path().join("blocker"), b"file").unwrap();
        let mut source = FakeSource::default();
        source.blobs.insert("h1".into(), b"data".to_vec());

        let tally = update_files(
            &skill(tmp.path()),
            &coord(),
            &[pending("blocker/child.txt", Some("h1")), pending("ok.txt", Some("h1"))],
            &source,
        );

        assert_eq!(tally.failed, 1);
        assert_eq!(tally.succeeded, 1);
        assert!(tally.failures[0].reason.contains("I/O error"));
    }

    #[test]
    fn pending_update_from_diff() {
        let diff = FileDiff {
            path: "a.txt".into(),
            local_hash: "L".into(),
            remote_hash: Some("R".into()),
            status: crate::diff::FileStatus::Outdated,
        };
        assert_eq!(PendingUpdate::from(&diff), pending("a.txt", Some("R")));
    }
}
