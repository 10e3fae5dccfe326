//! Check and update entrypoints used by the CLI.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use skillsync_core::{find_skill_at, parse_source, scan_skills_at, ScanIssue};

use crate::diff::{SkillSyncResult, SyncStatus};
use crate::error::SyncError;
use crate::remote::{ContentSource, TreeFetcher};
use crate::scheduler::check_skills_blocking;
use crate::update::{update_files, FileFailure, PendingUpdate};

/// Counts per overall status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CheckSummary {
    pub total: usize,
    pub outdated: usize,
    pub current: usize,
    pub errors: usize,
}

/// Result of checking every remote-tracked skill under a root.
#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    pub checked_at: DateTime<Utc>,
    pub summary: CheckSummary,
    /// Sorted by skill name.
    pub skills: Vec<SkillSyncResult>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub scan_issues: Vec<ScanIssue>,
}

/// Scan `root` and check all skills that carry a `github_url`.
pub fn check_at(
    root: &Path,
    fetcher: Arc<dyn TreeFetcher>,
    max_concurrency: usize,
) -> Result<CheckReport, SyncError> {
    let checked_at = Utc::now();
    let scan = scan_skills_at(root)?;
    let tracked: Vec<_> = scan.remote_tracked().cloned().collect();

    let mut skills = check_skills_blocking(tracked, fetcher, max_concurrency)?;
    skills.sort_by(|a, b| a.skill.name.cmp(&b.skill.name));

    let mut summary = CheckSummary {
        total: skills.len(),
        ..CheckSummary::default()
    };
    for result in &skills {
        match result.status {
            SyncStatus::Current => summary.current += 1,
            SyncStatus::Outdated => summary.outdated += 1,
            SyncStatus::Error => summary.errors += 1,
        }
    }

    Ok(CheckReport {
        checked_at,
        summary,
        skills,
        scan_issues: scan.issues,
    })
}

/// Outcome of an update run for a single skill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateStatus {
    UpToDate,
    /// Changes found but not applied (dry run).
    Outdated,
    Updated,
    PartialUpdateFailed,
    Error,
}

impl UpdateStatus {
    pub fn is_success(self) -> bool {
        matches!(
            self,
            UpdateStatus::UpToDate | UpdateStatus::Outdated | UpdateStatus::Updated
        )
    }
}

/// Report for `skillsync update`.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateReport {
    pub skill: String,
    pub status: UpdateStatus,
    pub message: String,
    /// Files selected for download.
    pub files: Vec<PendingUpdate>,
    pub succeeded: usize,
    pub failed: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<FileFailure>,
}

impl UpdateReport {
    fn new(skill: &str, status: UpdateStatus, message: impl Into<String>) -> Self {
        Self {
            skill: skill.to_string(),
            status,
            message: message.into(),
            files: Vec::new(),
            succeeded: 0,
            failed: 0,
            failures: Vec::new(),
        }
    }
}

/// Check the skill called `name` under `root` and download its outdated files.
///
/// Only files whose remote hash differs are downloaded; files missing on the
/// remote are left in place. With `dry_run` nothing is written.
pub fn update_at<C>(
    root: &Path,
    name: &str,
    client: Arc<C>,
    dry_run: bool,
) -> Result<UpdateReport, SyncError>
where
    C: TreeFetcher + ContentSource + 'static,
{
    let skill = find_skill_at(root, name)?;
    let label = skill.name.0.clone();
    let Some(url) = skill.github_url.clone() else {
        return Ok(UpdateReport::new(
            &label,
            UpdateStatus::Error,
            format!("Skill '{label}' is not tracked by a remote source."),
        ));
    };

    tracing::info!("checking updates for {label}");
    let fetcher: Arc<dyn TreeFetcher> = client.clone();
    let checked = check_skills_blocking(vec![skill], fetcher, 1)?
        .into_iter()
        .next();
    let Some(result) = checked else {
        return Ok(UpdateReport::new(
            &label,
            UpdateStatus::Error,
            "check produced no result",
        ));
    };

    match result.status {
        SyncStatus::Error => {
            return Ok(UpdateReport::new(&label, UpdateStatus::Error, result.message));
        }
        SyncStatus::Current => {
            return Ok(UpdateReport::new(
                &label,
                UpdateStatus::UpToDate,
                format!("Skill '{label}' is already up to date."),
            ));
        }
        SyncStatus::Outdated => {}
    }

    let pending: Vec<PendingUpdate> = result.outdated_files().map(PendingUpdate::from).collect();
    if pending.is_empty() {
        return Ok(UpdateReport::new(
            &label,
            UpdateStatus::UpToDate,
            "No files need update.",
        ));
    }

    if dry_run {
        let mut report = UpdateReport::new(
            &label,
            UpdateStatus::Outdated,
            format!("{} file(s) would be updated", pending.len()),
        );
        report.files = pending;
        return Ok(report);
    }

    let coord = parse_source(&url)?;
    tracing::info!("updating {} file(s) for {label}", pending.len());
    let tally = update_files(&result.skill, &coord, &pending, client.as_ref());

    let (status, message) = if tally.failed == 0 {
        (
            UpdateStatus::Updated,
            format!("Updated {} file(s)", tally.succeeded),
        )
    } else {
        (
            UpdateStatus::PartialUpdateFailed,
            format!(
                "Updated {} file(s), {} failed",
                tally.succeeded, tally.failed
            ),
        )
    };
    Ok(UpdateReport {
        skill: label,
        status,
        message,
        files: pending,
        succeeded: tally.succeeded,
        failed: tally.failed,
        failures: tally.failures,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use skillsync_core::{blob_hash, CoreError, SourceCoordinate, MANIFEST_FILE};
    use tempfile::TempDir;

    use super::*;
    use crate::error::FetchError;
    use crate::remote::RemoteTree;

    /// One-repository fake serving a tree and its blobs.
    #[derive(Default)]
    struct FakeRemote {
        tree: RemoteTree,
        blobs: HashMap<String, Vec<u8>>,
        tree_calls: AtomicUsize,
    }

    impl FakeRemote {
        fn with_file(mut self, path: &str, content: &[u8]) -> Self {
            let sha = blob_hash(content);
            self.tree.insert(path.to_string(), sha.clone());
            self.blobs.insert(sha, content.to_vec());
            self
        }

        /// Listed in the tree but the blob cannot be downloaded.
        fn with_broken_file(mut self, path: &str, content: &[u8]) -> Self {
            self.tree.insert(path.to_string(), blob_hash(content));
            self
        }
    }

    impl TreeFetcher for FakeRemote {
        fn fetch_tree(&self, coord: &SourceCoordinate) -> Result<RemoteTree, FetchError> {
            self.tree_calls.fetch_add(1, Ordering::SeqCst);
            if coord.repo == "missing" {
                return Err(FetchError::NotFound {
                    coordinate: coord.repo_key(),
                });
            }
            Ok(self.tree.clone())
        }
    }

    impl ContentSource for FakeRemote {
        fn fetch_blob(&self, coord: &SourceCoordinate, sha: &str) -> Result<Vec<u8>, FetchError> {
            self.blobs.get(sha).cloned().ok_or_else(|| FetchError::Network {
                coordinate: coord.repo_key(),
                reason: "connection reset".into(),
            })
        }

        fn fetch_file(&self, coord: &SourceCoordinate, _path: &str) -> Result<Vec<u8>, FetchError> {
            Err(FetchError::NotFound {
                coordinate: coord.repo_key(),
            })
        }
    }

    fn write_skill(root: &Path, dir: &str, url: Option<&str>, files: &[(&str, &[u8])]) {
        let skill_dir = root.join(dir);
        fs::create_dir_all(&skill_dir).unwrap();
        let url_line = url.map(|u| format!("github_url: {u}\n")).unwrap_or_default();
        fs::write(
            skill_dir.join(MANIFEST_FILE),
            format!("---\nname: {dir}\n{url_line}---\n"),
        )
        .unwrap();
        for (path, content) in files {
            let target = skill_dir.join(path);
            fs::create_dir_all(target.parent().unwrap()).unwrap();
            fs::write(target, content).unwrap();
        }
    }

    #[test]
    fn check_summarises_only_tracked_skills() {
        let root = TempDir::new().unwrap();
        write_skill(
            root.path(),
            "current",
            Some("https://github.com/o/r/tree/main/current"),
            &[("a.txt", b"same\n")],
        );
        write_skill(
            root.path(),
            "behind",
            Some("https://github.com/o/r/tree/main/behind"),
            &[("a.txt", b"old\n")],
        );
        write_skill(root.path(), "broken", Some("https://github.com/o"), &[]);
        write_skill(root.path(), "local", None, &[("a.txt", b"x")]);

        let remote = Arc::new(
            FakeRemote::default()
                .with_file("current/a.txt", b"same\n")
                .with_file("behind/a.txt", b"new\n"),
        );
        let report = check_at(root.path(), remote.clone(), 5).unwrap();

        assert_eq!(
            report.summary,
            CheckSummary {
                total: 3,
                outdated: 1,
                current: 1,
                errors: 1,
            }
        );
        let names: Vec<_> = report.skills.iter().map(|r| r.skill.name.0.as_str()).collect();
        assert_eq!(names, vec!["behind", "broken", "current"]);
        assert_eq!(remote.tree_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn check_missing_root_is_error() {
        let root = TempDir::new().unwrap();
        let remote = Arc::new(FakeRemote::default());
        let err = check_at(&root.path().join("nope"), remote, 5).unwrap_err();
        assert!(matches!(
            err,
            SyncError::Core(CoreError::SkillsRootNotFound { .. })
        ));
    }

    #[test]
    fn update_downloads_outdated_and_keeps_local_only_files() {
        let root = TempDir::new().unwrap();
        write_skill(
            root.path(),
            "demo",
            Some("https://github.com/o/r/tree/main/skills/demo"),
            &[("a.txt", b"old\n"), ("mine.md", b"local notes\n")],
        );
        let remote = Arc::new(FakeRemote::default().with_file("skills/demo/a.txt", b"new\n"));

        let report = update_at(root.path(), "demo", remote, false).unwrap();

        assert_eq!(report.status, UpdateStatus::Updated);
        assert_eq!(report.succeeded, 1);
        assert_eq!(report.failed, 0);
        let dir = root.path().join("demo");
        assert_eq!(fs::read(dir.join("a.txt")).unwrap(), b"new\n");
        assert_eq!(fs::read(dir.join("mine.md")).unwrap(), b"local notes\n");
    }

    #[test]
    fn update_reports_partial_failure() {
        let root = TempDir::new().unwrap();
        write_skill(
            root.path(),
            "demo",
            Some("https://github.com/o/r"),
            &[("a.txt", b"old a\n"), ("b.txt", b"old b\n"), ("c.txt", b"old c\n")],
        );
        let remote = Arc::new(
            FakeRemote::default()
                .with_file("a.txt", b"new a\n")
                .with_broken_file("b.txt", b"new b\n")
                .with_file("c.txt", b"new c\n"),
        );

        let report = update_at(root.path(), "demo", remote, false).unwrap();

        assert_eq!(report.status, UpdateStatus::PartialUpdateFailed);
        assert!(!report.status.is_success());
        assert_eq!((report.succeeded, report.failed), (2, 1));
        assert_eq!(report.failures[0].path, "b.txt");
        let dir = root.path().join("demo");
        assert_eq!(fs::read(dir.join("a.txt")).unwrap(), b"new a\n");
        assert_eq!(fs::read(dir.join("b.txt")).unwrap(), b"old b\n");
        assert_eq!(fs::read(dir.join("c.txt")).unwrap(), b"new c\n");
    }

    #[test]
    fn update_dry_run_writes_nothing() {
        let root = TempDir::new().unwrap();
        write_skill(
            root.path(),
            "demo",
            Some("https://github.com/o/r"),
            &[("a.txt", b"old\n")],
        );
        let remote = Arc::new(FakeRemote::default().with_file("a.txt", b"new\n"));

        let report = update_at(root.path(), "demo", remote, true).unwrap();

        assert_eq!(report.status, UpdateStatus::Outdated);
        assert_eq!(report.files.len(), 1);
        assert_eq!(fs::read(root.path().join("demo/a.txt")).unwrap(), b"old\n");
    }

    #[test]
    fn update_report_serializes_snake_case_status() {
        let root = TempDir::new().unwrap();
        write_skill(
            root.path(),
            "demo",
            Some("https://github.com/o/r"),
            &[("a.txt", b"old\n")],
        );
        let remote = Arc::new(FakeRemote::default().with_file("a.txt", b"new\n"));

        let report = update_at(root.path(), "demo", remote, false).unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "updated");
        assert_eq!(json["files"][0]["path"], "a.txt");
        assert!(json.get("failures").is_none());
    }

    #[test]
    fn update_when_current_is_up_to_date() {
        let root = TempDir::new().unwrap();
        write_skill(
            root.path(),
            "demo",
            Some("https://github.com/o/r"),
            &[("a.txt", b"same\n")],
        );
        let remote = Arc::new(FakeRemote::default().with_file("a.txt", b"same\n"));

        let report = update_at(root.path(), "demo", remote, false).unwrap();
        assert_eq!(report.status, UpdateStatus::UpToDate);
        assert!(report.message.contains("already up to date"));
    }

    #[test]
    fn update_surfaces_remote_failure_as_error_status() {
        let root = TempDir::new().unwrap();
        write_skill(
            root.path(),
            "demo",
            Some("https://github.com/o/missing"),
            &[("a.txt", b"x")],
        );
        let remote = Arc::new(FakeRemote::default());

        let report = update_at(root.path(), "demo", remote, false).unwrap();
        assert_eq!(report.status, UpdateStatus::Error);
        assert!(report.message.contains("not found"), "got: {}", report.message);
    }

    #[test]
    fn update_unknown_skill_is_not_found() {
        let root = TempDir::new().unwrap();
        let remote = Arc::new(FakeRemote::default());
        let err = update_at(root.path(), "ghost", remote, false).unwrap_err();
        assert!(matches!(err, SyncError::Core(CoreError::SkillNotFound { .. })));
    }
}
