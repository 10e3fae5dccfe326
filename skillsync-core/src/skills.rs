//! Skills root enumeration.
//!
//! # Storage layout
//!
//! ```text
//! <skills_root>/
//!   <skill>/
//!     SKILL.md        (manifest: frontmatter metadata)
//!     ...             (payload files)
//! ```
//!
//! # API pattern
//!
//! The skills root is always passed in explicitly. [`default_skills_root_at`]
//! derives the conventional location from a home directory; only the CLI calls
//! the no-arg [`default_skills_root`].

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{io_err, CoreError};
use crate::hasher::hash_file;
use crate::manifest::{Manifest, MANIFEST_FILE};
use crate::types::Skill;

/// `<home>/.config/opencode/skills`
pub fn default_skills_root_at(home: &Path) -> PathBuf {
    home.join(".config").join("opencode").join("skills")
}

/// `default_skills_root_at` convenience wrapper using `dirs::home_dir()`.
pub fn default_skills_root() -> Result<PathBuf, CoreError> {
    let home = dirs::home_dir().ok_or(CoreError::HomeNotFound)?;
    Ok(default_skills_root_at(&home))
}

/// A skill directory that could not be loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanIssue {
    pub dir: PathBuf,
    pub reason: String,
}

/// Everything found under a skills root.
#[derive(Debug, Default)]
pub struct ScanReport {
    /// Loaded skills, sorted by directory name.
    pub skills: Vec<Skill>,
    /// Directories skipped because their manifest failed to load.
    pub issues: Vec<ScanIssue>,
}

impl ScanReport {
    /// Skills carrying a `github_url`.
    pub fn remote_tracked(&self) -> impl Iterator<Item = &Skill> {
        self.skills.iter().filter(|s| s.is_remote_tracked())
    }
}

/// Enumerate every skill under `root`.
///
/// Non-directories, hidden directories and directories without a manifest are
/// not skills. A manifest that fails to load is recorded as a [`ScanIssue`]
/// and scanning continues with the next directory.
pub fn scan_skills_at(root: &Path) -> Result<ScanReport, CoreError> {
    if !root.is_dir() {
        return Err(CoreError::SkillsRootNotFound {
            path: root.to_path_buf(),
        });
    }

    let mut entries: Vec<_> = std::fs::read_dir(root)
        .map_err(|e| io_err(root, e))?
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .filter(|e| !e.file_name().to_string_lossy().starts_with('.'))
        .collect();
    entries.sort_by_key(|e| e.file_name());

    let mut report = ScanReport::default();
    for entry in entries {
        let dir = entry.path();
        let manifest_path = dir.join(MANIFEST_FILE);
        if !manifest_path.is_file() {
            continue;
        }

        match load_skill(&dir, &manifest_path) {
            Ok(skill) => report.skills.push(skill),
            Err(err) => {
                tracing::warn!("skipping {}: {err}", dir.display());
                report.issues.push(ScanIssue {
                    dir,
                    reason: err.to_string(),
                });
            }
        }
    }
    Ok(report)
}

fn load_skill(dir: &Path, manifest_path: &Path) -> Result<Skill, CoreError> {
    let mut skill = Manifest::load(manifest_path)?.into_skill(dir);
    refresh_tracked_hashes(&mut skill);
    Ok(skill)
}

/// Re-hash declared tracked files from disk so the diff sees current content.
fn refresh_tracked_hashes(skill: &mut Skill) {
    let Some(tracked) = skill.tracked_files.as_mut() else {
        return;
    };
    for file in tracked {
        let hash = hash_file(&skill.dir.join(&file.path));
        tracing::debug!("{}: {} -> {hash}", skill.name, file.path);
        file.local_hash = Some(hash);
    }
}

/// Find a skill under `root` by manifest name, falling back to directory name.
pub fn find_skill_at(root: &Path, name: &str) -> Result<Skill, CoreError> {
    let report = scan_skills_at(root)?;
    let mut skills = report.skills.into_iter();
    let found = skills.find(|s| {
        s.name.0 == name || s.dir.file_name().map(|n| n == name).unwrap_or(false)
    });
    found.ok_or_else(|| CoreError::SkillNotFound {
        name: name.to_string(),
        root: root.to_path_buf(),
    })
}
