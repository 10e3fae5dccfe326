pub mod check;
pub mod list;
pub mod update;

use std::path::PathBuf;

use anyhow::{Context, Result};

use skillsync_core::default_skills_root;

/// `--skills-dir` if given, else `~/.config/opencode/skills`.
pub(crate) fn resolve_skills_root(explicit: Option<PathBuf>) -> Result<PathBuf> {
    match explicit {
        Some(dir) => Ok(dir),
        None => default_skills_root().context("could not determine default skills root"),
    }
}
