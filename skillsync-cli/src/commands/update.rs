//! `skillsync update`: download changed files for one skill.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;

use skillsync_sync::{update_at, GitHubClient, SyncConfig, UpdateReport, UpdateStatus};

use super::resolve_skills_root;

/// Arguments for `skillsync update`.
#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Skill name (manifest `name` or directory name).
    pub name: String,

    /// Skills root (default: ~/.config/opencode/skills).
    #[arg(long)]
    pub skills_dir: Option<PathBuf>,

    /// Show which files would be downloaded without writing anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl UpdateArgs {
    pub fn run(self) -> Result<()> {
        let root = resolve_skills_root(self.skills_dir)?;
        let client = Arc::new(GitHubClient::new(SyncConfig::from_env()));

        let report = update_at(&root, &self.name, client, self.dry_run)
            .with_context(|| format!("update failed for '{}'", self.name))?;

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&report).context("failed to serialize update JSON")?
            );
        } else {
            print_report(&report);
        }

        if !report.status.is_success() {
            bail!("{}", report.message);
        }
        Ok(())
    }
}

fn print_report(report: &UpdateReport) {
    let prefix = if report.status == UpdateStatus::Outdated {
        "[dry-run] "
    } else {
        ""
    };
    let marker = match report.status {
        UpdateStatus::UpToDate | UpdateStatus::Updated => "✓".green().bold(),
        UpdateStatus::Outdated => "~".yellow().bold(),
        UpdateStatus::PartialUpdateFailed => "!".yellow().bold(),
        UpdateStatus::Error => "✗".red().bold(),
    };
    println!("{prefix}{marker} '{}': {}", report.skill, report.message);

    let failed: Vec<&str> = report.failures.iter().map(|f| f.path.as_str()).collect();
    for file in &report.files {
        if failed.contains(&file.path.as_str()) {
            continue;
        }
        let glyph = if report.status == UpdateStatus::Outdated {
            "~"
        } else {
            "✎"
        };
        println!("  {glyph}  {}", file.path);
    }
    for failure in &report.failures {
        println!("  {}  {}: {}", "✗".red(), failure.path, failure.reason);
    }
}
