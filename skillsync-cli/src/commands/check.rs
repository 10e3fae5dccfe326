//! `skillsync check`: remote freshness of every GitHub-tracked skill.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use skillsync_sync::{check_at, CheckReport, GitHubClient, SkillSyncResult, SyncConfig, SyncStatus};

use super::resolve_skills_root;

/// Arguments for `skillsync check`.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Skills root (default: ~/.config/opencode/skills).
    #[arg(long)]
    pub skills_dir: Option<PathBuf>,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl CheckArgs {
    pub fn run(self) -> Result<()> {
        let root = resolve_skills_root(self.skills_dir)?;
        let client = Arc::new(GitHubClient::new(SyncConfig::from_env()));
        tracing::debug!("remote config: {:?}", client.config());
        let max_concurrency = client.config().max_concurrency;

        let report = check_at(&root, client, max_concurrency)
            .with_context(|| format!("check failed for {}", root.display()))?;

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&report).context("failed to serialize check JSON")?
            );
        } else {
            print_table(&report);
        }

        if report.summary.errors > 0 {
            bail!("{} skill(s) could not be checked", report.summary.errors);
        }
        Ok(())
    }
}

#[derive(Tabled)]
struct CheckRow {
    #[tabled(rename = "skill")]
    skill: String,
    #[tabled(rename = "status")]
    status: String,
    #[tabled(rename = "changed")]
    changed: usize,
    #[tabled(rename = "detail")]
    detail: String,
}

fn print_table(report: &CheckReport) {
    let summary = &report.summary;
    println!(
        "skillsync v{} | {} checked | {} outdated | {} current | {} errors",
        env!("CARGO_PKG_VERSION"),
        summary.total,
        summary.outdated,
        summary.current,
        summary.errors,
    );

    if report.skills.is_empty() {
        println!("No GitHub-tracked skills found.");
        return;
    }

    let rows: Vec<CheckRow> = report
        .skills
        .iter()
        .map(|result| CheckRow {
            skill: result.skill.name.0.clone(),
            status: status_label(result.status),
            changed: result.outdated_files().count(),
            detail: detail(result),
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");

    for issue in &report.scan_issues {
        eprintln!(
            "{} {}: {}",
            "skipped".yellow().bold(),
            issue.dir.display(),
            issue.reason
        );
    }

    if summary.outdated > 0 {
        println!("Run 'skillsync update <name>' to download changed files.");
    }
}

fn status_label(status: SyncStatus) -> String {
    match status {
        SyncStatus::Current => "CURRENT".green().bold().to_string(),
        SyncStatus::Outdated => "OUTDATED".yellow().bold().to_string(),
        SyncStatus::Error => "ERROR".red().bold().to_string(),
    }
}

fn detail(result: &SkillSyncResult) -> String {
    let outdated: Vec<&str> = result
        .outdated_files()
        .map(|diff| diff.path.as_str())
        .collect();
    if outdated.is_empty() {
        return result.message.clone();
    }

    let mut names: Vec<String> = outdated.iter().take(2).map(|p| p.to_string()).collect();
    if outdated.len() > names.len() {
        names.push(format!("+{} more", outdated.len() - names.len()));
    }
    names.join(", ")
}
