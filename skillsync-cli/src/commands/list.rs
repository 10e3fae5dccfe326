//! `skillsync list`: installed skills.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use skillsync_core::{scan_skills_at, ScanIssue, Skill};

use super::resolve_skills_root;

/// Arguments for `skillsync list`.
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Skills root (default: ~/.config/opencode/skills).
    #[arg(long)]
    pub skills_dir: Option<PathBuf>,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl ListArgs {
    pub fn run(self) -> Result<()> {
        let root = resolve_skills_root(self.skills_dir)?;
        let report = scan_skills_at(&root)
            .with_context(|| format!("failed to scan skills in {}", root.display()))?;

        if self.json {
            let payload = ListJson {
                skills: report.skills.iter().map(SkillJson::from).collect(),
                issues: report.issues.clone(),
            };
            println!(
                "{}",
                serde_json::to_string_pretty(&payload).context("failed to serialize skill list")?
            );
            return Ok(());
        }

        print_table(&report.skills);
        for issue in &report.issues {
            eprintln!(
                "{} {}: {}",
                "skipped".yellow().bold(),
                issue.dir.display(),
                issue.reason
            );
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct ListJson<'a> {
    skills: Vec<SkillJson<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    issues: Vec<ScanIssue>,
}

#[derive(Serialize)]
struct SkillJson<'a> {
    name: &'a str,
    #[serde(rename = "type")]
    kind: &'static str,
    version: &'a str,
    description: String,
    github_url: Option<&'a str>,
    path: String,
}

impl<'a> From<&'a Skill> for SkillJson<'a> {
    fn from(skill: &'a Skill) -> Self {
        Self {
            name: &skill.name.0,
            kind: skill_kind(skill),
            version: &skill.version,
            description: one_line(skill.description.as_deref()),
            github_url: skill.github_url.as_deref(),
            path: skill.dir.display().to_string(),
        }
    }
}

#[derive(Tabled)]
struct SkillRow {
    #[tabled(rename = "name")]
    name: String,
    #[tabled(rename = "type")]
    kind: String,
    #[tabled(rename = "version")]
    version: String,
    #[tabled(rename = "description")]
    description: String,
}

fn print_table(skills: &[Skill]) {
    if skills.is_empty() {
        println!("No skills installed.");
        return;
    }

    let tracked = skills.iter().filter(|s| s.is_remote_tracked()).count();
    println!("{} skills | {} tracked on GitHub", skills.len(), tracked);
    let rows: Vec<SkillRow> = skills
        .iter()
        .map(|skill| SkillRow {
            name: skill.name.0.clone(),
            kind: if skill.is_remote_tracked() {
                skill_kind(skill).cyan().to_string()
            } else {
                skill_kind(skill).to_string()
            },
            version: skill.version.clone(),
            description: truncate(&one_line(skill.description.as_deref()), 60),
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
}

fn skill_kind(skill: &Skill) -> &'static str {
    if skill.is_remote_tracked() {
        "GitHub"
    } else {
        "Standard"
    }
}

/// Fold multi-line YAML descriptions into one line.
fn one_line(description: Option<&str>) -> String {
    description
        .unwrap_or_default()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(1)).collect();
    format!("{kept}…")
}
