//! skillsync: keep installed agent skills in step with their GitHub sources.
//!
//! # Usage
//!
//! ```text
//! skillsync list [--skills-dir <dir>] [--json]
//! skillsync check [--skills-dir <dir>] [--json]
//! skillsync update <name> [--skills-dir <dir>] [--dry-run] [--json]
//! ```
//!
//! Set `GITHUB_TOKEN` to raise API rate limits.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{check::CheckArgs, list::ListArgs, update::UpdateArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "skillsync",
    version,
    about = "Check and update installed skills against their GitHub sources",
    long_about = None,
)]
struct Cli {
    /// Print debug diagnostics to stderr.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List installed skills.
    List(ListArgs),

    /// Compare every GitHub-tracked skill with its remote source.
    Check(CheckArgs),

    /// Download changed files for one skill.
    Update(UpdateArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.command {
        Commands::List(args) => args.run(),
        Commands::Check(args) => args.run(),
        Commands::Update(args) => args.run(),
    }
}

/// Diagnostics go to stderr so `--json` output on stdout stays parseable.
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
