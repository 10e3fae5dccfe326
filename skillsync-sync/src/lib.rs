//! # skillsync-sync
//!
//! Remote freshness checks and file updates for installed skills.
//!
//! Call [`check_at`] to compare every remote-tracked skill under a root with
//! its GitHub source, or [`update_at`] to download the files of one skill
//! whose remote content has changed. Network access goes through the
//! [`TreeFetcher`] and [`ContentSource`] traits; [`GitHubClient`] implements
//! both against the GitHub REST API.

pub mod config;
pub mod diff;
pub mod error;
pub mod github;
pub mod pipeline;
pub mod remote;
pub mod scheduler;
pub mod update;

pub use config::SyncConfig;
pub use diff::{evaluate, FileDiff, FileStatus, SkillSyncResult, SyncStatus};
pub use error::{FetchError, SyncError};
pub use github::GitHubClient;
pub use pipeline::{check_at, update_at, CheckReport, CheckSummary, UpdateReport, UpdateStatus};
pub use remote::{ContentSource, RemoteTree, TreeFetcher};
pub use scheduler::{check_skills, check_skills_blocking};
pub use update::{update_files, FileFailure, PendingUpdate, UpdateTally};
