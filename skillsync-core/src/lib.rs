//! skillsync core library: domain types and manifest parsing.
//!
//! - [`types`]: skills, source coordinates, tracked files
//! - [`locator`]: repository URL → [`SourceCoordinate`]
//! - [`hasher`]: git blob hashing of local content
//! - [`manifest`]: `SKILL.md` frontmatter
//! - [`skills`]: skills root enumeration
//! - [`error`]: [`CoreError`]

pub mod error;
pub mod hasher;
pub mod locator;
pub mod manifest;
pub mod skills;
pub mod types;

pub use error::CoreError;
pub use hasher::{blob_hash, hash_file, try_hash_file, UNKNOWN_HASH};
pub use locator::parse_source;
pub use manifest::{Manifest, MANIFEST_FILE};
pub use skills::{
    default_skills_root, default_skills_root_at, find_skill_at, scan_skills_at, ScanIssue,
    ScanReport,
};
pub use types::{RepoKey, Skill, SkillName, SourceCoordinate, TrackedFile};
