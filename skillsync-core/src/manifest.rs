//! `SKILL.md` manifest parsing.
//!
//! A manifest starts with a `---` delimited YAML frontmatter block. The block
//! must be a mapping; unrecognised keys are ignored.
//!
//! ```text
//! ---
//! name: pdf
//! version: 1.2.0
//! description: Work with PDF files
//! github_url: https://github.com/anthropics/skills/tree/main/pdf
//! tracked_files:
//!   - path: scripts/fill.py
//!     local_hash: 3b18e512dba79e4c8300dd08aeb37f8e728b8dad
//! ---
//! ```

use std::path::Path;

use serde::{Deserialize, Deserializer};

use crate::error::{io_err, CoreError};
use crate::types::{Skill, SkillName, TrackedFile};

/// Fixed manifest file name inside every skill directory.
pub const MANIFEST_FILE: &str = "SKILL.md";

const DEFAULT_VERSION: &str = "0.0.0";

/// Parsed frontmatter block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Manifest {
    #[serde(default, deserialize_with = "scalar_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "scalar_string")]
    pub version: Option<String>,
    #[serde(default, deserialize_with = "scalar_string")]
    pub description: Option<String>,
    #[serde(default)]
    pub github_url: Option<String>,
    #[serde(default, deserialize_with = "scalar_string")]
    pub github_hash: Option<String>,
    #[serde(default)]
    pub tracked_files: Option<Vec<TrackedFile>>,
}

impl Manifest {
    /// Parse manifest `content`; `path` is only used for error context.
    pub fn parse(content: &str, path: &Path) -> Result<Self, CoreError> {
        let invalid = |reason: &str| CoreError::Manifest {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        };

        let content = content.trim_start_matches('\u{feff}');
        let rest = content
            .strip_prefix("---")
            .ok_or_else(|| invalid("missing frontmatter"))?;
        let end = rest
            .find("\n---")
            .ok_or_else(|| invalid("unclosed frontmatter"))?;
        let yaml = &rest[..end];

        let value: serde_yaml::Value =
            serde_yaml::from_str(yaml).map_err(|source| CoreError::ManifestYaml {
                path: path.to_path_buf(),
                source,
            })?;
        match value {
            serde_yaml::Value::Mapping(_) => {}
            serde_yaml::Value::Null => return Ok(Self::default()),
            _ => return Err(invalid("frontmatter must be a mapping")),
        }

        serde_yaml::from_value(value).map_err(|source| CoreError::ManifestYaml {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Read and parse the manifest at `path`.
    pub fn load(path: &Path) -> Result<Self, CoreError> {
        let content = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
        Self::parse(&content, path)
    }

    /// Build a [`Skill`] rooted at `dir`, applying defaults: the name falls
    /// back to the directory name and the version to `0.0.0`.
    pub fn into_skill(self, dir: &Path) -> Skill {
        let dir_name = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Skill {
            name: SkillName::from(self.name.filter(|n| !n.is_empty()).unwrap_or(dir_name)),
            dir: dir.to_path_buf(),
            version: self.version.unwrap_or_else(|| DEFAULT_VERSION.to_string()),
            description: self.description,
            github_url: self.github_url.filter(|u| !u.trim().is_empty()),
            github_hash: self.github_hash,
            tracked_files: self.tracked_files,
        }
    }
}

/// Accept strings, numbers and booleans for text fields (`version: 1.0`).
fn scalar_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let value = Option::<serde_yaml::Value>::deserialize(deserializer)?;
    match value {
        None | Some(serde_yaml::Value::Null) => Ok(None),
        Some(serde_yaml::Value::String(s)) => Ok(Some(s)),
        Some(serde_yaml::Value::Number(n)) => Ok(Some(n.to_string())),
        Some(serde_yaml::Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(_) => Err(D::Error::custom("expected a scalar value")),
    }
}
