//! Error types for skillsync-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from manifest, locator, and scan operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The manifest is structurally invalid (missing or unclosed frontmatter,
    /// or a frontmatter block that is not a mapping).
    #[error("invalid manifest at {path}: {reason}")]
    Manifest { path: PathBuf, reason: String },

    /// YAML parse error inside the frontmatter block; includes line context
    /// from serde_yaml.
    #[error("failed to parse manifest at {path}: {source}")]
    ManifestYaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// A repository URL could not be turned into a coordinate.
    #[error("Invalid GitHub URL: {url} ({reason})")]
    InvalidSource { url: String, reason: String },

    #[error("skill '{name}' not found in {root}")]
    SkillNotFound { name: String, root: PathBuf },

    #[error("skills root not found: {path}")]
    SkillsRootNotFound { path: PathBuf },

    /// `dirs::home_dir()` returned `None`; cannot locate the default skills root.
    #[error("cannot determine home directory; set $HOME or equivalent")]
    HomeNotFound,
}

/// Convenience constructor for [`CoreError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> CoreError {
    CoreError::Io {
        path: path.into(),
        source,
    }
}
