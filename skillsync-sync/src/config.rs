//! Remote access settings.

use std::time::Duration;

/// Default REST endpoint.
pub const DEFAULT_API_BASE: &str = "https://api.github.com";
/// Environment variable holding the optional bearer credential.
pub const TOKEN_ENV: &str = "GITHUB_TOKEN";
/// Environment variable overriding [`DEFAULT_API_BASE`].
pub const API_BASE_ENV: &str = "SKILLSYNC_API_BASE";
/// Per-request timeout.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);
/// Concurrent in-flight tree fetches.
pub const MAX_CONCURRENT_FETCHES: usize = 5;

/// Settings shared by the remote client and the scheduler.
#[derive(Clone, PartialEq, Eq)]
pub struct SyncConfig {
    pub api_base: String,
    pub token: Option<String>,
    pub timeout: Duration,
    pub max_concurrency: usize,
    pub user_agent: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            token: None,
            timeout: REQUEST_TIMEOUT,
            max_concurrency: MAX_CONCURRENT_FETCHES,
            user_agent: format!("skillsync/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl SyncConfig {
    /// Defaults plus `GITHUB_TOKEN` and `SKILLSYNC_API_BASE` from the process
    /// environment. Empty values are ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.token = non_empty_env(TOKEN_ENV);
        if let Some(base) = non_empty_env(API_BASE_ENV) {
            config.api_base = base;
        }
        config
    }
}

// The token must never end up in logs.
impl std::fmt::Debug for SyncConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncConfig")
            .field("api_base", &self.api_base)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .field("max_concurrency", &self.max_concurrency)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
