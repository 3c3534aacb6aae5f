//! Collaborator client configuration.

use std::time::Duration;

/// Default address of the collaborator service.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

/// Default bound on every collaborator call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Where the collaborator lives and how long to wait for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollaboratorConfig {
    /// Base URL without a trailing slash, e.g. `http://localhost:8080`.
    pub base_url: String,
    /// Applied to every request, including connect time.
    pub timeout: Duration,
}

impl CollaboratorConfig {
    /// A config for `base_url` with the default timeout.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Joins `path` onto the base URL.
    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

impl Default for CollaboratorConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}
