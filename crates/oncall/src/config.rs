//! Client configuration.

use std::time::Duration;

use url::Url;

use crate::error::{OnCallError, Result};

/// Environment variable holding the OnCall base URL.
pub const ENV_API_URL: &str = "ONCALL_API_URL";

/// Environment variable holding the API token.
pub const ENV_API_TOKEN: &str = "ONCALL_API_TOKEN";

/// Optional environment variable overriding the request timeout, in seconds.
pub const ENV_TIMEOUT_SECS: &str = "ONCALL_TIMEOUT_SECS";

/// Default timeout for API requests.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Redirects followed before giving up.
pub const DEFAULT_MAX_REDIRECTS: usize = 10;

/// Connection settings for [`crate::OnCallClient`].
#[derive(Clone)]
pub struct ClientConfig {
    /// Base URL of the OnCall instance. Any path is kept as a prefix before
    /// `api/v1`.
    pub base_url: Url,
    /// Value sent as the `Authorization` header.
    pub auth_token: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Maximum redirects followed per request.
    pub max_redirects: usize,
}

impl ClientConfig {
    /// Create a configuration with default timeout and redirect limit.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL does not parse, is not http(s), or the
    /// token is empty.
    pub fn new(base_url: &str, auth_token: impl Into<String>) -> Result<Self> {
        let base_url = Url::parse(base_url)?;
        if !matches!(base_url.scheme(), "http" | "https") || base_url.cannot_be_a_base() {
            return Err(OnCallError::Config(format!(
                "base URL must be an http(s) URL, got {base_url}"
            )));
        }

        let auth_token = auth_token.into();
        if auth_token.is_empty() {
            return Err(OnCallError::Config("API token is required".to_string()));
        }

        Ok(Self {
            base_url,
            auth_token,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_redirects: DEFAULT_MAX_REDIRECTS,
        })
    }

    /// Read the configuration from `ONCALL_API_URL`, `ONCALL_API_TOKEN` and
    /// the optional `ONCALL_TIMEOUT_SECS`.
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or a value is invalid.
    pub fn from_env() -> Result<Self> {
        let base_url = required_env(ENV_API_URL)?;
        let auth_token = required_env(ENV_API_TOKEN)?;
        let mut config = Self::new(&base_url, auth_token)?;

        if let Ok(raw) = std::env::var(ENV_TIMEOUT_SECS) {
            let secs = raw.trim().parse::<u64>().map_err(|_| {
                OnCallError::Config(format!("{ENV_TIMEOUT_SECS} must be a number of seconds, got {raw:?}"))
            })?;
            config.timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    /// Override the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override the redirect limit.
    #[must_use]
    pub fn with_max_redirects(mut self, max_redirects: usize) -> Self {
        self.max_redirects = max_redirects;
        self
    }
}

fn required_env(name: &str) -> Result<String> {
    std::env::var(name)
        .map_err(|_| OnCallError::Config(format!("{name} environment variable not set")))
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url.as_str())
            .field("timeout", &self.timeout)
            .field("max_redirects", &self.max_redirects)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        std::env::remove_var(ENV_API_URL);
        std::env::remove_var(ENV_API_TOKEN);
        std::env::remove_var(ENV_TIMEOUT_SECS);
    }

    #[test]
    fn test_new_applies_defaults() {
        let config = ClientConfig::new("https://oncall.example.com", "token").unwrap();
        assert_eq!(config.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert_eq!(config.max_redirects, DEFAULT_MAX_REDIRECTS);
    }

    #[test]
    fn test_new_requires_token() {
        let result = ClientConfig::new("https://oncall.example.com", "");
        assert!(matches!(result, Err(OnCallError::Config(_))));
    }

    #[test]
    fn test_new_rejects_bad_urls() {
        assert!(matches!(
            ClientConfig::new("not a url", "token"),
            Err(OnCallError::InvalidUrl(_))
        ));
        assert!(matches!(
            ClientConfig::new("mailto:oncall@example.com", "token"),
            Err(OnCallError::Config(_))
        ));
    }

    #[test]
    fn test_debug_hides_token() {
        let config = ClientConfig::new("https://oncall.example.com", "secret-token").unwrap();
        assert!(!format!("{config:?}").contains("secret-token"));
    }

    #[test]
    #[serial]
    fn test_from_env() {
        clear_env();
        std::env::set_var(ENV_API_URL, "https://oncall.example.com/prefix");
        std::env::set_var(ENV_API_TOKEN, "token");
        std::env::set_var(ENV_TIMEOUT_SECS, "5");

        let config = ClientConfig::from_env().unwrap();
        assert_eq!(config.base_url.path(), "/prefix");
        assert_eq!(config.timeout, Duration::from_secs(5));
        clear_env();
    }

    #[test]
    #[serial]
    fn test_from_env_missing_token() {
        clear_env();
        std::env::set_var(ENV_API_URL, "https://oncall.example.com");

        let err = ClientConfig::from_env().unwrap_err();
        assert!(err.to_string().contains(ENV_API_TOKEN));
        clear_env();
    }

    #[test]
    #[serial]
    fn test_from_env_bad_timeout() {
        clear_env();
        std::env::set_var(ENV_API_URL, "https://oncall.example.com");
        std::env::set_var(ENV_API_TOKEN, "token");
        std::env::set_var(ENV_TIMEOUT_SECS, "soon");

        assert!(matches!(ClientConfig::from_env(), Err(OnCallError::Config(_))));
        clear_env();
    }
}
