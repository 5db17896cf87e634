//! Client configuration.

use std::time::Duration;

use crate::error::{DeployError, Result};
use crate::poller::PollPolicy;

const DEFAULT_API_ROOT_URL: &str = "https://api.aptible.com";

/// Configuration for [`crate::HttpTransport`] and [`crate::DeployService`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Root URL of the platform API.
    pub api_root_url: String,
    /// Bearer token sent with every request.
    pub access_token: String,
    /// Per-request timeout.
    pub request_timeout: Duration,
    /// How operations are polled to completion.
    pub poll: PollPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_root_url: DEFAULT_API_ROOT_URL.to_string(),
            access_token: String::new(),
            request_timeout: Duration::from_secs(30),
            poll: PollPolicy::default(),
        }
    }
}

impl ClientConfig {
    /// Create a configuration with the given token and default values.
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            ..Self::default()
        }
    }

    /// Create a configuration from environment variables.
    ///
    /// Environment variables:
    /// - `APTIBLE_ACCESS_TOKEN`: Bearer token (required)
    /// - `APTIBLE_API_ROOT_URL`: API root (default: "https://api.aptible.com")
    /// - `APTIBLE_REQUEST_TIMEOUT_MS`: Request timeout in milliseconds (default: 30000)
    /// - `APTIBLE_POLL_INTERVAL_MS`: Delay between status checks (default: 2000)
    /// - `APTIBLE_POLL_MAX_ATTEMPTS`: Status checks before giving up (default: 900)
    /// - `APTIBLE_POLL_TIMEOUT_SECS`: Optional wall-clock bound on polling
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let access_token = lookup("APTIBLE_ACCESS_TOKEN")
            .filter(|token| !token.is_empty())
            .ok_or_else(|| DeployError::Config("APTIBLE_ACCESS_TOKEN is not set".to_string()))?;

        let api_root_url =
            lookup("APTIBLE_API_ROOT_URL").unwrap_or_else(|| DEFAULT_API_ROOT_URL.to_string());
        url::Url::parse(&api_root_url)
            .map_err(|e| DeployError::Config(format!("invalid APTIBLE_API_ROOT_URL: {}", e)))?;

        let request_timeout_ms = parse_var(&lookup, "APTIBLE_REQUEST_TIMEOUT_MS", 30_000u64)?;
        let poll_interval_ms = parse_var(&lookup, "APTIBLE_POLL_INTERVAL_MS", 2_000u64)?;
        let max_attempts = parse_var(&lookup, "APTIBLE_POLL_MAX_ATTEMPTS", 900u32)?;
        if max_attempts == 0 {
            return Err(DeployError::Config(
                "APTIBLE_POLL_MAX_ATTEMPTS must be at least 1".to_string(),
            ));
        }
        let timeout = match lookup("APTIBLE_POLL_TIMEOUT_SECS") {
            Some(raw) => Some(Duration::from_secs(raw.parse().map_err(|e| {
                DeployError::Config(format!("invalid APTIBLE_POLL_TIMEOUT_SECS: {}", e))
            })?)),
            None => None,
        };

        Ok(Self {
            api_root_url,
            access_token,
            request_timeout: Duration::from_millis(request_timeout_ms),
            poll: PollPolicy {
                interval: Duration::from_millis(poll_interval_ms),
                max_attempts,
                timeout,
            },
        })
    }

    /// Set the API root URL.
    pub fn with_api_root_url(mut self, url: impl Into<String>) -> Self {
        self.api_root_url = url.into();
        self
    }

    /// Set the request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the poll policy.
    pub fn with_poll_policy(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .parse()
            .map_err(|e| DeployError::Config(format!("invalid {}: {}", key, e))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.api_root_url, "https://api.aptible.com");
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.poll.interval, Duration::from_secs(2));
        assert_eq!(config.poll.max_attempts, 900);
        assert!(config.poll.timeout.is_none());
    }

    #[test]
    fn test_from_lookup_requires_token() {
        let err = ClientConfig::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(matches!(err, DeployError::Config(_)));
        assert!(err.to_string().contains("APTIBLE_ACCESS_TOKEN"));
    }

    #[test]
    fn test_from_lookup_reads_overrides() {
        let config = ClientConfig::from_lookup(lookup_from(&[
            ("APTIBLE_ACCESS_TOKEN", "tok"),
            ("APTIBLE_API_ROOT_URL", "http://localhost:4000"),
            ("APTIBLE_POLL_INTERVAL_MS", "250"),
            ("APTIBLE_POLL_MAX_ATTEMPTS", "12"),
            ("APTIBLE_POLL_TIMEOUT_SECS", "60"),
        ]))
        .unwrap();

        assert_eq!(config.access_token, "tok");
        assert_eq!(config.api_root_url, "http://localhost:4000");
        assert_eq!(config.poll.interval, Duration::from_millis(250));
        assert_eq!(config.poll.max_attempts, 12);
        assert_eq!(config.poll.timeout, Some(Duration::from_secs(60)));
    }

    #[test]
    fn test_from_lookup_rejects_bad_values() {
        let err = ClientConfig::from_lookup(lookup_from(&[
            ("APTIBLE_ACCESS_TOKEN", "tok"),
            ("APTIBLE_POLL_INTERVAL_MS", "soon"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("APTIBLE_POLL_INTERVAL_MS"));

        let err = ClientConfig::from_lookup(lookup_from(&[
            ("APTIBLE_ACCESS_TOKEN", "tok"),
            ("APTIBLE_POLL_MAX_ATTEMPTS", "0"),
        ]))
        .unwrap_err();
        assert!(matches!(err, DeployError::Config(_)));

        let err = ClientConfig::from_lookup(lookup_from(&[
            ("APTIBLE_ACCESS_TOKEN", "tok"),
            ("APTIBLE_API_ROOT_URL", "not a url"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("APTIBLE_API_ROOT_URL"));
    }

    #[test]
    fn test_builder_methods() {
        let config = ClientConfig::new("tok")
            .with_api_root_url("http://127.0.0.1:9000")
            .with_request_timeout(Duration::from_secs(5))
            .with_poll_policy(PollPolicy::new(Duration::ZERO, 3));

        assert_eq!(config.access_token, "tok");
        assert_eq!(config.api_root_url, "http://127.0.0.1:9000");
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.poll.max_attempts, 3);
    }
}
