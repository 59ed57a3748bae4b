//! Client configuration.
//!
//! Everything the client needs is injected through `ClientConfig` at
//! construction; nothing is looked up from the process environment later.

use std::time::Duration;

use crate::auth::Credentials;

pub const DEFAULT_HOST: &str = "https://api.pivotsecurity.com";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_MAX_RATE_LIMIT_RETRIES: u32 = 5;
pub const DEFAULT_RATE_LIMIT_DELAY: Duration = Duration::from_millis(1100);

/// How the dispatcher reacts to 429 responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    /// Retries allowed after the first attempt; a call makes at most
    /// `max_retries + 1` attempts.
    pub max_retries: u32,

    /// Wait used when a 429 carries no usable `X-RateLimit-Reset`.
    pub default_delay: Duration,
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RATE_LIMIT_RETRIES,
            default_delay: DEFAULT_RATE_LIMIT_DELAY,
        }
    }
}

/// Configuration for `PivotClient`.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Scheme and authority of the API, without the `/api` prefix.
    pub host: String,

    pub credentials: Credentials,

    /// Sent as `On-Behalf-Of` on every request when set.
    pub subuser: Option<String>,

    /// Per-attempt deadline for the network round trip.
    pub timeout: Duration,

    pub rate_limit: RateLimitPolicy,

    pub user_agent: String,
}

impl ClientConfig {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            credentials,
            subuser: None,
            timeout: DEFAULT_TIMEOUT,
            rate_limit: RateLimitPolicy::default(),
            user_agent: format!("pivotsecurity/{};rust", env!("CARGO_PKG_VERSION")),
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_subuser(mut self, subuser: impl Into<String>) -> Self {
        self.subuser = Some(subuser.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_rate_limit_retries(mut self, max_retries: u32) -> Self {
        self.rate_limit.max_retries = max_retries;
        self
    }

    pub fn with_rate_limit_delay(mut self, delay: Duration) -> Self {
        self.rate_limit.default_delay = delay;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Base URL every endpoint path is appended to.
    pub fn api_url(&self) -> String {
        format!("{}/api", self.host)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ClientConfig {
        ClientConfig::new(Credentials::new("priv", "pub"))
    }

    #[test]
    fn defaults() {
        let config = config();
        assert_eq!(config.api_url(), "https://api.pivotsecurity.com/api");
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
        assert_eq!(config.rate_limit.max_retries, 5);
        assert_eq!(config.rate_limit.default_delay, Duration::from_millis(1100));
        assert!(config.subuser.is_none());
        assert!(config.user_agent.starts_with("pivotsecurity/"));
        assert!(config.user_agent.ends_with(";rust"));
    }

    #[test]
    fn trailing_slash_is_stripped_from_host() {
        let config = config().with_host("http://localhost:8080/");
        assert_eq!(config.api_url(), "http://localhost:8080/api");
    }

    #[test]
    fn builder_overrides() {
        let config = config()
            .with_subuser("team-a")
            .with_timeout(Duration::from_secs(5))
            .with_max_rate_limit_retries(2)
            .with_rate_limit_delay(Duration::from_millis(10))
            .with_user_agent("custom/1.0");
        assert_eq!(config.subuser.as_deref(), Some("team-a"));
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(
            config.rate_limit,
            RateLimitPolicy {
                max_retries: 2,
                default_delay: Duration::from_millis(10),
            }
        );
        assert_eq!(config.user_agent, "custom/1.0");
    }
}
