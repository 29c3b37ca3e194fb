//! Client configuration types.

use std::fmt;
use std::time::Duration;

use billow_core::RetryPolicy;
use url::Url;

use crate::Result;

/// Environment variable holding the API key.
pub const ENV_API_KEY: &str = "BILLOW_API_KEY";
/// Environment variable holding the site ID.
pub const ENV_SITE_ID: &str = "BILLOW_SITE_ID";
/// Environment variable holding the API base URL.
pub const ENV_BASE_URL: &str = "BILLOW_BASE_URL";

/// Configuration for the billing client.
#[derive(Clone)]
pub struct ClientConfig {
    /// API root, e.g. `https://billing.example.com`.
    pub base_url: Option<Url>,
    /// Private API key, sent as the Basic auth username.
    pub api_key: Option<String>,
    /// Site every resource path is rooted under.
    pub site_id: Option<String>,
    /// Deadline of one call, retries and backoff included.
    pub timeout: Duration,
    /// I/O timeout of a single attempt.
    pub attempt_timeout: Duration,
    /// Connection timeout duration.
    pub connect_timeout: Duration,
    /// Maximum idle connections per host.
    pub pool_idle_per_host: usize,
    /// Idle connection timeout.
    pub pool_idle_timeout: Duration,
    /// Retry and backoff policy.
    pub retry: RetryPolicy,
    /// `User-Agent` header value.
    pub user_agent: String,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url.as_ref().map(Url::as_str))
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("site_id", &self.site_id)
            .field("timeout", &self.timeout)
            .field("attempt_timeout", &self.attempt_timeout)
            .field("connect_timeout", &self.connect_timeout)
            .field("pool_idle_per_host", &self.pool_idle_per_host)
            .field("pool_idle_timeout", &self.pool_idle_timeout)
            .field("retry", &self.retry)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key: None,
            site_id: None,
            timeout: Duration::from_secs(60),
            attempt_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            pool_idle_per_host: 32,
            pool_idle_timeout: Duration::from_secs(90),
            retry: RetryPolicy::default(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_user_agent() -> String {
    format!("billow/{}", env!("CARGO_PKG_VERSION"))
}

impl ClientConfig {
    /// Create a new configuration builder.
    #[must_use]
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Default configuration completed from `BILLOW_API_KEY`,
    /// `BILLOW_SITE_ID` and `BILLOW_BASE_URL`.
    ///
    /// Unset variables leave the field empty.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidUrl`] if `BILLOW_BASE_URL` is not a URL.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Like [`ClientConfig::from_env`], reading variables through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidUrl`] if the base URL is not a URL.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let non_empty = |name: &str| lookup(name).filter(|value: &String| !value.trim().is_empty());

        let mut builder = Self::builder();
        if let Some(api_key) = non_empty(ENV_API_KEY) {
            builder = builder.api_key(api_key);
        }
        if let Some(site_id) = non_empty(ENV_SITE_ID) {
            builder = builder.site_id(site_id);
        }
        if let Some(base_url) = non_empty(ENV_BASE_URL) {
            builder = builder.base_url(Url::parse(base_url.trim())?);
        }
        Ok(builder.build())
    }
}

/// Builder for [`ClientConfig`].
#[derive(Clone, Default)]
pub struct ClientConfigBuilder {
    base_url: Option<Url>,
    api_key: Option<String>,
    site_id: Option<String>,
    timeout: Option<Duration>,
    attempt_timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    pool_idle_per_host: Option<usize>,
    pool_idle_timeout: Option<Duration>,
    retry: Option<RetryPolicy>,
    user_agent: Option<String>,
}

impl fmt::Debug for ClientConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfigBuilder")
            .field("base_url", &self.base_url.as_ref().map(Url::as_str))
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("site_id", &self.site_id)
            .finish_non_exhaustive()
    }
}

impl ClientConfigBuilder {
    /// Set the API root.
    #[must_use]
    pub fn base_url(mut self, base_url: Url) -> Self {
        self.base_url = Some(base_url);
        self
    }

    /// Set the API key.
    #[must_use]
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the site ID.
    #[must_use]
    pub fn site_id(mut self, site_id: impl Into<String>) -> Self {
        self.site_id = Some(site_id.into());
        self
    }

    /// Set the call deadline.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the per-attempt I/O timeout.
    #[must_use]
    pub const fn attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = Some(timeout);
        self
    }

    /// Set the connection timeout.
    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Set the maximum idle connections per host.
    #[must_use]
    pub const fn pool_idle_per_host(mut self, count: usize) -> Self {
        self.pool_idle_per_host = Some(count);
        self
    }

    /// Set the idle connection timeout.
    #[must_use]
    pub const fn pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.pool_idle_timeout = Some(timeout);
        self
    }

    /// Set the retry policy.
    #[must_use]
    pub const fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = Some(retry);
        self
    }

    /// Set the `User-Agent` header.
    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Build the configuration.
    #[must_use]
    pub fn build(self) -> ClientConfig {
        let defaults = ClientConfig::default();
        ClientConfig {
            base_url: self.base_url,
            api_key: self.api_key,
            site_id: self.site_id,
            timeout: self.timeout.unwrap_or(defaults.timeout),
            attempt_timeout: self.attempt_timeout.unwrap_or(defaults.attempt_timeout),
            connect_timeout: self.connect_timeout.unwrap_or(defaults.connect_timeout),
            pool_idle_per_host: self
                .pool_idle_per_host
                .unwrap_or(defaults.pool_idle_per_host),
            pool_idle_timeout: self.pool_idle_timeout.unwrap_or(defaults.pool_idle_timeout),
            retry: self.retry.unwrap_or(defaults.retry),
            user_agent: self.user_agent.unwrap_or(defaults.user_agent),
        }
    }
}
