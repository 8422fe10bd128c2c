//! Introspection client settings.

use std::time::Duration;

use url::Url;

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default idle connections kept per identity provider host.
pub const DEFAULT_POOL_MAX_IDLE_PER_HOST: usize = 32;

/// Where and how to reach the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntrospectionConfig {
    /// Identity provider base URL, e.g. `https://sso.example.com/api/v1`.
    pub base_url: Url,
    /// Realm inserted as the first path segment after the base URL.
    pub realm: String,
    /// Timeout for a whole introspection call.
    pub timeout: Duration,
    /// Idle connection pool bound.
    pub pool_max_idle_per_host: usize,
}

impl IntrospectionConfig {
    /// Creates settings with default timeout and pool size.
    pub fn new(base_url: Url, realm: impl Into<String>) -> Self {
        Self {
            base_url,
            realm: realm.into(),
            timeout: DEFAULT_TIMEOUT,
            pool_max_idle_per_host: DEFAULT_POOL_MAX_IDLE_PER_HOST,
        }
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the idle pool bound.
    pub fn with_pool_max_idle_per_host(mut self, max: usize) -> Self {
        self.pool_max_idle_per_host = max;
        self
    }
}
