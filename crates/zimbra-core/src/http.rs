//! HTTP settings of the SOAP transport.
//!
//! One admin call is one HTTP exchange. Failures go back to the caller as they are;
//! nothing is retried.

use std::time::Duration;

/// Seconds an admin SOAP exchange may take.
pub const ADMIN_DEFAULT_TIMEOUT: u64 = 30;

/// Seconds an idle pooled connection is kept.
pub const DEFAULT_POOL_IDLE_TIMEOUT: u64 = 90;

/// Idle pooled connections kept per host.
pub const DEFAULT_POOL_MAX_IDLE_PER_HOST: usize = 10;

/// Connection timeout in seconds.
pub const DEFAULT_CONNECT_TIMEOUT: u64 = 10;

/// `User-Agent` sent to the admin service.
pub const DEFAULT_USER_AGENT: &str = concat!("zimbra-admin-rust/", env!("CARGO_PKG_VERSION"));

/// Settings of the HTTP client behind the admin transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpSettings {
    /// Whole-exchange timeout
    pub timeout: Duration,
    /// Connection establishment timeout
    pub connect_timeout: Duration,
    /// How long idle connections stay pooled
    pub pool_idle_timeout: Duration,
    /// Idle connections pooled per host
    pub pool_max_idle_per_host: usize,
    /// `User-Agent` header
    pub user_agent: &'static str,
    /// Accept gzip-encoded responses
    pub gzip: bool,
}

impl HttpSettings {
    /// Settings for an admin exchange of at most `timeout`.
    #[must_use]
    pub const fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT),
            pool_idle_timeout: Duration::from_secs(DEFAULT_POOL_IDLE_TIMEOUT),
            pool_max_idle_per_host: DEFAULT_POOL_MAX_IDLE_PER_HOST,
            user_agent: DEFAULT_USER_AGENT,
            gzip: true,
        }
    }

    /// Replace the connection timeout.
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Replace the pool idle timeout.
    #[must_use]
    pub const fn with_pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.pool_idle_timeout = timeout;
        self
    }

    /// Replace the per-host idle connection cap.
    #[must_use]
    pub const fn with_pool_max_idle(mut self, max: usize) -> Self {
        self.pool_max_idle_per_host = max;
        self
    }

    /// Replace the `User-Agent`.
    #[must_use]
    pub const fn with_user_agent(mut self, user_agent: &'static str) -> Self {
        self.user_agent = user_agent;
        self
    }

    /// Turn gzip responses on or off.
    #[must_use]
    pub const fn with_gzip(mut self, gzip: bool) -> Self {
        self.gzip = gzip;
        self
    }
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self::new(Duration::from_secs(ADMIN_DEFAULT_TIMEOUT))
    }
}
