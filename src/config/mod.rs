use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::limiter::QuotaTracker;
use crate::transport::Transport;

/// Default host for Alpha Vantage.
pub const HOST_DEFAULT: &str = "www.alphavantage.co";
pub const TIMEOUT_DEFAULT: Duration = Duration::from_secs(30);

pub const SECOND_WINDOW_DEFAULT: Duration = Duration::from_secs(1);
pub const DAY_WINDOW_DEFAULT: Duration = Duration::from_secs(24 * 60 * 60);
/// Step between re-checks while a caller waits for the per-second budget.
pub const POLL_INTERVAL_DEFAULT: Duration = Duration::from_millis(50);

const MIN_WINDOW: Duration = Duration::from_millis(1);

/// Budgets and timing for a [`QuotaTracker`]. A `None` limit leaves that window uncapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaSettings {
    pub per_second: Option<u32>,
    pub per_day: Option<u32>,
    pub second_window: Duration,
    pub day_window: Duration,
    pub poll_interval: Duration,
}

impl QuotaSettings {
    /// Maps the conventional "0 means no limit" arguments onto optional limits.
    pub fn from_limits(day_limit: u32, second_limit: u32) -> Self {
        Self {
            per_second: (second_limit > 0).then_some(second_limit),
            per_day: (day_limit > 0).then_some(day_limit),
            ..Self::default()
        }
    }

    pub(crate) fn normalized(mut self) -> Self {
        self.second_window = self.second_window.max(MIN_WINDOW);
        self.day_window = self.day_window.max(MIN_WINDOW);
        self.poll_interval = self.poll_interval.max(MIN_WINDOW);
        self
    }
}

impl Default for QuotaSettings {
    fn default() -> Self {
        Self {
            per_second: None,
            per_day: None,
            second_window: SECOND_WINDOW_DEFAULT,
            day_window: DAY_WINDOW_DEFAULT,
            poll_interval: POLL_INTERVAL_DEFAULT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scheme {
    /// Plain HTTP, only meant for local mock servers.
    Http,
    #[default]
    Https,
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scheme::Http => f.write_str("http"),
            Scheme::Https => f.write_str("https"),
        }
    }
}

/// Settings for a [`crate::transport::Connection`].
///
/// The `with_*` methods consume and return the config, so later calls for the same field win.
/// `timeout` configures the client built from this config. An injected `http_client` keeps its
/// own timeout unless `with_timeout` is called after it, which sets `request_timeout` so every
/// request carries the later value.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    pub host: String,
    pub scheme: Scheme,
    pub timeout: Duration,
    pub request_timeout: Option<Duration>,
    pub http_client: Option<reqwest::Client>,
    pub quota: Option<Arc<QuotaTracker>>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: HOST_DEFAULT.to_string(),
            scheme: Scheme::Https,
            timeout: TIMEOUT_DEFAULT,
            request_timeout: None,
            http_client: None,
            quota: None,
        }
    }
}

impl ConnectionConfig {
    pub fn with_host<S: Into<String>>(mut self, host: S) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_scheme(mut self, scheme: Scheme) -> Self {
        self.scheme = scheme;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self.request_timeout = self.http_client.as_ref().map(|_| timeout);
        self
    }

    /// Replaces the HTTP client. Its own timeout applies until a later `with_timeout`.
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = Some(client);
        self.request_timeout = None;
        self
    }

    pub fn with_quota(mut self, quota: Arc<QuotaTracker>) -> Self {
        self.quota = Some(quota);
        self
    }
}

/// Settings for a [`crate::Client`]. Without a `transport`, one is built from `connection`.
#[derive(Clone, Default)]
pub struct ClientConfig {
    pub api_key: String,
    pub transport: Option<Arc<dyn Transport>>,
    pub connection: ConnectionConfig,
}

impl ClientConfig {
    pub fn with_api_key<S: Into<String>>(mut self, api_key: S) -> Self {
        self.api_key = api_key.into();
        self
    }

    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn with_connection(mut self, connection: ConnectionConfig) -> Self {
        self.connection = connection;
        self
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &"<redacted>")
            .field("transport", &self.transport.as_ref().map(|_| "<injected>"))
            .field("connection", &self.connection)
            .finish()
    }
}
