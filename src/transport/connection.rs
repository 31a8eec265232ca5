use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use url::Url;

use crate::config::{ConnectionConfig, Scheme};
use crate::endpoint::{Endpoint, QUERY_FUNCTION};
use crate::error::{AppError, Context, Result};
use crate::limiter::QuotaTracker;

use super::{ResponseBody, Transport};

/// HTTP transport that issues one GET per admitted call against a fixed host.
#[derive(Debug, Clone)]
pub struct Connection {
    host: String,
    scheme: Scheme,
    base: Url,
    http: reqwest::Client,
    request_timeout: Option<Duration>,
    quota: Arc<QuotaTracker>,
}

impl Connection {
    pub fn new(config: ConnectionConfig) -> Result<Self> {
        let base = Url::parse(&format!("{}://{}/", config.scheme, config.host))
            .with_context(|| format!("Invalid host `{}`", config.host))?;

        let http = match config.http_client {
            Some(client) => client,
            None => reqwest::Client::builder()
                .timeout(config.timeout)
                .build()
                .context("Failed to construct HTTP client")?,
        };

        let quota = config
            .quota
            .unwrap_or_else(|| Arc::new(QuotaTracker::unlimited()));

        Ok(Self {
            host: config.host,
            scheme: config.scheme,
            base,
            http,
            request_timeout: config.request_timeout,
            quota,
        })
    }

    /// Connection to the default Alpha Vantage host with an unlimited quota.
    pub fn default_host() -> Result<Self> {
        Self::new(ConnectionConfig::default())
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    pub fn http_client(&self) -> &reqwest::Client {
        &self.http
    }

    pub fn quota(&self) -> &Arc<QuotaTracker> {
        &self.quota
    }

    pub fn url_for(&self, endpoint: &Endpoint) -> Result<Url> {
        self.base.join(&endpoint.to_string()).map_err(|err| {
            AppError::message(format!(
                "Failed to build URL for endpoint `{}`: {}",
                endpoint.path(),
                err
            ))
        })
    }
}

#[async_trait]
impl Transport for Connection {
    async fn request(&self, endpoint: &Endpoint) -> Result<ResponseBody> {
        let url = self.url_for(endpoint)?;
        let label = endpoint
            .param(QUERY_FUNCTION)
            .unwrap_or(endpoint.path())
            .to_string();

        self.quota
            .admit(move || async move {
                debug!("requesting {} from {}", label, self.host);

                let mut request = self.http.get(url);
                if let Some(timeout) = self.request_timeout {
                    request = request.timeout(timeout);
                }

                let response = request.send().await?;
                let status = response.status();
                if !status.is_success() {
                    warn!("{} responded with status {} for {}", self.host, status, label);
                }

                let bytes = response.bytes().await?;
                debug!("received {} bytes for {}", bytes.len(), label);
                Ok(ResponseBody::from_bytes(bytes.to_vec()))
            })
            .await
    }
}
