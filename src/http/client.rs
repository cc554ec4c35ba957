//! HTTP client with retry and rate limiting
//!
//! Provides the production [`RequestExecutor`] which handles:
//! - Automatic retries with exponential backoff
//! - Rate limiting to stay under the API quota
//! - Error classification (fatal, retryable, skippable)
//! - Response body parsing, with `204 No Content` mapped to `{}`

use super::rate_limit::{RateLimiter, RateLimiterConfig};
use super::request::{ApiRequest, RequestExecutor};
use crate::auth::{AuthConfig, Authenticator};
use crate::config::TapConfig;
use crate::error::{default_status_message, Error, Result};
use crate::types::{scalar_to_string, BackoffType, JsonObject, JsonValue, Method};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Seconds to wait on a 429 without a usable `Retry-After` header
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// Transport settings for [`HttpClient`]
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Joined with relative request paths, e.g. `https://www.zohoapis.com/crm/v8`
    pub base_url: Option<String>,
    pub timeout: Duration,
    /// Retries after the first attempt, so 4 means five attempts in total
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub backoff_type: BackoffType,
    /// `None` disables client-side throttling
    pub rate_limit: Option<RateLimiterConfig>,
    /// Sent with every request, before per-request headers
    pub default_headers: BTreeMap<String, String>,
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout: Duration::from_secs(300),
            max_retries: 4,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(60),
            backoff_type: BackoffType::Exponential,
            rate_limit: Some(RateLimiterConfig::default()),
            default_headers: BTreeMap::new(),
            user_agent: format!("{}/{}", crate::NAME, crate::VERSION),
        }
    }
}

impl HttpClientConfig {
    pub fn builder() -> HttpClientConfigBuilder {
        HttpClientConfigBuilder::default()
    }

    /// Settings for the data centre and timeout named in the tap config
    pub fn from_tap_config(config: &TapConfig) -> Self {
        let builder = Self::builder()
            .base_url(config.base_url())
            .timeout(config.request_timeout());
        match config.user_agent.as_deref().filter(|a| !a.is_empty()) {
            Some(agent) => builder.user_agent(agent),
            None => builder,
        }
        .build()
    }
}

#[derive(Default)]
pub struct HttpClientConfigBuilder {
    config: HttpClientConfig,
}

impl HttpClientConfigBuilder {
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = Some(url.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn max_retries(mut self, retries: u32) -> Self {
        self.config.max_retries = retries;
        self
    }

    /// Delay curve between attempts, capped at `max`
    pub fn backoff(mut self, backoff_type: BackoffType, initial: Duration, max: Duration) -> Self {
        self.config.backoff_type = backoff_type;
        self.config.initial_backoff = initial;
        self.config.max_backoff = max;
        self
    }

    pub fn rate_limit(mut self, config: RateLimiterConfig) -> Self {
        self.config.rate_limit = Some(config);
        self
    }

    pub fn no_rate_limit(mut self) -> Self {
        self.config.rate_limit = None;
        self
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.default_headers.insert(key.into(), value.into());
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    pub fn build(self) -> HttpClientConfig {
        self.config
    }
}

/// HTTP client with retry and rate limiting
pub struct HttpClient {
    client: Client,
    config: HttpClientConfig,
    authenticator: Option<Authenticator>,
    rate_limiter: Option<RateLimiter>,
}

impl HttpClient {
    /// Create a new HTTP client with custom configuration
    pub fn with_config(config: HttpClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(Error::Http)?;

        let rate_limiter = config.rate_limit.as_ref().map(RateLimiter::new);

        Ok(Self {
            client,
            config,
            authenticator: None,
            rate_limiter,
        })
    }

    /// Create a client with authentication
    pub fn with_auth(config: HttpClientConfig, auth_config: AuthConfig) -> Result<Self> {
        let mut client = Self::with_config(config)?;
        client.authenticator = Some(Authenticator::with_client(
            auth_config,
            client.client.clone(),
        ));
        Ok(client)
    }

    /// Build the authenticated client described by a tap config
    pub fn from_tap_config(config: &TapConfig) -> Result<Self> {
        Self::with_auth(
            HttpClientConfig::from_tap_config(config),
            AuthConfig::from_tap_config(config),
        )
    }

    /// Resolve the URL a request targets
    fn build_url(&self, request: &ApiRequest) -> Result<Url> {
        if let Some(endpoint) = &request.endpoint {
            return Ok(Url::parse(endpoint)?);
        }

        let path = request.path.as_deref().unwrap_or_default();
        if path.starts_with("http://") || path.starts_with("https://") {
            return Ok(Url::parse(path)?);
        }

        match &self.config.base_url {
            Some(base) => {
                let base = base.trim_end_matches('/');
                let path = path.trim_start_matches('/');
                Ok(Url::parse(&format!("{base}/{path}"))?)
            }
            None => Err(Error::config(format!(
                "No base URL configured for relative path '{path}'"
            ))),
        }
    }

    /// Calculate backoff delay for a given attempt
    pub fn calculate_backoff(&self, attempt: u32) -> Duration {
        let delay = match self.config.backoff_type {
            BackoffType::Constant => self.config.initial_backoff,
            BackoffType::Linear => self.config.initial_backoff * (attempt + 1),
            BackoffType::Exponential => {
                let factor = 2u32.saturating_pow(attempt);
                self.config.initial_backoff * factor
            }
        };

        std::cmp::min(delay, self.config.max_backoff)
    }

    /// One attempt, no retries
    async fn send_once(&self, method: Method, url: &Url, request: &ApiRequest) -> Result<JsonValue> {
        if let Some(ref limiter) = self.rate_limiter {
            if !limiter.try_acquire() {
                debug!(url = %url, "Rate limit reached, waiting for a permit");
                limiter.wait().await;
            }
        }

        let mut req = self
            .client
            .request(method.into(), url.clone())
            .timeout(self.config.timeout);

        for (key, value) in &self.config.default_headers {
            req = req.header(key.as_str(), value.as_str());
        }
        for (key, value) in &request.headers {
            req = req.header(key.as_str(), value.as_str());
        }

        if !request.params.is_empty() {
            req = req.query(&request.params);
        }

        if method == Method::POST {
            if let Some(ref body) = request.body {
                req = req.json(body);
            }
        }

        if let Some(ref auth) = self.authenticator {
            req = auth.apply(req).await?;
        }

        let response = req.send().await.map_err(|e| {
            if e.is_timeout() {
                Error::Timeout {
                    timeout_ms: self.config.timeout.as_millis() as u64,
                }
            } else {
                Error::Http(e)
            }
        })?;

        let status = response.status();
        if status == StatusCode::NO_CONTENT {
            return Ok(JsonValue::Object(JsonObject::new()));
        }

        if status.is_success() {
            let bytes = response.bytes().await.map_err(Error::Http)?;
            if bytes.iter().all(u8::is_ascii_whitespace) {
                return Ok(JsonValue::Object(JsonObject::new()));
            }
            return Ok(serde_json::from_slice(&bytes)?);
        }

        let retry_after = extract_retry_after(&response);
        let body = response.text().await.unwrap_or_default();
        Err(classify_error(status.as_u16(), &body, retry_after))
    }
}

#[async_trait]
impl RequestExecutor for HttpClient {
    async fn execute(&self, request: ApiRequest) -> Result<JsonValue> {
        let method = match request.method {
            Method::GET | Method::POST => request.method,
            other => {
                return Err(Error::UnsupportedMethod {
                    method: other.to_string(),
                })
            }
        };
        let url = self.build_url(&request)?;
        let max_retries = self.config.max_retries;
        let mut attempt = 0;
        let mut reauthenticated = false;

        loop {
            match self.send_once(method, &url, &request).await {
                Ok(body) => {
                    debug!("Request succeeded: {} {}", method, url);
                    return Ok(body);
                }
                Err(err) if err.is_skippable() => {
                    warn!(url = %url, error = %err, "Resource not accessible, treating as empty");
                    return Ok(JsonValue::Object(JsonObject::new()));
                }
                Err(err)
                    if err.status() == Some(401)
                        && !reauthenticated
                        && self.authenticator.as_ref().is_some_and(Authenticator::can_refresh) =>
                {
                    warn!(url = %url, error = %err, "Access token rejected, refreshing");
                    if let Some(ref auth) = self.authenticator {
                        auth.invalidate().await;
                    }
                    reauthenticated = true;
                }
                Err(err) if err.is_retryable() && attempt < max_retries => {
                    let delay = match &err {
                        Error::RateLimited {
                            retry_after_seconds,
                            ..
                        } => Duration::from_secs(*retry_after_seconds),
                        _ => self.calculate_backoff(attempt),
                    };
                    warn!(
                        "{}, attempt {}/{}, retrying in {:?}",
                        err,
                        attempt + 1,
                        max_retries + 1,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("config", &self.config)
            .field("has_authenticator", &self.authenticator.is_some())
            .field("has_rate_limiter", &self.rate_limiter.is_some())
            .finish_non_exhaustive()
    }
}

/// Turn a non-success response into a typed error.
///
/// The remote `error` field wins over `message`, which wins over the default
/// text for the status.
pub(crate) fn classify_error(status: u16, body: &str, retry_after: u64) -> Error {
    let payload: JsonValue = serde_json::from_str(body).unwrap_or(JsonValue::Null);
    let code = payload
        .get("code")
        .and_then(JsonValue::as_str)
        .map(String::from);
    let message = payload
        .get("error")
        .and_then(scalar_to_string)
        .or_else(|| payload.get("message").and_then(scalar_to_string));

    if status == 429 {
        return Error::RateLimited {
            retry_after_seconds: retry_after,
            message: message.unwrap_or_else(|| default_status_message(429).to_string()),
        };
    }

    Error::api(status, code, message)
}

/// Extract retry-after header value
fn extract_retry_after(response: &Response) -> u64 {
    response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(DEFAULT_RETRY_AFTER_SECS)
}
