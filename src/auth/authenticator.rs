//! Authorizes outgoing requests
//!
//! Refreshed tokens are shared by every request through the client until
//! they near expiry or the API rejects them.

use super::types::{AccessToken, AuthConfig, RefreshGrant};
use crate::error::{Error, Result};
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Prefix of the `Authorization` header value
pub const AUTH_HEADER_PREFIX: &str = "Zoho-oauthtoken";

pub struct Authenticator {
    config: AuthConfig,
    token: RwLock<Option<AccessToken>>,
    http: Client,
}

impl Authenticator {
    pub fn new(config: AuthConfig) -> Self {
        Self::with_client(config, Client::new())
    }

    /// Authenticator posting token refreshes through `http`
    pub fn with_client(config: AuthConfig, http: Client) -> Self {
        Self {
            config,
            token: RwLock::new(None),
            http,
        }
    }

    /// Add the `Authorization` header
    pub async fn apply(&self, req: RequestBuilder) -> Result<RequestBuilder> {
        let token = self.access_token().await?;
        Ok(req.header(
            reqwest::header::AUTHORIZATION,
            format!("{AUTH_HEADER_PREFIX} {token}"),
        ))
    }

    /// Whether a rejected token can be replaced by refreshing
    pub fn can_refresh(&self) -> bool {
        matches!(self.config, AuthConfig::Refresh(_))
    }

    /// Current access token, refreshing it when missing or near expiry
    pub async fn access_token(&self) -> Result<String> {
        match &self.config {
            AuthConfig::Static { token } => Ok(token.clone()),
            AuthConfig::Refresh(grant) => self.refreshed_token(grant).await,
        }
    }

    /// Drop the cached token so the next request refreshes it
    pub async fn invalidate(&self) {
        self.token.write().await.take();
    }

    async fn cached(&self) -> Option<String> {
        self.token
            .read()
            .await
            .as_ref()
            .filter(|token| !token.is_expired())
            .map(|token| token.value.clone())
    }

    async fn refreshed_token(&self, grant: &RefreshGrant) -> Result<String> {
        if let Some(value) = self.cached().await {
            return Ok(value);
        }

        let mut slot = self.token.write().await;
        // Refreshed by another request while waiting for the lock
        if let Some(token) = slot.as_ref().filter(|token| !token.is_expired()) {
            return Ok(token.value.clone());
        }

        let token = self.request_token(grant).await?;
        let value = token.value.clone();
        *slot = Some(token);
        Ok(value)
    }

    async fn request_token(&self, grant: &RefreshGrant) -> Result<AccessToken> {
        debug!(token_url = %grant.token_url, "Refreshing access token");

        let response = self
            .http
            .post(&grant.token_url)
            .form(&grant.form())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::TokenRefresh {
                message: format!("token endpoint answered {}: {body}", status.as_u16()),
            });
        }

        let token = response.json::<TokenResponse>().await?.into_access_token()?;
        info!(expires_at = ?token.expires_at, "Access token refreshed");
        Ok(token)
    }
}

/// Token endpoint answer.
///
/// The accounts server answers 200 with an `error` field for bad grants.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    error: Option<String>,
}

impl TokenResponse {
    fn into_access_token(self) -> Result<AccessToken> {
        if let Some(error) = self.error {
            return Err(Error::TokenRefresh { message: error });
        }
        let value = self.access_token.ok_or_else(|| Error::TokenRefresh {
            message: "token response has no access_token".to_string(),
        })?;
        Ok(match self.expires_in {
            Some(seconds) => AccessToken::valid_for(value, seconds),
            None => AccessToken::new(value, None),
        })
    }
}
