//! Auth configuration types

use crate::config::TapConfig;
use chrono::{DateTime, Duration, Utc};

/// Tokens this close to expiry are refreshed before use
pub const EXPIRY_MARGIN_SECS: i64 = 30;

/// How requests are authorized
#[derive(Debug, Clone)]
pub enum AuthConfig {
    /// Pre-issued access token, sent as-is and never refreshed
    Static { token: String },
    /// Access tokens minted from a long-lived refresh token
    Refresh(RefreshGrant),
}

impl AuthConfig {
    /// Pick the auth flow for a tap config.
    ///
    /// A configured `access_token` short-circuits the refresh grant.
    pub fn from_tap_config(config: &TapConfig) -> Self {
        match config.access_token.as_deref().filter(|t| !t.is_empty()) {
            Some(token) => Self::Static {
                token: token.to_string(),
            },
            None => Self::Refresh(RefreshGrant {
                token_url: config.token_url(),
                client_id: config.client_id.clone(),
                client_secret: config.client_secret.clone(),
                refresh_token: config.refresh_token.clone(),
            }),
        }
    }
}

/// Parameters of the `refresh_token` grant
#[derive(Debug, Clone)]
pub struct RefreshGrant {
    /// `<accounts_server>/oauth/v2/token`
    pub token_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
}

impl RefreshGrant {
    /// Form body posted to the token endpoint
    pub fn form(&self) -> [(&'static str, &str); 4] {
        [
            ("grant_type", "refresh_token"),
            ("client_id", &self.client_id),
            ("client_secret", &self.client_secret),
            ("refresh_token", &self.refresh_token),
        ]
    }
}

/// An access token and when it stops being accepted
#[derive(Debug, Clone)]
pub struct AccessToken {
    pub value: String,
    /// `None` for tokens the server gave no lifetime for
    pub expires_at: Option<DateTime<Utc>>,
}

impl AccessToken {
    pub fn new(value: impl Into<String>, expires_at: Option<DateTime<Utc>>) -> Self {
        Self {
            value: value.into(),
            expires_at,
        }
    }

    /// Token valid for `seconds` from now
    pub fn valid_for(value: impl Into<String>, seconds: i64) -> Self {
        Self::new(value, Some(Utc::now() + Duration::seconds(seconds)))
    }

    /// Whether the token expires within the refresh margin
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|expires_at| {
            Utc::now() + Duration::seconds(EXPIRY_MARGIN_SECS) >= expires_at
        })
    }
}
