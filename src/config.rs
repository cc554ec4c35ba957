//! Tap configuration
//!
//! The JSON config file handed to the tap is deserialized into [`TapConfig`].
//! Required keys are checked up front so a missing key is reported by name
//! rather than as a generic serde error.

use crate::error::{Error, Result};
use crate::types::JsonValue;
use chrono::DateTime;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;
use std::time::Duration;

/// Keys that must be present in every config file
pub const REQUIRED_CONFIG_KEYS: &[&str] = &[
    "refresh_token",
    "client_id",
    "client_secret",
    "start_date",
    "api_version",
    "select_fields_by_default",
];

/// Timeout applied when `request_timeout` is absent, empty, non-positive or too large
pub const DEFAULT_REQUEST_TIMEOUT_SECS: f64 = 300.0;

fn default_api_domain() -> String {
    "https://www.zohoapis.com".to_string()
}

fn default_accounts_server() -> String {
    "https://accounts.zoho.com".to_string()
}

/// Configuration recognised by the tap
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TapConfig {
    /// OAuth client id
    pub client_id: String,

    /// OAuth client secret
    pub client_secret: String,

    /// Long-lived refresh token used to mint access tokens
    pub refresh_token: String,

    /// ISO-8601 floor for incremental bookmarks
    pub start_date: String,

    /// Remote API version path segment (e.g. "v8")
    pub api_version: String,

    /// When false, fields without an explicit selection are deselected before sync
    #[serde(deserialize_with = "deserialize_bool_like")]
    pub select_fields_by_default: bool,

    /// Request timeout in seconds (number or numeric string)
    #[serde(default, deserialize_with = "deserialize_timeout")]
    pub request_timeout: Option<f64>,

    /// Pre-issued access token; skips the refresh grant when set
    #[serde(default)]
    pub access_token: Option<String>,

    /// API domain for the account's data centre
    #[serde(default = "default_api_domain")]
    pub api_domain: String,

    /// Accounts server for the account's data centre
    #[serde(default = "default_accounts_server")]
    pub accounts_server: String,

    /// User agent sent with every request
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl TapConfig {
    /// Build a config from a parsed JSON document
    pub fn from_value(value: JsonValue) -> Result<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| Error::config("Config must be a JSON object"))?;

        for key in REQUIRED_CONFIG_KEYS {
            if obj.get(*key).map_or(true, JsonValue::is_null) {
                return Err(Error::missing_field(*key));
            }
        }

        let config: TapConfig = serde_json::from_value(value)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a config from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let value: JsonValue = serde_json::from_str(json)
            .map_err(|e| Error::config(format!("Invalid config JSON: {e}")))?;
        Self::from_value(value)
    }

    /// Load a config file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| Error::config(format!("Failed to read config file: {e}")))?;
        Self::from_json(&content)
    }

    fn validate(&self) -> Result<()> {
        if DateTime::parse_from_rfc3339(&self.start_date).is_err() {
            return Err(Error::invalid_value(
                "start_date",
                format!("'{}' is not an ISO-8601 date-time", self.start_date),
            ));
        }
        if self.api_version.trim().is_empty() {
            return Err(Error::invalid_value("api_version", "must not be empty"));
        }
        Ok(())
    }

    /// Effective request timeout
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
            .filter(|secs| *secs > 0.0)
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
            .unwrap_or_else(|| Duration::from_secs_f64(DEFAULT_REQUEST_TIMEOUT_SECS))
    }

    /// Base URL every API path is joined to
    pub fn base_url(&self) -> String {
        format!(
            "{}/crm/{}",
            self.api_domain.trim_end_matches('/'),
            self.api_version.trim_matches('/')
        )
    }

    /// OAuth token endpoint
    pub fn token_url(&self) -> String {
        format!(
            "{}/oauth/v2/token",
            self.accounts_server.trim_end_matches('/')
        )
    }
}

/// Accept a number or a numeric string; empty strings become `None`
fn deserialize_timeout<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<JsonValue>::deserialize(deserializer)?;
    match value {
        None | Some(JsonValue::Null) => Ok(None),
        Some(JsonValue::Number(n)) => Ok(n.as_f64()),
        Some(JsonValue::String(s)) if s.trim().is_empty() => Ok(None),
        Some(JsonValue::String(s)) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|e| serde::de::Error::custom(format!("request_timeout: {e}"))),
        Some(other) => Err(serde::de::Error::custom(format!(
            "request_timeout must be a number, got {other}"
        ))),
    }
}

/// Accept `true`/`false` or their string spellings
fn deserialize_bool_like<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    match JsonValue::deserialize(deserializer)? {
        JsonValue::Bool(b) => Ok(b),
        JsonValue::String(s) => match s.to_ascii_lowercase().as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            _ => Err(serde::de::Error::custom(format!("expected a boolean, got '{s}'"))),
        },
        other => Err(serde::de::Error::custom(format!(
            "expected a boolean, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use test_case::test_case;

    fn base_config() -> JsonValue {
        json!({
            "client_id": "dummy_id",
            "client_secret": "dummy_secret",
            "refresh_token": "dummy_token",
            "start_date": "2019-01-01T00:00:00Z",
            "api_version": "v8",
            "select_fields_by_default": true
        })
    }

    #[test_case(json!(""), 300.0 ; "empty string")]
    #[test_case(json!("12"), 12.0 ; "string value")]
    #[test_case(json!(10), 10.0 ; "int value")]
    #[test_case(json!(20.0), 20.0 ; "float value")]
    #[test_case(json!(0), 300.0 ; "zero value")]
    #[test_case(json!("1e300"), 300.0 ; "too large for a duration")]
    #[test_case(json!(1e300), 300.0 ; "huge number")]
    #[test_case(json!("inf"), 300.0 ; "infinite")]
    #[test_case(json!("-5"), 300.0 ; "negative")]
    fn test_request_timeout_coercion(input: JsonValue, expected: f64) {
        let mut value = base_config();
        value["request_timeout"] = input;
        let config = TapConfig::from_value(value).unwrap();
        assert!((config.request_timeout().as_secs_f64() - expected).abs() < f64::EPSILON);
    }

    #[test]
    fn test_request_timeout_absent() {
        let config = TapConfig::from_value(base_config()).unwrap();
        assert_eq!(config.request_timeout(), Duration::from_secs(300));
    }

    #[test]
    fn test_invalid_request_timeout() {
        let mut value = base_config();
        value["request_timeout"] = json!("soon");
        assert!(TapConfig::from_value(value).is_err());
    }

    #[test_case("refresh_token")]
    #[test_case("client_id")]
    #[test_case("start_date")]
    #[test_case("select_fields_by_default")]
    fn test_missing_required_key(key: &str) {
        let mut value = base_config();
        value.as_object_mut().unwrap().remove(key);
        let err = TapConfig::from_value(value).unwrap_err();
        assert!(matches!(err, Error::MissingConfigField { ref field } if field == key));
    }

    #[test]
    fn test_invalid_start_date() {
        let mut value = base_config();
        value["start_date"] = json!("last tuesday");
        let err = TapConfig::from_value(value).unwrap_err();
        assert!(matches!(err, Error::InvalidConfigValue { .. }));
    }

    #[test]
    fn test_select_fields_by_default_string() {
        let mut value = base_config();
        value["select_fields_by_default"] = json!("false");
        let config = TapConfig::from_value(value).unwrap();
        assert!(!config.select_fields_by_default);
    }

    #[test]
    fn test_urls() {
        let mut value = base_config();
        value["api_domain"] = json!("https://www.zohoapis.eu/");
        let config = TapConfig::from_value(value).unwrap();
        assert_eq!(config.base_url(), "https://www.zohoapis.eu/crm/v8");
        assert_eq!(
            config.token_url(),
            "https://accounts.zoho.com/oauth/v2/token"
        );
    }
}
