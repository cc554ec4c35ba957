//! Request description and the executor seam
//!
//! Everything above the HTTP layer talks to the API through
//! [`RequestExecutor`], which lets stream and discovery code run against a
//! scripted executor in tests.

use crate::error::Result;
use crate::types::{JsonValue, Method, QueryParams};
use async_trait::async_trait;
use std::collections::BTreeMap;

/// A single API call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApiRequest {
    /// HTTP method
    pub method: Method,
    /// Absolute URL; wins over `path` when set
    pub endpoint: Option<String>,
    /// Path relative to the API base URL
    pub path: Option<String>,
    /// Query parameters
    pub params: QueryParams,
    /// Extra request headers
    pub headers: BTreeMap<String, String>,
    /// JSON body (dropped for GET)
    pub body: Option<JsonValue>,
}

impl ApiRequest {
    /// GET a path relative to the base URL
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            path: Some(path.into()),
            ..Self::default()
        }
    }

    /// Target an absolute URL instead of a path
    #[must_use]
    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.endpoint = Some(url.into());
        self
    }

    /// Add a query parameter
    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Replace all query parameters
    #[must_use]
    pub fn params(mut self, params: QueryParams) -> Self {
        self.params = params;
        self
    }

    /// Add a header
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Set JSON body
    #[must_use]
    pub fn json(mut self, body: JsonValue) -> Self {
        self.body = Some(body);
        self
    }

    /// Human readable target, for logs
    pub fn target(&self) -> &str {
        self.endpoint
            .as_deref()
            .or(self.path.as_deref())
            .unwrap_or_default()
    }
}

/// Executes API requests.
///
/// Implementations authenticate, retry transient failures, and map a `204`
/// response to an empty object. Errors returned here are final.
#[async_trait]
pub trait RequestExecutor: Send + Sync {
    /// Execute a request and return the decoded JSON body
    async fn execute(&self, request: ApiRequest) -> Result<JsonValue>;
}
