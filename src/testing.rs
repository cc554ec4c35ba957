//! Scripted request executor for unit tests

use crate::error::{Error, Result};
use crate::http::{ApiRequest, RequestExecutor};
use crate::types::JsonValue;
use async_trait::async_trait;
use std::sync::Mutex;

type Handler = Box<dyn Fn(&ApiRequest) -> Result<JsonValue> + Send + Sync>;

/// Answers requests by path and records every request it sees
#[derive(Default)]
pub(crate) struct ScriptedExecutor {
    routes: Vec<(String, Handler)>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl ScriptedExecutor {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Route requests whose path (or endpoint) equals `path` to `handler`
    pub(crate) fn route(
        mut self,
        path: &str,
        handler: impl Fn(&ApiRequest) -> Result<JsonValue> + Send + Sync + 'static,
    ) -> Self {
        self.routes.push((path.to_string(), Box::new(handler)));
        self
    }

    /// Route `path` to a fixed body
    pub(crate) fn fixed(self, path: &str, body: JsonValue) -> Self {
        self.route(path, move |_| Ok(body.clone()))
    }

    /// Every request executed so far
    pub(crate) fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Requests sent to one path
    pub(crate) fn requests_to(&self, path: &str) -> Vec<ApiRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.target() == path)
            .collect()
    }
}

#[async_trait]
impl RequestExecutor for ScriptedExecutor {
    async fn execute(&self, request: ApiRequest) -> Result<JsonValue> {
        self.requests.lock().unwrap().push(request.clone());
        let handler = self
            .routes
            .iter()
            .find(|(path, _)| path == request.target())
            .map(|(_, handler)| handler)
            .ok_or_else(|| Error::api(404, None, None))?;
        handler(&request)
    }
}
