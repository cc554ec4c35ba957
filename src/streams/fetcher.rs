//! Record fetching
//!
//! Walks a list endpoint page by page. Dynamic modules cap the number of
//! fields per request, so their field list is split into batches, every batch
//! is requested for the same page, and partial records are merged by `id`.

use super::definition::StreamDefinition;
use crate::error::{Error, Result};
use crate::http::{ApiRequest, RequestExecutor};
use crate::pagination::{NextPage, PaginationState, Paginator};
use crate::schema::JsonSchema;
use crate::types::{scalar_to_string, JsonObject, JsonValue, QueryParams};
use futures::stream::{self, TryStreamExt};
use std::collections::HashMap;
use tracing::debug;

/// Maximum number of fields per list request
pub const FIELD_BATCH_SIZE: usize = 50;

/// Query parameter carrying a comma-joined field batch
pub const FIELDS_PARAM: &str = "fields";

/// Split schema fields into request batches, `id` first
pub fn field_batches(schema: &JsonSchema) -> Vec<Vec<String>> {
    let mut names: Vec<String> = vec!["id".to_string()];
    names.extend(schema.field_names().filter(|n| *n != "id").map(String::from));
    names
        .chunks(FIELD_BATCH_SIZE)
        .map(<[String]>::to_vec)
        .collect()
}

/// Pages through one endpoint.
///
/// Once the paginator signals the last page, [`RecordFetcher::next_page`]
/// keeps returning `None`.
pub struct RecordFetcher<'a> {
    client: &'a dyn RequestExecutor,
    stream: String,
    path: String,
    data_key: String,
    params: QueryParams,
    field_batches: Option<Vec<Vec<String>>>,
    paginator: Box<dyn Paginator>,
    pagination: PaginationState,
    pages: u32,
}

impl<'a> RecordFetcher<'a> {
    /// Fetcher for a stream, optionally under a parent record
    pub fn new(
        client: &'a dyn RequestExecutor,
        definition: &StreamDefinition,
        schema: &JsonSchema,
        parent_id: Option<&str>,
        extra_params: QueryParams,
    ) -> Self {
        let paginator = definition.paginator();
        let pagination = PaginationState::new();
        let mut params = paginator.initial_params();
        params.extend(extra_params);

        Self {
            client,
            stream: definition.tap_stream_id.clone(),
            path: definition.resolve_path(parent_id),
            data_key: definition.data_key.clone(),
            params,
            field_batches: definition.is_dynamic.then(|| field_batches(schema)),
            paginator,
            pagination,
            pages: 0,
        }
    }

    /// Query parameters the next request will carry
    pub fn params(&self) -> &QueryParams {
        &self.params
    }

    /// Fetch the next page of records; `None` once pagination is exhausted
    pub async fn next_page(&mut self) -> Result<Option<Vec<JsonObject>>> {
        if self.pagination.done {
            return Ok(None);
        }

        let (records, body) = match self.field_batches.clone() {
            None => {
                let body = self.request(&self.params).await?;
                (self.extract_records(&body)?, body)
            }
            Some(batches) => self.fetch_batched(&batches).await?,
        };

        self.pages += 1;
        match self
            .paginator
            .process_response(&body, records.len(), &mut self.pagination)
        {
            NextPage::Continue { query_params } => self.params.extend(query_params),
            NextPage::Done => self.pagination.finish(),
        }

        debug!(
            stream = %self.stream,
            page = self.pages,
            records = records.len(),
            total_fetched = self.pagination.total_fetched,
            page_token = ?self.pagination.page_token,
            done = self.pagination.done,
            "Fetched page"
        );

        Ok(Some(records))
    }

    /// Request every field batch for the current page and merge by `id`.
    ///
    /// Pagination follows the last batch's response.
    async fn fetch_batched(
        &self,
        batches: &[Vec<String>],
    ) -> Result<(Vec<JsonObject>, JsonValue)> {
        let mut order: Vec<String> = Vec::new();
        let mut merged: HashMap<String, JsonObject> = HashMap::new();
        let mut last_body = JsonValue::Object(JsonObject::new());

        for batch in batches {
            let mut params = self.params.clone();
            params.insert(FIELDS_PARAM.to_string(), batch.join(","));
            let body = self.request(&params).await?;

            for record in self.extract_records(&body)? {
                let Some(id) = record
                    .get("id")
                    .and_then(scalar_to_string)
                    .filter(|id| !id.is_empty())
                else {
                    continue;
                };
                match merged.get_mut(&id) {
                    Some(existing) => existing.extend(record),
                    None => {
                        order.push(id.clone());
                        merged.insert(id, record);
                    }
                }
            }
            last_body = body;
        }

        let records = order
            .into_iter()
            .filter_map(|id| merged.remove(&id))
            .collect();
        Ok((records, last_body))
    }

    async fn request(&self, params: &QueryParams) -> Result<JsonValue> {
        let request = ApiRequest::get(self.path.clone())
            .params(params.clone())
            .header("Accept", "application/json");
        self.client.execute(request).await
    }

    fn extract_records(&self, body: &JsonValue) -> Result<Vec<JsonObject>> {
        match body.get(&self.data_key) {
            None | Some(JsonValue::Null) => Ok(Vec::new()),
            Some(JsonValue::Array(items)) => items
                .iter()
                .map(|item| {
                    item.as_object().cloned().ok_or_else(|| {
                        Error::stream(&self.stream, format!("expected record object, got {item}"))
                    })
                })
                .collect(),
            Some(other) => Err(Error::stream(
                &self.stream,
                format!("'{}' is not an array: {other}", self.data_key),
            )),
        }
    }

    /// Lazy, non-restartable sequence of records
    pub fn into_records(self) -> impl futures::Stream<Item = Result<JsonObject>> + Send + 'a {
        stream::try_unfold(self, |mut fetcher| async move {
            let page = fetcher.next_page().await?;
            let records = page.map(|records| {
                (stream::iter(records.into_iter().map(Ok::<_, Error>)), fetcher)
            });
            Ok::<_, Error>(records)
        })
        .try_flatten()
    }
}
