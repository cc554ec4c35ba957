//! Pagination types and traits

use crate::types::{JsonValue, QueryParams};

/// What the fetcher should do after a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextPage {
    /// Request another page, merging these parameters into the current ones
    Continue { query_params: QueryParams },
    /// Pagination is exhausted
    Done,
}

impl NextPage {
    /// Continue with one parameter set to `value`
    pub fn with_param(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Continue {
            query_params: QueryParams::from([(key.into(), value.into())]),
        }
    }

    pub fn is_done(&self) -> bool {
        *self == Self::Done
    }
}

/// Where a fetcher is within a stream's pages.
///
/// `page` is 1-based and only moves when the API answers with
/// `more_records`; a `page_token` answer leaves it untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationState {
    pub page: u32,
    pub page_token: Option<String>,
    /// Records seen across all pages
    pub total_fetched: u64,
    pub done: bool,
}

impl Default for PaginationState {
    fn default() -> Self {
        Self::new()
    }
}

impl PaginationState {
    pub fn new() -> Self {
        Self {
            page: 1,
            page_token: None,
            total_fetched: 0,
            done: false,
        }
    }

    /// Record a page of `count` records
    pub fn record_page(&mut self, count: usize) {
        self.total_fetched += count as u64;
    }

    /// Move to the next numbered page and return its number
    pub fn advance(&mut self) -> u32 {
        self.page += 1;
        self.page
    }

    pub fn finish(&mut self) {
        self.done = true;
    }
}

/// Reads the pagination block of a list response
pub trait Paginator: Send + Sync {
    /// Parameters sent with the first request of a stream
    fn initial_params(&self) -> QueryParams;

    /// Inspect a response body holding `records_count` records and decide
    /// whether another page follows
    fn process_response(
        &self,
        body: &JsonValue,
        records_count: usize,
        state: &mut PaginationState,
    ) -> NextPage;
}
