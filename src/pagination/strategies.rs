//! Pagination strategy implementations

use super::types::{NextPage, PaginationState, Paginator};
use crate::types::{is_truthy, JsonValue, QueryParams};

/// Default page number parameter
pub const PAGE_PARAM: &str = "page";
/// Default page token parameter
pub const PAGE_TOKEN_PARAM: &str = "page_token";
/// Default page size parameter
pub const PAGE_SIZE_PARAM: &str = "per_page";

// ============================================================================
// Info Block Pagination
// ============================================================================

/// Pagination driven by the response's `info` block.
///
/// Rules, in order:
/// - empty body or no `info` object: done
/// - non-empty `info.next_page_token`: send it as `page_token`
/// - truthy `info.more_records`: increment `page`
/// - otherwise: done
#[derive(Debug, Clone)]
pub struct InfoPaginator {
    /// Query parameter name for page number
    pub page_param: String,
    /// Query parameter name for the page token
    pub token_param: String,
    /// Query parameter name for page size
    pub page_size_param: String,
    /// Records requested per page
    pub page_size: u32,
}

impl InfoPaginator {
    /// Create a new info paginator
    pub fn new(page_size: u32) -> Self {
        Self {
            page_param: PAGE_PARAM.to_string(),
            token_param: PAGE_TOKEN_PARAM.to_string(),
            page_size_param: PAGE_SIZE_PARAM.to_string(),
            page_size,
        }
    }
}

impl Paginator for InfoPaginator {
    fn initial_params(&self) -> QueryParams {
        let mut params = QueryParams::new();
        params.insert(self.page_size_param.clone(), self.page_size.to_string());
        params
    }

    fn process_response(
        &self,
        body: &JsonValue,
        records_count: usize,
        state: &mut PaginationState,
    ) -> NextPage {
        state.record_page(records_count);

        let Some(info) = body.get("info").and_then(JsonValue::as_object) else {
            state.finish();
            return NextPage::Done;
        };

        if let Some(token) = info
            .get("next_page_token")
            .and_then(JsonValue::as_str)
            .filter(|t| !t.is_empty())
        {
            state.page_token = Some(token.to_string());
            return NextPage::with_param(self.token_param.clone(), token);
        }

        if info.get("more_records").is_some_and(is_truthy) {
            let page = state.advance();
            return NextPage::with_param(self.page_param.clone(), page.to_string());
        }

        state.finish();
        NextPage::Done
    }
}

// ============================================================================
// No Pagination
// ============================================================================

/// No pagination - single request
#[derive(Debug, Clone, Default)]
pub struct NoPaginator {
    /// Page size still sent with the single request, if any
    pub page_size: Option<u32>,
}

impl NoPaginator {
    /// Single request that still asks for `page_size` records
    pub fn with_page_size(page_size: u32) -> Self {
        Self {
            page_size: Some(page_size),
        }
    }
}

impl Paginator for NoPaginator {
    fn initial_params(&self) -> QueryParams {
        let mut params = QueryParams::new();
        if let Some(size) = self.page_size {
            params.insert(PAGE_SIZE_PARAM.to_string(), size.to_string());
        }
        params
    }

    fn process_response(
        &self,
        _body: &JsonValue,
        records_count: usize,
        state: &mut PaginationState,
    ) -> NextPage {
        state.record_page(records_count);
        state.finish();
        NextPage::Done
    }
}
