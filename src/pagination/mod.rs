//! Pagination module
//!
//! Supports: the `info` block (page number / opaque page token), single page
//!
//! # Overview
//!
//! List endpoints answer with an `info` object next to the records:
//! `{"data": [...], "info": {"more_records": true, "next_page_token": "..."}}`.
//! A paginator reads that block, updates its [`PaginationState`], and tells the
//! caller which query parameters to send for the next page.

mod strategies;
mod types;

pub use strategies::{InfoPaginator, NoPaginator};
pub use types::{NextPage, PaginationState, Paginator};

#[cfg(test)]
mod tests;
