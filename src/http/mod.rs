//! HTTP client module
//!
//! Provides the [`RequestExecutor`] seam and its reqwest-backed
//! implementation.
//!
//! # Features
//!
//! - **Automatic Retries**: exponential backoff for transport failures and retryable statuses
//! - **Rate Limiting**: token bucket rate limiter using governor
//! - **Error Classification**: status table, skippable permission errors, `Retry-After`
//! - **Authentication**: integration with the auth module

mod client;
mod rate_limit;
mod request;

pub use client::{HttpClient, HttpClientConfig};
pub use rate_limit::{RateLimiter, RateLimiterConfig};
pub use request::{ApiRequest, RequestExecutor};
