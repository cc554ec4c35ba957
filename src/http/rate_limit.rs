//! Client-side request throttling
//!
//! The remote API meters calls per minute, so the quota is expressed the
//! same way and enforced with a governor token bucket shared by clones.

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter as Governor};
use std::num::NonZeroU32;
use std::sync::Arc;

/// Per-minute request quota
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimiterConfig {
    pub requests_per_minute: u32,
    /// Requests allowed back-to-back before throttling kicks in
    pub burst_size: u32,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self::new(600, 20)
    }
}

impl RateLimiterConfig {
    pub fn new(requests_per_minute: u32, burst_size: u32) -> Self {
        Self {
            requests_per_minute,
            burst_size,
        }
    }

    /// Governor quota; zero values are raised to one
    fn quota(&self) -> Quota {
        let clamp = |n: u32| NonZeroU32::new(n).unwrap_or(NonZeroU32::MIN);
        Quota::per_minute(clamp(self.requests_per_minute)).allow_burst(clamp(self.burst_size))
    }
}

#[derive(Clone)]
pub struct RateLimiter(Arc<DefaultDirectRateLimiter>);

impl RateLimiter {
    pub fn new(config: &RateLimiterConfig) -> Self {
        Self(Arc::new(Governor::direct(config.quota())))
    }

    /// Wait for a permit
    pub async fn wait(&self) {
        self.0.until_ready().await;
    }

    /// Take a permit if one is free right now
    pub fn try_acquire(&self) -> bool {
        self.0.check().is_ok()
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("RateLimiter")
    }
}
