//! Authentication module
//!
//! Supports: OAuth2 refresh-token grant, static access token
//!
//! The `Authenticator` applies the `Zoho-oauthtoken` authorization header and
//! caches refreshed access tokens until shortly before they expire.

mod authenticator;
mod types;

pub use authenticator::{Authenticator, AUTH_HEADER_PREFIX};
pub use types::{AccessToken, AuthConfig, RefreshGrant, EXPIRY_MARGIN_SECS};

#[cfg(test)]
mod tests;
