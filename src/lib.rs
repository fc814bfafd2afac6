//! Typed async client for the MangaDex REST API.
//!
//! The crate maps the server's JSON envelopes (`id`/`type`/`attributes`/
//! `relationships`) onto flat domain entities and takes care of the
//! query-parameter conventions the API expects (bracketed array keys,
//! repeated values, `order[field]=asc` maps).
//!
//! Entities never resolve their relationships into nested objects; they keep
//! bare identifier lists so callers decide what to fetch next. One client
//! instance is meant to be owned by one logical user session: the bearer
//! token lives behind a lock and every call reads an owned snapshot of it.

pub mod requests;

pub use requests::{Error, Result};

use requests::auth::AuthState;

use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_tracing::TracingMiddleware;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Entry point for every operation in this crate.
///
/// Cheap to clone; clones share the HTTP connection pool and the bearer-token
/// holder.
#[derive(Clone)]
pub struct MandexClient {
    pub(crate) http: ClientWithMiddleware,
    pub(crate) auth: Arc<AuthState>,
}

impl MandexClient {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

    const USER_AGENT: &str = concat!("mandex/", env!("CARGO_PKG_VERSION"));

    /// Builds a client with the default per-request timeout.
    pub fn new() -> Result<Self> {
        Self::with_timeout(Self::DEFAULT_TIMEOUT)
    }

    /// Builds a client that bounds every individual request by `timeout`.
    /// There are no retries, so the bound is never cumulative.
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(Self::USER_AGENT)
            .timeout(timeout)
            .build()?;

        let http = ClientBuilder::new(client)
            .with(TracingMiddleware::default())
            .build();

        Ok(Self {
            http,
            auth: Arc::new(AuthState::default()),
        })
    }
}

impl fmt::Debug for MandexClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MandexClient").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use requests::auth::Token;

    #[test]
    fn client_builds_without_network() {
        let client = MandexClient::new().unwrap();
        assert!(client.token().is_none());
    }

    #[test]
    fn token_holder_get_set_roundtrip() {
        let client = MandexClient::with_timeout(Duration::from_secs(1)).unwrap();

        client.set_token(Token {
            access_token: "access".to_string(),
            refresh_token: "refresh".to_string(),
        });
        assert_eq!(client.token().unwrap().access_token, "access");

        // Clones share the same holder.
        let clone = client.clone();
        assert_eq!(clone.token().unwrap().refresh_token, "refresh");

        client.logout();
        assert!(clone.token().is_none());
    }
}
