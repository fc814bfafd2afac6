//! Shared request plumbing: the transport path every facade goes through,
//! the error taxonomy, and the server error payload shape.

pub mod auth;
pub mod author;
pub mod chapter;
pub mod cover;
pub mod custom_list;
pub mod envelope;
pub mod manga;
pub mod query_utils;
pub mod scanlation_group;
pub mod tag;
pub mod user;

pub use envelope::{DecodeError, EntityKind, LocalizedString, Relationship};

use crate::MandexClient;
use query_utils::{to_query_pairs, Query};

use reqwest::{Method, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// One record of the `errors` array the server attaches to failed responses.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerResponseError {
    pub id: String,
    pub status: i32,
    pub title: String,
    pub detail: Option<String>,
    pub context: Option<String>,
}

/// Everything that can go wrong in this crate's operations.
///
/// Nothing is retried or swallowed internally; each variant surfaces to the
/// caller of the operation that hit it.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Middleware(#[from] reqwest_middleware::Error),
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    /// Non-2xx status, or a 2xx body carrying `"result": "error"`/an
    /// `errors` array.
    #[error("server responded with {status}: {reason}")]
    Api {
        status: u16,
        reason: String,
        errors: Vec<ServerResponseError>,
    },
    #[error(transparent)]
    Decode(#[from] DecodeError),
    /// Client-side parameter validation, raised before any network call.
    #[error("invalid request parameters: {0}")]
    InvalidParams(String),
    #[error("no session: log in first")]
    NotLoggedIn,
}

/// Alias used by every fallible function in the crate. Decoders override
/// the error parameter with [`DecodeError`].
pub type Result<T, E = Error> = std::result::Result<T, E>;

impl MandexClient {
    pub const BASE_URL: &str = "https://api.mangadex.org";
    pub const AUTH_URL: &str = "https://auth.mangadex.org";
    pub const UPLOADS_URL: &str = "https://uploads.mangadex.org";
    pub const WEB_URL: &str = "https://mangadex.org";

    /// Lowest level call. Encodes `params` as a query string for GET/DELETE
    /// or a form body for POST/PUT, attaches the bearer token snapshot when
    /// `authenticated` and surfaces transport and domain errors.
    pub(crate) async fn request(
        &self,
        method: Method,
        url: &str,
        params: &impl Query,
        authenticated: bool,
    ) -> Result<Value> {
        let pairs = to_query_pairs(params)?;

        let mut req = self.http.request(method.clone(), url);
        req = if method == Method::GET || method == Method::DELETE {
            req.query(&pairs)
        } else {
            req.form(&pairs)
        };

        if authenticated {
            if let Some(token) = self.auth.access_token() {
                req = req.bearer_auth(token);
            }
        }

        let resp = match req.send().await {
            Ok(resp) => resp,
            Err(e) => {
                tracing::warn!("request to {url} failed: {e}");
                return Err(e.into());
            }
        };

        Self::parse_response(resp).await
    }

    /// Maps non-2xx statuses and domain-level error payloads (which can
    /// arrive on a 2xx) to [`Error::Api`], otherwise hands back the JSON body.
    async fn parse_response(resp: Response) -> Result<Value> {
        let status = resp.status();

        if !status.is_success() {
            let errors = Self::error_records(resp.json().await.unwrap_or(Value::Null));
            let reason = errors.first().map(|e| e.title.clone()).unwrap_or_else(|| {
                status.canonical_reason().unwrap_or("unknown error").to_string()
            });
            tracing::warn!("server responded with {status}: {reason}");
            return Err(Error::Api {
                status: status.as_u16(),
                reason,
                errors,
            });
        }

        let body: Value = resp.json().await?;
        Self::reject_domain_error(status.as_u16(), body)
    }

    /// The server reports some failures inside a 2xx body: a top-level
    /// `"result": "error"` or a non-null `errors` array. Either one turns
    /// the response into [`Error::Api`]; anything else passes through.
    fn reject_domain_error(status: u16, body: Value) -> Result<Value> {
        let flagged = body.get("result").and_then(Value::as_str) == Some("error")
            || body.get("errors").is_some_and(|e| !e.is_null());
        if !flagged {
            return Ok(body);
        }

        let errors = Self::error_records(body);
        let reason = errors
            .first()
            .map(|e| e.title.clone())
            .unwrap_or_else(|| "error response".to_string());
        Err(Error::Api {
            status,
            reason,
            errors,
        })
    }

    fn error_records(mut body: Value) -> Vec<ServerResponseError> {
        body.get_mut("errors")
            .map(Value::take)
            .and_then(|errors| serde_json::from_value(errors).ok())
            .unwrap_or_default()
    }

    /// Infrastructure health check. This endpoint answers with the plain
    /// text `pong`, not a JSON envelope.
    #[tracing::instrument(skip(self))]
    pub async fn ping(&self) -> Result<()> {
        let resp = self
            .http
            .get(format!("{}/ping", Self::BASE_URL))
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() || body != "pong" {
            return Err(Error::Api {
                status: status.as_u16(),
                reason: "infrastructure unavailable".to_string(),
                errors: Vec::new(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn error_records_from_payload() {
        let body = json!({
            "result": "error",
            "errors": [{
                "id": "e1",
                "status": 400,
                "title": "Bad Request",
                "detail": "limit must be <= 100"
            }]
        });

        let errors = MandexClient::error_records(body);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].title, "Bad Request");
        assert_eq!(errors[0].detail.as_deref(), Some("limit must be <= 100"));
    }

    #[test]
    fn error_records_tolerate_missing_array() {
        assert!(MandexClient::error_records(json!({"result": "ok"})).is_empty());
        assert!(MandexClient::error_records(Value::Null).is_empty());
    }

    #[test]
    fn clean_bodies_pass_through_domain_check() {
        let body = json!({"result": "ok", "data": {"id": "x"}});
        let passed = MandexClient::reject_domain_error(200, body.clone()).unwrap();
        assert_eq!(passed, body);

        // A null `errors` key is not a failure marker.
        let with_null = json!({"result": "ok", "errors": null});
        assert!(MandexClient::reject_domain_error(200, with_null).is_ok());
    }

    #[test]
    fn domain_error_on_2xx_maps_to_api_error() {
        let body = json!({
            "result": "error",
            "errors": [{
                "id": "e1",
                "status": 403,
                "title": "Forbidden",
                "detail": "not your list"
            }]
        });

        let err = MandexClient::reject_domain_error(200, body).unwrap_err();
        match err {
            Error::Api { status, reason, errors } => {
                assert_eq!(status, 200);
                assert_eq!(reason, "Forbidden");
                assert_eq!(errors.len(), 1);
            }
            other => panic!("expected Error::Api, got {other}"),
        }
    }

    #[test]
    fn bare_errors_array_is_flagged_even_without_result_marker() {
        let body = json!({"errors": [{"id": "e1", "status": 400, "title": "Bad Request"}]});
        assert!(MandexClient::reject_domain_error(200, body).is_err());
    }
}
