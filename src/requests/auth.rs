//! OAuth2 session handling against the dedicated auth host.
//!
//! The token endpoint lives on a separate host from the main API and takes
//! form-encoded password or refresh-token grants.

use super::query_utils::Query;
use super::{Error, Result};
use crate::MandexClient;

use parking_lot::RwLock;
use reqwest::Method;
use serde::{Deserialize, Serialize};

/// Access/refresh token pair returned by the token endpoint.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Clone)]
struct Credentials {
    client_id: String,
    client_secret: String,
}

/// Bearer-token holder shared by every facade call.
///
/// Reads take an owned snapshot; the lock is never held across I/O. Writes
/// happen only through [`MandexClient::login`],
/// [`MandexClient::refresh_login`], [`MandexClient::set_token`] and
/// [`MandexClient::logout`].
#[derive(Debug, Default)]
pub(crate) struct AuthState {
    token: RwLock<Option<Token>>,
    credentials: RwLock<Option<Credentials>>,
}

impl AuthState {
    pub(crate) fn access_token(&self) -> Option<String> {
        self.token.read().as_ref().map(|t| t.access_token.clone())
    }
}

#[derive(Serialize, Debug)]
struct TokenRequest<'a> {
    grant_type: &'a str,
    username: Option<&'a str>,
    password: Option<&'a str>,
    refresh_token: Option<String>,
    client_id: &'a str,
    client_secret: &'a str,
}

impl Query for TokenRequest<'_> {}

impl MandexClient {
    const TOKEN_ENDPOINT: &str = "/realms/mangadex/protocol/openid-connect/token";

    /// Password grant. On success the token pair is stored for subsequent
    /// calls and the client credentials are kept for
    /// [`refresh_login`](Self::refresh_login).
    #[tracing::instrument(skip(self, password, client_secret))]
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        client_id: &str,
        client_secret: &str,
    ) -> Result<()> {
        let form = TokenRequest {
            grant_type: "password",
            username: Some(username),
            password: Some(password),
            refresh_token: None,
            client_id,
            client_secret,
        };

        let token = self.token_grant(&form).await?;
        *self.auth.credentials.write() = Some(Credentials {
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
        });
        *self.auth.token.write() = Some(token);

        Ok(())
    }

    /// Refresh grant re-using the stored refresh token and client
    /// credentials. Fails with [`Error::NotLoggedIn`] when there is no
    /// session to refresh.
    #[tracing::instrument(skip(self))]
    pub async fn refresh_login(&self) -> Result<()> {
        let refresh_token = self.token().ok_or(Error::NotLoggedIn)?.refresh_token;
        let creds = self
            .auth
            .credentials
            .read()
            .clone()
            .ok_or(Error::NotLoggedIn)?;

        let form = TokenRequest {
            grant_type: "refresh_token",
            username: None,
            password: None,
            refresh_token: Some(refresh_token),
            client_id: &creds.client_id,
            client_secret: &creds.client_secret,
        };

        let token = self.token_grant(&form).await?;
        *self.auth.token.write() = Some(token);

        Ok(())
    }

    async fn token_grant(&self, form: &TokenRequest<'_>) -> Result<Token> {
        let url = format!("{}{}", Self::AUTH_URL, Self::TOKEN_ENDPOINT);
        let body = self.request(Method::POST, &url, form, false).await?;
        Ok(serde_json::from_value(body)?)
    }

    /// Current token snapshot, if a session exists.
    pub fn token(&self) -> Option<Token> {
        self.auth.token.read().clone()
    }

    /// Replaces the stored token, e.g. one obtained out of band. Refreshing
    /// still requires a prior [`login`](Self::login) so the client
    /// credentials are known.
    pub fn set_token(&self, token: Token) {
        *self.auth.token.write() = Some(token);
    }

    /// Drops the stored session.
    pub fn logout(&self) {
        *self.auth.token.write() = None;
        *self.auth.credentials.write() = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::requests::query_utils::to_query_pairs;

    #[test]
    fn password_grant_form_shape() {
        let form = TokenRequest {
            grant_type: "password",
            username: Some("user"),
            password: Some("hunter2"),
            refresh_token: None,
            client_id: "cid",
            client_secret: "secret",
        };

        let pairs = to_query_pairs(&form).unwrap();
        assert!(pairs.contains(&("grant_type".to_string(), "password".to_string())));
        assert!(pairs.contains(&("username".to_string(), "user".to_string())));
        // Unused grant fields are dropped, not sent empty.
        assert!(!pairs.iter().any(|(k, _)| k == "refresh_token"));
    }

    #[test]
    fn token_parses_from_grant_response() {
        let token: Token = serde_json::from_value(serde_json::json!({
            "access_token": "aaa",
            "refresh_token": "rrr",
            "expires_in": 900,
            "token_type": "Bearer"
        }))
        .unwrap();
        assert_eq!(token.access_token, "aaa");
        assert_eq!(token.refresh_token, "rrr");
    }
}
