//! User accounts. User envelopes carry no timestamps; the server does not
//! expose them on this entity.

use super::envelope::{decode_attributes, decode_list, expect_envelope, DecodeError};
use super::query_utils::{EmptyQuery, Pagination};
use super::Result;
use crate::MandexClient;

use reqwest::Method;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub username: String,
    pub roles: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct UserAttributes {
    username: String,
    #[serde(default)]
    roles: Vec<String>,
}

impl User {
    pub(crate) const TYPE: &'static str = "user";

    /// Decodes one user envelope, bare or wrapped under `data`.
    pub fn from_response(value: Value) -> Result<Self, DecodeError> {
        let env = expect_envelope(value, Self::TYPE)?;
        let attrs: UserAttributes = decode_attributes(Self::TYPE, &env.attributes)?;

        Ok(User {
            id: env.id,
            username: attrs.username,
            roles: attrs.roles,
        })
    }

    pub fn list_from_response(value: Value) -> Result<Vec<Self>, DecodeError> {
        decode_list(value, Self::TYPE, Self::from_response)
    }
}

impl MandexClient {
    /// The account behind the current session.
    #[tracing::instrument(skip(self))]
    pub async fn me(&self) -> Result<User> {
        let url = format!("{}/user/me", Self::BASE_URL);
        let body = self.request(Method::GET, &url, &EmptyQuery {}, true).await?;
        Ok(User::from_response(body)?)
    }

    /// Fetches one user by id.
    #[tracing::instrument(skip(self))]
    pub async fn get_user(&self, id: &str) -> Result<User> {
        let url = format!("{}/user/{id}", Self::BASE_URL);
        let body = self.request(Method::GET, &url, &EmptyQuery {}, false).await?;
        Ok(User::from_response(body)?)
    }

    /// Users the logged-in user follows.
    #[tracing::instrument(skip(self))]
    pub async fn get_followed_users(&self, page: &Pagination) -> Result<Vec<User>> {
        let url = format!("{}/user/follows/user", Self::BASE_URL);
        let body = self.request(Method::GET, &url, page, true).await?;
        Ok(User::list_from_response(body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_user_without_timestamps() {
        let user = User::from_response(json!({
            "data": {
                "id": "u1",
                "type": "user",
                "attributes": {
                    "username": "reader",
                    "roles": ["ROLE_MEMBER"],
                    "version": 1
                },
                "relationships": []
            }
        }))
        .unwrap();

        assert_eq!(user.username, "reader");
        assert_eq!(user.roles, vec!["ROLE_MEMBER"]);
    }

    #[test]
    fn missing_roles_default_to_empty() {
        let user = User::from_response(json!({
            "id": "u1",
            "type": "user",
            "attributes": {"username": "reader"}
        }))
        .unwrap();

        assert!(user.roles.is_empty());
    }
}
