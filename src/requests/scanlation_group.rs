//! Scanlation groups.

use super::envelope::{decode_attributes, decode_list, expect_envelope, DecodeError, EntityKind};
use super::query_utils::{EmptyQuery, Pagination, Query, SortingOptions};
use super::{Error, Result};
use crate::MandexClient;

use bon::Builder;
use chrono::{DateTime, FixedOffset};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A scanlation group snapshot. The leader is located by its `leader`
/// relationship discriminator; groups without one decode fine with
/// `leader_id: None`.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanlationGroup {
    pub id: String,
    pub name: String,
    pub website: Option<String>,
    pub discord: Option<String>,
    pub contact_email: Option<String>,
    pub description: Option<String>,
    pub leader_id: Option<String>,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct GroupAttributes {
    name: String,
    website: Option<String>,
    discord: Option<String>,
    contact_email: Option<String>,
    description: Option<String>,
    created_at: DateTime<FixedOffset>,
    updated_at: DateTime<FixedOffset>,
}

impl ScanlationGroup {
    pub(crate) const TYPE: &'static str = "scanlation_group";

    /// Decodes one group envelope, bare or wrapped under `data`.
    pub fn from_response(value: Value) -> Result<Self, DecodeError> {
        let env = expect_envelope(value, Self::TYPE)?;
        let attrs: GroupAttributes = decode_attributes(Self::TYPE, &env.attributes)?;

        Ok(ScanlationGroup {
            leader_id: env.related_id(EntityKind::Leader),
            id: env.id,
            name: attrs.name,
            website: attrs.website,
            discord: attrs.discord,
            contact_email: attrs.contact_email,
            description: attrs.description,
            created_at: attrs.created_at,
            updated_at: attrs.updated_at,
        })
    }

    pub fn list_from_response(value: Value) -> Result<Vec<Self>, DecodeError> {
        decode_list(value, Self::TYPE, Self::from_response)
    }

    /// Web URL of this group.
    pub fn url(&self) -> String {
        format!("{}/group/{}", MandexClient::WEB_URL, self.id)
    }
}

/// Search parameters for `GET /group`.
#[derive(Serialize, Builder, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
#[builder(on(String, into))]
pub struct GroupQuery {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    pub ids: Option<Vec<String>>,
    pub name: Option<String>,
    pub order: Option<SortingOptions>,
}

impl Query for GroupQuery {
    fn array_params(&self) -> &'static [&'static str] {
        &["ids"]
    }
}

/// Fields for creating or updating a group. `version` is mandatory on
/// updates and checked client-side.
#[derive(Serialize, Builder, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
#[builder(on(String, into))]
pub struct GroupDraft {
    pub name: Option<String>,
    pub website: Option<String>,
    pub discord: Option<String>,
    pub contact_email: Option<String>,
    pub description: Option<String>,
    pub version: Option<u32>,
}

impl Query for GroupDraft {}

impl MandexClient {
    /// Searches scanlation groups with the parameters in `query`.
    #[tracing::instrument(skip(self))]
    pub async fn get_group_list(&self, query: &GroupQuery) -> Result<Vec<ScanlationGroup>> {
        let url = format!("{}/group", Self::BASE_URL);
        let body = self.request(Method::GET, &url, query, false).await?;
        Ok(ScanlationGroup::list_from_response(body)?)
    }

    /// Fetches one group by id.
    #[tracing::instrument(skip(self))]
    pub async fn get_group(&self, id: &str) -> Result<ScanlationGroup> {
        let url = format!("{}/group/{id}", Self::BASE_URL);
        let body = self.request(Method::GET, &url, &EmptyQuery {}, false).await?;
        Ok(ScanlationGroup::from_response(body)?)
    }

    /// Creates a group named `name`. With `return_entity` the fresh
    /// snapshot is decoded and returned.
    #[tracing::instrument(skip(self))]
    pub async fn create_group(
        &self,
        name: &str,
        return_entity: bool,
    ) -> Result<Option<ScanlationGroup>> {
        let draft = GroupDraft::builder().name(name).build();
        let url = format!("{}/group", Self::BASE_URL);
        let body = self.request(Method::POST, &url, &draft, true).await?;
        if return_entity {
            Ok(Some(ScanlationGroup::from_response(body)?))
        } else {
            Ok(None)
        }
    }

    /// Updates a group. `draft.version` must be set.
    #[tracing::instrument(skip(self, draft))]
    pub async fn update_group(
        &self,
        id: &str,
        draft: &GroupDraft,
        return_entity: bool,
    ) -> Result<Option<ScanlationGroup>> {
        if draft.version.is_none() {
            return Err(Error::InvalidParams(
                "update_group requires `version`".to_string(),
            ));
        }

        let url = format!("{}/group/{id}", Self::BASE_URL);
        let body = self.request(Method::PUT, &url, draft, true).await?;
        if return_entity {
            Ok(Some(ScanlationGroup::from_response(body)?))
        } else {
            Ok(None)
        }
    }

    /// Deletes a group.
    #[tracing::instrument(skip(self))]
    pub async fn delete_group(&self, id: &str) -> Result<()> {
        let url = format!("{}/group/{id}", Self::BASE_URL);
        self.request(Method::DELETE, &url, &EmptyQuery {}, true).await?;
        Ok(())
    }

    /// Groups the logged-in user follows.
    #[tracing::instrument(skip(self))]
    pub async fn get_followed_groups(&self, page: &Pagination) -> Result<Vec<ScanlationGroup>> {
        let url = format!("{}/user/follows/group", Self::BASE_URL);
        let body = self.request(Method::GET, &url, page, true).await?;
        Ok(ScanlationGroup::list_from_response(body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample(relationships: Value) -> Value {
        json!({
            "id": "g1",
            "type": "scanlation_group",
            "attributes": {
                "name": "Fallen Syndicate",
                "website": "https://example.org",
                "discord": null,
                "contactEmail": null,
                "description": null,
                "createdAt": "2021-04-19T21:45:59+00:00",
                "updatedAt": "2021-04-19T21:45:59+00:00"
            },
            "relationships": relationships
        })
    }

    #[test]
    fn leader_found_even_when_not_first() {
        let group = ScanlationGroup::from_response(sample(json!([
            {"type": "member", "id": "m1"},
            {"type": "member", "id": "m2"},
            {"type": "leader", "id": "boss"}
        ])))
        .unwrap();

        assert_eq!(group.name, "Fallen Syndicate");
        assert_eq!(group.leader_id.as_deref(), Some("boss"));
    }

    #[test]
    fn missing_leader_is_not_an_error() {
        let group = ScanlationGroup::from_response(sample(json!([]))).unwrap();
        assert_eq!(group.leader_id, None);
        assert_eq!(group.website.as_deref(), Some("https://example.org"));
    }
}
