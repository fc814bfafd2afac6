//! Custom lists: user-curated sets of manga.

use super::envelope::{decode_attributes, decode_list, expect_envelope, DecodeError, EntityKind};
use super::query_utils::{EmptyQuery, Pagination, Query};
use super::{Error, Result};
use crate::MandexClient;

use bon::Builder;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ListVisibility {
    Public,
    Private,
}

/// A custom list snapshot. The owner is the `user` relationship; every
/// `manga` relationship is one entry of the list, in server order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomList {
    pub id: String,
    pub name: String,
    pub visibility: ListVisibility,
    pub owner_id: Option<String>,
    pub manga_ids: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct CustomListAttributes {
    name: String,
    visibility: ListVisibility,
}

impl CustomList {
    pub(crate) const TYPE: &'static str = "custom_list";

    /// Decodes one list envelope, bare or wrapped under `data`.
    pub fn from_response(value: Value) -> Result<Self, DecodeError> {
        let env = expect_envelope(value, Self::TYPE)?;
        let attrs: CustomListAttributes = decode_attributes(Self::TYPE, &env.attributes)?;

        Ok(CustomList {
            owner_id: env.related_id(EntityKind::User),
            manga_ids: env.related_ids(EntityKind::Manga),
            id: env.id,
            name: attrs.name,
            visibility: attrs.visibility,
        })
    }

    pub fn list_from_response(value: Value) -> Result<Vec<Self>, DecodeError> {
        decode_list(value, Self::TYPE, Self::from_response)
    }
}

/// Fields for creating or updating a custom list. `version` is mandatory on
/// updates and checked client-side.
#[derive(Serialize, Builder, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
#[builder(on(String, into))]
pub struct CustomListDraft {
    pub name: Option<String>,
    pub visibility: Option<ListVisibility>,
    /// Manga ids seeding the list.
    pub manga: Option<Vec<String>>,
    pub version: Option<u32>,
}

impl Query for CustomListDraft {
    fn array_params(&self) -> &'static [&'static str] {
        &["manga"]
    }
}

impl MandexClient {
    /// Fetches one custom list by id. Private lists need a session.
    #[tracing::instrument(skip(self))]
    pub async fn get_custom_list(&self, id: &str) -> Result<CustomList> {
        let url = format!("{}/list/{id}", Self::BASE_URL);
        let body = self.request(Method::GET, &url, &EmptyQuery {}, true).await?;
        Ok(CustomList::from_response(body)?)
    }

    /// All lists owned by the logged-in user, private ones included.
    #[tracing::instrument(skip(self))]
    pub async fn get_my_custom_lists(&self, page: &Pagination) -> Result<Vec<CustomList>> {
        let url = format!("{}/user/list", Self::BASE_URL);
        let body = self.request(Method::GET, &url, page, true).await?;
        Ok(CustomList::list_from_response(body)?)
    }

    /// Public lists of another user.
    #[tracing::instrument(skip(self))]
    pub async fn get_user_custom_lists(
        &self,
        user_id: &str,
        page: &Pagination,
    ) -> Result<Vec<CustomList>> {
        let url = format!("{}/user/{user_id}/list", Self::BASE_URL);
        let body = self.request(Method::GET, &url, page, false).await?;
        Ok(CustomList::list_from_response(body)?)
    }

    /// Lists the logged-in user follows.
    #[tracing::instrument(skip(self))]
    pub async fn get_followed_custom_lists(&self, page: &Pagination) -> Result<Vec<CustomList>> {
        let url = format!("{}/user/follows/list", Self::BASE_URL);
        let body = self.request(Method::GET, &url, page, true).await?;
        Ok(CustomList::list_from_response(body)?)
    }

    /// Creates a custom list. `draft.name` must be set; with
    /// `return_entity` the fresh snapshot is decoded and returned.
    #[tracing::instrument(skip(self, draft))]
    pub async fn create_custom_list(
        &self,
        draft: &CustomListDraft,
        return_entity: bool,
    ) -> Result<Option<CustomList>> {
        if draft.name.is_none() {
            return Err(Error::InvalidParams(
                "create_custom_list requires `name`".to_string(),
            ));
        }

        let url = format!("{}/list", Self::BASE_URL);
        let body = self.request(Method::POST, &url, draft, true).await?;
        if return_entity {
            Ok(Some(CustomList::from_response(body)?))
        } else {
            Ok(None)
        }
    }

    /// Updates a custom list. `draft.version` must be set.
    #[tracing::instrument(skip(self, draft))]
    pub async fn update_custom_list(
        &self,
        id: &str,
        draft: &CustomListDraft,
        return_entity: bool,
    ) -> Result<Option<CustomList>> {
        if draft.version.is_none() {
            return Err(Error::InvalidParams(
                "update_custom_list requires `version`".to_string(),
            ));
        }

        let url = format!("{}/list/{id}", Self::BASE_URL);
        let body = self.request(Method::PUT, &url, draft, true).await?;
        if return_entity {
            Ok(Some(CustomList::from_response(body)?))
        } else {
            Ok(None)
        }
    }

    /// Deletes a custom list.
    #[tracing::instrument(skip(self))]
    pub async fn delete_custom_list(&self, id: &str) -> Result<()> {
        let url = format!("{}/list/{id}", Self::BASE_URL);
        self.request(Method::DELETE, &url, &EmptyQuery {}, true).await?;
        Ok(())
    }

    /// Adds a manga to a custom list.
    #[tracing::instrument(skip(self))]
    pub async fn add_manga_to_custom_list(&self, manga_id: &str, list_id: &str) -> Result<()> {
        let url = format!("{}/manga/{manga_id}/list/{list_id}", Self::BASE_URL);
        self.request(Method::POST, &url, &EmptyQuery {}, true).await?;
        Ok(())
    }

    /// Removes a manga from a custom list.
    #[tracing::instrument(skip(self))]
    pub async fn remove_manga_from_custom_list(&self, manga_id: &str, list_id: &str) -> Result<()> {
        let url = format!("{}/manga/{manga_id}/list/{list_id}", Self::BASE_URL);
        self.request(Method::DELETE, &url, &EmptyQuery {}, true).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn splits_owner_from_entries() {
        let list = CustomList::from_response(json!({
            "data": {
                "id": "l1",
                "type": "custom_list",
                "attributes": {
                    "name": "weekend backlog",
                    "visibility": "private",
                    "version": 3
                },
                "relationships": [
                    {"type": "manga", "id": "m1"},
                    {"type": "user", "id": "owner"},
                    {"type": "manga", "id": "m2"}
                ]
            }
        }))
        .unwrap();

        assert_eq!(list.name, "weekend backlog");
        assert_eq!(list.visibility, ListVisibility::Private);
        assert_eq!(list.owner_id.as_deref(), Some("owner"));
        assert_eq!(list.manga_ids, vec!["m1", "m2"]);
    }

    #[test]
    fn draft_seeds_manga_with_bracket_keys() {
        use super::super::query_utils::to_query_pairs;

        let draft = CustomListDraft::builder()
            .name("weekend backlog")
            .visibility(ListVisibility::Public)
            .manga(vec!["m1".to_string(), "m2".to_string()])
            .build();

        let pairs = to_query_pairs(&draft).unwrap();
        assert!(pairs.contains(&("manga[]".to_string(), "m1".to_string())));
        assert!(pairs.contains(&("manga[]".to_string(), "m2".to_string())));
        assert!(pairs.contains(&("visibility".to_string(), "public".to_string())));
        assert!(!pairs.iter().any(|(k, _)| k == "version"));
    }
}
