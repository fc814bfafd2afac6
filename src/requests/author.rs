//! Authors and artists. Artists share the author endpoints; the entity type
//! tag is `author` either way.

use super::envelope::{
    decode_attributes, decode_list, expect_envelope, DecodeError, EntityKind, LocalizedString,
};
use super::query_utils::{EmptyQuery, Query, SortingOptions};
use super::{Error, Result};
use crate::MandexClient;

use bon::Builder;
use chrono::{DateTime, FixedOffset};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An author snapshot. `manga_ids` collects every `manga`-typed
/// relationship, i.e. the works attributed to this person.
#[derive(Debug, Clone, PartialEq)]
pub struct Author {
    pub id: String,
    pub name: String,
    pub image_url: Option<String>,
    pub biography: LocalizedString,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
    pub manga_ids: Vec<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct AuthorAttributes {
    name: String,
    image_url: Option<String>,
    #[serde(default)]
    biography: LocalizedString,
    created_at: DateTime<FixedOffset>,
    updated_at: DateTime<FixedOffset>,
}

impl Author {
    pub(crate) const TYPE: &'static str = "author";

    /// Decodes one author envelope, bare or wrapped under `data`.
    pub fn from_response(value: Value) -> Result<Self, DecodeError> {
        let env = expect_envelope(value, Self::TYPE)?;
        let attrs: AuthorAttributes = decode_attributes(Self::TYPE, &env.attributes)?;

        Ok(Author {
            manga_ids: env.related_ids(EntityKind::Manga),
            id: env.id,
            name: attrs.name,
            image_url: attrs.image_url,
            biography: attrs.biography,
            created_at: attrs.created_at,
            updated_at: attrs.updated_at,
        })
    }

    pub fn list_from_response(value: Value) -> Result<Vec<Self>, DecodeError> {
        decode_list(value, Self::TYPE, Self::from_response)
    }

    /// Web URL of this author.
    pub fn url(&self) -> String {
        format!("{}/author/{}", MandexClient::WEB_URL, self.id)
    }
}

/// Search parameters for `GET /author`.
#[derive(Serialize, Builder, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
#[builder(on(String, into))]
pub struct AuthorQuery {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    pub ids: Option<Vec<String>>,
    pub name: Option<String>,
    pub order: Option<SortingOptions>,
}

impl Query for AuthorQuery {
    fn array_params(&self) -> &'static [&'static str] {
        &["ids"]
    }
}

/// Fields for creating or updating an author. `version` is mandatory on
/// updates and checked client-side.
#[derive(Serialize, Builder, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
#[builder(on(String, into))]
pub struct AuthorDraft {
    pub name: Option<String>,
    pub biography: Option<LocalizedString>,
    pub version: Option<u32>,
}

impl Query for AuthorDraft {}

impl MandexClient {
    /// Searches authors with the parameters in `query`.
    #[tracing::instrument(skip(self))]
    pub async fn get_author_list(&self, query: &AuthorQuery) -> Result<Vec<Author>> {
        let url = format!("{}/author", Self::BASE_URL);
        let body = self.request(Method::GET, &url, query, false).await?;
        Ok(Author::list_from_response(body)?)
    }

    /// Fetches one author by id.
    #[tracing::instrument(skip(self))]
    pub async fn get_author(&self, id: &str) -> Result<Author> {
        let url = format!("{}/author/{id}", Self::BASE_URL);
        let body = self.request(Method::GET, &url, &EmptyQuery {}, false).await?;
        Ok(Author::from_response(body)?)
    }

    /// Creates an author named `name`. With `return_entity` the fresh
    /// snapshot is decoded and returned.
    #[tracing::instrument(skip(self))]
    pub async fn create_author(&self, name: &str, return_entity: bool) -> Result<Option<Author>> {
        let draft = AuthorDraft::builder().name(name).build();
        let url = format!("{}/author", Self::BASE_URL);
        let body = self.request(Method::POST, &url, &draft, true).await?;
        if return_entity {
            Ok(Some(Author::from_response(body)?))
        } else {
            Ok(None)
        }
    }

    /// Updates an author. `draft.version` must be set.
    #[tracing::instrument(skip(self, draft))]
    pub async fn update_author(
        &self,
        id: &str,
        draft: &AuthorDraft,
        return_entity: bool,
    ) -> Result<Option<Author>> {
        if draft.version.is_none() {
            return Err(Error::InvalidParams(
                "update_author requires `version`".to_string(),
            ));
        }

        let url = format!("{}/author/{id}", Self::BASE_URL);
        let body = self.request(Method::PUT, &url, draft, true).await?;
        if return_entity {
            Ok(Some(Author::from_response(body)?))
        } else {
            Ok(None)
        }
    }

    /// Deletes an author.
    #[tracing::instrument(skip(self))]
    pub async fn delete_author(&self, id: &str) -> Result<()> {
        let url = format!("{}/author/{id}", Self::BASE_URL);
        self.request(Method::DELETE, &url, &EmptyQuery {}, true).await?;
        Ok(())
    }
}
