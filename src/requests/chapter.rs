//! Chapter entities, queries, and image-server resolution.
//!
//! Chapters do not embed page URLs; those come from a separate image-server
//! lookup keyed by chapter id (see [`MandexClient::get_chapter_images`]).

use super::envelope::{decode_attributes, decode_list, expect_envelope, DecodeError, EntityKind};
use super::query_utils::{EmptyQuery, Query, SortingOptions};
use super::{Error, Result};
use crate::MandexClient;

use bon::Builder;
use chrono::{DateTime, FixedOffset};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A chapter snapshot decoded from a server envelope.
///
/// The series, scanlation group and uploader are located by their
/// relationship discriminator, never by position: the server's relationship
/// order is undocumented and the uploader may be absent entirely.
#[derive(Debug, Clone, PartialEq)]
pub struct Chapter {
    pub id: String,
    pub title: Option<String>,
    pub volume: Option<String>,
    /// Chapter number parsed from the wire string. `None` means the server
    /// sent no number at all; zero is a legitimate number and stays
    /// `Some(0.0)`.
    pub number: Option<f32>,
    pub translated_language: String,
    pub pages: Option<u32>,
    pub external_url: Option<String>,
    pub manga_id: String,
    pub group_id: Option<String>,
    pub uploader_id: Option<String>,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
    pub publish_at: DateTime<FixedOffset>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct ChapterAttributes {
    title: Option<String>,
    volume: Option<String>,
    chapter: Option<String>,
    pages: Option<u32>,
    translated_language: String,
    external_url: Option<String>,
    created_at: DateTime<FixedOffset>,
    updated_at: DateTime<FixedOffset>,
    publish_at: DateTime<FixedOffset>,
}

impl Chapter {
    pub(crate) const TYPE: &'static str = "chapter";

    /// Decodes one chapter envelope, bare or wrapped under `data`.
    pub fn from_response(value: Value) -> Result<Self, DecodeError> {
        let env = expect_envelope(value, Self::TYPE)?;
        let attrs: ChapterAttributes = decode_attributes(Self::TYPE, &env.attributes)?;

        let number = match attrs.chapter {
            Some(raw) => Some(raw.parse::<f32>().map_err(|e| DecodeError::Field {
                entity: Self::TYPE,
                field: "chapter",
                message: e.to_string(),
            })?),
            None => None,
        };

        let manga_id = env.require_related(Self::TYPE, EntityKind::Manga)?;
        let group_id = env.related_id(EntityKind::ScanlationGroup);
        let uploader_id = env.related_id(EntityKind::User);

        Ok(Chapter {
            id: env.id,
            title: attrs.title,
            volume: attrs.volume,
            number,
            translated_language: attrs.translated_language,
            pages: attrs.pages,
            external_url: attrs.external_url,
            manga_id,
            group_id,
            uploader_id,
            created_at: attrs.created_at,
            updated_at: attrs.updated_at,
            publish_at: attrs.publish_at,
        })
    }

    /// Decodes a bulk chapter response, aborting on the first bad element.
    pub fn list_from_response(value: Value) -> Result<Vec<Self>, DecodeError> {
        decode_list(value, Self::TYPE, Self::from_response)
    }

    /// Web URL of this chapter.
    pub fn url(&self) -> String {
        format!("{}/chapter/{}", MandexClient::WEB_URL, self.id)
    }
}

/// Image-server lookup result: one base URL, a content hash, and page
/// filenames in reading order.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChapterImages {
    pub base_url: String,
    pub chapter: ChapterImageData,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChapterImageData {
    pub hash: String,
    pub data: Vec<String>,
    #[serde(default)]
    pub data_saver: Vec<String>,
}

impl ChapterImages {
    /// Full-quality page URLs, one per page, in reading order. Filenames
    /// are never re-sorted: their order is the page order. The server
    /// invalidates these URLs after roughly fifteen minutes; fetch the
    /// metadata again when they expire.
    pub fn page_urls(&self) -> Vec<String> {
        self.chapter
            .data
            .iter()
            .map(|f| format!("{}/data/{}/{}", self.base_url, self.chapter.hash, f))
            .collect()
    }

    /// Compressed page variants, same ordering and lifetime rules as
    /// [`page_urls`](Self::page_urls).
    pub fn data_saver_urls(&self) -> Vec<String> {
        self.chapter
            .data_saver
            .iter()
            .map(|f| format!("{}/data-saver/{}/{}", self.base_url, self.chapter.hash, f))
            .collect()
    }
}

/// Search parameters for `GET /chapter`.
#[derive(Serialize, Builder, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
#[builder(on(String, into))]
pub struct ChapterQuery {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    pub ids: Option<Vec<String>>,
    pub groups: Option<Vec<String>>,
    pub uploader: Option<String>,
    pub manga: Option<String>,
    pub volume: Option<Vec<String>>,
    pub chapter: Option<String>,
    pub translated_language: Option<Vec<String>>,
    pub order: Option<SortingOptions>,
}

impl Query for ChapterQuery {
    fn array_params(&self) -> &'static [&'static str] {
        &["ids", "groups", "volume", "translatedLanguage"]
    }
}

/// Fields for updating a chapter. `version` is mandatory and checked
/// client-side.
#[derive(Serialize, Builder, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
#[builder(on(String, into))]
pub struct ChapterUpdate {
    pub title: Option<String>,
    pub volume: Option<String>,
    pub chapter: Option<String>,
    pub translated_language: Option<String>,
    pub version: Option<u32>,
}

impl Query for ChapterUpdate {}

impl MandexClient {
    /// Searches chapters with the parameters in `query`.
    #[tracing::instrument(skip(self))]
    pub async fn get_chapter_list(&self, query: &ChapterQuery) -> Result<Vec<Chapter>> {
        let url = format!("{}/chapter", Self::BASE_URL);
        let body = self.request(Method::GET, &url, query, false).await?;
        Ok(Chapter::list_from_response(body)?)
    }

    /// Fetches one chapter by id.
    #[tracing::instrument(skip(self))]
    pub async fn get_chapter(&self, id: &str) -> Result<Chapter> {
        let url = format!("{}/chapter/{id}", Self::BASE_URL);
        let body = self.request(Method::GET, &url, &EmptyQuery {}, false).await?;
        Ok(Chapter::from_response(body)?)
    }

    /// Updates a chapter. `update.version` must be set; with
    /// `return_entity` the refreshed snapshot is decoded and returned.
    #[tracing::instrument(skip(self, update))]
    pub async fn update_chapter(
        &self,
        id: &str,
        update: &ChapterUpdate,
        return_entity: bool,
    ) -> Result<Option<Chapter>> {
        if update.version.is_none() {
            return Err(Error::InvalidParams(
                "update_chapter requires `version`".to_string(),
            ));
        }

        let url = format!("{}/chapter/{id}", Self::BASE_URL);
        let body = self.request(Method::PUT, &url, update, true).await?;
        if return_entity {
            Ok(Some(Chapter::from_response(body)?))
        } else {
            Ok(None)
        }
    }

    /// Deletes a chapter.
    #[tracing::instrument(skip(self))]
    pub async fn delete_chapter(&self, id: &str) -> Result<()> {
        let url = format!("{}/chapter/{id}", Self::BASE_URL);
        self.request(Method::DELETE, &url, &EmptyQuery {}, true).await?;
        Ok(())
    }

    /// Resolves the image-server metadata for a chapter. This is the one
    /// operation that needs a second request to turn a chapter into page
    /// URLs; decoding itself never does this implicitly.
    #[tracing::instrument(skip(self))]
    pub async fn get_chapter_images(&self, chapter_id: &str) -> Result<ChapterImages> {
        let url = format!("{}/at-home/server/{chapter_id}", Self::BASE_URL);
        let body = self.request(Method::GET, &url, &EmptyQuery {}, false).await?;
        Ok(serde_json::from_value(body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample(chapter_field: Value, relationships: Value) -> Value {
        json!({
            "id": "ch1",
            "type": "chapter",
            "attributes": {
                "title": "Dog & Chainsaw",
                "volume": "1",
                "chapter": chapter_field,
                "pages": 52,
                "translatedLanguage": "en",
                "createdAt": "2021-05-01T12:00:00+00:00",
                "updatedAt": "2021-05-02T12:00:00+00:00",
                "publishAt": "2021-05-01T12:00:00+00:00"
            },
            "relationships": relationships
        })
    }

    #[test]
    fn relationships_resolve_by_discriminator_in_any_order() {
        // Uploader first, series last: positions must not matter.
        let value = sample(
            json!("1"),
            json!([
                {"type": "user", "id": "up1"},
                {"type": "scanlation_group", "id": "grp1"},
                {"type": "manga", "id": "mng1"}
            ]),
        );

        let chapter = Chapter::from_response(value).unwrap();
        assert_eq!(chapter.manga_id, "mng1");
        assert_eq!(chapter.group_id.as_deref(), Some("grp1"));
        assert_eq!(chapter.uploader_id.as_deref(), Some("up1"));
        assert_eq!(chapter.number, Some(1.0));
    }

    #[test]
    fn missing_optional_relationships_are_fine() {
        let value = sample(json!("1"), json!([{"type": "manga", "id": "mng1"}]));
        let chapter = Chapter::from_response(value).unwrap();
        assert_eq!(chapter.group_id, None);
        assert_eq!(chapter.uploader_id, None);
    }

    #[test]
    fn missing_manga_relationship_fails() {
        let value = sample(json!("1"), json!([{"type": "scanlation_group", "id": "grp1"}]));
        assert!(matches!(
            Chapter::from_response(value),
            Err(DecodeError::MissingRelationship { .. })
        ));
    }

    #[test]
    fn chapter_zero_is_a_number_and_null_is_unset() {
        let rels = json!([{"type": "manga", "id": "mng1"}]);

        let zero = Chapter::from_response(sample(json!("0"), rels.clone())).unwrap();
        assert_eq!(zero.number, Some(0.0));

        let unset = Chapter::from_response(sample(Value::Null, rels.clone())).unwrap();
        assert_eq!(unset.number, None);

        let garbled = Chapter::from_response(sample(json!("oneshot"), rels));
        assert!(matches!(garbled, Err(DecodeError::Field { .. })));
    }

    #[test]
    fn page_urls_keep_filename_order() {
        let images = ChapterImages {
            base_url: "https://node.example".to_string(),
            chapter: ChapterImageData {
                hash: "h4sh".to_string(),
                data: vec!["1.png".to_string(), "2.png".to_string()],
                data_saver: vec!["1.jpg".to_string(), "2.jpg".to_string()],
            },
        };

        assert_eq!(
            images.page_urls(),
            vec![
                "https://node.example/data/h4sh/1.png",
                "https://node.example/data/h4sh/2.png"
            ]
        );
        assert_eq!(
            images.data_saver_urls(),
            vec![
                "https://node.example/data-saver/h4sh/1.jpg",
                "https://node.example/data-saver/h4sh/2.jpg"
            ]
        );
    }

    #[test]
    fn image_meta_deserializes_from_server_shape() {
        let images: ChapterImages = serde_json::from_value(json!({
            "result": "ok",
            "baseUrl": "https://node.example",
            "chapter": {
                "hash": "h4sh",
                "data": ["1.png"],
                "dataSaver": ["1.jpg"]
            }
        }))
        .unwrap();

        assert_eq!(images.chapter.hash, "h4sh");
        assert_eq!(images.page_urls().len(), 1);
    }
}
