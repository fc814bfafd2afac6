//! Manga entities, search/feed queries and the manga facade.
//!
//! Queries and drafts are built with the builder syntax from the [bon]
//! crate: `MangaQuery::builder().title("Chainsaw Man").build()`.

use super::chapter::Chapter;
use super::envelope::{
    decode_attributes, decode_list, expect_envelope, DecodeError, EntityKind, LocalizedString,
};
use super::query_utils::{EmptyQuery, Query, SortingOptions};
use super::tag::{Tag, TagsMode};
use super::{Error, Result};
use crate::MandexClient;

use bon::Builder;
use chrono::{DateTime, FixedOffset};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use std::collections::HashMap;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MangaStatus {
    Completed,
    Ongoing,
    Cancelled,
    Hiatus,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ContentRating {
    Safe,
    Suggestive,
    Erotica,
    Pornographic,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PublicationDemographic {
    Shounen,
    Shoujo,
    Josei,
    Seinen,
}

/// A manga snapshot decoded from a server envelope.
///
/// Authors, artists and the cover stay as unresolved identifiers; tags are
/// the one nested structure and are decoded recursively through the tag
/// decoder.
#[derive(Debug, Clone, PartialEq)]
pub struct Manga {
    pub id: String,
    pub title: LocalizedString,
    pub alt_titles: Vec<LocalizedString>,
    pub description: LocalizedString,
    pub is_locked: bool,
    pub links: HashMap<String, String>,
    pub original_language: String,
    pub last_volume: Option<String>,
    pub last_chapter: Option<String>,
    pub publication_demographic: Option<PublicationDemographic>,
    pub status: MangaStatus,
    pub year: Option<i32>,
    pub content_rating: ContentRating,
    pub tags: Vec<Tag>,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
    pub author_ids: Vec<String>,
    pub artist_ids: Vec<String>,
    pub cover_id: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct MangaAttributes {
    title: LocalizedString,
    #[serde(default)]
    alt_titles: Vec<LocalizedString>,
    #[serde(default)]
    description: LocalizedString,
    #[serde(default)]
    is_locked: bool,
    links: Option<HashMap<String, String>>,
    original_language: String,
    last_volume: Option<String>,
    last_chapter: Option<String>,
    publication_demographic: Option<PublicationDemographic>,
    status: MangaStatus,
    year: Option<i32>,
    content_rating: ContentRating,
    #[serde(default)]
    tags: Vec<Value>,
    created_at: DateTime<FixedOffset>,
    updated_at: DateTime<FixedOffset>,
}

impl Manga {
    pub(crate) const TYPE: &'static str = "manga";

    /// Decodes one manga envelope, bare or wrapped under `data`.
    pub fn from_response(value: Value) -> Result<Self, DecodeError> {
        let env = expect_envelope(value, Self::TYPE)?;
        let attrs: MangaAttributes = decode_attributes(Self::TYPE, &env.attributes)?;

        let tags = attrs
            .tags
            .into_iter()
            .map(Tag::from_response)
            .collect::<Result<Vec<_>, DecodeError>>()?;

        Ok(Manga {
            author_ids: env.related_ids(EntityKind::Author),
            artist_ids: env.related_ids(EntityKind::Artist),
            cover_id: env.related_id(EntityKind::CoverArt),
            id: env.id,
            title: attrs.title,
            alt_titles: attrs.alt_titles,
            description: attrs.description,
            is_locked: attrs.is_locked,
            links: attrs.links.unwrap_or_default(),
            original_language: attrs.original_language,
            last_volume: attrs.last_volume,
            last_chapter: attrs.last_chapter,
            publication_demographic: attrs.publication_demographic,
            status: attrs.status,
            year: attrs.year,
            content_rating: attrs.content_rating,
            tags,
            created_at: attrs.created_at,
            updated_at: attrs.updated_at,
        })
    }

    /// Decodes a bulk manga response, aborting on the first bad element.
    pub fn list_from_response(value: Value) -> Result<Vec<Self>, DecodeError> {
        decode_list(value, Self::TYPE, Self::from_response)
    }

    /// Web URL of this title.
    pub fn url(&self) -> String {
        format!("{}/title/{}", MandexClient::WEB_URL, self.id)
    }
}

/// Search parameters for `GET /manga`.
#[derive(Serialize, Builder, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
#[builder(on(String, into))]
pub struct MangaQuery {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    pub title: Option<String>,
    pub authors: Option<Vec<String>>,
    pub artists: Option<Vec<String>>,
    pub year: Option<i32>,
    pub included_tags: Option<Vec<String>>,
    pub included_tags_mode: Option<TagsMode>,
    pub excluded_tags: Option<Vec<String>>,
    pub excluded_tags_mode: Option<TagsMode>,
    pub status: Option<Vec<MangaStatus>>,
    pub original_language: Option<Vec<String>>,
    pub available_translated_language: Option<Vec<String>>,
    pub publication_demographic: Option<Vec<PublicationDemographic>>,
    pub ids: Option<Vec<String>>,
    pub content_rating: Option<Vec<ContentRating>>,
    pub created_at_since: Option<String>,
    pub updated_at_since: Option<String>,
    pub order: Option<SortingOptions>,
    pub includes: Option<Vec<EntityKind>>,
}

impl Query for MangaQuery {
    fn array_params(&self) -> &'static [&'static str] {
        &[
            "authors",
            "artists",
            "includedTags",
            "excludedTags",
            "status",
            "originalLanguage",
            "availableTranslatedLanguage",
            "publicationDemographic",
            "ids",
            "contentRating",
            "includes",
        ]
    }
}

/// Parameters for `GET /manga/{id}/feed`.
#[derive(Serialize, Builder, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
#[builder(on(String, into))]
pub struct MangaFeedQuery {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    pub translated_language: Option<Vec<String>>,
    pub excluded_groups: Option<Vec<String>>,
    pub created_at_since: Option<String>,
    pub updated_at_since: Option<String>,
    pub order: Option<SortingOptions>,
}

impl Query for MangaFeedQuery {
    fn array_params(&self) -> &'static [&'static str] {
        &["translatedLanguage", "excludedGroups"]
    }
}

/// Fields for creating or updating a manga.
///
/// `version` is mandatory on updates and checked client-side before any
/// request goes out.
#[derive(Serialize, Builder, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
#[builder(on(String, into))]
pub struct MangaDraft {
    pub title: Option<String>,
    pub description: Option<LocalizedString>,
    pub authors: Option<Vec<String>>,
    pub artists: Option<Vec<String>>,
    pub links: Option<HashMap<String, String>>,
    pub original_language: Option<String>,
    pub last_volume: Option<String>,
    pub last_chapter: Option<String>,
    pub publication_demographic: Option<PublicationDemographic>,
    pub status: Option<MangaStatus>,
    pub year: Option<i32>,
    pub content_rating: Option<ContentRating>,
    pub mod_notes: Option<String>,
    pub version: Option<u32>,
}

impl Query for MangaDraft {
    fn array_params(&self) -> &'static [&'static str] {
        &["authors", "artists"]
    }
}

/// Where a followed manga sits in the user's reading progress.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReadingStatus {
    Reading,
    OnHold,
    PlanToRead,
    Dropped,
    ReReading,
    Completed,
}

/// One volume entry of the `/manga/{id}/aggregate` response: chapter
/// summaries keyed by chapter number, not full chapter entities.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct VolumeAggregate {
    pub volume: String,
    pub count: u32,
    #[serde(default)]
    pub chapters: HashMap<String, ChapterAggregate>,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ChapterAggregate {
    pub chapter: String,
    pub id: String,
    #[serde(default)]
    pub others: Vec<String>,
    pub count: u32,
}

#[derive(Serialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
struct AggregateQuery {
    translated_language: Option<Vec<String>>,
}

impl Query for AggregateQuery {
    fn array_params(&self) -> &'static [&'static str] {
        &["translatedLanguage"]
    }
}

#[derive(Serialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
struct ReadMarkerUpdate {
    chapter_ids_read: Option<Vec<String>>,
    chapter_ids_unread: Option<Vec<String>>,
}

impl Query for ReadMarkerUpdate {
    fn array_params(&self) -> &'static [&'static str] {
        &["chapterIdsRead", "chapterIdsUnread"]
    }
}

#[derive(Serialize, Debug)]
struct StatusParam {
    status: Option<ReadingStatus>,
}

impl Query for StatusParam {}

#[derive(Deserialize, Debug)]
struct ReadMarkersBody {
    data: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct ReadingStatusesBody {
    statuses: HashMap<String, ReadingStatus>,
}

#[derive(Deserialize, Debug)]
struct ReadingStatusBody {
    status: ReadingStatus,
}

/// A manga with no chapters aggregates to `"volumes": []` instead of an
/// empty map.
fn volumes_from_response(mut body: Value) -> Result<HashMap<String, VolumeAggregate>> {
    match body.get_mut("volumes").map(Value::take) {
        Some(volumes @ Value::Object(_)) => Ok(serde_json::from_value(volumes)?),
        _ => Ok(HashMap::new()),
    }
}

impl MandexClient {
    /// Searches manga with the parameters in `query`.
    #[tracing::instrument(skip(self))]
    pub async fn get_manga_list(&self, query: &MangaQuery) -> Result<Vec<Manga>> {
        let url = format!("{}/manga", Self::BASE_URL);
        let body = self.request(Method::GET, &url, query, false).await?;
        Ok(Manga::list_from_response(body)?)
    }

    /// Fetches one manga by id.
    #[tracing::instrument(skip(self))]
    pub async fn get_manga(&self, id: &str) -> Result<Manga> {
        let url = format!("{}/manga/{id}", Self::BASE_URL);
        let body = self.request(Method::GET, &url, &EmptyQuery {}, false).await?;
        Ok(Manga::from_response(body)?)
    }

    /// Fetches a random manga.
    #[tracing::instrument(skip(self))]
    pub async fn get_random_manga(&self) -> Result<Manga> {
        let url = format!("{}/manga/random", Self::BASE_URL);
        let body = self.request(Method::GET, &url, &EmptyQuery {}, false).await?;
        Ok(Manga::from_response(body)?)
    }

    /// Chapters published for the manga with the given id.
    #[tracing::instrument(skip(self))]
    pub async fn get_manga_feed(&self, id: &str, query: &MangaFeedQuery) -> Result<Vec<Chapter>> {
        let url = format!("{}/manga/{id}/feed", Self::BASE_URL);
        let body = self.request(Method::GET, &url, query, false).await?;
        Ok(Chapter::list_from_response(body)?)
    }

    /// Creates a manga titled `title` with the remaining fields of `draft`.
    #[tracing::instrument(skip(self, draft))]
    pub async fn create_manga(&self, title: &str, draft: &MangaDraft) -> Result<Manga> {
        let mut draft = draft.clone();
        draft.title = Some(title.to_string());

        let url = format!("{}/manga", Self::BASE_URL);
        let body = self.request(Method::POST, &url, &draft, true).await?;
        Ok(Manga::from_response(body)?)
    }

    /// Updates a manga. `draft.version` must be set; with `return_entity`
    /// the refreshed snapshot is decoded and returned.
    #[tracing::instrument(skip(self, draft))]
    pub async fn update_manga(
        &self,
        id: &str,
        draft: &MangaDraft,
        return_entity: bool,
    ) -> Result<Option<Manga>> {
        if draft.version.is_none() {
            return Err(Error::InvalidParams(
                "update_manga requires `version`".to_string(),
            ));
        }

        let url = format!("{}/manga/{id}", Self::BASE_URL);
        let body = self.request(Method::PUT, &url, draft, true).await?;
        if return_entity {
            Ok(Some(Manga::from_response(body)?))
        } else {
            Ok(None)
        }
    }

    /// Deletes a manga.
    #[tracing::instrument(skip(self))]
    pub async fn delete_manga(&self, id: &str) -> Result<()> {
        let url = format!("{}/manga/{id}", Self::BASE_URL);
        self.request(Method::DELETE, &url, &EmptyQuery {}, true).await?;
        Ok(())
    }

    /// Follows a manga for the logged-in user.
    #[tracing::instrument(skip(self))]
    pub async fn follow_manga(&self, id: &str) -> Result<()> {
        let url = format!("{}/manga/{id}/follow", Self::BASE_URL);
        self.request(Method::POST, &url, &EmptyQuery {}, true).await?;
        Ok(())
    }

    /// Unfollows a manga for the logged-in user.
    #[tracing::instrument(skip(self))]
    pub async fn unfollow_manga(&self, id: &str) -> Result<()> {
        let url = format!("{}/manga/{id}/follow", Self::BASE_URL);
        self.request(Method::DELETE, &url, &EmptyQuery {}, true).await?;
        Ok(())
    }

    /// Manga followed by the logged-in user.
    #[tracing::instrument(skip(self))]
    pub async fn get_followed_manga(&self, query: &MangaQuery) -> Result<Vec<Manga>> {
        let url = format!("{}/user/follows/manga", Self::BASE_URL);
        let body = self.request(Method::GET, &url, query, true).await?;
        Ok(Manga::list_from_response(body)?)
    }

    /// Volume/chapter summary of a manga, keyed by volume number, optionally
    /// restricted to the given translation languages.
    #[tracing::instrument(skip(self))]
    pub async fn get_manga_volumes_and_chapters(
        &self,
        id: &str,
        translated_language: Option<Vec<String>>,
    ) -> Result<HashMap<String, VolumeAggregate>> {
        let query = AggregateQuery { translated_language };
        let url = format!("{}/manga/{id}/aggregate", Self::BASE_URL);
        let body = self.request(Method::GET, &url, &query, false).await?;
        volumes_from_response(body)
    }

    /// Ids of the chapters the logged-in user has marked as read for this
    /// manga. Identifiers only; fetch the chapters separately if needed.
    #[tracing::instrument(skip(self))]
    pub async fn get_manga_read_markers(&self, id: &str) -> Result<Vec<String>> {
        let url = format!("{}/manga/{id}/read", Self::BASE_URL);
        let body = self.request(Method::GET, &url, &EmptyQuery {}, true).await?;
        let markers: ReadMarkersBody = serde_json::from_value(body)?;
        Ok(markers.data)
    }

    /// Marks chapters of this manga as read and/or unread in one batch.
    #[tracing::instrument(skip(self, read, unread))]
    pub async fn set_manga_read_markers(
        &self,
        id: &str,
        read: &[String],
        unread: &[String],
    ) -> Result<()> {
        let update = ReadMarkerUpdate {
            chapter_ids_read: (!read.is_empty()).then(|| read.to_vec()),
            chapter_ids_unread: (!unread.is_empty()).then(|| unread.to_vec()),
        };

        let url = format!("{}/manga/{id}/read", Self::BASE_URL);
        self.request(Method::POST, &url, &update, true).await?;
        Ok(())
    }

    /// Reading statuses of every followed manga, keyed by manga id,
    /// optionally filtered to one status.
    #[tracing::instrument(skip(self))]
    pub async fn get_all_manga_reading_status(
        &self,
        status: Option<ReadingStatus>,
    ) -> Result<HashMap<String, ReadingStatus>> {
        let url = format!("{}/manga/status", Self::BASE_URL);
        let body = self
            .request(Method::GET, &url, &StatusParam { status }, true)
            .await?;
        let statuses: ReadingStatusesBody = serde_json::from_value(body)?;
        Ok(statuses.statuses)
    }

    /// Reading status of one manga for the logged-in user.
    #[tracing::instrument(skip(self))]
    pub async fn get_manga_reading_status(&self, id: &str) -> Result<ReadingStatus> {
        let url = format!("{}/manga/{id}/status", Self::BASE_URL);
        let body = self.request(Method::GET, &url, &EmptyQuery {}, true).await?;
        let status: ReadingStatusBody = serde_json::from_value(body)?;
        Ok(status.status)
    }

    /// Moves one manga to the given reading status.
    #[tracing::instrument(skip(self))]
    pub async fn update_manga_reading_status(
        &self,
        id: &str,
        status: ReadingStatus,
    ) -> Result<()> {
        let url = format!("{}/manga/{id}/status", Self::BASE_URL);
        self.request(Method::POST, &url, &StatusParam { status: Some(status) }, true)
            .await?;
        Ok(())
    }
}
