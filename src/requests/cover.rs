//! Cover art. A cover is meaningless without its series, so the `manga`
//! relationship is required at decode time; the image lives on the uploads
//! host and is addressed by manga id plus filename.

use super::envelope::{decode_attributes, decode_list, expect_envelope, DecodeError, EntityKind};
use super::query_utils::{EmptyQuery, Query, SortingOptions};
use super::{Error, Result};
use crate::MandexClient;

use bon::Builder;
use chrono::{DateTime, FixedOffset};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Requested rendition of a cover image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoverQuality {
    /// The file as uploaded.
    #[default]
    Source,
    /// 512px-wide thumbnail.
    Medium,
    /// 256px-wide thumbnail.
    Small,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cover {
    pub id: String,
    pub volume: Option<String>,
    pub file_name: String,
    pub description: Option<String>,
    pub locale: Option<String>,
    pub manga_id: String,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct CoverAttributes {
    volume: Option<String>,
    file_name: String,
    description: Option<String>,
    locale: Option<String>,
    created_at: DateTime<FixedOffset>,
    updated_at: DateTime<FixedOffset>,
}

impl Cover {
    pub(crate) const TYPE: &'static str = "cover_art";

    /// Decodes one cover envelope, bare or wrapped under `data`.
    pub fn from_response(value: Value) -> Result<Self, DecodeError> {
        let env = expect_envelope(value, Self::TYPE)?;
        let attrs: CoverAttributes = decode_attributes(Self::TYPE, &env.attributes)?;

        let manga_id = env.require_related(Self::TYPE, EntityKind::Manga)?;

        Ok(Cover {
            id: env.id,
            volume: attrs.volume,
            file_name: attrs.file_name,
            description: attrs.description,
            locale: attrs.locale,
            manga_id,
            created_at: attrs.created_at,
            updated_at: attrs.updated_at,
        })
    }

    pub fn list_from_response(value: Value) -> Result<Vec<Self>, DecodeError> {
        decode_list(value, Self::TYPE, Self::from_response)
    }

    /// URL of the image on the uploads host, in the requested rendition.
    pub fn image_url(&self, quality: CoverQuality) -> String {
        let base = format!(
            "{}/covers/{}/{}",
            MandexClient::UPLOADS_URL,
            self.manga_id,
            self.file_name
        );
        match quality {
            CoverQuality::Source => base,
            CoverQuality::Medium => format!("{base}.512.jpg"),
            CoverQuality::Small => format!("{base}.256.jpg"),
        }
    }
}

/// Search parameters for `GET /cover`.
#[derive(Serialize, Builder, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
#[builder(on(String, into))]
pub struct CoverQuery {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    pub manga: Option<Vec<String>>,
    pub ids: Option<Vec<String>>,
    pub uploaders: Option<Vec<String>>,
    pub order: Option<SortingOptions>,
}

impl Query for CoverQuery {
    fn array_params(&self) -> &'static [&'static str] {
        &["manga", "ids", "uploaders"]
    }
}

/// Fields for editing a cover. `version` is mandatory and checked
/// client-side.
#[derive(Serialize, Builder, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
#[builder(on(String, into))]
pub struct CoverEdit {
    pub volume: Option<String>,
    pub description: Option<String>,
    pub version: Option<u32>,
}

impl Query for CoverEdit {}

impl MandexClient {
    /// Searches covers with the parameters in `query`.
    #[tracing::instrument(skip(self))]
    pub async fn get_cover_list(&self, query: &CoverQuery) -> Result<Vec<Cover>> {
        let url = format!("{}/cover", Self::BASE_URL);
        let body = self.request(Method::GET, &url, query, false).await?;
        Ok(Cover::list_from_response(body)?)
    }

    /// Fetches one cover by id.
    #[tracing::instrument(skip(self))]
    pub async fn get_cover(&self, id: &str) -> Result<Cover> {
        let url = format!("{}/cover/{id}", Self::BASE_URL);
        let body = self.request(Method::GET, &url, &EmptyQuery {}, false).await?;
        Ok(Cover::from_response(body)?)
    }

    /// Edits a cover. `edit.version` must be set; with `return_entity` the
    /// refreshed snapshot is decoded and returned.
    #[tracing::instrument(skip(self, edit))]
    pub async fn edit_cover(
        &self,
        id: &str,
        edit: &CoverEdit,
        return_entity: bool,
    ) -> Result<Option<Cover>> {
        if edit.version.is_none() {
            return Err(Error::InvalidParams(
                "edit_cover requires `version`".to_string(),
            ));
        }

        let url = format!("{}/cover/{id}", Self::BASE_URL);
        let body = self.request(Method::PUT, &url, edit, true).await?;
        if return_entity {
            Ok(Some(Cover::from_response(body)?))
        } else {
            Ok(None)
        }
    }

    /// Deletes a cover.
    #[tracing::instrument(skip(self))]
    pub async fn delete_cover(&self, id: &str) -> Result<()> {
        let url = format!("{}/cover/{id}", Self::BASE_URL);
        self.request(Method::DELETE, &url, &EmptyQuery {}, true).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample(relationships: Value) -> Value {
        json!({
            "id": "c1",
            "type": "cover_art",
            "attributes": {
                "volume": "1",
                "fileName": "cover.jpg",
                "description": null,
                "locale": "ja",
                "createdAt": "2021-05-24T18:02:01+00:00",
                "updatedAt": "2021-05-24T18:02:01+00:00"
            },
            "relationships": relationships
        })
    }

    #[test]
    fn requires_the_series_relationship() {
        let err = Cover::from_response(sample(json!([{"type": "user", "id": "u1"}]))).unwrap_err();
        assert!(matches!(err, DecodeError::MissingRelationship { .. }));
    }

    #[test]
    fn image_url_per_quality() {
        let cover = Cover::from_response(sample(json!([{"type": "manga", "id": "m1"}]))).unwrap();

        assert_eq!(
            cover.image_url(CoverQuality::Source),
            "https://uploads.mangadex.org/covers/m1/cover.jpg"
        );
        assert_eq!(
            cover.image_url(CoverQuality::Medium),
            "https://uploads.mangadex.org/covers/m1/cover.jpg.512.jpg"
        );
        assert_eq!(
            cover.image_url(CoverQuality::Small),
            "https://uploads.mangadex.org/covers/m1/cover.jpg.256.jpg"
        );
    }
}
