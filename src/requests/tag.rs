//! Tags attached to manga entries.

use super::envelope::{
    decode_attributes, decode_list, expect_envelope, DecodeError, LocalizedString,
};
use super::query_utils::EmptyQuery;
use super::Result;
use crate::MandexClient;

use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TagGroup {
    Content,
    Format,
    Genre,
    Theme,
}

/// Mode for combining several tag filters in a search.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum TagsMode {
    And,
    Or,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub id: String,
    pub name: LocalizedString,
    pub description: LocalizedString,
    pub group: TagGroup,
}

#[derive(Deserialize, Debug)]
struct TagAttributes {
    name: LocalizedString,
    #[serde(default)]
    description: LocalizedString,
    group: TagGroup,
}

impl Tag {
    pub(crate) const TYPE: &'static str = "tag";

    /// Decodes one tag envelope, bare or wrapped under `data`.
    pub fn from_response(value: Value) -> Result<Self, DecodeError> {
        let env = expect_envelope(value, Self::TYPE)?;
        let attrs: TagAttributes = decode_attributes(Self::TYPE, &env.attributes)?;

        Ok(Tag {
            id: env.id,
            name: attrs.name,
            description: attrs.description,
            group: attrs.group,
        })
    }

    pub fn list_from_response(value: Value) -> Result<Vec<Self>, DecodeError> {
        decode_list(value, Self::TYPE, Self::from_response)
    }
}

impl MandexClient {
    /// All tags known to the server.
    #[tracing::instrument(skip(self))]
    pub async fn get_tag_list(&self) -> Result<Vec<Tag>> {
        let url = format!("{}/manga/tag", Self::BASE_URL);
        let body = self.request(Method::GET, &url, &EmptyQuery {}, false).await?;
        Ok(Tag::list_from_response(body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_tag_envelope() {
        let tag = Tag::from_response(json!({
            "id": "t1",
            "type": "tag",
            "attributes": {
                "name": {"en": "Action"},
                "description": {},
                "group": "genre",
                "version": 1
            },
            "relationships": []
        }))
        .unwrap();

        assert_eq!(tag.id, "t1");
        assert_eq!(tag.name["en"], "Action");
        assert_eq!(tag.group, TagGroup::Genre);
    }

    #[test]
    fn rejects_non_tag_envelope() {
        let err = Tag::from_response(json!({
            "id": "t1",
            "type": "manga",
            "attributes": {}
        }))
        .unwrap_err();

        assert!(matches!(err, DecodeError::TypeMismatch { .. }));
    }
}
