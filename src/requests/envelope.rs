//! JSON envelope handling shared by every entity decoder.
//!
//! The server describes one entity as `{"id", "type", "attributes",
//! "relationships"}`, sometimes nested one level deeper under `"data"`
//! depending on the endpoint. Decoders unwrap at most one such layer,
//! validate the type tag, then read everything through [`Envelope`].
//! Decoding is pure: it never issues network calls.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use std::collections::HashMap;

/// Localized text keyed by language code. Codes are opaque to this crate.
pub type LocalizedString = HashMap<String, String>;

/// Relationship discriminators used by the server.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Manga,
    Chapter,
    Tag,
    Author,
    Artist,
    CoverArt,
    ScanlationGroup,
    User,
    CustomList,
    Leader,
    Member,
    Creator,
    #[serde(untagged)]
    Other(String),
}

impl EntityKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Manga => "manga",
            Self::Chapter => "chapter",
            Self::Tag => "tag",
            Self::Author => "author",
            Self::Artist => "artist",
            Self::CoverArt => "cover_art",
            Self::ScanlationGroup => "scanlation_group",
            Self::User => "user",
            Self::CustomList => "custom_list",
            Self::Leader => "leader",
            Self::Member => "member",
            Self::Creator => "creator",
            Self::Other(s) => s,
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed, unresolved reference to another entity's identifier.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: EntityKind,
}

/// Failure to map a server payload onto an entity. Every variant carries
/// enough of the offending payload for diagnostics.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("expected a `{expected}` envelope, got `{actual}`")]
    TypeMismatch {
        expected: &'static str,
        actual: String,
        payload: Value,
    },
    #[error("malformed `{expected}` envelope: {source}")]
    Envelope {
        expected: &'static str,
        #[source]
        source: serde_json::Error,
        payload: Value,
    },
    #[error("invalid `{entity}` attributes: {source}")]
    Attributes {
        entity: &'static str,
        #[source]
        source: serde_json::Error,
        payload: Value,
    },
    #[error("`{entity}` envelope has no `{kind}` relationship")]
    MissingRelationship {
        entity: &'static str,
        kind: EntityKind,
        payload: Value,
    },
    #[error("invalid `{entity}` field `{field}`: {message}")]
    Field {
        entity: &'static str,
        field: &'static str,
        message: String,
    },
    #[error("expected a `{expected}` list envelope")]
    NotAList {
        expected: &'static str,
        payload: Value,
    },
}

/// One validated entity envelope.
#[derive(Deserialize, Debug, Clone)]
pub(crate) struct Envelope {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub attributes: Value,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
    /// The unwrapped payload this envelope was read from, kept for errors.
    #[serde(skip)]
    raw: Value,
}

impl Envelope {
    /// Ids of every relationship with the given discriminator, in server
    /// order.
    pub fn related_ids(&self, kind: EntityKind) -> Vec<String> {
        self.relationships
            .iter()
            .filter(|r| r.kind == kind)
            .map(|r| r.id.clone())
            .collect()
    }

    /// Id of the first relationship with the given discriminator.
    pub fn related_id(&self, kind: EntityKind) -> Option<String> {
        self.relationships
            .iter()
            .find(|r| r.kind == kind)
            .map(|r| r.id.clone())
    }

    /// Like [`related_id`](Self::related_id), but absence is a decode error.
    pub fn require_related(
        &self,
        entity: &'static str,
        kind: EntityKind,
    ) -> Result<String, DecodeError> {
        self.related_id(kind.clone())
            .ok_or_else(|| DecodeError::MissingRelationship {
                entity,
                kind,
                payload: self.raw.clone(),
            })
    }
}

/// Unwraps at most one `"data"` object layer. Endpoints nest inconsistently;
/// both the bare and the wrapped form must decode.
pub(crate) fn unwrap_data(mut value: Value) -> Value {
    match value.get_mut("data") {
        Some(inner) if inner.is_object() => inner.take(),
        _ => value,
    }
}

/// Reads an envelope out of `value` and validates its type tag against
/// `expected`.
pub(crate) fn expect_envelope(
    value: Value,
    expected: &'static str,
) -> Result<Envelope, DecodeError> {
    let raw = unwrap_data(value);

    let mut env: Envelope =
        serde_json::from_value(raw.clone()).map_err(|source| DecodeError::Envelope {
            expected,
            source,
            payload: raw.clone(),
        })?;

    if env.kind != expected {
        return Err(DecodeError::TypeMismatch {
            expected,
            actual: env.kind,
            payload: raw,
        });
    }

    env.raw = raw;
    Ok(env)
}

/// Deserializes the `attributes` sub-object of an envelope.
pub(crate) fn decode_attributes<T: serde::de::DeserializeOwned>(
    entity: &'static str,
    attributes: &Value,
) -> Result<T, DecodeError> {
    serde_json::from_value(attributes.clone()).map_err(|source| DecodeError::Attributes {
        entity,
        source,
        payload: attributes.clone(),
    })
}

/// Decodes a bulk response: `{"data": [...]}`, the legacy
/// `{"results": [...]}` shape, or a bare array. Elements decode in server
/// order; the first failure aborts the whole list, partial lists are never
/// returned.
pub(crate) fn decode_list<T>(
    value: Value,
    expected: &'static str,
    decode: impl Fn(Value) -> Result<T, DecodeError>,
) -> Result<Vec<T>, DecodeError> {
    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("data").or_else(|| map.remove("results")) {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(DecodeError::NotAList {
                    expected,
                    payload: Value::Object(map),
                })
            }
        },
        other => {
            return Err(DecodeError::NotAList {
                expected,
                payload: other,
            })
        }
    };

    items.into_iter().map(decode).collect()
}
