//! Query parameter encoding.
//!
//! The server marks array-valued parameters with a literal `[]` suffix on
//! the key and expects one occurrence of the key per element. Exactly which
//! parameters are arrays is part of the API contract, independent of what a
//! caller happens to pass, so each query type carries an explicit table
//! ([`Query::array_params`]) instead of inferring it from the value shape.

use super::{Error, Result};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use std::collections::HashMap;

/// Implemented by every parameter struct that can be sent to the server.
pub trait Query: Serialize + std::fmt::Debug {
    /// Wire names the server expects in `name[]` bracket notation.
    fn array_params(&self) -> &'static [&'static str] {
        &[]
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, Copy)]
pub struct EmptyQuery {}

impl Query for EmptyQuery {}

/// Plain limit/offset pagination shared by several list endpoints.
#[derive(Serialize, bon::Builder, Debug, Clone, Default, Copy)]
pub struct Pagination {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl Query for Pagination {}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Order {
    Asc,
    Desc,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, std::hash::Hash)]
#[serde(rename_all = "camelCase")]
pub enum OrderOption {
    Title,
    Year,
    CreatedAt,
    UpdatedAt,
    PublishAt,
    LatestUploadedChapter,
    FollowedCount,
    Relevance,
    Volume,
    Chapter,
    Name,
}

/// Sort directives, encoded as `order[field]=direction`.
pub type SortingOptions = HashMap<OrderOption, Order>;

/// Rewrites a query into the ordered key/value pairs the server accepts,
/// ready to become a query string (GET/DELETE) or a form body (POST/PUT).
/// Percent-encoding happens in the HTTP layer.
///
/// `null` entries are dropped entirely: the server distinguishes unset from
/// empty. Sequences expand to one pair per element, preserving element
/// order. Maps flatten to `name[key]=value`. Names listed in
/// [`Query::array_params`] get the `[]` suffix even when the value is a
/// single scalar.
pub(crate) fn to_query_pairs(query: &impl Query) -> Result<Vec<(String, String)>> {
    let Value::Object(fields) = serde_json::to_value(query)? else {
        return Err(Error::InvalidParams(
            "query parameters must serialize to an object".to_string(),
        ));
    };

    let mut pairs = Vec::new();
    for (name, value) in fields {
        if value.is_null() {
            continue;
        }

        let key = if query.array_params().contains(&name.as_str()) {
            format!("{name}[]")
        } else {
            name.clone()
        };

        match value {
            Value::Array(items) => {
                for item in items {
                    if item.is_null() {
                        continue;
                    }
                    pairs.push((key.clone(), scalar(&name, &item)?));
                }
            }
            Value::Object(entries) => {
                for (sub, item) in entries {
                    pairs.push((format!("{name}[{sub}]"), scalar(&name, &item)?));
                }
            }
            other => pairs.push((key, scalar(&name, &other)?)),
        }
    }

    Ok(pairs)
}

fn scalar(name: &str, value: &Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        _ => Err(Error::InvalidParams(format!(
            "parameter `{name}` nests non-scalar values"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize, Debug, Default)]
    #[serde(rename_all = "camelCase")]
    struct SearchParams {
        title: Option<String>,
        authors: Option<Vec<String>>,
        limit: Option<u32>,
        locked: Option<bool>,
        order: Option<SortingOptions>,
    }

    impl Query for SearchParams {
        fn array_params(&self) -> &'static [&'static str] {
            &["authors"]
        }
    }

    // The wire contract says `contentRating` is an array even though this
    // (deliberately wrong-typed) struct passes a scalar.
    #[derive(Serialize, Debug, Default)]
    #[serde(rename_all = "camelCase")]
    struct ScalarForArray {
        content_rating: Option<String>,
    }

    impl Query for ScalarForArray {
        fn array_params(&self) -> &'static [&'static str] {
            &["contentRating"]
        }
    }

    #[test]
    fn array_params_get_bracketed_repeated_keys() {
        let params = SearchParams {
            authors: Some(vec!["a".to_string(), "b".to_string()]),
            ..Default::default()
        };

        let pairs = to_query_pairs(&params).unwrap();
        assert_eq!(
            pairs,
            vec![
                ("authors[]".to_string(), "a".to_string()),
                ("authors[]".to_string(), "b".to_string()),
            ]
        );
    }

    #[test]
    fn null_entries_are_dropped_not_emptied() {
        let params = SearchParams {
            authors: None,
            title: None,
            ..Default::default()
        };

        assert!(to_query_pairs(&params).unwrap().is_empty());
    }

    #[test]
    fn scalar_for_array_param_still_gets_brackets() {
        let params = ScalarForArray {
            content_rating: Some("safe".to_string()),
        };

        let pairs = to_query_pairs(&params).unwrap();
        assert_eq!(
            pairs,
            vec![("contentRating[]".to_string(), "safe".to_string())]
        );
    }

    #[test]
    fn scalars_and_maps_keep_plain_keys() {
        let mut order = SortingOptions::new();
        order.insert(OrderOption::Chapter, Order::Asc);

        let params = SearchParams {
            title: Some("Chainsaw Man".to_string()),
            limit: Some(10),
            locked: Some(false),
            order: Some(order),
            ..Default::default()
        };

        let pairs = to_query_pairs(&params).unwrap();
        assert!(pairs.contains(&("title".to_string(), "Chainsaw Man".to_string())));
        assert!(pairs.contains(&("limit".to_string(), "10".to_string())));
        assert!(pairs.contains(&("locked".to_string(), "false".to_string())));
        assert!(pairs.contains(&("order[chapter]".to_string(), "asc".to_string())));
    }

    #[test]
    fn empty_query_yields_no_pairs() {
        assert!(to_query_pairs(&EmptyQuery {}).unwrap().is_empty());
    }
}
