//! Query-string codec.
//!
//! Parsing is lenient: undecodable values become empty strings and a bare key
//! reads as `"true"`. Stringifying emits keys in sorted order and uses the
//! `key[]=value` convention for lists.
//!
//! List keys are percent-encoded like scalar keys, so a key containing `&`,
//! `=` or a space parses back to the same list.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::routing::normalizer::{decode_component, encode_component};

/// Value of one query parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryValue {
    Single(String),
    List(Vec<String>),
}

impl From<&str> for QueryValue {
    fn from(value: &str) -> Self {
        QueryValue::Single(value.to_string())
    }
}

impl From<String> for QueryValue {
    fn from(value: String) -> Self {
        QueryValue::Single(value)
    }
}

impl From<Vec<String>> for QueryValue {
    fn from(values: Vec<String>) -> Self {
        QueryValue::List(values)
    }
}

/// Query parameters keyed by decoded name, iterated in sorted order.
pub type QueryParams = BTreeMap<String, QueryValue>;

/// Parse a query string (without the leading `?`).
pub fn parse_query_string(query: &str) -> QueryParams {
    let mut params = QueryParams::new();

    for pair in query.split(['&', ';']).filter(|pair| !pair.is_empty()) {
        let mut parts = pair.split('=');
        let raw_key = parts.next().unwrap_or_default();
        let mut key = decode(raw_key);

        let value = match parts.next() {
            None => {
                params.insert(key, QueryValue::Single("true".to_string()));
                continue;
            }
            Some(raw) => decode(raw),
        };

        if key.len() > 2 && key.ends_with("[]") {
            key.truncate(key.len() - 2);
            let values = match params.remove(&key) {
                Some(QueryValue::List(mut values)) => {
                    values.push(value);
                    values
                }
                Some(QueryValue::Single(first)) => vec![first, value],
                None => vec![value],
            };
            params.insert(key, QueryValue::List(values));
        } else {
            params.insert(key, QueryValue::Single(value));
        }
    }

    params
}

/// Serialize parameters as `key=value` pairs joined by `&`, without a leading `?`.
pub fn stringify_query(params: &QueryParams) -> String {
    let mut pairs = Vec::new();
    for (key, value) in params {
        let key = encode_component(key);
        match value {
            QueryValue::Single(value) => {
                pairs.push(format!("{}={}", key, encode_component(value)));
            }
            QueryValue::List(values) => {
                for value in values {
                    pairs.push(format!("{}[]={}", key, encode_component(value)));
                }
            }
        }
    }
    pairs.join("&")
}

// `+` means space; undecodable input yields an empty string.
fn decode(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    decode_component(&spaced)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_default()
}
