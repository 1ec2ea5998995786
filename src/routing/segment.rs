//! Segment variants of the route trie.
//!
//! | Kind    | Consumes               | Pattern fragment | Score |
//! |---------|------------------------|------------------|-------|
//! | Static  | one exact literal      | escaped literal  | 3     |
//! | Dynamic | one path segment       | `([^/]+)`        | 2     |
//! | Glob    | one or more segments   | `(.+)`           | 1     |
//! | Epsilon | nothing                | (none)           | 0     |

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::routing::normalizer::normalize_path;

/// Discriminant of a [`Segment`], as written in snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Static,
    Dynamic,
    Glob,
    Epsilon,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeKind::Static => "static",
            NodeKind::Dynamic => "dynamic",
            NodeKind::Glob => "glob",
            NodeKind::Epsilon => "epsilon",
        };
        f.write_str(name)
    }
}

/// One trie state together with its kind-specific value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Matches exactly this (normalized) literal.
    Static(String),
    /// Matches any single segment and binds it to the named parameter.
    Dynamic(String),
    /// Matches one or more segments and binds them to the named parameter.
    Glob(String),
    /// Non-consuming state used for index routes and the root.
    Epsilon,
}

impl Segment {
    /// Classify one raw declaration segment by its first character.
    ///
    /// Static literals are normalized so they compare equal to normalized
    /// lookup paths.
    pub fn parse(raw: &str) -> Self {
        if let Some(name) = raw.strip_prefix(':') {
            Segment::Dynamic(name.to_string())
        } else if let Some(name) = raw.strip_prefix('*') {
            Segment::Glob(name.to_string())
        } else {
            Segment::Static(normalize_path(raw))
        }
    }

    /// Rebuild a segment from its snapshot representation.
    pub fn from_parts(kind: NodeKind, value: Option<&str>) -> Self {
        let value = value.unwrap_or_default();
        match kind {
            NodeKind::Static => Segment::Static(normalize_path(value)),
            NodeKind::Dynamic => Segment::Dynamic(value.to_string()),
            NodeKind::Glob => Segment::Glob(value.to_string()),
            NodeKind::Epsilon => Segment::Epsilon,
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Segment::Static(_) => NodeKind::Static,
            Segment::Dynamic(_) => NodeKind::Dynamic,
            Segment::Glob(_) => NodeKind::Glob,
            Segment::Epsilon => NodeKind::Epsilon,
        }
    }

    /// Literal text for static segments, parameter name for dynamic and glob.
    pub fn value(&self) -> Option<&str> {
        match self {
            Segment::Static(value) | Segment::Dynamic(value) | Segment::Glob(value) => {
                Some(value.as_str())
            }
            Segment::Epsilon => None,
        }
    }

    /// Name of the parameter this segment binds, if any.
    pub fn param_name(&self) -> Option<&str> {
        match self {
            Segment::Dynamic(name) | Segment::Glob(name) => Some(name.as_str()),
            Segment::Static(_) | Segment::Epsilon => None,
        }
    }

    /// Fragment of the anchored extraction pattern, `None` for epsilon.
    pub fn regex_fragment(&self) -> Option<Cow<'_, str>> {
        match self {
            Segment::Static(literal) => Some(Cow::Owned(regex::escape(literal))),
            Segment::Dynamic(_) => Some(Cow::Borrowed("([^/]+)")),
            Segment::Glob(_) => Some(Cow::Borrowed("(.+)")),
            Segment::Epsilon => None,
        }
    }

    /// Specificity score of this segment kind.
    pub fn score(&self) -> u8 {
        match self {
            Segment::Static(_) => 3,
            Segment::Dynamic(_) => 2,
            Segment::Glob(_) => 1,
            Segment::Epsilon => 0,
        }
    }

    /// Declaration-syntax text (`literal`, `:name`, `*name`; empty for epsilon).
    pub fn to_pattern(&self) -> String {
        match self {
            Segment::Static(literal) => literal.clone(),
            Segment::Dynamic(name) => format!(":{}", name),
            Segment::Glob(name) => format!("*{}", name),
            Segment::Epsilon => String::new(),
        }
    }
}
