//! Recognition result shape and candidate ranking.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::ops::Deref;

use serde::Serialize;

use crate::routing::query::QueryParams;

/// Parameter bindings, keyed by parameter name.
pub type Params = HashMap<String, String>;

/// One handler of a matched chain with the parameters bound below it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HandlerMatch {
    pub handler: String,
    pub params: Params,
    /// True when a dynamic or glob segment contributed to this entry.
    pub is_dynamic: bool,
}

/// Ranking key of one accepting state.
///
/// Ordered by the per-segment score digits read as a number, then by the
/// number of segments, then by the number of handlers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Specificity {
    pub score: String,
    pub segments: usize,
    pub handlers: usize,
}

impl Ord for Specificity {
    fn cmp(&self, other: &Self) -> Ordering {
        // Digit strings have no leading zeros, so length orders magnitude.
        self.score
            .len()
            .cmp(&other.score.len())
            .then_with(|| self.score.cmp(&other.score))
            .then_with(|| self.segments.cmp(&other.segments))
            .then_with(|| self.handlers.cmp(&other.handlers))
    }
}

impl PartialOrd for Specificity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Result of a successful `recognize`, root-to-leaf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecognizeResults {
    pub(crate) entries: Vec<HandlerMatch>,
    pub(crate) query_params: QueryParams,
    pub(crate) specificity: Specificity,
}

impl RecognizeResults {
    pub fn entries(&self) -> &[HandlerMatch] {
        &self.entries
    }

    pub fn query_params(&self) -> &QueryParams {
        &self.query_params
    }

    pub fn specificity(&self) -> &Specificity {
        &self.specificity
    }

    /// Handler names of the chain, root-to-leaf.
    pub fn handlers(&self) -> Vec<&str> {
        self.entries.iter().map(|entry| entry.handler.as_str()).collect()
    }
}

impl Deref for RecognizeResults {
    type Target = [HandlerMatch];

    fn deref(&self) -> &[HandlerMatch] {
        &self.entries
    }
}
