//! Route recognition and generation.
//!
//! # Responsibilities
//! - Own the trie and the route name index
//! - Recognize a path: walk the NFA, rebuild every accepting chain, keep
//!   the most specific one
//! - Generate a path from a route name and its parameters
//! - Replay flattened routes (`add`)
//!
//! # Design Decisions
//! - A miss is `None`, never an error; generation failures are errors
//! - Parameters are extracted with one anchored pattern per candidate, and
//!   only for candidates that bind parameters
//! - Ties in specificity keep the first accepting state found
//! - Declaration needs `&mut self`; a published engine is read-only and can
//!   be shared across threads (see `shared.rs`)

use std::borrow::Cow;
use std::collections::{HashMap, VecDeque};

use regex::Regex;
use serde::Serialize;

use crate::config::schema::{RecognizerSettings, RouteConfig, RouterConfig};
use crate::routing::error::{RouterError, RouterResult};
use crate::routing::matcher::{AddRouteHook, FlatRoute, Matcher};
use crate::routing::node::{Node, NodeId, Trie};
use crate::routing::normalizer::{decode_component, decode_uri, encode_path_segment, normalize_path};
use crate::routing::query::{parse_query_string, stringify_query, QueryParams};
use crate::routing::results::{HandlerMatch, Params, RecognizeResults, Specificity};
use crate::routing::segment::{NodeKind, Segment};
use crate::routing::transition::{step, Input};

/// A handler of a named route and the parameters it receives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HandlerSpec {
    pub handler: String,
    pub param_names: Vec<String>,
}

/// The recognition engine.
#[derive(Debug, Clone, Default)]
pub struct Recognizer {
    pub(crate) trie: Trie,
    pub(crate) names: HashMap<String, NodeId>,
    pub(crate) settings: RecognizerSettings,
    pub(crate) handler_bindings: usize,
}

impl Recognizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: RecognizerSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    /// Build an engine from a configured route tree.
    pub fn from_config(config: &RouterConfig) -> RouterResult<Self> {
        let mut recognizer = Self::with_settings(config.recognizer.clone());
        recognizer.map(|m| declare_config_routes(m, &config.routes))?;
        tracing::info!(
            routes = recognizer.names.len(),
            nodes = recognizer.trie.len(),
            "Built recognizer from config"
        );
        Ok(recognizer)
    }

    pub fn settings(&self) -> &RecognizerSettings {
        &self.settings
    }

    pub fn root(&self) -> NodeId {
        Trie::ROOT
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.trie.get(id)
    }

    pub(crate) fn trie(&self) -> &Trie {
        &self.trie
    }

    /// Registered route names, sorted.
    pub fn route_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.names.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Declare routes through `block`, starting at the root.
    pub fn map<F>(&mut self, block: F) -> RouterResult<()>
    where
        F: FnOnce(&mut Matcher<'_>) -> RouterResult<()>,
    {
        let mut matcher = Matcher::new(self, None, Trie::ROOT);
        block(&mut matcher)
    }

    /// Like [`Recognizer::map`], calling `hook` after every handler binding
    /// with the flattened chain of the bound route.
    pub fn map_with_hook<H, F>(&mut self, hook: H, block: F) -> RouterResult<()>
    where
        H: FnMut(&mut Recognizer, &[FlatRoute]) -> RouterResult<()>,
        F: FnOnce(&mut Matcher<'_>) -> RouterResult<()>,
    {
        let mut hook = hook;
        let hook: &mut dyn AddRouteHook = &mut hook;
        let mut matcher = Matcher::new(self, Some(hook), Trie::ROOT);
        block(&mut matcher)
    }

    /// Replay flattened routes as successive nested declarations from the
    /// root, optionally naming the final node.
    pub fn add(&mut self, routes: &[FlatRoute], name: Option<&str>) -> NodeId {
        let mut leaf = Trie::ROOT;
        for route in routes {
            leaf = self.declare(leaf, &route.path);
            leaf = self.bind_handler(leaf, Some(route.handler.clone()));
        }
        if let Some(name) = name {
            self.names.insert(name.to_string(), leaf);
        }
        leaf
    }

    pub fn has_route(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    /// Handlers of the named route, root to leaf, with the parameter names
    /// each one receives.
    pub fn handlers_for(&self, name: &str) -> RouterResult<Vec<HandlerSpec>> {
        let leaf = self.lookup(name)?;
        let mut handlers: Vec<HandlerSpec> = Vec::new();

        for id in self.trie.ancestors(leaf).into_iter().rev() {
            let node = &self.trie[id];
            if let Some(handler) = node.handler() {
                handlers.push(HandlerSpec {
                    handler: handler.to_string(),
                    param_names: Vec::new(),
                });
            }
            if let (Some(param), Some(last)) = (node.segment().param_name(), handlers.last_mut()) {
                last.param_names.insert(0, param.to_string());
            }
        }

        handlers.reverse();
        Ok(handlers)
    }

    pub fn generate(&self, name: &str, params: &Params) -> RouterResult<String> {
        self.generate_with_query(name, params, &QueryParams::new())
    }

    /// Build the path of the named route, appending `query` when non-empty.
    pub fn generate_with_query(
        &self,
        name: &str,
        params: &Params,
        query: &QueryParams,
    ) -> RouterResult<String> {
        let leaf = self.lookup(name)?;
        let mut output = String::new();

        for id in self.trie.ancestors(leaf) {
            match self.trie[id].segment() {
                Segment::Static(literal) => {
                    output.push('/');
                    output.push_str(literal);
                }
                Segment::Dynamic(param) => {
                    let value = required_param(params, param)?;
                    output.push('/');
                    if self.settings.encode_and_decode_path_segments {
                        output.push_str(&encode_path_segment(value));
                    } else {
                        output.push_str(value);
                    }
                }
                Segment::Glob(param) => {
                    let value = required_param(params, param)?;
                    output.push('/');
                    output.push_str(value);
                }
                Segment::Epsilon => {}
            }
        }

        if !output.starts_with('/') {
            output.insert(0, '/');
        }

        let query = stringify_query(query);
        if !query.is_empty() {
            output.push('?');
            output.push_str(&query);
        }
        Ok(output)
    }

    /// Find the most specific handler chain for `path`.
    ///
    /// The fragment and query string are removed first, then one leading and
    /// one trailing slash. Parameters are extracted from the same normalized
    /// path the trie is walked with, so static segments compare equal on both
    /// passes.
    pub fn recognize(&self, path: &str) -> Option<RecognizeResults> {
        let path = path.split_once('#').map_or(path, |(path, _)| path);
        let (path, query_params) = match path.split_once('?') {
            Some((path, query)) => (path, parse_query_string(query)),
            None => (path, QueryParams::new()),
        };
        let path = path.strip_prefix('/').unwrap_or(path);
        let trimmed = path.strip_suffix('/').unwrap_or(path);

        let (lookup, original): (Cow<'_, str>, Cow<'_, str>) =
            if self.settings.encode_and_decode_path_segments {
                let lookup = normalize_path(trimmed);
                let mut original = lookup.clone();
                if trimmed.len() < path.len() {
                    original.push('/');
                }
                (Cow::Owned(lookup), Cow::Owned(original))
            } else {
                (decode_uri(trimmed), decode_uri(path))
            };

        let segments: Vec<&str> = if lookup.is_empty() {
            Vec::new()
        } else {
            lookup.split('/').collect()
        };

        let mut states = vec![Trie::ROOT];
        for &segment in &segments {
            states = step(&self.trie, &states, Input::Segment(segment));
            if states.is_empty() {
                tracing::debug!(path = %path, "No route matched");
                return None;
            }
        }

        let accepting = step(&self.trie, &states, Input::End);
        let mut best: Option<RecognizeResults> = None;
        for state in accepting {
            let Some(candidate) = self.process(state, &original, &query_params) else {
                continue;
            };
            best = match best {
                Some(current) if current.specificity >= candidate.specificity => Some(current),
                _ => Some(candidate),
            };
        }

        if best.is_none() {
            tracing::debug!(path = %path, "No route matched");
        }
        best
    }

    /// Append the segments of `pattern` under `leaf`, returning the new leaf.
    pub(crate) fn declare(&mut self, leaf: NodeId, pattern: &str) -> NodeId {
        let mut leaf = self.trie.resolve(leaf);
        let pattern = pattern.trim_matches('/');
        if pattern.is_empty() {
            return self.trie.append(leaf, Segment::Epsilon, None);
        }
        for raw in pattern.split('/') {
            leaf = self.trie.append(leaf, Segment::parse(raw), None);
        }
        leaf
    }

    /// Bind `handler` to `leaf` and keep the name index pointing at live nodes.
    ///
    /// An empty handler name counts as no handler.
    pub(crate) fn bind_handler(&mut self, leaf: NodeId, handler: Option<String>) -> NodeId {
        let handler = handler.filter(|handler| !handler.is_empty());
        let leaf = self.trie.resolve(leaf);
        let bound = self.trie.assign_handler(leaf, handler.clone());

        for id in self.names.values_mut() {
            *id = self.trie.resolve(*id);
        }

        if let Some(handler) = handler {
            self.handler_bindings += 1;
            tracing::debug!(handler = %handler, node = %bound, "Bound handler");
            self.names.entry(handler).or_insert(bound);
        }
        bound
    }

    fn lookup(&self, name: &str) -> RouterResult<NodeId> {
        self.names
            .get(name)
            .copied()
            .ok_or_else(|| RouterError::UnknownRoute(name.to_string()))
    }

    /// Rebuild the handler chain ending at `leaf` against `path`.
    fn process(&self, leaf: NodeId, path: &str, query_params: &QueryParams) -> Option<RecognizeResults> {
        let chain = self.trie.ancestors(leaf);

        let mut specificity = Specificity::default();
        for &id in &chain {
            let node = &self.trie[id];
            if node.kind() != NodeKind::Epsilon {
                specificity.score.push(char::from(b'0' + node.segment().score()));
            }
            specificity.segments += 1;
            if node.handler().is_some() {
                specificity.handlers += 1;
            }
        }

        let mut captures = self.extract_params(&chain, path)?;

        let mut entries: VecDeque<HandlerMatch> = VecDeque::new();
        for &id in chain.iter().rev() {
            let node = &self.trie[id];
            if let Some(handler) = node.handler() {
                entries.push_front(HandlerMatch {
                    handler: handler.to_string(),
                    params: Params::new(),
                    is_dynamic: false,
                });
            }

            let Some(param) = node.segment().param_name() else {
                continue;
            };
            let raw = captures.pop().unwrap_or_default();
            let value = if self.settings.encode_and_decode_path_segments
                && node.kind() == NodeKind::Dynamic
            {
                decode_component(&raw)
                    .map(Cow::into_owned)
                    .unwrap_or_else(|| raw.clone())
            } else {
                raw
            };
            if let Some(entry) = entries.front_mut() {
                entry.params.insert(param.to_string(), value);
                entry.is_dynamic = true;
            }
        }

        Some(RecognizeResults {
            entries: entries.into(),
            query_params: query_params.clone(),
            specificity,
        })
    }

    /// Capture groups of the chain's anchored pattern, in chain order.
    ///
    /// Chains without dynamic or glob segments capture nothing. `None` means
    /// the pattern did not match and the candidate is dropped.
    fn extract_params(&self, chain: &[NodeId], path: &str) -> Option<Vec<String>> {
        let binds_params = chain
            .iter()
            .any(|id| self.trie[*id].segment().param_name().is_some());
        if !binds_params {
            return Some(Vec::new());
        }

        let pattern = extraction_pattern(&self.trie, chain);
        let regex = match Regex::new(&pattern) {
            Ok(regex) => regex,
            Err(err) => {
                tracing::warn!(pattern = %pattern, error = %err, "Invalid extraction pattern");
                return None;
            }
        };

        let Some(found) = regex.captures(path) else {
            tracing::warn!(
                pattern = %pattern,
                path = %path,
                "Extraction pattern did not match, dropping candidate"
            );
            return None;
        };

        Some(
            found
                .iter()
                .skip(1)
                .map(|group| group.map(|m| m.as_str().to_string()).unwrap_or_default())
                .collect(),
        )
    }
}

/// `^` + non-epsilon fragments joined by `/` + optional trailing slash
/// (omitted after a glob terminal) + `$`.
fn extraction_pattern(trie: &Trie, chain: &[NodeId]) -> String {
    let fragments: Vec<Cow<'_, str>> = chain
        .iter()
        .filter_map(|id| trie[*id].segment().regex_fragment())
        .collect();
    let ends_in_glob = chain
        .last()
        .is_some_and(|id| trie[*id].kind() == NodeKind::Glob);
    let tail = if ends_in_glob { "" } else { "(?:/?)" };
    format!("^{}{}$", fragments.join("/"), tail)
}

fn required_param<'p>(params: &'p Params, name: &str) -> RouterResult<&'p str> {
    match params.get(name) {
        None => Err(RouterError::MissingParam(name.to_string())),
        Some(value) if value.is_empty() => Err(RouterError::EmptyParam(name.to_string())),
        Some(value) => Ok(value),
    }
}

fn declare_config_routes(m: &mut Matcher<'_>, routes: &[RouteConfig]) -> RouterResult<()> {
    for route in routes {
        let declared = m.route(&route.path);
        match (route.handler.as_deref(), route.children.is_empty()) {
            (Some(handler), true) => {
                declared.to(handler)?;
            }
            (Some(handler), false) => {
                declared.to_nested(handler, |m| declare_config_routes(m, &route.children))?;
            }
            (None, false) => {
                declared.nest(|m| declare_config_routes(m, &route.children))?;
            }
            (None, true) => {
                tracing::warn!(path = %route.path, "Configured route has no handler");
            }
        }
    }
    Ok(())
}
