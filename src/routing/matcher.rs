//! Declaration API: patterns, handler binding and nested blocks.
//!
//! # Responsibilities
//! - Turn slash-delimited patterns into trie insertions under a leaf
//! - Bind handlers through the late-binding fix-up
//! - Run nested declaration blocks anchored at a bound leaf
//! - Report every completed binding to an optional add-route hook
//!
//! # Design Decisions
//! - A nested block must bind at least one handler, otherwise the whole
//!   declaration fails
//! - The hook sees each binding as a flattened `{path, handler}` list that
//!   `Recognizer::add` can replay; replays never reach the hook
//!
//! # Example
//! ```text
//! recognizer.map(|m| {
//!     m.route("/posts").to_nested("posts", |m| {
//!         m.route("/:id").to("showPost")?;
//!         Ok(())
//!     })?;
//!     Ok(())
//! })
//! ```

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::routing::error::{RouterError, RouterResult};
use crate::routing::node::{NodeId, Trie};
use crate::routing::router::Recognizer;
use crate::routing::segment::Segment;

/// One handler of a flattened route and the path leading to it from the
/// previous handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatRoute {
    pub path: String,
    pub handler: String,
}

impl FlatRoute {
    pub fn new(path: impl Into<String>, handler: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            handler: handler.into(),
        }
    }
}

/// Receives every handler binding made through `Recognizer::map_with_hook`.
pub trait AddRouteHook {
    fn on_add_route(&mut self, recognizer: &mut Recognizer, routes: &[FlatRoute]) -> RouterResult<()>;
}

impl<F> AddRouteHook for F
where
    F: FnMut(&mut Recognizer, &[FlatRoute]) -> RouterResult<()>,
{
    fn on_add_route(&mut self, recognizer: &mut Recognizer, routes: &[FlatRoute]) -> RouterResult<()> {
        self(recognizer, routes)
    }
}

/// Declaration handle anchored at one trie leaf.
pub struct Matcher<'a> {
    engine: &'a mut Recognizer,
    hook: Option<&'a mut dyn AddRouteHook>,
    leaf: NodeId,
}

impl<'a> Matcher<'a> {
    pub(crate) fn new(
        engine: &'a mut Recognizer,
        hook: Option<&'a mut dyn AddRouteHook>,
        leaf: NodeId,
    ) -> Self {
        Self { engine, hook, leaf }
    }

    /// Node that patterns declared through this matcher are appended under.
    pub fn leaf(&self) -> NodeId {
        self.leaf
    }

    /// Declare `pattern` under this matcher's leaf.
    ///
    /// The segments are inserted immediately; the returned [`Route`] binds a
    /// handler or opens a nested block.
    pub fn route(&mut self, pattern: &str) -> Route<'_, 'a> {
        let leaf = self.engine.declare(self.leaf, pattern);
        Route {
            matcher: self,
            leaf,
            pattern: pattern.to_string(),
        }
    }

    /// Declare `pattern` without a handler and nest `block` under it.
    pub fn nest<F>(&mut self, pattern: &str, block: F) -> RouterResult<NodeId>
    where
        F: FnOnce(&mut Matcher<'_>) -> RouterResult<()>,
    {
        self.route(pattern).nest(block)
    }

    fn bind(&mut self, leaf: NodeId, handler: Option<String>) -> RouterResult<NodeId> {
        let bound = self.engine.bind_handler(leaf, handler);
        let handled = self.engine.node(bound).and_then(|node| node.handler()).is_some();

        if handled {
            if let Some(hook) = self.hook.as_mut() {
                let routes = flatten_route(self.engine.trie(), bound);
                hook.on_add_route(self.engine, &routes)?;
            }
        }
        Ok(bound)
    }

    /// Run `block` under `leaf`. Without a handler at `leaf` the block must
    /// bind at least one.
    fn run_nested<F>(
        &mut self,
        leaf: NodeId,
        pattern: &str,
        handled: bool,
        block: F,
    ) -> RouterResult<NodeId>
    where
        F: FnOnce(&mut Matcher<'_>) -> RouterResult<()>,
    {
        let before = self.engine.handler_bindings;
        {
            let mut nested = Matcher {
                engine: &mut *self.engine,
                hook: reborrow(&mut self.hook),
                leaf,
            };
            block(&mut nested)?;
        }

        if !handled && self.engine.handler_bindings == before {
            return Err(RouterError::EmptyNestedBlock {
                pattern: pattern.to_string(),
            });
        }
        Ok(leaf)
    }
}

fn reborrow<'s>(hook: &'s mut Option<&mut dyn AddRouteHook>) -> Option<&'s mut dyn AddRouteHook> {
    match hook {
        Some(hook) => Some(&mut **hook),
        None => None,
    }
}

/// A declared pattern awaiting its handler or nested block.
pub struct Route<'m, 'a> {
    matcher: &'m mut Matcher<'a>,
    leaf: NodeId,
    pattern: String,
}

impl Route<'_, '_> {
    /// Terminal node of the declared pattern, before any handler fix-up.
    pub fn leaf(&self) -> NodeId {
        self.leaf
    }

    /// Bind `handler`, returning the node that carries it.
    pub fn to(self, handler: impl Into<String>) -> RouterResult<NodeId> {
        self.matcher.bind(self.leaf, Some(handler.into()))
    }

    /// Bind `handler` and declare `block` beneath it.
    pub fn to_nested<F>(self, handler: impl Into<String>, block: F) -> RouterResult<NodeId>
    where
        F: FnOnce(&mut Matcher<'_>) -> RouterResult<()>,
    {
        let bound = self.matcher.bind(self.leaf, Some(handler.into()))?;
        let handled = self
            .matcher
            .engine
            .node(bound)
            .and_then(|node| node.handler())
            .is_some();
        self.matcher.run_nested(bound, &self.pattern, handled, block)
    }

    /// Declare `block` beneath this pattern without binding a handler here.
    pub fn nest<F>(self, block: F) -> RouterResult<NodeId>
    where
        F: FnOnce(&mut Matcher<'_>) -> RouterResult<()>,
    {
        let bound = self.matcher.bind(self.leaf, None)?;
        self.matcher.run_nested(bound, &self.pattern, false, block)
    }
}

/// Rebuild the handler chain ending at `node` as replayable routes.
///
/// Each entry's path holds the segments between its handler and the previous
/// one; an entry reached only through epsilon segments gets `/`.
pub fn flatten_route(trie: &Trie, node: NodeId) -> Vec<FlatRoute> {
    let mut routes: VecDeque<FlatRoute> = VecDeque::new();

    for id in trie.ancestors(node).into_iter().rev() {
        let current = &trie[id];
        if let Some(handler) = current.handler() {
            routes.push_front(FlatRoute::new("", handler));
        }
        let Some(front) = routes.front_mut() else {
            continue;
        };
        match current.segment() {
            Segment::Epsilon => {
                if front.path.is_empty() {
                    front.path.push('/');
                }
            }
            segment => front.path.insert_str(0, &format!("/{}", segment.to_pattern())),
        }
    }

    routes.into()
}
