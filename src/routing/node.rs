//! Segment trie nodes and their insertion rules.
//!
//! # Responsibilities
//! - Own every node of one engine in an id-indexed arena
//! - Insert children into the right bucket, collapsing equivalent siblings
//! - Repair earlier collapses when a handler is bound late
//!
//! # Design Decisions
//! - Node ids are arena indices, allocated in creation order; parent links
//!   and the glob self-loop are plain ids, so there are no ownership cycles
//! - Two siblings in one bucket are equivalent when kind, value and handler
//!   all match; equivalent siblings never coexist
//! - Nodes removed by a merge stay in the arena as detached slots so ids are
//!   never reused
//! - Mutation happens only while declaring; a published trie is read-only

use std::collections::HashMap;
use std::fmt;
use std::ops::Index;

use crate::routing::segment::{NodeKind, Segment};

/// Stable identifier of a trie node within one engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Position of this node in the engine's id sequence.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Child buckets of a node, one per segment kind.
#[derive(Debug, Clone, Default)]
pub struct Children {
    statics: HashMap<String, Vec<NodeId>>,
    dynamics: Vec<NodeId>,
    globs: Vec<NodeId>,
    epsilons: Vec<NodeId>,
}

impl Children {
    /// Static children keyed by exactly this literal.
    pub fn statics(&self, literal: &str) -> &[NodeId] {
        self.statics.get(literal).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn dynamics(&self) -> &[NodeId] {
        &self.dynamics
    }

    /// Glob children; a glob node lists itself here.
    pub fn globs(&self) -> &[NodeId] {
        &self.globs
    }

    pub fn epsilons(&self) -> &[NodeId] {
        &self.epsilons
    }

    fn bucket(&self, segment: &Segment) -> &[NodeId] {
        match segment {
            Segment::Static(literal) => self.statics(literal),
            Segment::Dynamic(_) => &self.dynamics,
            Segment::Glob(_) => &self.globs,
            Segment::Epsilon => &self.epsilons,
        }
    }

    fn bucket_mut(&mut self, segment: &Segment) -> &mut Vec<NodeId> {
        match segment {
            Segment::Static(literal) => self.statics.entry(literal.clone()).or_default(),
            Segment::Dynamic(_) => &mut self.dynamics,
            Segment::Glob(_) => &mut self.globs,
            Segment::Epsilon => &mut self.epsilons,
        }
    }

    fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.statics
            .values()
            .flatten()
            .chain(&self.dynamics)
            .chain(&self.globs)
            .chain(&self.epsilons)
            .copied()
    }
}

/// One state of the segment trie.
#[derive(Debug, Clone)]
pub struct Node {
    id: NodeId,
    segment: Segment,
    handler: Option<String>,
    parent: Option<NodeId>,
    children: Children,
    collapsed: bool,
    detached: bool,
    merged_into: Option<NodeId>,
}

impl Node {
    fn new(id: NodeId, segment: Segment, handler: Option<String>, parent: Option<NodeId>) -> Self {
        let mut children = Children::default();
        if let Segment::Glob(_) = segment {
            // A glob keeps consuming segments by transitioning to itself.
            children.globs.push(id);
        }
        Self {
            id,
            segment,
            handler,
            parent,
            children,
            collapsed: false,
            detached: false,
            merged_into: None,
        }
    }

    fn placeholder(id: NodeId) -> Self {
        Self {
            detached: true,
            ..Self::new(id, Segment::Epsilon, None, None)
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn segment(&self) -> &Segment {
        &self.segment
    }

    pub fn kind(&self) -> NodeKind {
        self.segment.kind()
    }

    pub fn value(&self) -> Option<&str> {
        self.segment.value()
    }

    /// Handler bound to this node; accepting states carry one.
    pub fn handler(&self) -> Option<&str> {
        self.handler.as_deref()
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &Children {
        &self.children
    }

    /// True once another insertion has been collapsed into this node.
    pub fn is_collapsed(&self) -> bool {
        self.collapsed
    }

    /// True for slots that no longer belong to the trie.
    pub fn is_detached(&self) -> bool {
        self.detached
    }

    fn equivalent(&self, segment: &Segment, handler: Option<&str>) -> bool {
        self.segment == *segment && self.handler.as_deref() == handler
    }
}

/// Arena owning every node of one engine. Slot 0 is the epsilon root.
#[derive(Debug, Clone)]
pub struct Trie {
    nodes: Vec<Node>,
}

impl Default for Trie {
    fn default() -> Self {
        Self::new()
    }
}

impl Trie {
    pub const ROOT: NodeId = NodeId(0);

    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new(Self::ROOT, Segment::Epsilon, None, None)],
        }
    }

    /// Number of allocated ids, detached slots included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    /// Insert a child under `parent`, or return the equivalent sibling that
    /// already occupies the bucket.
    ///
    /// Every insertion takes an id. A collapsed insertion leaves its id as a
    /// detached slot, so numbering depends only on the declaration sequence.
    pub fn append(&mut self, parent: NodeId, segment: Segment, handler: Option<String>) -> NodeId {
        if let Some(existing) = self.find_equivalent(parent, &segment, handler.as_deref(), None) {
            let discarded = self.reserve();
            tracing::trace!(
                node = %existing,
                discarded = %discarded,
                kind = %segment.kind(),
                "Collapsed equivalent segment"
            );
            self.nodes[existing.0].collapsed = true;
            return existing;
        }

        let id = self.alloc(segment.clone(), handler, Some(parent));
        self.nodes[parent.0].children.bucket_mut(&segment).push(id);
        id
    }

    /// Bind `handler` to `node`, returning the node that now carries it.
    ///
    /// Two phases keep siblings unique after a late binding:
    /// 1. split: a collapse target whose handler changes is cloned into a
    ///    fresh sibling, and the clone receives the handler
    /// 2. merge: if the handled node now equals another sibling, it is
    ///    detached and that sibling is returned instead
    pub fn assign_handler(&mut self, node: NodeId, handler: Option<String>) -> NodeId {
        let mut target = node;

        let current = &self.nodes[node.0];
        if current.collapsed && current.handler != handler {
            if let Some(parent) = current.parent {
                let segment = current.segment.clone();
                let clone = self.alloc(segment.clone(), None, Some(parent));
                self.nodes[parent.0].children.bucket_mut(&segment).push(clone);
                tracing::trace!(node = %node, clone = %clone, "Split collapsed segment");
                target = clone;
            }
        }

        self.nodes[target.0].handler = handler;

        let Some(parent) = self.nodes[target.0].parent else {
            return target;
        };
        let segment = self.nodes[target.0].segment.clone();
        let handler = self.nodes[target.0].handler.clone();
        match self.find_equivalent(parent, &segment, handler.as_deref(), Some(target)) {
            Some(sibling) => {
                tracing::trace!(node = %target, into = %sibling, "Merged segment into sibling");
                self.nodes[parent.0]
                    .children
                    .bucket_mut(&segment)
                    .retain(|id| *id != target);
                self.detach(target, sibling);
                self.absorb(target, sibling);
                sibling
            }
            None => target,
        }
    }

    /// Follow merges from `id` to the node that survived them.
    pub fn resolve(&self, mut id: NodeId) -> NodeId {
        while let Some(next) = self.nodes[id.0].merged_into {
            id = next;
        }
        id
    }

    /// Ids from the root down to `node`, inclusive.
    pub fn ancestors(&self, node: NodeId) -> Vec<NodeId> {
        let mut chain = Vec::new();
        let mut current = Some(node);
        while let Some(id) = current {
            chain.push(id);
            current = self.nodes[id.0].parent;
        }
        chain.reverse();
        chain
    }

    /// Grow the arena with detached slots until `len` ids are allocated.
    pub(crate) fn pad_to(&mut self, len: usize) {
        while self.nodes.len() < len {
            self.reserve();
        }
    }

    fn reserve(&mut self) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::placeholder(id));
        id
    }

    fn alloc(&mut self, segment: Segment, handler: Option<String>, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(id, segment, handler, parent));
        id
    }

    fn find_equivalent(
        &self,
        parent: NodeId,
        segment: &Segment,
        handler: Option<&str>,
        exclude: Option<NodeId>,
    ) -> Option<NodeId> {
        self.nodes[parent.0]
            .children
            .bucket(segment)
            .iter()
            .copied()
            .filter(|id| Some(*id) != exclude)
            .find(|id| self.nodes[id.0].equivalent(segment, handler))
    }

    fn detach(&mut self, node: NodeId, survivor: NodeId) {
        let node = &mut self.nodes[node.0];
        node.detached = true;
        node.merged_into = Some(survivor);
    }

    /// Move the children of a detached node under `into`, merging any child
    /// that is equivalent to one already there.
    fn absorb(&mut self, from: NodeId, into: NodeId) {
        let children = std::mem::take(&mut self.nodes[from.0].children);
        for child in children.iter().filter(|id| *id != from) {
            let segment = self.nodes[child.0].segment.clone();
            let handler = self.nodes[child.0].handler.clone();
            match self.find_equivalent(into, &segment, handler.as_deref(), Some(child)) {
                Some(twin) => {
                    self.detach(child, twin);
                    self.absorb(child, twin);
                }
                None => {
                    self.nodes[child.0].parent = Some(into);
                    self.nodes[into.0].children.bucket_mut(&segment).push(child);
                }
            }
        }
    }
}

impl Index<NodeId> for Trie {
    type Output = Node;

    fn index(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stat(value: &str) -> Segment {
        Segment::Static(value.into())
    }

    #[test]
    fn test_root_is_epsilon() {
        let trie = Trie::new();
        assert_eq!(trie[Trie::ROOT].kind(), NodeKind::Epsilon);
        assert_eq!(trie[Trie::ROOT].parent(), None);
    }

    #[test]
    fn test_append_collapses_equivalent_static() {
        let mut trie = Trie::new();
        let parent = trie.append(Trie::ROOT, stat("parent"), None);
        let first = trie.append(parent, stat("child"), None);
        let second = trie.append(parent, stat("child"), None);

        assert_eq!(first, second);
        assert_eq!(trie[parent].children().statics("child"), &[first]);
        assert!(trie[first].is_collapsed());
        assert_eq!(trie.len(), 4);
        assert!(trie[NodeId(3)].is_detached());
    }

    #[test]
    fn test_ids_follow_declaration_sequence() {
        let mut trie = Trie::new();
        let posts = trie.append(Trie::ROOT, stat("posts"), None);
        let new = trie.append(posts, stat("new"), None);
        let again = trie.append(Trie::ROOT, stat("posts"), None);
        let id = trie.append(again, Segment::Dynamic("id".into()), None);

        assert_eq!(again, posts);
        assert_eq!((posts, new, id), (NodeId(1), NodeId(2), NodeId(4)));
        assert!(trie[NodeId(3)].is_detached());
        assert_eq!(trie[posts].children().statics("new"), &[new]);
        assert_eq!(trie[posts].children().dynamics(), &[id]);
    }

    #[test]
    fn test_append_collapses_every_kind() {
        for segment in [
            Segment::Dynamic("child".into()),
            Segment::Glob("child".into()),
            Segment::Epsilon,
        ] {
            let mut trie = Trie::new();
            let parent = trie.append(Trie::ROOT, stat("parent"), None);
            let first = trie.append(parent, segment.clone(), None);
            let second = trie.append(parent, segment.clone(), None);
            assert_eq!(first, second, "{:?}", segment);
        }
    }

    #[test]
    fn test_append_keeps_distinct_handlers_apart() {
        let mut trie = Trie::new();
        let first = trie.append(Trie::ROOT, stat("a"), Some("one".into()));
        let second = trie.append(Trie::ROOT, stat("a"), Some("two".into()));
        assert_ne!(first, second);
        assert_eq!(trie[Trie::ROOT].children().statics("a").len(), 2);
    }

    #[test]
    fn test_glob_references_itself() {
        let mut trie = Trie::new();
        let glob = trie.append(Trie::ROOT, Segment::Glob("globby".into()), None);
        assert_eq!(trie[glob].children().globs(), &[glob]);
    }

    #[test]
    fn test_late_binding_splits_collapsed_node() {
        let mut trie = Trie::new();
        let posts = trie.append(Trie::ROOT, stat("posts"), None);
        let first = trie.append(posts, stat("new"), None);
        let second = trie.append(posts, stat("new"), None);
        assert_eq!(first, second);

        let one = trie.assign_handler(first, Some("one".into()));
        let two = trie.assign_handler(second, Some("two".into()));

        assert_ne!(one, two);
        assert_eq!(trie[one].handler(), Some("one"));
        assert_eq!(trie[two].handler(), Some("two"));
        assert_eq!(trie[one].parent(), Some(posts));
        assert_eq!(trie[two].parent(), Some(posts));
    }

    #[test]
    fn test_late_binding_merges_into_equivalent_sibling() {
        let mut trie = Trie::new();
        let existing = trie.append(Trie::ROOT, stat("a"), Some("h".into()));
        let fresh = trie.append(Trie::ROOT, stat("a"), None);
        assert_ne!(existing, fresh);

        let bound = trie.assign_handler(fresh, Some("h".into()));

        assert_eq!(bound, existing);
        assert!(trie[fresh].is_detached());
        assert_eq!(trie[Trie::ROOT].children().statics("a"), &[existing]);
    }

    #[test]
    fn test_merge_moves_children_to_survivor() {
        let mut trie = Trie::new();
        let existing = trie.append(Trie::ROOT, stat("a"), Some("h".into()));
        let fresh = trie.append(Trie::ROOT, stat("a"), None);
        let child = trie.append(fresh, stat("b"), Some("b".into()));

        let bound = trie.assign_handler(fresh, Some("h".into()));

        assert_eq!(bound, existing);
        assert_eq!(trie[existing].children().statics("b"), &[child]);
        assert_eq!(trie[child].parent(), Some(existing));
    }

    #[test]
    fn test_merge_forwards_nested_twins() {
        let mut trie = Trie::new();
        let existing = trie.append(Trie::ROOT, stat("a"), Some("h".into()));
        let kept = trie.append(existing, stat("b"), Some("b".into()));
        let fresh = trie.append(Trie::ROOT, stat("a"), None);
        let twin = trie.append(fresh, stat("b"), Some("b".into()));

        trie.assign_handler(fresh, Some("h".into()));

        assert!(trie[twin].is_detached());
        assert_eq!(trie.resolve(twin), kept);
        assert_eq!(trie.resolve(fresh), existing);
        assert_eq!(trie[existing].children().statics("b"), &[kept]);
    }

    #[test]
    fn test_uncollapsed_binding_keeps_node() {
        let mut trie = Trie::new();
        let node = trie.append(Trie::ROOT, stat("a"), None);
        assert_eq!(trie.assign_handler(node, Some("h".into())), node);
        assert_eq!(trie[node].handler(), Some("h"));
    }

    #[test]
    fn test_ancestors_are_root_first() {
        let mut trie = Trie::new();
        let a = trie.append(Trie::ROOT, stat("a"), None);
        let b = trie.append(a, Segment::Dynamic("b".into()), None);
        assert_eq!(trie.ancestors(b), vec![Trie::ROOT, a, b]);
    }
}
