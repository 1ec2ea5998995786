//! NFA stepping over the segment trie.
//!
//! A state set is an ordered, duplicate-free list of node ids. Each input
//! first expands the set through epsilon children, then follows the
//! transitions that accept the input.

use crate::routing::node::{NodeId, Trie};

/// One symbol fed to the automaton.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input<'s> {
    /// A single `/`-free path segment.
    Segment(&'s str),
    /// End of path; keeps the states that accept.
    End,
}

/// Expand `states` with everything reachable through epsilon children.
///
/// Input order is preserved and newly reached states are appended.
pub fn epsilon_closure(trie: &Trie, states: &[NodeId]) -> Vec<NodeId> {
    let mut closure: Vec<NodeId> = Vec::with_capacity(states.len());
    for &state in states {
        push_unique(&mut closure, state);
    }

    let mut cursor = 0;
    while cursor < closure.len() {
        let state = closure[cursor];
        for &next in trie[state].children().epsilons() {
            push_unique(&mut closure, next);
        }
        cursor += 1;
    }
    closure
}

/// Advance a state set by one input.
pub fn step(trie: &Trie, states: &[NodeId], input: Input<'_>) -> Vec<NodeId> {
    let closure = epsilon_closure(trie, states);

    match input {
        Input::Segment(segment) => {
            let mut next = Vec::new();
            for state in closure {
                let children = trie[state].children();
                let targets = children
                    .statics(segment)
                    .iter()
                    .chain(children.dynamics())
                    .chain(children.globs());
                for &target in targets {
                    push_unique(&mut next, target);
                }
            }
            next
        }
        Input::End => closure
            .into_iter()
            .filter(|state| trie[*state].handler().is_some())
            .collect(),
    }
}

fn push_unique(states: &mut Vec<NodeId>, state: NodeId) {
    if !states.contains(&state) {
        states.push(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::segment::Segment;

    fn run(trie: &Trie, path: &[&str]) -> Vec<NodeId> {
        let mut states = vec![Trie::ROOT];
        for segment in path {
            states = step(trie, &states, Input::Segment(segment));
        }
        step(trie, &states, Input::End)
    }

    #[test]
    fn test_static_and_dynamic_both_reachable() {
        let mut trie = Trie::new();
        let posts = trie.append(Trie::ROOT, Segment::Static("posts".into()), None);
        let new = trie.append(posts, Segment::Static("new".into()), Some("new".into()));
        let show = trie.append(posts, Segment::Dynamic("id".into()), Some("show".into()));

        assert_eq!(run(&trie, &["posts", "new"]), vec![new, show]);
        assert_eq!(run(&trie, &["posts", "1"]), vec![show]);
        assert!(run(&trie, &["posts"]).is_empty());
    }

    #[test]
    fn test_glob_consumes_many_segments() {
        let mut trie = Trie::new();
        let glob = trie.append(Trie::ROOT, Segment::Glob("path".into()), Some("g".into()));
        assert_eq!(run(&trie, &["a"]), vec![glob]);
        assert_eq!(run(&trie, &["a", "b", "c"]), vec![glob]);
        assert!(run(&trie, &[]).is_empty());
    }

    #[test]
    fn test_epsilon_children_accept_without_input() {
        let mut trie = Trie::new();
        let posts = trie.append(Trie::ROOT, Segment::Static("posts".into()), None);
        let index = trie.append(posts, Segment::Epsilon, Some("index".into()));
        assert_eq!(run(&trie, &["posts"]), vec![index]);
    }

    #[test]
    fn test_closure_has_no_duplicates() {
        let mut trie = Trie::new();
        let a = trie.append(Trie::ROOT, Segment::Epsilon, None);
        let b = trie.append(a, Segment::Epsilon, Some("b".into()));
        let closure = epsilon_closure(&trie, &[Trie::ROOT, a]);
        assert_eq!(closure, vec![Trie::ROOT, a, b]);
    }
}
