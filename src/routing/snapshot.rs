//! Snapshot export and restore of a compiled route table.
//!
//! # Format
//! ```text
//! {
//!   "names": { "helloworld": 1 },
//!   "rootState": 0,
//!   "nodes": [
//!     { "id": 0, "type": "epsilon" },
//!     { "id": 1, "type": "static", "value": "helloworld", "handler": "helloworld", "parent": 0 }
//!   ]
//! }
//! ```
//!
//! # Design Decisions
//! - Array index equals node id; nodes that lead to no route export as `null`
//! - A route is a named node or any node carrying a handler. A handler whose
//!   name was already taken by an earlier binding has no name entry, and
//!   keeping its ancestors is what lets a restored engine still recognize it
//! - Restore replays records in id order through the same `append` used at
//!   declaration time, so bucket structure matches a live build
//! - Inconsistent snapshots are rejected, never partially applied

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::schema::RecognizerSettings;
use crate::routing::error::SnapshotError;
use crate::routing::node::{Node, NodeId, Trie};
use crate::routing::router::Recognizer;
use crate::routing::segment::{NodeKind, Segment};

/// Serialized form of a recognizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub names: BTreeMap<String, usize>,
    #[serde(default)]
    pub root_state: usize,
    pub nodes: Vec<Option<NodeRecord>>,
}

/// One exported trie node. Empty fields are omitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: usize,
    #[serde(rename = "type", alias = "kind")]
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handler: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<usize>,
}

impl From<&Node> for NodeRecord {
    fn from(node: &Node) -> Self {
        Self {
            id: node.id().index(),
            kind: node.kind(),
            value: node.value().filter(|value| !value.is_empty()).map(str::to_string),
            handler: node.handler().map(str::to_string),
            parent: node.parent().map(NodeId::index),
        }
    }
}

impl Snapshot {
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), SnapshotError> {
        let path = path.as_ref();
        let file = File::create(path)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer(writer, self)?;
        tracing::info!(
            path = %path.display(),
            routes = self.names.len(),
            "Saved route snapshot"
        );
        Ok(())
    }

    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let snapshot: Snapshot = serde_json::from_reader(reader)?;
        tracing::info!(
            path = %path.display(),
            routes = snapshot.names.len(),
            "Loaded route snapshot"
        );
        Ok(snapshot)
    }
}

impl Recognizer {
    /// Export the nodes that lie on the path to a route.
    ///
    /// A route is a named node or a node carrying a handler; every other node
    /// is written as a hole so the remaining ids keep their positions.
    pub fn to_snapshot(&self) -> Snapshot {
        let mut live = vec![false; self.trie.len()];
        live[Trie::ROOT.index()] = true;

        let leaves = self
            .trie
            .iter()
            .filter(|node| !node.is_detached() && node.handler().is_some())
            .map(Node::id)
            .chain(self.names.values().copied());
        for leaf in leaves {
            for id in self.trie.ancestors(leaf) {
                live[id.index()] = true;
            }
        }

        let nodes = self
            .trie
            .iter()
            .map(|node| (live[node.id().index()] && !node.is_detached()).then(|| NodeRecord::from(node)))
            .collect();
        let names = self
            .names
            .iter()
            .map(|(name, id)| (name.clone(), id.index()))
            .collect();

        Snapshot {
            names,
            root_state: Trie::ROOT.index(),
            nodes,
        }
    }

    pub fn from_snapshot(snapshot: &Snapshot) -> Result<Self, SnapshotError> {
        Self::from_snapshot_with(snapshot, RecognizerSettings::default())
    }

    /// Rebuild an engine from `snapshot`.
    pub fn from_snapshot_with(
        snapshot: &Snapshot,
        settings: RecognizerSettings,
    ) -> Result<Self, SnapshotError> {
        if snapshot.root_state != Trie::ROOT.index() {
            return Err(SnapshotError::Invalid(format!(
                "root state must be 0, found {}",
                snapshot.root_state
            )));
        }

        let mut recognizer = Recognizer::with_settings(settings);
        let mut remap: Vec<Option<NodeId>> = vec![None; snapshot.nodes.len().max(1)];
        remap[0] = Some(Trie::ROOT);

        for (index, record) in snapshot.nodes.iter().enumerate() {
            let Some(record) = record else {
                continue;
            };
            if record.id != index {
                return Err(SnapshotError::Invalid(format!(
                    "node at index {} has id {}",
                    index, record.id
                )));
            }
            if index == Trie::ROOT.index() {
                if record.kind != NodeKind::Epsilon {
                    return Err(SnapshotError::Invalid(format!(
                        "root node must be epsilon, found {}",
                        record.kind
                    )));
                }
                continue;
            }

            let parent = match record.parent {
                Some(parent) if parent < index => remap[parent].ok_or_else(|| {
                    SnapshotError::Invalid(format!("node {} has missing parent {}", index, parent))
                })?,
                Some(parent) => {
                    return Err(SnapshotError::Invalid(format!(
                        "node {} has forward parent {}",
                        index, parent
                    )))
                }
                None => {
                    return Err(SnapshotError::Invalid(format!("node {} has no parent", index)))
                }
            };

            let segment = Segment::from_parts(record.kind, record.value.as_deref());
            let handler = record.handler.clone().filter(|handler| !handler.is_empty());
            if handler.is_some() {
                recognizer.handler_bindings += 1;
            }

            recognizer.trie.pad_to(index);
            remap[index] = Some(recognizer.trie.append(parent, segment, handler));
        }
        recognizer.trie.pad_to(snapshot.nodes.len());

        for (name, &index) in &snapshot.names {
            let id = remap.get(index).copied().flatten().ok_or_else(|| {
                SnapshotError::Invalid(format!("route `{}` points at missing node {}", name, index))
            })?;
            recognizer.names.insert(name.clone(), id);
        }

        tracing::debug!(
            nodes = snapshot.nodes.len(),
            routes = recognizer.names.len(),
            "Restored recognizer from snapshot"
        );
        Ok(recognizer)
    }
}
