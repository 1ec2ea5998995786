//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Declaration (map / add / from_config):
//!     pattern string
//!     → matcher.rs (split, classify via segment.rs)
//!     → node.rs (append with dedup, late-binding fix-up on `to`)
//!     → name index updated
//!
//! Recognition:
//!     path string
//!     → router.rs (strip fragment, query via query.rs, slashes)
//!     → normalizer.rs (canonical lookup path)
//!     → transition.rs (NFA walk over the trie)
//!     → results.rs (rebuild each accepting chain, rank by specificity)
//!     → Return: Some(RecognizeResults) or None
//!
//! Generation:
//!     route name → ancestor chain → literal path (+ query string)
//!
//! Persistence:
//!     Recognizer ⇄ snapshot.rs (id-indexed node array, JSON)
//!     → shared.rs (atomic swap for concurrent readers)
//! ```
//!
//! # Design Decisions
//! - The trie is an arena; ids are indices and links are ids
//! - Deterministic: same declarations always build the same trie
//! - Most specific match wins; ties keep the first accepting state

pub mod error;
pub mod matcher;
pub mod node;
pub mod normalizer;
pub mod query;
pub mod results;
pub mod router;
pub mod segment;
pub mod shared;
pub mod snapshot;
pub mod transition;

pub use error::{RouterError, RouterResult, SnapshotError};
pub use matcher::{AddRouteHook, FlatRoute, Matcher, Route};
pub use node::{Node, NodeId};
pub use query::{parse_query_string, stringify_query, QueryParams, QueryValue};
pub use results::{HandlerMatch, Params, RecognizeResults, Specificity};
pub use router::{HandlerSpec, Recognizer};
pub use segment::{NodeKind, Segment};
pub use shared::{ReloadError, SharedRecognizer};
pub use snapshot::{NodeRecord, Snapshot};
