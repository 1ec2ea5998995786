//! Segment-trie route recognizer.
//!
//! Recognizes which handler chain a path belongs to, generates paths from
//! route names, and persists compiled route tables as JSON snapshots.
//!
//! ```text
//!   declarations ──▶ routing::matcher ──▶ trie (routing::node)
//!                                            │
//!   path ──▶ routing::router::recognize ──▶ NFA walk ──▶ ranked handlers
//!   name ──▶ routing::router::generate  ──▶ ancestor chain ──▶ path
//!                                            │
//!                         routing::snapshot ◀┘ JSON ⇄ disk
//! ```

pub mod config;
pub mod observability;
pub mod routing;

pub use config::schema::RouterConfig;
pub use routing::{
    FlatRoute, HandlerMatch, Matcher, Params, QueryParams, QueryValue, RecognizeResults,
    Recognizer, RouterError, SharedRecognizer, Snapshot, SnapshotError,
};
