//! Shared utilities for integration testing.

use route_recognizer::routing::{HandlerMatch, Matcher, Params, RouterResult};
use route_recognizer::{Recognizer, Snapshot};

/// Rebuild `recognizer` from its JSON snapshot.
pub fn round_trip(recognizer: &Recognizer) -> Recognizer {
    let json = recognizer.to_snapshot().to_json().unwrap();
    let snapshot = Snapshot::from_json(&json).unwrap();
    Recognizer::from_snapshot_with(&snapshot, recognizer.settings().clone()).unwrap()
}

/// Declare `block` on a fresh engine and return it with its restored copy.
pub fn live_and_restored<F>(block: F) -> [Recognizer; 2]
where
    F: FnOnce(&mut Matcher<'_>) -> RouterResult<()>,
{
    let mut recognizer = Recognizer::new();
    recognizer.map(block).unwrap();
    let restored = round_trip(&recognizer);
    [recognizer, restored]
}

pub fn params(pairs: &[(&str, &str)]) -> Params {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

pub fn entry(handler: &str, pairs: &[(&str, &str)], is_dynamic: bool) -> HandlerMatch {
    HandlerMatch {
        handler: handler.to_string(),
        params: params(pairs),
        is_dynamic,
    }
}

/// Assert that `path` recognizes to exactly `expected` on every engine.
pub fn assert_matches(engines: &[Recognizer], path: &str, expected: &[HandlerMatch]) {
    for (i, recognizer) in engines.iter().enumerate() {
        let result = recognizer
            .recognize(path)
            .unwrap_or_else(|| panic!("engine {} did not recognize {}", i, path));
        assert_eq!(result.entries(), expected, "engine {} recognizing {}", i, path);
    }
}
