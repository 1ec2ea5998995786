//! Shared, hot-swappable recognizer.
//!
//! # Design Decisions
//! - Readers load the current engine without locking
//! - A replacement is built off to the side and published in one atomic swap
//! - A failed reload keeps the engine that is currently published

use std::path::Path;
use std::sync::Arc;

use arc_swap::{ArcSwap, Guard};

use crate::config::loader::{load_config, ConfigError};
use crate::routing::error::{RouterError, SnapshotError};
use crate::routing::results::RecognizeResults;
use crate::routing::router::Recognizer;
use crate::routing::snapshot::Snapshot;

/// Why a reload was rejected.
#[derive(Debug, thiserror::Error)]
pub enum ReloadError {
    #[error("Failed to load config: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to declare routes: {0}")]
    Router(#[from] RouterError),

    #[error("Failed to restore snapshot: {0}")]
    Snapshot(#[from] SnapshotError),
}

/// A recognizer many threads can read while it is replaced.
#[derive(Debug)]
pub struct SharedRecognizer {
    current: ArcSwap<Recognizer>,
}

impl SharedRecognizer {
    pub fn new(recognizer: Recognizer) -> Self {
        Self {
            current: ArcSwap::from_pointee(recognizer),
        }
    }

    /// The published engine.
    pub fn load(&self) -> Guard<Arc<Recognizer>> {
        self.current.load()
    }

    pub fn recognize(&self, path: &str) -> Option<RecognizeResults> {
        self.current.load().recognize(path)
    }

    /// Publish `recognizer`, returning the engine it replaced.
    pub fn store(&self, recognizer: Recognizer) -> Arc<Recognizer> {
        let routes = recognizer.route_names().len();
        let previous = self.current.swap(Arc::new(recognizer));
        tracing::info!(routes, "Published recognizer");
        previous
    }

    /// Rebuild from a TOML config file and publish the result.
    pub fn reload_from_config(&self, path: impl AsRef<Path>) -> Result<(), ReloadError> {
        let path = path.as_ref();
        let rebuilt = load_config(path)
            .map_err(ReloadError::from)
            .and_then(|config| Recognizer::from_config(&config).map_err(ReloadError::from));
        self.publish(path, rebuilt)
    }

    /// Restore from a snapshot file and publish the result, keeping the
    /// current settings.
    pub fn reload_from_snapshot(&self, path: impl AsRef<Path>) -> Result<(), ReloadError> {
        let path = path.as_ref();
        let settings = self.current.load().settings().clone();
        let rebuilt = Snapshot::load_from_file(path)
            .and_then(|snapshot| Recognizer::from_snapshot_with(&snapshot, settings))
            .map_err(ReloadError::from);
        self.publish(path, rebuilt)
    }

    fn publish(&self, path: &Path, rebuilt: Result<Recognizer, ReloadError>) -> Result<(), ReloadError> {
        match rebuilt {
            Ok(recognizer) => {
                self.store(recognizer);
                Ok(())
            }
            Err(err) => {
                tracing::error!(
                    path = %path.display(),
                    error = %err,
                    "Reload failed, keeping current recognizer"
                );
                Err(err)
            }
        }
    }
}

impl Default for SharedRecognizer {
    fn default() -> Self {
        Self::new(Recognizer::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::thread;
    use tempfile::NamedTempFile;

    fn with_route(pattern: &str, handler: &str) -> Recognizer {
        let mut recognizer = Recognizer::new();
        recognizer
            .map(|m| {
                m.route(pattern).to(handler)?;
                Ok(())
            })
            .unwrap();
        recognizer
    }

    #[test]
    fn test_store_swaps_engine() {
        let shared = SharedRecognizer::new(with_route("/old", "old"));
        assert!(shared.recognize("/old").is_some());

        let previous = shared.store(with_route("/new", "new"));
        assert!(previous.recognize("/old").is_some());
        assert!(shared.recognize("/old").is_none());
        assert!(shared.recognize("/new").is_some());
    }

    #[test]
    fn test_concurrent_readers() {
        let shared = Arc::new(SharedRecognizer::new(with_route("/posts/:id", "showPost")));

        let readers: Vec<_> = (0..4)
            .map(|i| {
                let shared = Arc::clone(&shared);
                thread::spawn(move || {
                    let path = format!("/posts/{}", i);
                    let result = shared.recognize(&path).unwrap();
                    result[0].params["id"].clone()
                })
            })
            .collect();

        for (i, reader) in readers.into_iter().enumerate() {
            assert_eq!(reader.join().unwrap(), i.to_string());
        }
    }

    #[test]
    fn test_reload_from_snapshot() {
        let shared = SharedRecognizer::default();
        let file = NamedTempFile::new().unwrap();
        with_route("/hello", "hello")
            .to_snapshot()
            .save_to_file(file.path())
            .unwrap();

        shared.reload_from_snapshot(file.path()).unwrap();
        assert!(shared.recognize("/hello").is_some());
    }

    #[test]
    fn test_failed_reload_keeps_current() {
        let shared = SharedRecognizer::new(with_route("/kept", "kept"));
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();

        let err = shared.reload_from_snapshot(file.path()).unwrap_err();
        assert!(matches!(err, ReloadError::Snapshot(SnapshotError::Json(_))));
        assert!(shared.recognize("/kept").is_some());
    }

    #[test]
    fn test_reload_from_config() {
        let shared = SharedRecognizer::default();
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[[routes]]
path = "/posts/:id"
handler = "showPost"
"#
        )
        .unwrap();

        shared.reload_from_config(file.path()).unwrap();
        let result = shared.recognize("/posts/9").unwrap();
        assert_eq!(result[0].handler, "showPost");
    }
}
