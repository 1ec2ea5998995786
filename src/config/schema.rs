//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from TOML files.

use serde::{Deserialize, Serialize};

/// Root configuration for a recognizer.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct RouterConfig {
    /// Recognition and generation behavior.
    pub recognizer: RecognizerSettings,

    /// Logging settings.
    pub observability: ObservabilityConfig,

    /// Route tree, declared in order from the root.
    pub routes: Vec<RouteConfig>,
}

/// Engine behavior switches.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct RecognizerSettings {
    /// Normalize lookup paths, decode dynamic parameters on recognition and
    /// percent-encode them on generation.
    pub encode_and_decode_path_segments: bool,
}

impl Default for RecognizerSettings {
    fn default() -> Self {
        Self {
            encode_and_decode_path_segments: true,
        }
    }
}

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable, for development.
    #[default]
    Pretty,
    /// One JSON object per line, for production.
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}

/// One declared pattern and the routes nested beneath it.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct RouteConfig {
    /// Slash-delimited pattern (`/posts/:id`, `/*path`, `/`).
    pub path: String,

    /// Handler bound to the pattern's terminal node.
    #[serde(default)]
    pub handler: Option<String>,

    /// Routes declared beneath this one.
    #[serde(default)]
    pub children: Vec<RouteConfig>,
}
