//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → RouterConfig (validated, immutable)
//!     → Recognizer::from_config (declares the route tree)
//!
//! On reload:
//!     SharedRecognizer::reload_from_config
//!     → loader.rs loads and validates
//!     → new Recognizer built off to the side
//!     → atomic swap of Arc<Recognizer>
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{LogFormat, ObservabilityConfig, RecognizerSettings, RouteConfig, RouterConfig};
pub use validation::ValidationError;
