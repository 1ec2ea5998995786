//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! routing and config produce:
//!     → tracing events with structured fields
//!       (bindings, collapses, misses, snapshot IO, engine swaps)
//!
//! logging.rs installs:
//!     → EnvFilter (RUST_LOG or configured level)
//!     → fmt layer (pretty or JSON) on stdout
//! ```
//!
//! # Design Decisions
//! - Library code only emits events; installing a subscriber is the
//!   embedding application's call
//! - Structured logging (JSON) for machine parsing

pub mod logging;

pub use logging::init_logging;
