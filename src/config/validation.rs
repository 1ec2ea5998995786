//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Reject route trees that would fail or silently do nothing at
//!   declaration time
//! - Validate the log level
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RouterConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use thiserror::Error;

use crate::config::schema::{RouteConfig, RouterConfig};

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("route `{path}` has an empty handler name")]
    EmptyHandler { path: String },

    #[error("route `{path}` has neither a handler nor children")]
    HandlerlessLeaf { path: String },

    #[error("children of route `{path}` bind no handler")]
    EmptyNestedBlock { path: String },

    #[error("route `{path}` has a parameter or glob segment without a name")]
    UnnamedParam { path: String },

    #[error("unknown log level `{0}`")]
    InvalidLogLevel(String),
}

/// Check `config`, collecting every problem found.
pub fn validate_config(config: &RouterConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if !LOG_LEVELS.contains(&config.observability.log_level.to_lowercase().as_str()) {
        errors.push(ValidationError::InvalidLogLevel(
            config.observability.log_level.clone(),
        ));
    }

    validate_routes(&config.routes, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_routes(routes: &[RouteConfig], errors: &mut Vec<ValidationError>) {
    for route in routes {
        let path = || route.path.clone();

        if route.handler.as_deref() == Some("") {
            errors.push(ValidationError::EmptyHandler { path: path() });
        }
        if route.handler.is_none() && route.children.is_empty() {
            errors.push(ValidationError::HandlerlessLeaf { path: path() });
        }
        if route.handler.is_none() && !route.children.is_empty() && !binds_handler(&route.children)
        {
            errors.push(ValidationError::EmptyNestedBlock { path: path() });
        }
        if route.path.split('/').any(|segment| segment == ":" || segment == "*") {
            errors.push(ValidationError::UnnamedParam { path: path() });
        }

        validate_routes(&route.children, errors);
    }
}

fn binds_handler(routes: &[RouteConfig]) -> bool {
    routes.iter().any(|route| {
        route.handler.as_deref().is_some_and(|handler| !handler.is_empty())
            || binds_handler(&route.children)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(path: &str, handler: Option<&str>, children: Vec<RouteConfig>) -> RouteConfig {
        RouteConfig {
            path: path.into(),
            handler: handler.map(str::to_string),
            children,
        }
    }

    #[test]
    fn test_valid_config() {
        let config = RouterConfig {
            routes: vec![route(
                "/posts",
                None,
                vec![route("/:id", Some("showPost"), vec![])],
            )],
            ..RouterConfig::default()
        };
        assert_eq!(validate_config(&config), Ok(()));
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = RouterConfig {
            routes: vec![
                route("/a/:", Some(""), vec![]),
                route("/b", None, vec![]),
                route("/c", Some("c"), vec![route("/d", None, vec![route("/e", None, vec![])])]),
            ],
            ..RouterConfig::default()
        };
        config.observability.log_level = "loud".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::InvalidLogLevel("loud".into()),
                ValidationError::EmptyHandler { path: "/a/:".into() },
                ValidationError::UnnamedParam { path: "/a/:".into() },
                ValidationError::HandlerlessLeaf { path: "/b".into() },
                ValidationError::EmptyNestedBlock { path: "/d".into() },
                ValidationError::HandlerlessLeaf { path: "/e".into() },
            ]
        );
    }
}
