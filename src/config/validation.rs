//! Route table validation.
//!
//! Semantic checks on the parsed table (serde handles syntactic ones).
//! Validation is a pure function over [`RouteFile`] and returns **all**
//! errors, not just the first: a broken table is fixed in one pass, not
//! one boot at a time. Any error here is fatal — the router must not serve
//! a table it could not fully validate.

use regex::Regex;
use serde_json::Value;
use thiserror::Error;

use crate::config::schema::{RawRoute, RouteFile};

/// A semantic defect in one route entry.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// `defaults.controller` is present but carries no `::` separator.
    #[error("route {route} has a controller but no action")]
    ControllerMissingAction { route: String },

    /// The methods list is empty.
    #[error("route {route} has no methods configured")]
    NoMethods { route: String },

    /// None of `controller`, `template` or `redirect` is declared.
    #[error("route {route} declares none of controller, template or redirect")]
    NoTarget { route: String },

    /// `defaults.redirect` is not a table with `path` and `status`.
    #[error("route {route} has a malformed redirect (needs path and status)")]
    MalformedRedirect { route: String },

    /// A reserved defaults key holds the wrong shape (e.g. a non-string
    /// controller).
    #[error("route {route}: {message}")]
    MalformedTarget { route: String, message: String },

    /// A placeholder requirement does not compile as a regex.
    #[error("route {route}: requirement for {{{placeholder}}} is not a valid regex: {message}")]
    BadRequirement {
        route: String,
        placeholder: String,
        message: String,
    },

    /// Two routes resolved to the same name.
    #[error("duplicate route name: {name}")]
    DuplicateName { name: String },
}

/// Human-readable label for a route in error messages: the explicit name
/// when present, otherwise its path.
pub fn route_label(raw: &RawRoute) -> String {
    match &raw.name {
        Some(name) => name.clone(),
        None if raw.path.is_empty() => "<unnamed>".to_string(),
        None => raw.path.clone(),
    }
}

/// Validate the whole table, collecting every defect.
pub fn validate(file: &RouteFile) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    for raw in &file.routes {
        check_route(raw, &mut errors);
    }

    let mut seen = std::collections::HashSet::new();
    for raw in &file.routes {
        if let Some(name) = &raw.name {
            if !seen.insert(name.clone()) {
                errors.push(ValidationError::DuplicateName { name: name.clone() });
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_route(raw: &RawRoute, errors: &mut Vec<ValidationError>) {
    let route = route_label(raw);

    if raw.methods.is_empty() {
        errors.push(ValidationError::NoMethods {
            route: route.clone(),
        });
    }

    match raw.defaults.get("controller") {
        Some(Value::String(spec)) => {
            match spec.split_once("::") {
                Some((controller, action)) if !controller.is_empty() && !action.is_empty() => {}
                _ => errors.push(ValidationError::ControllerMissingAction {
                    route: route.clone(),
                }),
            }
        }
        Some(_) => errors.push(ValidationError::MalformedTarget {
            route: route.clone(),
            message: "controller must be a string".to_string(),
        }),
        None => check_fallback_target(raw, &route, errors),
    }

    for (placeholder, requirement) in &raw.requirements {
        if let Err(err) = Regex::new(requirement) {
            errors.push(ValidationError::BadRequirement {
                route: route.clone(),
                placeholder: placeholder.clone(),
                message: err.to_string(),
            });
        }
    }
}

/// Controller-less routes must fall back to a template or redirect target.
/// Both forms are deprecated; they stay only for tables that predate
/// controller dispatch.
fn check_fallback_target(raw: &RawRoute, route: &str, errors: &mut Vec<ValidationError>) {
    match (raw.defaults.get("template"), raw.defaults.get("redirect")) {
        (Some(Value::String(_)), _) => {}
        (Some(_), _) => errors.push(ValidationError::MalformedTarget {
            route: route.to_string(),
            message: "template must be a string".to_string(),
        }),
        (None, Some(Value::Object(redirect))) => {
            let path_ok = matches!(redirect.get("path"), Some(Value::String(_)));
            let status_ok = matches!(redirect.get("status"), Some(Value::Number(n)) if n.is_u64());
            if !path_ok || !status_ok {
                errors.push(ValidationError::MalformedRedirect {
                    route: route.to_string(),
                });
            }
        }
        (None, Some(_)) => errors.push(ValidationError::MalformedRedirect {
            route: route.to_string(),
        }),
        (None, None) => errors.push(ValidationError::NoTarget {
            route: route.to_string(),
        }),
    }
}
