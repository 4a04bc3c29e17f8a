//! Typed routes and the ordered route collection.
//!
//! A [`Route`] is the validated form of a raw table entry. The dispatch
//! target is a tagged variant rather than a set of optional defaults keys:
//! a route is a controller route, a template route or a redirect route,
//! and the dispatcher resolves that by pattern matching.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::schema::{RawRoute, RouteFile};
use crate::config::validation::{self, ValidationError};
use crate::routing::method::Method;

/// Defaults keys consumed by the router itself; they never reach a
/// controller action as parameters.
pub const RESERVED_KEYS: [&str; 4] = ["_route", "controller", "redirect", "template"];

/// What a matched route dispatches to.
///
/// Template and redirect targets are deprecated carry-overs from tables
/// that predate controller dispatch; new routes declare a controller.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RouteTarget {
    Controller { controller: String, action: String },
    Template { template: String },
    Redirect { path: String, status: u16 },
}

/// A validated route.
#[derive(Debug, Clone)]
pub struct Route {
    pub name: String,
    /// Path pattern, normalized to a leading slash.
    pub path: String,
    pub target: RouteTarget,
    /// Plain defaults (reserved keys stripped).
    pub defaults: BTreeMap<String, Value>,
    pub requirements: BTreeMap<String, String>,
    /// Free-form options; retained for config compatibility, unused by
    /// the matcher.
    pub options: BTreeMap<String, Value>,
    /// Lowercased; empty matches any host.
    pub host: String,
    /// Lowercased; empty matches any scheme.
    pub schemes: Vec<String>,
    pub methods: Vec<Method>,
}

impl Route {
    /// Build a typed route from a validated raw entry.
    ///
    /// Defects are still surfaced as errors rather than assumed away, so
    /// the conversion is total even on an unvalidated entry.
    pub fn from_raw(raw: &RawRoute) -> Result<Self, ValidationError> {
        let label = validation::route_label(raw);
        let target = resolve_target(raw, &label)?;

        let mut defaults = raw.defaults.clone();
        for key in RESERVED_KEYS {
            defaults.remove(key);
        }

        let path = normalize_path(&raw.path);
        let name = match &raw.name {
            Some(name) => name.clone(),
            None => synthesized_name(&path, &target, &raw.methods),
        };

        Ok(Self {
            name,
            path,
            target,
            defaults,
            requirements: raw.requirements.clone(),
            options: raw.options.clone(),
            host: raw.host.to_lowercase(),
            schemes: raw.schemes.iter().map(|s| s.to_lowercase()).collect(),
            methods: raw.methods.clone(),
        })
    }
}

fn resolve_target(raw: &RawRoute, label: &str) -> Result<RouteTarget, ValidationError> {
    if let Some(value) = raw.defaults.get("controller") {
        let spec = value
            .as_str()
            .ok_or_else(|| ValidationError::MalformedTarget {
                route: label.to_string(),
                message: "controller must be a string".to_string(),
            })?;
        return match spec.split_once("::") {
            Some((controller, action)) if !controller.is_empty() && !action.is_empty() => {
                Ok(RouteTarget::Controller {
                    controller: controller.to_string(),
                    action: action.to_string(),
                })
            }
            _ => Err(ValidationError::ControllerMissingAction {
                route: label.to_string(),
            }),
        };
    }

    if let Some(value) = raw.defaults.get("template") {
        let template = value
            .as_str()
            .ok_or_else(|| ValidationError::MalformedTarget {
                route: label.to_string(),
                message: "template must be a string".to_string(),
            })?;
        return Ok(RouteTarget::Template {
            template: template.to_string(),
        });
    }

    if let Some(value) = raw.defaults.get("redirect") {
        let malformed = || ValidationError::MalformedRedirect {
            route: label.to_string(),
        };
        let redirect = value.as_object().ok_or_else(malformed)?;
        let path = redirect
            .get("path")
            .and_then(Value::as_str)
            .ok_or_else(malformed)?;
        let status = redirect
            .get("status")
            .and_then(Value::as_u64)
            .ok_or_else(malformed)?;
        let status = u16::try_from(status).map_err(|_| malformed())?;
        return Ok(RouteTarget::Redirect {
            path: path.to_string(),
            status,
        });
    }

    Err(ValidationError::NoTarget {
        route: label.to_string(),
    })
}

fn normalize_path(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}

/// Deterministic name for an anonymous legacy entry, so URL generation
/// works for it too.
fn synthesized_name(path: &str, target: &RouteTarget, methods: &[Method]) -> String {
    let joined_methods = methods
        .iter()
        .map(|m| m.as_str())
        .collect::<Vec<_>>()
        .join("_");
    let name = match target {
        RouteTarget::Controller { controller, action } => {
            format!("controller_{controller}_{action}_{joined_methods}")
        }
        RouteTarget::Redirect { path, status } => format!("redirect_{status}_{path}"),
        RouteTarget::Template { .. } => format!("path_{path}"),
    };
    sanitize(&name)
}

/// Lowercase token sequence joined by underscores.
fn sanitize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_was_glue = true;
    for ch in text.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch.to_ascii_lowercase());
            last_was_glue = false;
        } else if !last_was_glue {
            out.push('_');
            last_was_glue = true;
        }
    }
    if out.ends_with('_') {
        out.pop();
    }
    out
}

/// Insertion-ordered set of routes. Matching walks routes in the order
/// they were added; operators order the table most-specific-first.
#[derive(Debug, Clone, Default)]
pub struct RouteCollection {
    routes: Vec<Route>,
    index: HashMap<String, usize>,
}

impl RouteCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convert a parsed table, collecting every defect. Run
    /// [`validation::validate`] first for the full semantic check set;
    /// this still refuses structurally broken entries on its own.
    pub fn from_file(file: &RouteFile) -> Result<Self, Vec<ValidationError>> {
        let mut collection = Self::new();
        let mut errors = Vec::new();

        for raw in &file.routes {
            match Route::from_raw(raw) {
                Ok(route) => {
                    if let Err(err) = collection.add(route) {
                        errors.push(err);
                    }
                }
                Err(err) => errors.push(err),
            }
        }

        if errors.is_empty() {
            Ok(collection)
        } else {
            Err(errors)
        }
    }

    /// Append a route; the position it lands in is its match precedence.
    pub fn add(&mut self, route: Route) -> Result<(), ValidationError> {
        if self.index.contains_key(&route.name) {
            return Err(ValidationError::DuplicateName {
                name: route.name.clone(),
            });
        }
        self.index.insert(route.name.clone(), self.routes.len());
        self.routes.push(route);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Route> {
        self.index.get(name).map(|&i| &self.routes[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::RouteFile;

    fn collection(raw: &str) -> RouteCollection {
        let file: RouteFile = toml::from_str(raw).unwrap();
        RouteCollection::from_file(&file).unwrap()
    }

    #[test]
    fn test_controller_target_is_split() {
        let routes = collection(
            r#"
            [[routes]]
            name = "home"
            path = "/"
            methods = ["GET"]
            defaults = { controller = "Home::indexAction" }
        "#,
        );
        let route = routes.get("home").unwrap();
        assert_eq!(
            route.target,
            RouteTarget::Controller {
                controller: "Home".to_string(),
                action: "indexAction".to_string(),
            }
        );
    }

    #[test]
    fn test_reserved_keys_are_stripped_from_defaults() {
        let routes = collection(
            r#"
            [[routes]]
            name = "listing"
            path = "/cars"
            methods = ["GET"]
            defaults = { controller = "Car::listAction", page = 1 }
        "#,
        );
        let route = routes.get("listing").unwrap();
        assert!(route.defaults.get("controller").is_none());
        assert_eq!(route.defaults.get("page"), Some(&Value::from(1)));
    }

    #[test]
    fn test_anonymous_controller_route_gets_synthesized_name() {
        let routes = collection(
            r#"
            [[routes]]
            path = "/contact"
            methods = ["GET", "POST"]
            defaults = { controller = "Contact::formAction" }
        "#,
        );
        assert!(routes.get("controller_contact_formaction_get_post").is_some());
    }

    #[test]
    fn test_anonymous_redirect_route_gets_synthesized_name() {
        let routes = collection(
            r#"
            [[routes]]
            path = "/old-home"
            methods = ["GET"]
            [routes.defaults.redirect]
            path = "/new-home"
            status = 301
        "#,
        );
        assert!(routes.get("redirect_301_new_home").is_some());
    }

    #[test]
    fn test_declaration_order_is_preserved() {
        let routes = collection(
            r#"
            [[routes]]
            name = "zebra"
            path = "/z"
            methods = ["GET"]
            defaults = { controller = "Z::indexAction" }

            [[routes]]
            name = "alpha"
            path = "/a"
            methods = ["GET"]
            defaults = { controller = "A::indexAction" }
        "#,
        );
        let names: Vec<_> = routes.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["zebra", "alpha"]);
    }

    #[test]
    fn test_path_is_normalized_to_leading_slash() {
        let routes = collection(
            r#"
            [[routes]]
            name = "bare"
            path = "bare"
            methods = ["GET"]
            defaults = { controller = "Bare::indexAction" }
        "#,
        );
        assert_eq!(routes.get("bare").unwrap().path, "/bare");
    }

    #[test]
    fn test_sanitize_collapses_symbols() {
        assert_eq!(sanitize("redirect_301_/new-home/"), "redirect_301_new_home");
        assert_eq!(sanitize("Controller_Home_indexAction_GET"), "controller_home_indexaction_get");
    }
}
