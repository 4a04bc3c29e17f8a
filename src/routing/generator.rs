//! URL generation from the compiled table.
//!
//! The generator is built from the same artifact as the matcher, so the
//! two can never disagree about what a route's pattern looks like.

use std::collections::{BTreeMap, HashMap};

use regex::Regex;
use serde_json::Value;
use thiserror::Error;
use url::form_urlencoded;

use crate::routing::compiler::{self, CompileError, CompiledMatcher, CompiledRoute, Segment};
use crate::routing::context::RequestContext;

/// Failure to produce a URL. Typically hit inside template rendering, so
/// the caller decides whether this is loud (development) or degraded
/// (production); see `Router::generate_url`.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("no route named {name}")]
    UnknownRoute { name: String },

    #[error("route {route}: no value for required parameter {{{placeholder}}}")]
    MissingParameter { route: String, placeholder: String },

    #[error("route {route}: value {value:?} is not usable for {{{placeholder}}}")]
    InvalidParameter {
        route: String,
        placeholder: String,
        value: String,
    },

    #[error("no configured host named {host}")]
    UnknownHost { host: String },
}

struct GeneratorRoute {
    meta: CompiledRoute,
    segments: Vec<Segment>,
    /// Anchored requirement regexes, keyed by placeholder.
    constraints: HashMap<String, Regex>,
}

/// Reverses the compiled table: route name + parameters → concrete path.
pub struct UrlGenerator {
    routes: HashMap<String, GeneratorRoute>,
}

impl UrlGenerator {
    pub fn new(artifact: &CompiledMatcher) -> Result<Self, CompileError> {
        let mut routes = HashMap::with_capacity(artifact.routes.len());
        for meta in &artifact.routes {
            let segments = compiler::parse_pattern(&meta.name, &meta.path)?;
            let mut constraints = HashMap::new();
            for (placeholder, requirement) in &meta.requirements {
                let anchored = format!("^(?:{requirement})$");
                let regex = Regex::new(&anchored).map_err(|err| CompileError::Pattern {
                    route: meta.name.clone(),
                    message: err.to_string(),
                })?;
                constraints.insert(placeholder.clone(), regex);
            }
            routes.insert(
                meta.name.clone(),
                GeneratorRoute {
                    meta: meta.clone(),
                    segments,
                    constraints,
                },
            );
        }
        Ok(Self { routes })
    }

    /// Substitute `parameters` into the named route's pattern.
    ///
    /// Placeholders fall back to route defaults; a placeholder with
    /// neither is an error. Supplied parameters the pattern does not
    /// consume are appended as a query string, except those merely
    /// restating a route default (a match result fed back in reproduces
    /// the path it came from, nothing more).
    pub fn generate(
        &self,
        name: &str,
        parameters: &BTreeMap<String, Value>,
        absolute: bool,
        ctx: &RequestContext,
    ) -> Result<String, GenerationError> {
        let route = self.routes.get(name).ok_or_else(|| {
            GenerationError::UnknownRoute {
                name: name.to_string(),
            }
        })?;

        let mut path = String::new();
        for segment in &route.segments {
            match segment {
                Segment::Literal(text) => path.push_str(text),
                Segment::Placeholder(placeholder) => {
                    let value = parameters
                        .get(placeholder)
                        .or_else(|| route.meta.defaults.get(placeholder))
                        .ok_or_else(|| GenerationError::MissingParameter {
                            route: name.to_string(),
                            placeholder: placeholder.clone(),
                        })?;
                    let text = scalar_text(value).ok_or_else(|| {
                        GenerationError::InvalidParameter {
                            route: name.to_string(),
                            placeholder: placeholder.clone(),
                            value: value.to_string(),
                        }
                    })?;
                    if let Some(constraint) = route.constraints.get(placeholder) {
                        if !constraint.is_match(&text) {
                            return Err(GenerationError::InvalidParameter {
                                route: name.to_string(),
                                placeholder: placeholder.clone(),
                                value: text,
                            });
                        }
                    }
                    path.push_str(&text);
                }
            }
        }

        let query = self.leftover_query(route, parameters);
        if !query.is_empty() {
            path.push('?');
            path.push_str(&query);
        }

        if absolute {
            let scheme = route
                .meta
                .schemes
                .first()
                .map(String::as_str)
                .unwrap_or_else(|| ctx.scheme());
            let host = if route.meta.host.is_empty() {
                ctx.host()
            } else {
                route.meta.host.as_str()
            };
            return Ok(format!("{scheme}://{host}{path}"));
        }
        Ok(path)
    }

    fn leftover_query(
        &self,
        route: &GeneratorRoute,
        parameters: &BTreeMap<String, Value>,
    ) -> String {
        let consumed: Vec<&str> = route
            .segments
            .iter()
            .filter_map(|s| match s {
                Segment::Placeholder(p) => Some(p.as_str()),
                Segment::Literal(_) => None,
            })
            .collect();

        let mut serializer = form_urlencoded::Serializer::new(String::new());
        let mut any = false;
        for (key, value) in parameters {
            if key == "_route" || consumed.contains(&key.as_str()) {
                continue;
            }
            if route.meta.defaults.get(key) == Some(value) {
                continue;
            }
            let Some(text) = scalar_text(value) else {
                continue;
            };
            serializer.append_pair(key, &text);
            any = true;
        }
        if any {
            serializer.finish()
        } else {
            String::new()
        }
    }
}

/// Build an absolute URL against one of the configured named hosts
/// (`www`, `static`, ...).
pub fn external_url(
    hosts: &BTreeMap<String, String>,
    host: &str,
    path: &str,
    query: &[(&str, &str)],
    scheme: &str,
) -> Result<String, GenerationError> {
    let host_name = hosts.get(host).ok_or_else(|| GenerationError::UnknownHost {
        host: host.to_string(),
    })?;
    let mut out = format!("{scheme}://{host_name}{path}");
    if !query.is_empty() {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, value) in query {
            serializer.append_pair(key, value);
        }
        out.push('?');
        out.push_str(&serializer.finish());
    }
    Ok(out)
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}
