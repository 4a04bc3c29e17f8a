//! Request-to-route matching.
//!
//! The matcher walks the compiled table in declaration order and returns
//! the first route whose path, host, scheme and method all accept the
//! request. Declaration order is a first-class part of the contract:
//! operators order the table most-specific-first, and a tie always goes to
//! the earlier route.
//!
//! A route that matches everything except the HTTP method is remembered
//! and the scan continues; only when no later route fully matches does the
//! result become "method not allowed" rather than "not found".

use std::collections::BTreeMap;

use regex::Regex;
use serde_json::Value;
use thiserror::Error;

use crate::routing::compiler::{CompileError, CompiledMatcher, CompiledRoute};
use crate::routing::context::RequestContext;
use crate::routing::method::Method;
use crate::routing::route::RouteTarget;

/// Static-file extensions the router refuses outright; the web server's
/// static layer owns these, so a request that reaches us anyway is a 404
/// no matter what the table says.
pub const IGNORED_EXTENSIONS: &[&str] = &[
    "avi", "bmp", "css", "flv", "gif", "jpg", "js", "mov", "mp3", "mp4", "png", "rar", "swf",
    "wmv", "zip",
];

/// A successful match: the route's name, its dispatch target, and the
/// merged parameter map (route defaults overlaid with extracted path
/// parameters, plus `_route`). Consumed immediately by the dispatcher.
#[derive(Debug, Clone)]
pub struct MatchResult {
    pub route: String,
    pub target: RouteTarget,
    pub params: BTreeMap<String, Value>,
}

impl MatchResult {
    pub fn param(&self, name: &str) -> Option<&Value> {
        self.params.get(name)
    }
}

/// The two recoverable matching outcomes. These are results for the
/// caller to translate into protocol responses, not faults.
#[derive(Debug, Error)]
pub enum MatchError {
    /// No route accepted the path (HTTP 404 semantics).
    #[error("no route matches {method} {path}")]
    NotFound { method: Method, path: String },

    /// A route accepted the path but not the method (HTTP 405 semantics).
    #[error("{method} not allowed for {path}")]
    MethodNotAllowed {
        method: Method,
        path: String,
        /// Methods that would have been accepted, for the Allow header.
        allowed: Vec<Method>,
    },
}

struct ReadyRoute {
    meta: CompiledRoute,
    regex: Regex,
}

/// The runtime matcher: compiled routes with their regexes rebuilt.
pub struct UrlMatcher {
    routes: Vec<ReadyRoute>,
}

impl UrlMatcher {
    /// Rebuild the runtime regexes from an artifact. A regex that no
    /// longer compiles means the artifact was tampered with or truncated,
    /// which is fatal.
    pub fn new(artifact: &CompiledMatcher) -> Result<Self, CompileError> {
        let mut routes = Vec::with_capacity(artifact.routes.len());
        for meta in &artifact.routes {
            let regex = Regex::new(&meta.path_regex).map_err(|err| CompileError::Pattern {
                route: meta.name.clone(),
                message: err.to_string(),
            })?;
            routes.push(ReadyRoute {
                meta: meta.clone(),
                regex,
            });
        }
        Ok(Self { routes })
    }

    /// Match a path against the table.
    pub fn match_path(
        &self,
        path: &str,
        ctx: &RequestContext,
    ) -> Result<MatchResult, MatchError> {
        if let Some(ext) = static_extension(path) {
            tracing::debug!(path, extension = ext, "static extension, not routing");
            return Err(MatchError::NotFound {
                method: ctx.method(),
                path: path.to_string(),
            });
        }

        let mut allowed: Vec<Method> = Vec::new();

        for route in &self.routes {
            let Some(captures) = route.regex.captures(path) else {
                continue;
            };
            if !host_matches(&route.meta.host, ctx.host()) {
                continue;
            }
            if !scheme_matches(&route.meta.schemes, ctx.scheme()) {
                continue;
            }
            if !route.meta.methods.contains(&ctx.method()) {
                for method in &route.meta.methods {
                    if !allowed.contains(method) {
                        allowed.push(*method);
                    }
                }
                continue;
            }

            let mut params = route.meta.defaults.clone();
            for name in &route.meta.placeholders {
                if let Some(value) = captures.name(name) {
                    params.insert(name.clone(), Value::String(value.as_str().to_string()));
                }
            }
            params.insert(
                "_route".to_string(),
                Value::String(route.meta.name.clone()),
            );

            tracing::debug!(
                route = %route.meta.name,
                path,
                method = %ctx.method(),
                "route matched"
            );
            return Ok(MatchResult {
                route: route.meta.name.clone(),
                target: route.meta.target.clone(),
                params,
            });
        }

        if !allowed.is_empty() {
            return Err(MatchError::MethodNotAllowed {
                method: ctx.method(),
                path: path.to_string(),
                allowed,
            });
        }
        Err(MatchError::NotFound {
            method: ctx.method(),
            path: path.to_string(),
        })
    }
}

fn static_extension(path: &str) -> Option<&str> {
    let (_, ext) = path.rsplit_once('.')?;
    IGNORED_EXTENSIONS.contains(&ext).then_some(ext)
}

fn host_matches(route_host: &str, request_host: &str) -> bool {
    route_host.is_empty() || route_host.eq_ignore_ascii_case(request_host)
}

fn scheme_matches(route_schemes: &[String], request_scheme: &str) -> bool {
    route_schemes.is_empty() || route_schemes.iter().any(|s| s == request_scheme)
}
