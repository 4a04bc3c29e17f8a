//! Parameters and request metadata handed to a controller action.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::routing::context::RequestContext;
use crate::routing::matcher::MatchResult;
use crate::routing::route::RESERVED_KEYS;

/// Response format negotiated for the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestFormat {
    #[default]
    Html,
    Json,
}

impl RequestFormat {
    /// A matched `_format` parameter wins; otherwise a path ending in
    /// `json` selects JSON.
    pub fn resolve(params: &BTreeMap<String, Value>, path: &str) -> Self {
        match params.get("_format").and_then(Value::as_str) {
            Some("json") => Self::Json,
            Some(_) => Self::Html,
            None if path.ends_with("json") => Self::Json,
            None => Self::Html,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Json => "json",
        }
    }
}

/// What an action sees: the matched route's merged parameters (reserved
/// keys stripped), the request snapshot, and the negotiated format.
pub struct ActionContext<'a> {
    route: String,
    params: BTreeMap<String, Value>,
    request: &'a RequestContext,
    format: RequestFormat,
}

impl<'a> ActionContext<'a> {
    pub fn new(result: &MatchResult, request: &'a RequestContext, format: RequestFormat) -> Self {
        let mut params = result.params.clone();
        for key in RESERVED_KEYS {
            params.remove(key);
        }
        Self {
            route: result.route.clone(),
            params,
            request,
            format,
        }
    }

    pub fn route(&self) -> &str {
        &self.route
    }

    pub fn params(&self) -> &BTreeMap<String, Value> {
        &self.params
    }

    /// A route parameter by name.
    pub fn param(&self, name: &str) -> Option<&Value> {
        self.params.get(name)
    }

    /// A route parameter, or the given fallback when absent.
    pub fn param_or(&self, name: &str, default: Value) -> Value {
        self.params.get(name).cloned().unwrap_or(default)
    }

    /// Convenience accessor for string-typed parameters.
    pub fn param_str(&self, name: &str) -> Option<&str> {
        self.params.get(name).and_then(Value::as_str)
    }

    pub fn request(&self) -> &RequestContext {
        self.request
    }

    pub fn format(&self) -> RequestFormat {
        self.format
    }
}
