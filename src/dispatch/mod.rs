//! Dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! MatchResult (route, target, params)
//!     → IP allow-list check (403 on violation)
//!     → request-format resolution
//!     → target pattern match:
//!         Controller → registry lookup → action invocation
//!         Template   → template outcome (deprecated)
//!         Redirect   → redirect outcome (deprecated)
//!     → Outcome, rendered by the host layer
//! ```
//!
//! # Design Decisions
//! - Controllers come from an explicit registry, never from name-to-type
//!   resolution at runtime
//! - Template and redirect routes are tagged variants resolved by pattern
//!   matching, not presence checks on optional fields
//! - Forbidden is a recoverable outcome; unknown controllers, unknown
//!   actions and unsupported redirect statuses are configuration-class
//!   failures

pub mod context;
pub mod registry;

use serde_json::Value;
use thiserror::Error;

use crate::routing::context::RequestContext;
use crate::routing::matcher::MatchResult;
use crate::routing::route::RouteTarget;

pub use context::{ActionContext, RequestFormat};
pub use registry::{Controller, ControllerRegistry};

/// What a dispatched request produced. The host layer turns this into a
/// protocol response; the router never renders anything itself.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// A controller action's response body.
    Body {
        content: String,
        format: RequestFormat,
    },

    /// Render the named template directly (deprecated route form).
    Template { name: String },

    /// Redirect with one of the 300–308 statuses.
    Redirect { location: String, status: u16 },
}

#[derive(Debug, Error)]
pub enum DispatchError {
    /// The route's IP allow-list excludes the requester (HTTP 403).
    #[error("client {client} is not allowed on route {route}")]
    Forbidden { route: String, client: String },

    /// The registry has no controller under this identifier.
    #[error("unknown controller: {controller}")]
    UnknownController { controller: String },

    /// The controller does not provide the referenced action.
    #[error("controller {controller} has no action {action}")]
    UnknownAction { controller: String, action: String },

    /// A redirect route declared a status outside the 300–308 table.
    #[error("unsupported redirect status: {status}")]
    UnsupportedRedirectStatus { status: u16 },

    /// An action failed in a controller-specific way.
    #[error("action failed: {message}")]
    Action { message: String },
}

/// Canonical reason phrase for a supported redirect status.
pub fn redirect_reason(status: u16) -> Option<&'static str> {
    match status {
        300 => Some("Multiple Choices"),
        301 => Some("Moved Permanently"),
        302 => Some("Found"),
        303 => Some("See Other"),
        304 => Some("Not Modified"),
        305 => Some("Use Proxy"),
        306 => Some("Switch Proxy"),
        307 => Some("Temporary Redirect"),
        308 => Some("Permanent Redirect"),
        _ => None,
    }
}

/// Resolves a match result to an [`Outcome`] through the registry.
pub struct Dispatcher {
    registry: ControllerRegistry,
}

impl Dispatcher {
    pub fn new(registry: ControllerRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ControllerRegistry {
        &self.registry
    }

    pub fn dispatch(
        &self,
        result: &MatchResult,
        ctx: &RequestContext,
    ) -> Result<Outcome, DispatchError> {
        check_ip_allow_list(result, ctx)?;
        let format = RequestFormat::resolve(&result.params, ctx.path());

        match &result.target {
            RouteTarget::Controller { controller, action } => {
                let instance = self.registry.resolve(controller).ok_or_else(|| {
                    DispatchError::UnknownController {
                        controller: controller.clone(),
                    }
                })?;
                let action_ctx = ActionContext::new(result, ctx, format);
                tracing::debug!(
                    request_id = %ctx.request_id(),
                    route = %result.route,
                    controller = %controller,
                    action = %action,
                    "dispatching to controller"
                );
                instance.call(action, &action_ctx)
            }
            RouteTarget::Template { template } => {
                tracing::warn!(
                    route = %result.route,
                    template = %template,
                    "template route dispatched; declare a controller instead"
                );
                Ok(Outcome::Template {
                    name: template.clone(),
                })
            }
            RouteTarget::Redirect { path, status } => {
                if redirect_reason(*status).is_none() {
                    return Err(DispatchError::UnsupportedRedirectStatus { status: *status });
                }
                tracing::debug!(
                    route = %result.route,
                    location = %path,
                    status,
                    "redirect route dispatched"
                );
                Ok(Outcome::Redirect {
                    location: path.clone(),
                    status: *status,
                })
            }
        }
    }
}

/// A route may pin itself to specific client IPs via an `ip` default
/// (scalar or list). Requests without a verifiable client IP are refused
/// on such routes.
fn check_ip_allow_list(result: &MatchResult, ctx: &RequestContext) -> Result<(), DispatchError> {
    let allowed: Vec<&str> = match result.params.get("ip") {
        None => return Ok(()),
        Some(Value::String(ip)) => vec![ip.as_str()],
        Some(Value::Array(list)) => list.iter().filter_map(Value::as_str).collect(),
        Some(_) => Vec::new(),
    };

    let client = ctx.client_ip().map(|ip| ip.to_string());
    if let Some(client) = &client {
        if allowed.contains(&client.as_str()) {
            return Ok(());
        }
    }
    Err(DispatchError::Forbidden {
        route: result.route.clone(),
        client: client.unwrap_or_else(|| "unknown".to_string()),
    })
}
