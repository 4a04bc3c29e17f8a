//! Controller registry.
//!
//! Controllers are resolved through an explicit table registered at
//! startup: controller identifier → constructor. There is no runtime
//! string-to-type resolution; an identifier the table does not know is a
//! configuration-class failure.

use std::collections::HashMap;

use crate::dispatch::context::ActionContext;
use crate::dispatch::{DispatchError, Outcome};

/// A request handler grouping related actions.
///
/// The dispatcher hands over the action identifier from the route's
/// `Controller::action` reference; implementations select the action
/// themselves and return [`DispatchError::UnknownAction`] for one they do
/// not provide.
pub trait Controller: Send + Sync {
    fn call(&self, action: &str, ctx: &ActionContext<'_>) -> Result<Outcome, DispatchError>;
}

type ControllerFactory = Box<dyn Fn() -> Box<dyn Controller> + Send + Sync>;

/// Startup-registered table of controller constructors. A fresh controller
/// instance is built per dispatch, keeping the request model shared-nothing.
#[derive(Default)]
pub struct ControllerRegistry {
    factories: HashMap<String, ControllerFactory>,
}

impl ControllerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn() -> Box<dyn Controller> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Box::new(factory));
    }

    pub fn resolve(&self, name: &str) -> Option<Box<dyn Controller>> {
        self.factories.get(name).map(|factory| factory())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::context::RequestFormat;

    struct Probe;

    impl Controller for Probe {
        fn call(&self, action: &str, _ctx: &ActionContext<'_>) -> Result<Outcome, DispatchError> {
            Ok(Outcome::Body {
                content: format!("probe:{action}"),
                format: RequestFormat::Html,
            })
        }
    }

    #[test]
    fn test_register_and_resolve() {
        let mut registry = ControllerRegistry::new();
        registry.register("Probe", || Box::new(Probe));

        assert!(registry.contains("Probe"));
        assert!(registry.resolve("Probe").is_some());
        assert!(registry.resolve("Missing").is_none());
    }
}
