//! Structured logging setup.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::environment::Environment;

/// Initialize the tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise production logs at `info` and every
/// other environment at `debug`. Safe to call more than once — later calls
/// are no-ops.
pub fn init(environment: Environment) {
    let default_level = if environment.is_production_like() {
        "info"
    } else {
        "debug"
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("ruta={default_level}")));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        init(Environment::Development);
        init(Environment::Production);
    }
}
