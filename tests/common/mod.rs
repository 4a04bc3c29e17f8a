//! Shared fixtures for integration tests.

use std::path::Path;

use ruta::cache::MemoryStore;
use ruta::config::RouterSettings;
use ruta::routing::{Method, RequestContext, ROUTES_FILE};

/// A representative application route table: controller routes with and
/// without placeholders, an anonymous legacy entry, a template route, a
/// redirect route and an IP-pinned route.
pub const TABLE: &str = r#"
    [[routes]]
    name = "home"
    path = "/"
    methods = ["GET"]
    defaults = { controller = "Home::indexAction" }

    [[routes]]
    name = "user_new"
    path = "/user/new"
    methods = ["GET"]
    defaults = { controller = "User::newAction" }

    [[routes]]
    name = "user"
    path = "/user/{id}"
    methods = ["GET"]
    defaults = { controller = "User::showAction" }
    requirements = { id = "\\d+" }

    [[routes]]
    path = "/contact"
    methods = ["GET", "POST"]
    defaults = { controller = "Contact::formAction" }

    [[routes]]
    name = "legal"
    path = "/legal"
    methods = ["GET"]
    defaults = { template = "static/legal.html" }

    [[routes]]
    name = "old_home"
    path = "/old-home"
    methods = ["GET"]
    [routes.defaults.redirect]
    path = "/"
    status = 301

    [[routes]]
    name = "ops"
    path = "/ops/status"
    methods = ["GET"]
    defaults = { controller = "Ops::statusAction", ip = "10.0.0.1" }
"#;

/// Write `table` as the route file inside `dir` and return settings
/// pointing at it.
pub fn workspace(dir: &Path, table: &str) -> RouterSettings {
    let config_dir = dir.join("config");
    let cache_dir = dir.join("cache");
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::write(config_dir.join(ROUTES_FILE), table).unwrap();

    let mut settings = RouterSettings::default();
    settings.paths.config_dir = config_dir;
    settings.paths.cache_dir = cache_dir;
    settings
}

pub fn store(settings: &RouterSettings) -> MemoryStore {
    MemoryStore::new(&settings.cache)
}

pub fn request(method: Method, path: &str) -> RequestContext {
    RequestContext::new(method, "http", "www.example.com", path)
}
