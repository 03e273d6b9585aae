//! The application: a root router plus routers mounted under path prefixes.

use std::sync::Arc;
use log::{info, warn};

use crate::parser::HttpRequest;
use crate::router::chain::{chain_middleware, Middleware};
use crate::router::table::Router;
use crate::server::{BoxedHandler, Error, Handler, HttpServer, ResponseWriter, ServerConfig};

/// A router mounted under a path prefix, with its own middleware.
#[derive(Clone)]
struct Mount {
    prefix: String,
    router: Arc<Router>,
    middlewares: Vec<Middleware>,
    // `router` wrapped in app-level then mount-level middleware
    handler: BoxedHandler,
}

impl Mount {
    fn new(prefix: &str, router: Arc<Router>, middlewares: &[Middleware], app_middlewares: &[Middleware]) -> Self {
        let mut mount = Self {
            prefix: prefix.to_string(),
            handler: router.clone(),
            router,
            middlewares: middlewares.to_vec(),
        };
        mount.compose(app_middlewares);
        mount
    }

    fn compose(&mut self, app_middlewares: &[Middleware]) {
        let mut layers = app_middlewares.to_vec();
        layers.extend(self.middlewares.iter().cloned());
        let router: BoxedHandler = self.router.clone();
        self.handler = chain_middleware(router, &layers);
    }

    /// `path` belongs to this mount when it starts with the prefix at a
    /// segment boundary, so `/use` never claims `/users`.
    fn claims(&self, path: &str) -> bool {
        path.starts_with(&self.prefix)
            && (self.prefix == "/"
                || path.len() == self.prefix.len()
                || path.as_bytes()[self.prefix.len()] == b'/')
    }
}

/// Entry point of an application.
///
/// Requests are routed to the mounted router with the longest matching
/// prefix, with the prefix stripped from `req.path` for the duration of the
/// call. Requests no mount claims go to the root router. App-level middleware
/// wraps mount-level middleware, which wraps route middleware:
///
/// ```
/// use microrouter_rs::{App, Router, ResponseWriter, HttpRequest};
///
/// let mut users = Router::new();
/// users.get("/:id", |res: &mut ResponseWriter, req: &mut HttpRequest| {
///     let id = req.param("id").unwrap_or_default().to_string();
///     res.send_string(&id);
/// });
///
/// let mut app = App::new();
/// app.get("/", |res: &mut ResponseWriter, _req: &mut HttpRequest| {
///     res.send_string("home");
/// })
/// .route("/users", users, &[]);
/// ```
#[derive(Clone, Default)]
pub struct App {
    root: Arc<Router>,
    // Sorted by descending prefix length; equal lengths keep mount order
    mounts: Vec<Mount>,
    middlewares: Vec<Middleware>,
}

impl App {
    pub fn new() -> Self {
        Self::default()
    }

    /// The root router, for direct registration.
    pub fn router(&mut self) -> &mut Router {
        Arc::make_mut(&mut self.root)
    }

    /// Mount `router` under `prefix` with mount-scoped `middlewares`.
    ///
    /// An empty prefix mounts at `/`. Mounting at a prefix that is already
    /// taken replaces the earlier mount.
    pub fn route(
        &mut self,
        prefix: &str,
        router: impl Into<Arc<Router>>,
        middlewares: &[Middleware],
    ) -> &mut Self {
        let prefix = if prefix.is_empty() { "/" } else { prefix };
        let mount = Mount::new(prefix, router.into(), middlewares, &self.middlewares);

        if let Some(existing) = self.mounts.iter_mut().find(|m| m.prefix == prefix) {
            warn!("Router for path {prefix} already exists. Overwriting.");
            *existing = mount;
            return self;
        }

        let at = self
            .mounts
            .iter()
            .position(|m| m.prefix.len() < prefix.len())
            .unwrap_or(self.mounts.len());
        self.mounts.insert(at, mount);
        self
    }

    /// Add app-level middleware. It applies to every request, whether it is
    /// served by a mount or by the root router.
    pub fn use_middleware(&mut self, middleware: Middleware) -> &mut Self {
        self.middlewares.push(middleware);
        for mount in &mut self.mounts {
            mount.compose(&self.middlewares);
        }
        self
    }

    pub fn get(&mut self, path: &str, handler: impl Handler + 'static) -> &mut Self {
        self.router().get(path, handler);
        self
    }

    pub fn post(&mut self, path: &str, handler: impl Handler + 'static) -> &mut Self {
        self.router().post(path, handler);
        self
    }

    pub fn put(&mut self, path: &str, handler: impl Handler + 'static) -> &mut Self {
        self.router().put(path, handler);
        self
    }

    pub fn delete(&mut self, path: &str, handler: impl Handler + 'static) -> &mut Self {
        self.router().delete(path, handler);
        self
    }

    pub fn patch(&mut self, path: &str, handler: impl Handler + 'static) -> &mut Self {
        self.router().patch(path, handler);
        self
    }

    pub fn head(&mut self, path: &str, handler: impl Handler + 'static) -> &mut Self {
        self.router().head(path, handler);
        self
    }

    pub fn options(&mut self, path: &str, handler: impl Handler + 'static) -> &mut Self {
        self.router().options(path, handler);
        self
    }

    /// Mounted prefixes in the order they are tried.
    pub fn prefixes(&self) -> Vec<&str> {
        self.mounts.iter().map(|m| m.prefix.as_str()).collect()
    }

    fn log_routes(&self) {
        info!("Registered endpoints:");
        for (method, template) in self.root.routes() {
            info!("  {method} {template}");
        }
        for mount in &self.mounts {
            for (method, template) in mount.router.routes() {
                info!("  {method} {prefix}{template}", prefix = mount.prefix.trim_end_matches('/'));
            }
        }
    }

    /// Serve the application until Ctrl+C.
    pub async fn listen(self, config: ServerConfig) -> Result<(), Error> {
        self.log_routes();
        HttpServer::new(config, self).start().await
    }
}

impl Handler for App {
    fn serve(&self, res: &mut ResponseWriter, req: &mut HttpRequest) {
        let Some(mount) = self.mounts.iter().find(|m| m.claims(&req.path)) else {
            // The root router can still change through `router()`, so its
            // chain is folded per request
            let root: BoxedHandler = self.root.clone();
            chain_middleware(root, &self.middlewares).serve(res, req);
            return;
        };

        let original_path = req.path.clone();
        if mount.prefix != "/" {
            let rest = &original_path[mount.prefix.len()..];
            req.path = if rest.is_empty() { "/".to_string() } else { rest.to_string() };
        }

        mount.handler.serve(res, req);

        // Later logging should see the path the client asked for
        req.path = original_path;
    }
}
