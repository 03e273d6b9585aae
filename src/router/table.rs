//! Route registration and single-request dispatch.

use std::collections::HashMap;
use std::sync::Arc;
use log::debug;

use crate::parser::{HttpRequest, Method};
use crate::router::chain::{chain_middleware, Middleware};
use crate::router::pattern::RoutePattern;
use crate::server::{BoxedHandler, Handler, ResponseWriter, StatusCode};

/// Maps (method, path template) pairs to middleware-wrapped handlers.
///
/// Middleware is captured when a route is registered: a middleware added with
/// [`use_middleware`](Self::use_middleware) only wraps routes registered after
/// it. Registration is expected to finish before the router starts serving;
/// dispatch only reads the route tables.
#[derive(Clone, Default)]
pub struct Router {
    routes: HashMap<Method, HashMap<String, BoxedHandler>>,
    // One pattern per template, in first-registration order
    patterns: Vec<RoutePattern>,
    middlewares: Vec<Middleware>,
    path_middlewares: HashMap<String, Vec<Middleware>>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `method` requests matching `path`.
    ///
    /// The handler is wrapped, outermost first, in the router's middleware,
    /// then any middleware added for this exact template with
    /// [`use_path`](Self::use_path), then `middlewares`. Registering the same
    /// method and template again replaces the earlier handler.
    pub fn handle(
        &mut self,
        method: Method,
        path: &str,
        handler: impl Handler + 'static,
        middlewares: &[Middleware],
    ) -> &mut Self {
        if !self.patterns.iter().any(|p| p.template() == path) {
            self.patterns.push(RoutePattern::compile(path));
        }

        let mut collection: Vec<Middleware> = self.middlewares.clone();
        if let Some(path_middlewares) = self.path_middlewares.get(path) {
            collection.extend(path_middlewares.iter().cloned());
        }
        collection.extend(middlewares.iter().cloned());

        let handler = chain_middleware(Arc::new(handler), &collection);
        self.routes
            .entry(method)
            .or_default()
            .insert(path.to_string(), handler);
        self
    }

    pub fn get(&mut self, path: &str, handler: impl Handler + 'static) -> &mut Self {
        self.handle(Method::GET, path, handler, &[])
    }

    pub fn post(&mut self, path: &str, handler: impl Handler + 'static) -> &mut Self {
        self.handle(Method::POST, path, handler, &[])
    }

    pub fn put(&mut self, path: &str, handler: impl Handler + 'static) -> &mut Self {
        self.handle(Method::PUT, path, handler, &[])
    }

    pub fn delete(&mut self, path: &str, handler: impl Handler + 'static) -> &mut Self {
        self.handle(Method::DELETE, path, handler, &[])
    }

    pub fn patch(&mut self, path: &str, handler: impl Handler + 'static) -> &mut Self {
        self.handle(Method::PATCH, path, handler, &[])
    }

    pub fn head(&mut self, path: &str, handler: impl Handler + 'static) -> &mut Self {
        self.handle(Method::HEAD, path, handler, &[])
    }

    pub fn options(&mut self, path: &str, handler: impl Handler + 'static) -> &mut Self {
        self.handle(Method::OPTIONS, path, handler, &[])
    }

    /// Add router-level middleware for routes registered from now on.
    pub fn use_middleware(&mut self, middleware: Middleware) -> &mut Self {
        self.middlewares.push(middleware);
        self
    }

    /// Add middleware for routes registered from now on at exactly `path`.
    pub fn use_path(&mut self, path: &str, middleware: Middleware) -> &mut Self {
        self.path_middlewares
            .entry(path.to_string())
            .or_default()
            .push(middleware);
        self
    }

    /// Every registered (method, template) pair, in template registration
    /// order.
    pub fn routes(&self) -> Vec<(Method, &str)> {
        self.patterns
            .iter()
            .flat_map(|pattern| {
                Method::ALL
                    .into_iter()
                    .filter(move |method| self.lookup(*method, pattern.template()).is_some())
                    .map(move |method| (method, pattern.template()))
            })
            .collect()
    }

    fn lookup(&self, method: Method, template: &str) -> Option<&BoxedHandler> {
        self.routes.get(&method)?.get(template)
    }
}

impl Handler for Router {
    /// Dispatch one request.
    ///
    /// An exact (method, path) registration always wins. Otherwise compiled
    /// templates are tried in registration order and the first one that both
    /// matches the path and has a handler for the method is invoked, with its
    /// captures in `req.params`. Anything else gets a plain-text 404.
    fn serve(&self, res: &mut ResponseWriter, req: &mut HttpRequest) {
        if let Some(handler) = self.lookup(req.method, &req.path) {
            req.params.clear();
            handler.serve(res, req);
            return;
        }

        for pattern in &self.patterns {
            let Some(params) = pattern.matches(&req.path) else {
                continue;
            };
            // A template registered only for other methods does not stop the search
            if let Some(handler) = self.lookup(req.method, pattern.template()) {
                req.params = params;
                handler.serve(res, req);
                return;
            }
        }

        debug!("No route for {method} {path}", method = req.method, path = req.path);
        res.status(StatusCode::NotFound)
            .set_header("Content-Type", "text/plain");
        res.send("404 Not Found");
    }
}
