//! Middleware composition.

use std::sync::Arc;

use crate::parser::HttpRequest;
use crate::server::{BoxedHandler, Handler, ResponseWriter};

/// A handler-to-handler transform.
///
/// A middleware receives the next handler in the chain and returns a handler
/// that wraps it. Each layer closes over its `next`.
pub type Middleware = Arc<dyn Fn(BoxedHandler) -> BoxedHandler + Send + Sync>;

/// Wrap a handler-to-handler closure as a [`Middleware`].
pub fn middleware<F>(f: F) -> Middleware
where
    F: Fn(BoxedHandler) -> BoxedHandler + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Build a middleware from a function that receives the next handler as an
/// argument.
///
/// ```
/// use microrouter_rs::{from_fn, Handler};
///
/// let powered_by = from_fn(|res, req, next| {
///     res.set_header("X-Powered-By", "microrouter-rs");
///     next.serve(res, req);
/// });
/// # let _ = powered_by;
/// ```
pub fn from_fn<F>(f: F) -> Middleware
where
    F: Fn(&mut ResponseWriter, &mut HttpRequest, &dyn Handler) + Send + Sync + 'static,
{
    let f = Arc::new(f);
    Arc::new(move |next: BoxedHandler| -> BoxedHandler {
        let f = f.clone();
        Arc::new(move |res: &mut ResponseWriter, req: &mut HttpRequest| f(res, req, next.as_ref()))
    })
}

/// Apply `middlewares` to `handler`. The first middleware in the slice ends
/// up outermost and runs first.
pub fn chain_middleware(handler: BoxedHandler, middlewares: &[Middleware]) -> BoxedHandler {
    middlewares
        .iter()
        .rev()
        .fold(handler, |next, middleware| middleware(next))
}

/// Fluent builder that wraps a single handler in middleware.
///
/// The first middleware passed to [`use_middleware`](Self::use_middleware)
/// is outermost.
pub struct HandlerBuilder {
    handler: BoxedHandler,
    middlewares: Vec<Middleware>,
}

impl HandlerBuilder {
    pub fn new(handler: impl Handler + 'static) -> Self {
        Self {
            handler: Arc::new(handler),
            middlewares: Vec::new(),
        }
    }

    /// Add a middleware layer inside the ones added so far.
    pub fn use_middleware(mut self, middleware: Middleware) -> Self {
        self.middlewares.push(middleware);
        self
    }

    /// Return the final handler with all middleware applied.
    pub fn build(self) -> BoxedHandler {
        chain_middleware(self.handler, &self.middlewares)
    }
}
