//! The request-handling capability shared by handlers, routers and the app.

use std::sync::Arc;

use crate::parser::HttpRequest;
use crate::server::writer::ResponseWriter;

/// Anything that can answer a request.
///
/// Dispatch is synchronous: `serve` runs to completion and leaves exactly one
/// response in `res`. Plain closures, [`Router`](crate::Router) and
/// [`App`](crate::App) all implement it, so a router can be wrapped in
/// middleware or served directly.
pub trait Handler: Send + Sync {
    fn serve(&self, res: &mut ResponseWriter, req: &mut HttpRequest);
}

/// Type alias for a shared, type-erased handler.
pub type BoxedHandler = Arc<dyn Handler>;

impl<F> Handler for F
where
    F: Fn(&mut ResponseWriter, &mut HttpRequest) + Send + Sync,
{
    fn serve(&self, res: &mut ResponseWriter, req: &mut HttpRequest) {
        self(res, req)
    }
}
