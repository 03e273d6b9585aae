//! Request logging.

use std::time::Instant;
use log::info;

use crate::router::{from_fn, Middleware};

/// Log every request on entry and its duration on exit.
pub fn logger() -> Middleware {
    from_fn(|res, req, next| {
        let start = Instant::now();
        info!("[{method}] {path} {version}", method = req.method, path = req.path, version = req.version);
        next.serve(res, req);
        info!(
            "[{method}] {path} -> {status} completed in {elapsed:?}",
            method = req.method,
            path = req.path,
            status = res.status_code().as_u16(),
            elapsed = start.elapsed()
        );
    })
}
