//! Panic recovery.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use log::error;
use serde_json::json;

use crate::router::{from_fn, Middleware};
use crate::server::StatusCode;

/// Options for [`recovery`].
#[derive(Debug, Clone)]
pub struct RecoveryOptions {
    /// Whether to log the panic message.
    pub log: bool,
}

impl Default for RecoveryOptions {
    fn default() -> Self {
        Self { log: true }
    }
}

/// Turn a panic in any inner handler into a JSON 500 response.
///
/// The body the handler wrote before panicking is discarded; headers set so
/// far, such as those from outer CORS or request ID middleware, are kept.
/// Without this middleware a panicking handler takes down the task serving
/// its connection.
pub fn recovery(options: RecoveryOptions) -> Middleware {
    from_fn(move |res, req, next| {
        let outcome = catch_unwind(AssertUnwindSafe(|| next.serve(res, req)));
        if let Err(payload) = outcome {
            if options.log {
                error!(
                    "Panic recovered while serving {method} {path}: {message}",
                    method = req.method,
                    path = req.path,
                    message = panic_message(payload.as_ref())
                );
            }
            res.clear_body();
            let body = json!({ "error": "Internal Server Error" });
            if let Err(e) = res.json(StatusCode::InternalServerError, &body) {
                error!("Failed to write recovery response: {e}");
            }
        }
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "unknown panic payload"
    }
}
