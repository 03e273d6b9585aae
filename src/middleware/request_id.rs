//! Request ID generation.

use uuid::Uuid;

use crate::router::{from_fn, Middleware};

const DEFAULT_HEADER: &str = "X-Request-ID";

/// Options for [`request_id`].
#[derive(Debug, Clone, Default)]
pub struct RequestIdOptions {
    /// Response header carrying the ID. Defaults to `X-Request-ID`.
    pub header_name: Option<String>,
}

/// Tag every response with a fresh UUIDv4.
pub fn request_id(options: RequestIdOptions) -> Middleware {
    let header_name = options
        .header_name
        .unwrap_or_else(|| DEFAULT_HEADER.to_string());

    from_fn(move |res, req, next| {
        res.set_header(header_name.clone(), Uuid::new_v4().to_string());
        next.serve(res, req);
    })
}
