//! Cross-origin resource sharing headers.

use crate::parser::Method;
use crate::router::{from_fn, Middleware};
use crate::server::{ResponseWriter, StatusCode};
use crate::parser::HttpRequest;

const DEFAULT_ALLOWED_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";

/// Options for [`cors`].
#[derive(Debug, Clone, Default)]
pub struct CorsOptions {
    /// Allowed origins. Empty allows any origin (`*`).
    pub allowed_origins: Vec<String>,
    /// Allowed methods. Empty uses `GET, POST, PUT, DELETE, OPTIONS`.
    pub allowed_methods: Vec<String>,
    /// Allowed request headers. Empty echoes `Access-Control-Request-Headers`.
    pub allowed_headers: Vec<String>,
    /// `Access-Control-Max-Age` in seconds for preflight responses.
    pub preflight_max_age: Option<u32>,
    /// Pass preflight requests on to the inner handler instead of answering
    /// them directly.
    pub preflight_continue: bool,
    /// Send `Access-Control-Allow-Credentials: true`.
    pub credentials: bool,
}

impl CorsOptions {
    fn apply(&self, res: &mut ResponseWriter, req: &HttpRequest) {
        let origin = if self.allowed_origins.is_empty() {
            "*".to_string()
        } else {
            self.allowed_origins.join(", ")
        };
        res.set_header("Access-Control-Allow-Origin", origin);

        let methods = if self.allowed_methods.is_empty() {
            DEFAULT_ALLOWED_METHODS.to_string()
        } else {
            self.allowed_methods.join(", ")
        };
        res.set_header("Access-Control-Allow-Methods", methods);

        if self.allowed_headers.is_empty() {
            let requested = req
                .get_header("Access-Control-Request-Headers")
                .cloned()
                .unwrap_or_default();
            res.set_header("Access-Control-Allow-Headers", requested);
            res.set_header("Vary", "Access-Control-Request-Headers");
        } else {
            res.set_header("Access-Control-Allow-Headers", self.allowed_headers.join(", "));
        }

        if let Some(max_age) = self.preflight_max_age.filter(|age| *age > 0) {
            res.set_header("Access-Control-Max-Age", max_age.to_string());
        }

        if self.credentials {
            res.set_header("Access-Control-Allow-Credentials", "true");
        }
    }
}

/// Add CORS headers to every response and answer preflight requests.
pub fn cors(options: CorsOptions) -> Middleware {
    from_fn(move |res, req, next| {
        options.apply(res, req);

        let preflight = req.method == Method::OPTIONS
            && req.has_header("Access-Control-Request-Method");
        if preflight && !options.preflight_continue {
            res.status(StatusCode::Ok);
            res.send("OK");
            return;
        }

        next.serve(res, req);
    })
}
