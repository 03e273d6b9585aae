//! A small HTTP router with composable middleware.
//!
//! This library maps requests to handlers by method and path, supports
//! `:name` path parameters, groups routers under path prefixes and wraps
//! handlers in middleware chains.
//!
//! # Features
//!
//! - Exact and parameterized routes (`/users/:id`) per HTTP method
//! - Routers mounted under prefixes with longest-prefix dispatch
//! - Middleware at application, mount, path and route level
//! - Built-in logging, panic recovery, request ID, response time, CORS and
//!   rate limiting middleware
//! - A Tokio-based HTTP/1.1 server with keep-alive and connection limits
//!
//! # Examples
//!
//! ## Routing
//!
//! ```
//! use microrouter_rs::{App, Handler, HttpRequest, Method, ResponseWriter, Router};
//!
//! let mut users = Router::new();
//! users.get("/:id", |res: &mut ResponseWriter, req: &mut HttpRequest| {
//!     let id = req.param("id").unwrap_or_default().to_string();
//!     res.send_string(&format!("user {id}"));
//! });
//!
//! let mut app = App::new();
//! app.route("/users", users, &[]);
//!
//! let mut req = HttpRequest::new(Method::GET, "/users/42", Default::default(), Default::default());
//! let mut res = ResponseWriter::new();
//! app.serve(&mut res, &mut req);
//!
//! assert_eq!(res.body(), b"user 42");
//! ```
//!
//! ## Middleware
//!
//! ```
//! use microrouter_rs::{from_fn, Handler, HttpRequest, Method, ResponseWriter, Router};
//!
//! let mut router = Router::new();
//! router
//!     .use_middleware(from_fn(|res, req, next| {
//!         res.set_header("X-Powered-By", "microrouter-rs");
//!         next.serve(res, req);
//!     }))
//!     .get("/", |res: &mut ResponseWriter, _req: &mut HttpRequest| {
//!         res.send_string("home");
//!     });
//!
//! let mut req = HttpRequest::new(Method::GET, "/", Default::default(), Default::default());
//! let mut res = ResponseWriter::new();
//! router.serve(&mut res, &mut req);
//!
//! assert_eq!(res.get_header("X-Powered-By").unwrap(), "microrouter-rs");
//! ```
//!
//! ## Parsing
//!
//! ```
//! use microrouter_rs::{parse_request, ParserError};
//!
//! let request = parse_request(b"GET /search?q=rust HTTP/1.1\r\nHost: example.com\r\n\r\n").unwrap();
//! assert_eq!(request.path, "/search");
//! assert_eq!(request.get_query_param("q").unwrap(), "rust");
//!
//! match parse_request(b"INVALID /index.html HTTP/1.1\r\nHost: example.com\r\n\r\n") {
//!     Err(ParserError::InvalidMethod(method)) => assert_eq!(method, "INVALID"),
//!     other => panic!("unexpected result: {other:?}"),
//! }
//! ```
//!
//! See the `demos` directory for runnable servers.

pub mod parser;
pub mod server;
pub mod router;
pub mod middleware;

// Re-export commonly used items for convenience
pub use parser::{Error as ParserError, HttpRequest, HttpVersion, Method, parse_request};
pub use server::{
    send_error, send_error_string, BoxedHandler, Error as ServerError, Handler, HttpError, HttpResponse,
    HttpServer, ResponseWriter, ServerConfig, StatusCode,
};
pub use router::{chain_middleware, from_fn, App, HandlerBuilder, Middleware, RoutePattern, Router};
