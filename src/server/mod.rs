//! HTTP server implementation for microrouter-rs.
//!
//! This module provides the response sink handed to handlers, the
//! [`Handler`] capability itself, and a tokio-based transport that parses
//! requests off TCP connections and dispatches them.

mod response;
mod writer;
mod config;
mod error;
mod handler;
mod http_server;

// Re-export public items
pub use response::{send_error, send_error_string, HttpError, HttpResponse, StatusCode};
pub use writer::ResponseWriter;
pub use config::ServerConfig;
pub use error::Error;
pub use handler::{BoxedHandler, Handler};
pub use http_server::HttpServer;
