//! HTTP parser module.
//!
//! Turns raw request bytes into an [`HttpRequest`] for the router. Framing
//! helpers ([`find_head_end`], [`content_length`]) are shared with the
//! transport so it knows when a full message has arrived.

mod request;
mod method;
mod version;
mod error;

// Re-export public items
pub use request::HttpRequest;
pub use method::Method;
pub use version::HttpVersion;
pub use error::Error;

pub use request::{content_length, find_head_end, parse_request};
