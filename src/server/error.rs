//! Error types for the HTTP server.

use thiserror::Error;

use crate::parser::Error as ParserError;

/// Errors that can occur during HTTP server operation.
///
/// Routing failures are not errors: an unmatched request is answered with a
/// 404 response by the router itself.
#[derive(Debug, Error)]
pub enum Error {
    /// Error parsing an HTTP request.
    #[error("Parse error: {0}")]
    ParseError(#[from] ParserError),

    /// I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The declared request body exceeds the configured limit.
    #[error("Request body of {0} bytes exceeds the configured limit")]
    PayloadTooLarge(usize),

    /// The peer closed the connection in the middle of a request.
    #[error("Connection closed before the request was complete")]
    IncompleteRequest,

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}
