//! The response sink handed to every handler.

use std::collections::HashMap;
use serde::Serialize;

use crate::server::error::Error;
use crate::server::response::{HttpResponse, StatusCode};

/// Collects the status, headers and body a handler produces.
///
/// Output is buffered and only serialized by the transport after dispatch
/// returns, so middleware may still add headers once the inner handler has
/// sent a body. The status code is frozen by the first body write.
#[derive(Debug, Clone)]
pub struct ResponseWriter {
    status: StatusCode,
    headers: HashMap<String, String>,
    body: Vec<u8>,
    written: bool,
}

impl Default for ResponseWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseWriter {
    pub fn new() -> Self {
        Self {
            status: StatusCode::Ok,
            headers: HashMap::new(),
            body: Vec::new(),
            written: false,
        }
    }

    /// Set the status code. Has no effect once the body has been written.
    pub fn status(&mut self, status: StatusCode) -> &mut Self {
        if !self.written {
            self.status = status;
        }
        self
    }

    pub fn status_code(&self) -> StatusCode {
        self.status
    }

    /// Set a response header, replacing any previous value under the same
    /// name in any letter case.
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        let name = name.into();
        self.headers.retain(|k, _| !k.eq_ignore_ascii_case(&name));
        self.headers.insert(name, value.into());
        self
    }

    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HashMap<String, String> {
        &mut self.headers
    }

    /// Get a header value, comparing names case-insensitively.
    pub fn get_header(&self, name: &str) -> Option<&String> {
        self.headers
            .iter()
            .find_map(|(k, v)| k.eq_ignore_ascii_case(name).then_some(v))
    }

    /// Append data to the response body. Returns the number of bytes written.
    pub fn send(&mut self, data: impl AsRef<[u8]>) -> usize {
        let data = data.as_ref();
        self.written = true;
        self.body.extend_from_slice(data);
        data.len()
    }

    /// Append a string to the response body, defaulting the content type to
    /// plain text.
    pub fn send_string(&mut self, s: &str) -> usize {
        if self.get_header("Content-Type").is_none() {
            self.set_header("Content-Type", "text/plain; charset=utf-8");
        }
        self.send(s)
    }

    /// Serialize `value` as the JSON body with the given status.
    pub fn json<T: Serialize + ?Sized>(&mut self, status: StatusCode, value: &T) -> Result<(), Error> {
        let json = serde_json::to_vec(value)?;
        self.status(status).set_header("Content-Type", "application/json");
        self.send(json);
        Ok(())
    }

    /// Like [`json`](Self::json), but pretty-printed.
    pub fn json_pretty<T: Serialize + ?Sized>(&mut self, status: StatusCode, value: &T) -> Result<(), Error> {
        let json = serde_json::to_vec_pretty(value)?;
        self.status(status).set_header("Content-Type", "application/json");
        self.send(json);
        Ok(())
    }

    /// Whether any body bytes have been written.
    pub fn is_written(&self) -> bool {
        self.written
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Discard everything written so far.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Discard the body and status but keep the headers, so a replacement
    /// response can still be written.
    pub fn clear_body(&mut self) {
        self.body.clear();
        self.written = false;
        self.status = StatusCode::Ok;
    }

    /// Finish the response.
    pub fn into_response(self) -> HttpResponse {
        let response = self
            .headers
            .into_iter()
            .fold(HttpResponse::new(self.status), |response, (name, value)| response.with_header(name, value));
        response.with_body_bytes(self.body)
    }
}
