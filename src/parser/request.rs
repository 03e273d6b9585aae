//! HTTP request parsing and representation.

use std::collections::HashMap;
use std::str::FromStr;
use serde::de::DeserializeOwned;

use crate::parser::error::Error;
use crate::parser::method::Method;
use crate::parser::version::HttpVersion;

/// Represents an HTTP request.
///
/// The router fills `params` while dispatching; everything else is produced by
/// [`parse_request`] (or by the transport, in the case of `client_ip`).
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// The HTTP method (GET, POST, etc.)
    pub method: Method,
    /// The request path, without the query string
    pub path: String,
    /// The HTTP version
    pub version: HttpVersion,
    /// The HTTP headers
    pub headers: HashMap<String, String>,
    /// The request body
    pub body: Vec<u8>,
    /// Route parameters captured by the router (e.g. `id` for `/users/:id`)
    pub params: HashMap<String, String>,
    /// Query parameters parsed from the request target
    pub query_params: HashMap<String, String>,
    /// Address of the peer that sent the request, empty when unknown
    pub client_ip: String,
}

impl HttpRequest {
    /// Create a new HTTP request.
    ///
    /// `target` is the request target as it appears on the request line; any
    /// query string is split off into `query_params` and `path` keeps only the
    /// part before `?`.
    pub fn new(method: Method, target: impl Into<String>, version: HttpVersion, headers: HashMap<String, String>) -> Self {
        let target = target.into();
        let (path, query_params) = match target.split_once('?') {
            Some((path, query)) => (path.to_string(), parse_query(query)),
            None => (target, HashMap::new()),
        };

        Self {
            method,
            path,
            version,
            headers,
            body: Vec::new(),
            params: HashMap::new(),
            query_params,
            client_ip: String::new(),
        }
    }

    /// Create a new HTTP request with a body.
    pub fn with_body(method: Method, target: impl Into<String>, version: HttpVersion, headers: HashMap<String, String>, body: Vec<u8>) -> Self {
        let mut request = Self::new(method, target, version, headers);
        request.body = body;
        request
    }

    /// Get a header value.
    ///
    /// Header names are compared case-insensitively.
    pub fn get_header(&self, name: &str) -> Option<&String> {
        if let Some(value) = self.headers.get(name) {
            return Some(value);
        }
        self.headers.iter().find_map(|(k, v)| {
            if k.eq_ignore_ascii_case(name) {
                Some(v)
            } else {
                None
            }
        })
    }

    /// Check if a header exists.
    pub fn has_header(&self, name: &str) -> bool {
        self.get_header(name).is_some()
    }

    /// The `Content-Type` header, if present.
    pub fn content_type(&self) -> Option<&String> {
        self.get_header("Content-Type")
    }

    /// Parse the request body as JSON.
    ///
    /// # Returns
    ///
    /// The parsed JSON value, or an error if the body is not valid JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, Error> {
        if !self.is_json() {
            return Err(Error::MissingHeader("Content-Type: application/json".to_string()));
        }

        let json = serde_json::from_slice(&self.body)?;
        Ok(json)
    }

    /// Check if the request has a JSON body.
    pub fn is_json(&self) -> bool {
        self.content_type()
            .is_some_and(|content_type| content_type.starts_with("application/json"))
    }

    /// Get a route parameter captured by the router.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// Get a query parameter value.
    pub fn get_query_param(&self, name: &str) -> Option<&String> {
        self.query_params.get(name)
    }

    /// Check if a query parameter exists.
    pub fn has_query_param(&self, name: &str) -> bool {
        self.query_params.contains_key(name)
    }

    /// Whether the client asked for the connection to stay open.
    ///
    /// Only an explicit `Connection: keep-alive` keeps the connection; every
    /// other request closes it after the response.
    pub fn keep_alive(&self) -> bool {
        self.get_header("Connection")
            .is_some_and(|value| value.eq_ignore_ascii_case("keep-alive"))
    }
}

// Splits `a=1&b=2` into pairs. A key without `=` maps to an empty value.
fn parse_query(query: &str) -> HashMap<String, String> {
    query
        .split('&')
        .filter(|s| !s.is_empty())
        .map(|pair| {
            if let Some((k, v)) = pair.split_once('=') {
                (k.to_string(), v.to_string())
            } else {
                (pair.to_string(), String::new())
            }
        })
        .collect()
}

/// Find the end of the header block.
///
/// Returns the index just past the blank line (`\r\n\r\n`) that terminates the
/// headers, or `None` if the block is not complete yet.
pub fn find_head_end(input: &[u8]) -> Option<usize> {
    input
        .windows(4)
        .position(|window| window == b"\r\n\r\n")
        .map(|pos| pos + 4)
}

/// Read the declared body length from a header block.
///
/// A missing `Content-Length` header means an empty body.
pub fn content_length(head: &[u8]) -> Result<usize, Error> {
    let head = std::str::from_utf8(head)
        .map_err(|_| Error::MalformedRequestLine("Invalid UTF-8".to_string()))?;

    for line in head.lines().skip(1) {
        if let Some((name, value)) = line.split_once(':') {
            if name.trim().eq_ignore_ascii_case("Content-Length") {
                let value = value.trim();
                return value
                    .parse::<usize>()
                    .map_err(|_| Error::InvalidContentLength(value.to_string()));
            }
        }
    }

    Ok(0)
}

fn is_valid_header_name(name: &str) -> bool {
    !name.is_empty() && !name.contains(|c: char| c.is_ascii_whitespace())
}

fn is_valid_header_value(value: &str) -> bool {
    !value.contains(['\r', '\n'])
}

/// Parse an HTTP request from a byte slice.
///
/// Everything after the blank line that ends the header block becomes the
/// body. Input without a blank line is treated as a header block with an
/// empty body.
pub fn parse_request(input: &[u8]) -> Result<HttpRequest, Error> {
    let (head, body) = match find_head_end(input) {
        Some(end) => (&input[..end], &input[end..]),
        None => (input, &input[input.len()..]),
    };

    let input_str = match std::str::from_utf8(head) {
        Ok(s) => s,
        Err(_) => return Err(Error::MalformedRequestLine("Invalid UTF-8".to_string())),
    };

    let mut lines = input_str.lines();

    let request_line = match lines.next() {
        Some(line) => line,
        None => return Err(Error::EmptyRequest),
    };

    // method, target, version
    let parts: Vec<&str> = request_line.split_whitespace().collect();
    if parts.len() != 3 {
        return Err(Error::MalformedRequestLine(request_line.to_string()));
    }

    let method = Method::from_str(parts[0])?;

    let target = parts[1];
    if target.is_empty() || target.starts_with('?') {
        return Err(Error::InvalidPath);
    }

    let version = HttpVersion::from_str(parts[2])?;

    let mut headers = HashMap::new();
    for line in lines {
        // Empty line indicates the end of headers
        if line.is_empty() {
            break;
        }

        let (name, value) = line.split_once(':').ok_or(Error::InvalidHeaderFormat)?;
        let name = name.trim();
        let value = value.trim();
        if !is_valid_header_name(name) || !is_valid_header_value(value) {
            return Err(Error::InvalidHeaderFormat);
        }

        headers.insert(name.to_string(), value.to_string());
    }

    if version == HttpVersion::Http11 && !headers.keys().any(|k| k.eq_ignore_ascii_case("Host")) {
        return Err(Error::MissingHeader("Host".to_string()));
    }

    Ok(HttpRequest::with_body(method, target, version, headers, body.to_vec()))
}
