//! Response timing header.

use std::time::{Duration, Instant};

use crate::router::{from_fn, Middleware};

const DEFAULT_HEADER: &str = "X-Response-Time";

/// Options for [`response_time`].
#[derive(Debug, Clone, Default)]
pub struct ResponseTimeOptions {
    /// Header to set. Defaults to `X-Response-Time`.
    pub header_name: Option<String>,
    /// Unit suffix: `ms` (default), `s`, `us` or `ns`. Unknown suffixes are
    /// measured in milliseconds but still appended as given.
    pub suffix: Option<String>,
}

/// Render `elapsed` as a whole number in the unit named by `suffix`.
pub fn format_elapsed(elapsed: Duration, suffix: &str) -> String {
    let amount = match suffix {
        "s" => elapsed.as_secs() as u128,
        "us" => elapsed.as_micros(),
        "ns" => elapsed.as_nanos(),
        _ => elapsed.as_millis(),
    };
    format!("{amount}{suffix}")
}

/// Record how long the inner handler took in a response header.
pub fn response_time(options: ResponseTimeOptions) -> Middleware {
    let header_name = options
        .header_name
        .unwrap_or_else(|| DEFAULT_HEADER.to_string());
    let suffix = options
        .suffix
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "ms".to_string());

    from_fn(move |res, req, next| {
        let start = Instant::now();
        next.serve(res, req);
        res.set_header(header_name.clone(), format_elapsed(start.elapsed(), &suffix));
    })
}
