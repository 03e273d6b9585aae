//! Built-in middleware.
//!
//! Each constructor returns a [`Middleware`](crate::Middleware) ready for
//! `use_middleware` on a [`Router`](crate::Router) or [`App`](crate::App), or
//! for per-route and per-mount lists.

mod logging;
mod recovery;
mod request_id;
mod response_time;
mod cors;
mod rate_limit;

pub use logging::logger;
pub use recovery::{recovery, RecoveryOptions};
pub use request_id::{request_id, RequestIdOptions};
pub use response_time::{format_elapsed, response_time, ResponseTimeOptions};
pub use cors::{cors, CorsOptions};
pub use rate_limit::{rate_limit, RateLimiter};
