//! Request routing and middleware composition.
//!
//! - [`RoutePattern`] compiles `/users/:id` style templates.
//! - [`Router`] registers routes and dispatches a single request.
//! - [`App`] selects among mounted routers by longest prefix.
//! - [`chain_middleware`] and [`HandlerBuilder`] fold middleware around a
//!   handler, first middleware outermost.

mod pattern;
mod chain;
mod table;
mod app;
mod tests;

pub use pattern::RoutePattern;
pub use chain::{chain_middleware, from_fn, middleware, HandlerBuilder, Middleware};
pub use table::Router;
pub use app::App;
