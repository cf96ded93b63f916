//! HTTP server module.
//!
//! Binds the listener on the configured `bind:port` and serves the router on
//! plain HTTP until the process is stopped.

mod server;

pub use server::{bind, serve, start_server, ServerError};
