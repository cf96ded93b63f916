//! redis-healthz: HTTP health-check endpoint for Redis.
//!
//! Serves `/healthz`, which pings a Redis instance on every request and maps
//! the outcome to 200 or 503.

pub mod cache;
pub mod config;
pub mod error;
pub mod http;
pub mod middleware;
pub mod routes;
pub mod state;

pub use error::AppError;
