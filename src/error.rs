//! Startup errors.
//!
//! Anything here is fatal: `main` prints the message and exits with code 1.
//! Probe failures never reach this type; they become 503 responses.

use crate::cache::CacheError;
use crate::config::ConfigError;
use crate::http::ServerError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("--config should be set.")]
    MissingConfigFlag,

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Server(#[from] ServerError),
}
