//! Shared application state for request handlers.

use std::sync::Arc;

use crate::cache::Pinger;
use crate::config::Config;

/// Shared application state, cloneable across handlers via Arc-wrapped fields.
///
/// Holds the settled configuration and the cache client the health handler
/// probes. Both are created once in `main` and never replaced.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub cache: Arc<dyn Pinger>,
}

impl AppState {
    /// Creates a new application state from the given configuration and cache client.
    pub fn new(config: Config, cache: Arc<dyn Pinger>) -> Self {
        Self {
            config: Arc::new(config),
            cache,
        }
    }
}
