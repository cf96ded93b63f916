//! Redis client used for liveness probes.
//!
//! [`CacheClient`] is built once at startup and shared by every request. It
//! does not dial Redis until the first probe; the multiplexed connection
//! opened then is cached and reused by overlapping probes. A failed probe
//! drops the cached connection so the next one dials again.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::Client;
use tokio::sync::Mutex;
use tokio::time::{timeout_at, Instant};

use crate::config::RedisSettings;

/// Reply Redis sends to a successful PING
pub const PONG: &str = "PONG";

/// Client construction error
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Invalid Redis address {address}: {source}")]
    InvalidTarget {
        address: String,
        #[source]
        source: redis::RedisError,
    },
}

/// A single failed probe
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("{0}")]
    Redis(#[from] redis::RedisError),

    #[error("ping timed out after {0:?}")]
    Timeout(Duration),
}

/// Something that can answer a liveness ping.
#[async_trait]
pub trait Pinger: Send + Sync {
    /// Issue one ping and return the literal reply text.
    async fn ping(&self) -> Result<String, ProbeError>;
}

/// Cached connection tagged with the dial that produced it.
///
/// The generation only moves forward on a new dial, so a probe holding an
/// older generation can never evict a connection stored after it.
#[derive(Debug)]
struct Slot<C> {
    generation: u64,
    conn: Option<C>,
}

impl<C: Clone> Slot<C> {
    fn new() -> Self {
        Self {
            generation: 0,
            conn: None,
        }
    }

    fn current(&self) -> Option<(u64, C)> {
        self.conn.as_ref().map(|conn| (self.generation, conn.clone()))
    }

    fn store(&mut self, conn: C) -> u64 {
        self.generation += 1;
        self.conn = Some(conn);
        self.generation
    }

    /// Drop the cached connection if it is still the one from `generation`.
    fn discard(&mut self, generation: u64) {
        if self.generation == generation {
            self.conn = None;
        }
    }
}

/// Redis client handle, safe to share across concurrent requests.
pub struct CacheClient {
    client: Client,
    address: String,
    timeout: Duration,
    slot: Mutex<Slot<MultiplexedConnection>>,
}

impl CacheClient {
    /// Build a client for the configured instance without connecting.
    ///
    /// Only a malformed target fails here; reachability is observed by
    /// [`Pinger::ping`].
    pub fn connect(settings: &RedisSettings) -> Result<Self, CacheError> {
        let client = Client::open(settings.url()).map_err(|source| CacheError::InvalidTarget {
            address: settings.address(),
            source,
        })?;

        Ok(Self {
            client,
            address: settings.address(),
            timeout: settings.ping_timeout(),
            slot: Mutex::new(Slot::new()),
        })
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Cached connection, or a freshly dialed one.
    ///
    /// The slot stays locked while dialing so a burst of probes opens one
    /// connection, not one each.
    async fn connection(&self) -> Result<(u64, MultiplexedConnection), redis::RedisError> {
        let mut slot = self.slot.lock().await;
        if let Some(cached) = slot.current() {
            return Ok(cached);
        }

        let conn = self.client.get_multiplexed_async_connection().await?;
        tracing::debug!(address = %self.address, "Opened Redis connection");
        let generation = slot.store(conn.clone());
        Ok((generation, conn))
    }
}

async fn send_ping(conn: &mut MultiplexedConnection) -> Result<String, redis::RedisError> {
    let reply: String = redis::cmd("PING").query_async(conn).await?;
    Ok(reply)
}

#[async_trait]
impl Pinger for CacheClient {
    async fn ping(&self) -> Result<String, ProbeError> {
        let deadline = Instant::now() + self.timeout;

        let (generation, mut conn) = match timeout_at(deadline, self.connection()).await {
            Ok(Ok(dialed)) => dialed,
            Ok(Err(e)) => return Err(ProbeError::Redis(e)),
            Err(_) => return Err(ProbeError::Timeout(self.timeout)),
        };

        // Slot is not locked here; overlapping probes share the connection
        let err = match timeout_at(deadline, send_ping(&mut conn)).await {
            Ok(Ok(reply)) => return Ok(reply),
            Ok(Err(e)) => ProbeError::Redis(e),
            Err(_) => ProbeError::Timeout(self.timeout),
        };

        // Next probe dials fresh instead of reusing a possibly broken connection
        self.slot.lock().await.discard(generation);
        Err(err)
    }
}
