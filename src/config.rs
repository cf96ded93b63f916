//! Configuration loading and constants.
//!
//! Loads the YAML configuration file into a raw, all-optional shape, then
//! settles it into [`Config`] by filling in defaults for anything left unset.
//! Values from the file can be overridden by `HEALTHZ__SECTION__KEY`
//! environment variables.

use const_format::formatcp;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

// =============================================================================
// Defaults
// =============================================================================

/// Redis host used when `redis.host` is missing or empty
pub const DEFAULT_REDIS_HOST: &str = "127.0.0.1";

/// Redis port used when `redis.port` is missing or empty
pub const DEFAULT_REDIS_PORT: &str = "6379";

/// Probe timeout in seconds (connect plus PING)
pub const DEFAULT_PING_TIMEOUT_SECS: u64 = 5;

/// Listen address used when `server.bind` is missing or empty
pub const DEFAULT_SERVER_BIND: &str = "127.0.0.1";

/// Listen port used when `server.port` is missing or empty
pub const DEFAULT_SERVER_PORT: &str = "80";

/// Default log filter when neither --log-level nor RUST_LOG is set
pub const DEFAULT_LOG_FILTER: &str = "redis_healthz=info";

// =============================================================================
// Environment Overrides
// =============================================================================

/// Prefix for environment overrides, e.g. `HEALTHZ__REDIS__PASSWORD`
pub const ENV_PREFIX: &str = "HEALTHZ";

/// Separator between prefix, section and key in override variable names
pub const ENV_SEPARATOR: &str = "__";

// =============================================================================
// Build Metadata
// =============================================================================

/// Build revision, injected through `HEALTHZ_REVISION` at compile time
pub const REVISION: &str = match option_env!("HEALTHZ_REVISION") {
    Some(revision) => revision,
    None => "unknown",
};

/// Version string shown by `--version`
pub const LONG_VERSION: &str = formatcp!("{} ({})", env!("CARGO_PKG_VERSION"), REVISION);

/// Configuration file as written, before defaults are applied.
///
/// Every field is optional so that a partially filled file (or one missing a
/// whole section) still deserializes.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawConfig {
    pub redis: RawRedisSettings,
    pub server: RawServerSettings,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawRedisSettings {
    pub host: Option<String>,
    pub port: Option<String>,
    pub password: Option<String>,
    pub db: Option<i64>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawServerSettings {
    pub bind: Option<String>,
    pub port: Option<String>,
}

/// Settled configuration. Built once at startup and never modified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub redis: RedisSettings,
    pub server: ServerSettings,
}

/// Connection settings for the Redis instance being probed
#[derive(Clone, PartialEq, Eq)]
pub struct RedisSettings {
    pub host: String,
    pub port: String,
    /// Empty means no AUTH is sent
    pub password: String,
    pub db: i64,
    pub timeout_seconds: u64,
}

impl RedisSettings {
    /// `host:port` of the Redis instance
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Connection URL understood by the redis client.
    pub fn url(&self) -> String {
        let host = if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]", self.host)
        } else {
            self.host.clone()
        };

        if self.password.is_empty() {
            format!("redis://{}:{}/{}", host, self.port, self.db)
        } else {
            format!(
                "redis://:{}@{}:{}/{}",
                urlencoding::encode(&self.password),
                host,
                self.port,
                self.db
            )
        }
    }

    pub fn has_password(&self) -> bool {
        !self.password.is_empty()
    }

    pub fn ping_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

// Keeps the password out of logs and panic messages.
impl std::fmt::Debug for RedisSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("password", &if self.has_password() { "<redacted>" } else { "" })
            .field("db", &self.db)
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

/// HTTP listener settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    pub bind: String,
    pub port: String,
}

impl ServerSettings {
    /// `bind:port` the HTTP listener binds to
    pub fn binding(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

fn or_default(value: Option<String>, default: &str) -> String {
    match value {
        Some(v) if !v.is_empty() => v,
        _ => default.to_string(),
    }
}

/// Settle a raw configuration by substituting defaults for missing or empty
/// host/port fields. Password and db are taken as-is: an empty password means
/// no credential and db 0 is a valid index.
pub fn apply_defaults(raw: RawConfig) -> Config {
    let RawConfig { redis, server } = raw;

    Config {
        redis: RedisSettings {
            host: or_default(redis.host, DEFAULT_REDIS_HOST),
            port: or_default(redis.port, DEFAULT_REDIS_PORT),
            password: redis.password.unwrap_or_default(),
            db: redis.db.unwrap_or(0),
            timeout_seconds: match redis.timeout_seconds {
                Some(secs) if secs > 0 => secs,
                _ => DEFAULT_PING_TIMEOUT_SECS,
            },
        },
        server: ServerSettings {
            bind: or_default(server.bind, DEFAULT_SERVER_BIND),
            port: or_default(server.port, DEFAULT_SERVER_PORT),
        },
    }
}

impl Config {
    /// Read and settle the configuration file at `path`.
    ///
    /// Returns an error instead of exiting so the caller decides how to fail.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Settle configuration from YAML text plus `HEALTHZ__*` overrides.
    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        Self::build(
            contents,
            ::config::Environment::with_prefix(ENV_PREFIX).separator(ENV_SEPARATOR),
        )
    }

    fn build(contents: &str, env: ::config::Environment) -> Result<Self, ConfigError> {
        let raw: RawConfig = ::config::Config::builder()
            .add_source(::config::File::from_str(contents, ::config::FileFormat::Yaml))
            .add_source(env)
            .build()?
            .try_deserialize()?;

        Ok(apply_defaults(raw))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] ::config::ConfigError),
}
