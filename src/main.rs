//! redis-healthz: HTTP health-check endpoint of Redis.
//!
//! This is the application entry point. It initializes tracing, loads the YAML
//! configuration, builds the Redis client, mounts `/healthz` and serves it.

use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use redis_healthz::cache::CacheClient;
use redis_healthz::config::{Config, DEFAULT_LOG_FILTER, LONG_VERSION};
use redis_healthz::http::start_server;
use redis_healthz::routes::create_router;
use redis_healthz::state::AppState;
use redis_healthz::AppError;

/// HTTP health-check endpoint of Redis
#[derive(Parser, Debug)]
#[command(name = "redis-healthz", version = LONG_VERSION, about)]
struct Args {
    /// Path to config YAML file
    #[arg(short, long)]
    config: Option<String>,

    /// Log level filter (e.g., "redis_healthz=debug")
    #[arg(short, long)]
    log_level: Option<String>,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

fn init_tracing(log_level: Option<String>, format: LogFormat) {
    // Priority: CLI > env > default
    let log_filter = log_level
        .or_else(|| std::env::var("RUST_LOG").ok())
        .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

    let registry =
        tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::new(&log_filter));

    match format {
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
    }
}

async fn run(config_path: Option<String>) -> Result<(), AppError> {
    let config_path = config_path
        .filter(|path| !path.is_empty())
        .ok_or(AppError::MissingConfigFlag)?;

    let config = Config::load(&config_path)?;
    let cache = CacheClient::connect(&config.redis)?;

    tracing::info!("Starting healthcheck endpoint server...");
    tracing::info!(path = %config_path, "Loaded configuration");
    tracing::info!(
        redis.address = %config.redis.address(),
        redis.db = config.redis.db,
        redis.has_password = config.redis.has_password(),
        redis.timeout_seconds = config.redis.timeout_seconds,
        server.binding = %config.server.binding(),
        "Configuration"
    );

    let server = config.server.clone();
    let state = AppState::new(config, Arc::new(cache));
    let app = create_router(state);

    start_server(app, &server).await?;

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    init_tracing(args.log_level, args.log_format);

    match run(args.config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
