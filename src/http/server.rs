//! HTTP server startup logic.

use std::net::SocketAddr;

use axum::Router;
use tokio::net::TcpListener;

use crate::config::ServerSettings;

/// Server startup error
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Failed to bind {binding}: {source}")]
    Bind {
        binding: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// Bind the listener for the configured `bind:port`.
///
/// The bind host may be a name; it is resolved here.
pub async fn bind(settings: &ServerSettings) -> Result<TcpListener, ServerError> {
    let binding = settings.binding();
    TcpListener::bind(&binding)
        .await
        .map_err(|source| ServerError::Bind { binding, source })
}

/// Serve `app` on an already bound listener.
///
/// This function blocks until the server stops.
pub async fn serve(listener: TcpListener, app: Router) -> Result<(), ServerError> {
    axum::serve(listener, app).await.map_err(ServerError::Serve)
}

/// Bind and serve. Used by `main`.
pub async fn start_server(app: Router, settings: &ServerSettings) -> Result<(), ServerError> {
    let listener = bind(settings).await?;
    let addr: Option<SocketAddr> = listener.local_addr().ok();
    tracing::info!(binding = %settings.binding(), ?addr, "Listening for health probes");

    serve(listener, app).await
}
