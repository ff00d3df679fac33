//! Server setup and lifecycle management

use crate::api::create_router;
use crate::api::rest::state::AppState;
use crate::config::{DaemonConfig, StorageConfig};
use crate::error::{DaemonError, DaemonResult};
use crate::service::EventService;
use crate::storage::{EventStorage, InMemoryStorage, PostgresStorage};
use axum::Router;
use eventdesk_gate::{AdPartnerClient, AuthorizationGate, IpApiLocationResolver};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Eventdesk daemon server
pub struct Server {
    config: DaemonConfig,
    state: AppState,
}

impl Server {
    /// Create a new server with the given configuration
    pub async fn new(config: DaemonConfig) -> DaemonResult<Self> {
        let storage = connect_storage(&config.storage).await?;
        let gate = build_gate(&config)?;
        let events = Arc::new(EventService::new(storage, gate));

        Ok(Self {
            state: AppState::new(events),
            config,
        })
    }

    /// Router with the configured middleware, without a listener
    pub fn router(&self) -> Router {
        create_router(self.state.clone(), self.config.server.enable_cors)
    }

    /// Run the server
    pub async fn run(self) -> DaemonResult<()> {
        let addr = self.config.server.listen_addr;
        let app = self.router();

        let listener = TcpListener::bind(addr).await?;

        tracing::info!("Eventdesk daemon listening on {}", listener.local_addr()?);
        tracing::info!(
            storage = self.config.storage.label(),
            geo_endpoint = %self.config.geo.endpoint,
            partner_endpoint = %self.config.partner.endpoint,
            "Service configured"
        );

        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| DaemonError::Server(e.to_string()))?;

        tracing::info!("Eventdesk daemon shutting down");
        Ok(())
    }
}

async fn connect_storage(config: &StorageConfig) -> DaemonResult<Arc<dyn EventStorage>> {
    match config {
        StorageConfig::Memory => Ok(Arc::new(InMemoryStorage::new())),
        StorageConfig::Postgres {
            url,
            max_connections,
            connect_timeout_secs,
        } => {
            let storage =
                PostgresStorage::new(url, *max_connections, *connect_timeout_secs).await?;
            Ok(Arc::new(storage))
        }
    }
}

/// Wire the HTTP-backed location resolver and partner client into a gate
pub fn build_gate(config: &DaemonConfig) -> DaemonResult<AuthorizationGate> {
    let locations = IpApiLocationResolver::new(&config.geo)?;
    let partner = AdPartnerClient::new(config.partner.clone())?;
    Ok(AuthorizationGate::new(Arc::new(locations), Arc::new(partner)))
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install terminate handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        }
    }
}
