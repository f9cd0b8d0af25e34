pub mod api;
pub mod config;
pub mod upstream;

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use tracing::{error, info};

use crate::config::AppConfig;
use crate::upstream::{ChatClient, GroqClient};

/// Shared, read-only state handed to every request.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub chat_client: Arc<dyn ChatClient>,
}

impl AppState {
    pub fn new(config: AppConfig, chat_client: Arc<dyn ChatClient>) -> Self {
        Self {
            config: Arc::new(config),
            chat_client,
        }
    }

    /// State backed by a real Groq client built from `config.base_url`.
    pub fn from_config(config: AppConfig) -> Self {
        let client = GroqClient::new(config.base_url.clone());
        Self::new(config, Arc::new(client))
    }
}

pub fn build_app(state: AppState) -> Router {
    api::router(state)
}

pub async fn run_server(app: Router, port: u16) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!("ask relay listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server failed")
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("shutdown signal received");
}
