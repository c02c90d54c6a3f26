//! ff-server: the fileforged HTTP front end.
//!
//! Every request enters one axum fallback handler and is handed to the
//! [`pipeline::Pipeline`], which offers it to each interceptor in order
//! (API, assets, WebDAV, video player, subtitle) before the terminal
//! file/directory handler. The crate provides:
//!
//! - The request context and the interceptor/terminal traits
//! - All interceptors and the terminal handler
//! - Byte-range static serving and HTML rendering
//! - Request-id middleware, tracing and graceful shutdown

pub mod context;
pub mod error;
pub mod interceptors;
pub mod listing;
pub mod middleware;
pub mod pipeline;
pub mod render;
pub mod router;
pub mod static_files;
pub mod terminal;

use std::net::SocketAddr;
use std::sync::Arc;

use ff_core::config::Config;
use ff_core::{FileSystem, LocalFs};
use tokio_util::sync::CancellationToken;

pub use crate::context::{AppContext, RequestContext};
pub use crate::pipeline::{Interceptor, Outcome, Pipeline, Terminal};
pub use crate::router::build_router;

/// Start the fileforged server.
///
/// Serves `config.server.root` until SIGINT or SIGTERM arrives.
pub async fn start(config: Config) -> ff_core::Result<()> {
    start_with_cancel(config, CancellationToken::new()).await
}

/// Like [`start`], but also stops when `cancel` is triggered.
pub async fn start_with_cancel(config: Config, cancel: CancellationToken) -> ff_core::Result<()> {
    config.routes.check()?;
    for warning in config.validate() {
        tracing::warn!("Config warning: {warning}");
    }

    let root = config.server.root.clone();
    let metadata = std::fs::metadata(&root).map_err(|e| {
        ff_core::Error::Validation(format!("cannot serve {}: {e}", root.display()))
    })?;
    if !metadata.is_dir() {
        return Err(ff_core::Error::Validation(format!(
            "cannot serve {}: not a directory",
            root.display()
        )));
    }

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|e| ff_core::Error::Internal(format!("Invalid server address: {e}")))?;

    let fs: Arc<dyn FileSystem> = Arc::new(LocalFs::new(root.clone()));
    let ctx = AppContext::new(config, fs);
    tracing::debug!(interceptors = ?ctx.pipeline.interceptor_names(), "Pipeline built");

    let app = build_router(ctx);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ff_core::Error::Internal(format!("Failed to bind to {addr}: {e}")))?;

    tracing::info!("Serving {} on http://{addr}", root.display());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cancel))
        .await
        .map_err(|e| ff_core::Error::Io { source: e })?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wait for a shutdown signal (SIGINT or SIGTERM) or cancellation.
async fn shutdown_signal(cancel: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
        _ = cancel.cancelled() => {}
    }

    tracing::info!("Shutdown signal received");
}
