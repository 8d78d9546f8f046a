//! # HTTP Server
//!
//! Exposes the meme pipeline over HTTP:
//!
//! - `GET /` answers `"GET OK"`
//! - `POST /generatememe` writes a meme for `{"uri": ...}` and answers `"OK"`
//! - `POST /generatememe/image` answers with the encoded meme

pub mod error;
pub mod handlers;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tracing::info;

use crate::error::Result;
use crate::pipeline::MemePipeline;

pub use error::ApiError;
pub use handlers::MemeRequest;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<MemePipeline>,
    pub default_max_results: u32,
}

impl AppState {
    pub fn new(pipeline: MemePipeline) -> Self {
        let default_max_results = pipeline.config().detector.max_results;
        Self {
            pipeline: Arc::new(pipeline),
            default_max_results,
        }
    }
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::health))
        .route("/generatememe", post(handlers::generate_meme))
        .route("/generatememe/image", post(handlers::generate_meme_image))
        .with_state(state)
}

/// Bind `bind_addr` and serve until Ctrl-C
pub async fn serve(state: AppState, bind_addr: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    info!("🌐 Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        // No signal handler available; run until killed
        std::future::pending::<()>().await;
    }
}
