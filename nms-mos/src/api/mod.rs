//! HTTP side channel
//!
//! Health check plus a Server-Sent Events stream of gateway notifications
//! for UI clients. The MOS protocol itself never goes through HTTP.

pub mod health;
pub mod sse;

use std::net::SocketAddr;

use axum::{routing::get, Router};
use chrono::{DateTime, Utc};
use nms_common::events::EventBus;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::Result;

/// Shared state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub bus: EventBus,
    pub client_id: i64,
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(bus: EventBus, client_id: i64) -> Self {
        Self {
            bus,
            client_id,
            startup_time: Utc::now(),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/events", get(sse::event_stream))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the HTTP side channel until `shutdown` resolves
pub async fn serve(
    listener: tokio::net::TcpListener,
    state: AppState,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let addr: SocketAddr = listener.local_addr()?;
    info!("HTTP side channel listening on http://{}", addr);
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}
