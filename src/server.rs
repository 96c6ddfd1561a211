//! HTTP surface.
//!
//! - `/` and `/api/custom-news`: the news digest envelope, any method
//! - `/api/predictions`: filtered prediction markets
//!
//! Every response is JSON, allows any origin and may be cached by shared
//! caches for five minutes. A failed digest run answers 500 with the
//! failure envelope.

use crate::config::Settings;
use crate::error::DigestError;
use crate::models::Envelope;
use crate::pipeline;
use crate::predictions::fetch_predictions;
use axum::{
    Json, Router,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::any,
};
use reqwest::Client;
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

pub const CACHE_CONTROL: &str = "public, max-age=300, s-maxage=300";

/// State shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub client: Client,
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", any(custom_news))
        .route("/api/custom-news", any(custom_news))
        .route("/api/predictions", any(predictions))
        .layer(cors)
        .with_state(state)
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    (status, [(header::CACHE_CONTROL, CACHE_CONTROL)], Json(body)).into_response()
}

/// 200 for a digest, 500 for the failure envelope.
fn status_for(envelope: &Envelope) -> StatusCode {
    if envelope.is_success() {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

async fn custom_news(State(state): State<AppState>) -> Response {
    let envelope = pipeline::run_envelope(&state.client, Arc::clone(&state.settings)).await;
    json_response(status_for(&envelope), envelope)
}

async fn predictions(State(state): State<AppState>) -> Response {
    let markets = fetch_predictions(&state.client, &state.settings.predictions).await;
    json_response(
        StatusCode::OK,
        serde_json::json!({
            "success": true,
            "total": markets.len(),
            "predictions": markets,
        }),
    )
}

/// Bind and serve until Ctrl-C.
pub async fn serve(bind: &str, state: AppState) -> Result<(), DigestError> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!(addr = %listener.local_addr()?, "Serving digest");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}
