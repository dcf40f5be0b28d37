//! HTTP request handlers

use super::AppState;
use crate::channel::{Channel, Update};
use crate::gateway::DataGateway;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tower_http::trace::TraceLayer;

/// Create the webhook router. `prefix` is the normalized path prefix, e.g. `/webhook`.
pub fn create_router<G, C>(state: AppState<G, C>, prefix: &str) -> Router
where
    G: DataGateway + 'static,
    C: Channel + 'static,
{
    Router::new()
        .route(&format!("{prefix}/:token"), post(receive_update::<G, C>))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Accept one update. Telegram only needs to know it arrived, so anything
/// that parses gets 200 and is processed in the background.
async fn receive_update<G, C>(
    State(state): State<AppState<G, C>>,
    Path(token): Path<String>,
    body: Result<Json<Update>, JsonRejection>,
) -> StatusCode
where
    G: DataGateway + 'static,
    C: Channel + 'static,
{
    if token != *state.token {
        return StatusCode::NOT_FOUND;
    }
    let update = match body {
        Ok(Json(update)) => update,
        Err(e) => {
            tracing::warn!(error = %e, "Discarding malformed update");
            return StatusCode::OK;
        }
    };

    let engine = state.engine.clone();
    tokio::spawn(async move {
        engine.handle_update(update).await;
    });
    StatusCode::OK
}

async fn health() -> &'static str {
    concat!("gradiator ", env!("CARGO_PKG_VERSION"))
}
