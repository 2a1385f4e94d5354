use axum::{extract::State, routing::get, Json, Router};

use crate::db;
use crate::models::HealthResponse;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let database_ok = db::ping(&state.pool).await;
    if !database_ok {
        tracing::warn!("Health check could not reach the database");
    }

    Json(HealthResponse {
        status: if database_ok { "OK" } else { "degraded" },
        database_status: if database_ok { "ok" } else { "error" },
        environment: state.environment.to_string(),
        version: env!("CARGO_PKG_VERSION"),
    })
}
