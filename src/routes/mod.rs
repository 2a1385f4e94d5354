pub mod auth;
pub mod contributions;
pub mod forum;
pub mod health;
pub mod measurements;
pub mod notifications;
pub mod stations;
pub mod users;

use axum::http::{HeaderValue, Method};
use axum::Router;
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(health::routes())
        .merge(auth::routes())
        .merge(users::routes())
        .merge(stations::routes())
        .merge(measurements::routes())
        .merge(contributions::routes())
        .merge(forum::routes())
        .merge(notifications::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// CORS policy for the configured browser origins. Unparseable origins are
/// skipped with a warning. A `*` entry allows any origin without credentials.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(AllowHeaders::mirror_request());

    if origins.iter().any(|origin| origin == "*") {
        tracing::warn!("CORS allows any origin, credentials disabled");
        return layer.allow_origin(AllowOrigin::any());
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    layer.allow_origin(allowed).allow_credentials(true)
}
