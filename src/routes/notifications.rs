use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};

use airwatch_core::validation::NOTIFICATION_TITLE_MAX;
use airwatch_core::Validator;

use crate::auth::AuthUser;
use crate::db;
use crate::error::ApiError;
use crate::models::{CreateNotificationRequest, Notification, NotificationQuery};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/notifications",
            get(list_notifications).post(create_notifications),
        )
        .route("/notifications/{id}/read", patch(mark_read))
}

/// Create one notification per recipient. An empty recipient list
/// broadcasts to every active user.
async fn create_notifications(
    State(state): State<AppState>,
    admin: AuthUser,
    Json(req): Json<CreateNotificationRequest>,
) -> Result<(StatusCode, Json<Vec<Notification>>), ApiError> {
    admin.require_admin()?;
    Validator::validate_text("title", &req.title, NOTIFICATION_TITLE_MAX)?;
    Validator::validate_content("message", &req.message)?;
    Validator::validate_non_negative("aqi_value", req.aqi_value.map(|v| v as f64))?;

    if let Some(station_id) = req.station_id {
        if !db::stations::station_exists(&state.pool, station_id).await? {
            return Err(ApiError::NotFound("Station"));
        }
    }

    let mut recipients = req.user_ids.clone();
    recipients.sort_unstable();
    recipients.dedup();
    if recipients.is_empty() {
        recipients = db::notifications::active_user_ids(&state.pool).await?;
    } else {
        for &user_id in &recipients {
            if !db::users::exists(&state.pool, user_id).await? {
                return Err(ApiError::NotFound("User"));
            }
        }
    }

    let created = db::notifications::insert_notifications(&state.pool, &req, &recipients).await?;
    tracing::info!(
        "Admin {} sent {} notification to {} users",
        admin.user_id,
        req.notification_type.as_str(),
        created.len()
    );
    Ok((StatusCode::CREATED, Json(created)))
}

async fn list_notifications(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<NotificationQuery>,
) -> Result<Json<Vec<Notification>>, ApiError> {
    Ok(Json(
        db::notifications::list_for_user(&state.pool, user.user_id, query.unread_only).await?,
    ))
}

async fn mark_read(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<Notification>, ApiError> {
    let notification = db::notifications::mark_read(&state.pool, user.user_id, id)
        .await?
        .ok_or(ApiError::NotFound("Notification"))?;
    Ok(Json(notification))
}
