use axum::{
    extract::{Path, Query, State},
    routing::{get, patch},
    Json, Router,
};

use airwatch_core::Validator;

use crate::auth::AuthUser;
use crate::db;
use crate::error::{is_unique_violation, ApiError};
use crate::models::{PageQuery, UpdateUserRequest, User};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users/me", get(me))
        .route("/users", get(list_users))
        .route("/users/{id}", patch(update_user))
}

async fn me(State(state): State<AppState>, user: AuthUser) -> Result<Json<User>, ApiError> {
    let user = db::users::find_by_id(&state.pool, user.user_id)
        .await?
        .ok_or(ApiError::NotFound("User"))?;
    Ok(Json(user))
}

async fn list_users(
    State(state): State<AppState>,
    user: AuthUser,
    Query(page): Query<PageQuery>,
) -> Result<Json<Vec<User>>, ApiError> {
    user.require_admin()?;
    let (limit, offset) = db::clamp_page(page.limit, page.offset);
    Ok(Json(db::users::list_users(&state.pool, limit, offset).await?))
}

async fn update_user(
    State(state): State<AppState>,
    admin: AuthUser,
    Path(id): Path<i64>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Json<User>, ApiError> {
    admin.require_admin()?;
    if let Some(email) = &req.email {
        Validator::validate_email(email)?;
    }

    let updated = db::users::update_user(&state.pool, id, &req)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                ApiError::Conflict("Email already registered".to_string())
            } else {
                e.into()
            }
        })?
        .ok_or(ApiError::NotFound("User"))?;

    tracing::info!(
        "Admin {} updated user {} (role {}, active {})",
        admin.user_id,
        updated.user_id,
        updated.role,
        updated.is_active
    );
    Ok(Json(updated))
}
