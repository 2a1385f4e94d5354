use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};

use airwatch_core::validation::SOURCE_MAX;
use airwatch_core::{ContributionStatus, Lifecycle, Transition, Validator};

use crate::auth::AuthUser;
use crate::db;
use crate::error::ApiError;
use crate::models::{Contribution, ContributionQuery, CreateContributionRequest, StatusUpdate};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/contributions",
            get(list_contributions).post(create_contribution),
        )
        .route(
            "/contributions/{id}",
            get(get_contribution)
                .patch(update_contribution_status)
                .delete(delete_contribution),
        )
}

async fn create_contribution(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<CreateContributionRequest>,
) -> Result<(StatusCode, Json<Contribution>), ApiError> {
    user.require_data_contributor()?;
    Validator::validate_contribution(&req.pollutants, req.overall_aqi, req.station_id)?;
    Validator::validate_text("source", &req.source, SOURCE_MAX)?;

    if let Some(station_id) = req.station_id {
        if !db::stations::station_exists(&state.pool, station_id).await? {
            return Err(ApiError::NotFound("Station"));
        }
    }

    let contribution = db::contributions::insert_contribution(&state.pool, user.user_id, &req).await?;
    tracing::info!(
        "User {} submitted contribution {}",
        user.user_id,
        contribution.contribution_id
    );
    Ok((StatusCode::CREATED, Json(contribution)))
}

async fn list_contributions(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ContributionQuery>,
) -> Result<Json<Vec<Contribution>>, ApiError> {
    user.require_contributions_access()?;
    let (limit, offset) = db::clamp_page(query.limit, query.offset);
    Ok(Json(
        db::contributions::list_contributions(&state.pool, query.status, limit, offset).await?,
    ))
}

async fn get_contribution(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<Contribution>, ApiError> {
    user.require_contributions_access()?;
    let contribution = db::contributions::find_contribution(&state.pool, id)
        .await?
        .ok_or(ApiError::NotFound("Contribution"))?;
    Ok(Json(contribution))
}

/// Approve or reject a pending contribution.
async fn update_contribution_status(
    State(state): State<AppState>,
    admin: AuthUser,
    Path(id): Path<i64>,
    Json(update): Json<StatusUpdate<ContributionStatus>>,
) -> Result<Json<Contribution>, ApiError> {
    admin.require_admin()?;
    let current = db::contributions::find_contribution(&state.pool, id)
        .await?
        .ok_or(ApiError::NotFound("Contribution"))?;

    if current.status.transition_to(update.status)? == Transition::Unchanged {
        return Ok(Json(current));
    }

    let updated =
        db::contributions::transition_status(&state.pool, id, current.status, update.status)
            .await?
            .ok_or_else(|| ApiError::Conflict("Contribution was modified concurrently".to_string()))?;

    tracing::info!(
        "Admin {} moved contribution {} from {} to {}",
        admin.user_id,
        id,
        current.status,
        updated.status
    );
    Ok(Json(updated))
}

async fn delete_contribution(
    State(state): State<AppState>,
    admin: AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    admin.require_admin()?;
    if !db::contributions::delete_contribution(&state.pool, id).await? {
        return Err(ApiError::NotFound("Contribution"));
    }
    tracing::info!("Admin {} deleted contribution {}", admin.user_id, id);
    Ok(StatusCode::NO_CONTENT)
}
