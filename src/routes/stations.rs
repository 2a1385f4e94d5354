use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};

use airwatch_core::validation::{EPA_LINK_MAX, EPA_NAME_MAX, SOURCE_MAX, STATION_NAME_MAX};
use airwatch_core::{ValidationError, Validator};

use crate::auth::AuthUser;
use crate::db;
use crate::error::ApiError;
use crate::models::{CreateStationRequest, Station, StationQuery, UpdateStationRequest};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/stations", get(list_stations).post(create_station))
        .route(
            "/stations/{id}",
            get(get_station).patch(update_station).delete(delete_station),
        )
}

fn validate_epa(epa_name: Option<&str>, epa_link: Option<&str>) -> Result<(), ValidationError> {
    if let Some(name) = epa_name {
        Validator::validate_max_len("epa_name", name, EPA_NAME_MAX)?;
    }
    if let Some(link) = epa_link {
        Validator::validate_max_len("epa_link", link, EPA_LINK_MAX)?;
    }
    Ok(())
}

async fn list_stations(
    State(state): State<AppState>,
    Query(query): Query<StationQuery>,
) -> Result<Json<Vec<Station>>, ApiError> {
    for lat in [query.min_lat, query.max_lat].into_iter().flatten() {
        Validator::validate_latitude(lat)?;
    }
    for lon in [query.min_lon, query.max_lon].into_iter().flatten() {
        Validator::validate_longitude(lon)?;
    }
    Ok(Json(db::stations::list_stations(&state.pool, &query).await?))
}

async fn get_station(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Station>, ApiError> {
    let station = db::stations::find_station(&state.pool, id)
        .await?
        .ok_or(ApiError::NotFound("Station"))?;
    Ok(Json(station))
}

async fn create_station(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<CreateStationRequest>,
) -> Result<(StatusCode, Json<Station>), ApiError> {
    user.require_admin()?;
    Validator::validate_text("station_name", &req.station_name, STATION_NAME_MAX)?;
    Validator::validate_coordinates(req.latitude, req.longitude)?;
    Validator::validate_text("source", &req.source, SOURCE_MAX)?;
    validate_epa(req.epa_name.as_deref(), req.epa_link.as_deref())?;

    let station = db::stations::insert_station(&state.pool, &req).await?;
    tracing::info!("Created station {} ({})", station.station_id, station.station_name);
    Ok((StatusCode::CREATED, Json(station)))
}

async fn update_station(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
    Json(req): Json<UpdateStationRequest>,
) -> Result<Json<Station>, ApiError> {
    user.require_admin()?;
    if let Some(name) = &req.station_name {
        Validator::validate_text("station_name", name, STATION_NAME_MAX)?;
    }
    if let Some(lat) = req.latitude {
        Validator::validate_latitude(lat)?;
    }
    if let Some(lon) = req.longitude {
        Validator::validate_longitude(lon)?;
    }
    if let Some(source) = &req.source {
        Validator::validate_text("source", source, SOURCE_MAX)?;
    }
    validate_epa(req.epa_name.as_deref(), req.epa_link.as_deref())?;

    let station = db::stations::update_station(&state.pool, id, &req)
        .await?
        .ok_or(ApiError::NotFound("Station"))?;
    Ok(Json(station))
}

async fn delete_station(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    user.require_admin()?;
    if !db::stations::delete_station(&state.pool, id).await? {
        return Err(ApiError::NotFound("Station"));
    }
    tracing::info!("Deleted station {}", id);
    Ok(StatusCode::NO_CONTENT)
}
