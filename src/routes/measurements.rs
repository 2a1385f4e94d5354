use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::{Duration, Utc};

use airwatch_core::validation::SOURCE_MAX;
use airwatch_core::{BoundingBox, Validator};

use crate::auth::AuthUser;
use crate::db;
use crate::error::ApiError;
use crate::models::{CreateMeasurementRequest, Measurement, MeasurementQuery, NearbyQuery};
use crate::state::AppState;

/// Longest look-back window accepted by the nearby query.
const MAX_NEARBY_HOURS: i64 = 24 * 365;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/measurements", get(list_measurements).post(create_measurement))
        .route("/measurements/nearby", get(nearby_measurements))
        .route(
            "/measurements/{id}",
            get(get_measurement).delete(delete_measurement),
        )
}

/// Store a reading and bump the station's last_updated in one transaction.
async fn create_measurement(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<CreateMeasurementRequest>,
) -> Result<(StatusCode, Json<Measurement>), ApiError> {
    user.require_admin()?;
    Validator::validate_pollutants(&req.pollutants)?;
    Validator::validate_non_negative("aqi", req.aqi.map(|a| a as f64))?;
    Validator::validate_text("source", &req.source, SOURCE_MAX)?;

    if !db::stations::station_exists(&state.pool, req.station_id).await? {
        return Err(ApiError::NotFound("Station"));
    }

    let timestamp = req.timestamp.unwrap_or_else(Utc::now);
    let mut tx = state.pool.begin().await?;
    let measurement = db::measurements::insert_measurement(&mut *tx, &req, timestamp).await?;
    db::stations::touch_last_updated(&mut *tx, req.station_id, timestamp).await?;
    tx.commit().await?;

    Ok((StatusCode::CREATED, Json(measurement)))
}

async fn list_measurements(
    State(state): State<AppState>,
    Query(query): Query<MeasurementQuery>,
) -> Result<Json<Vec<Measurement>>, ApiError> {
    let (limit, offset) = db::clamp_page(query.limit, query.offset);
    Ok(Json(
        db::measurements::list_measurements(&state.pool, &query, limit, offset).await?,
    ))
}

/// Readings from stations within `radius_km` of a point over the last `hours`.
async fn nearby_measurements(
    State(state): State<AppState>,
    Query(query): Query<NearbyQuery>,
) -> Result<Json<Vec<Measurement>>, ApiError> {
    Validator::validate_coordinates(query.lat, query.lon)?;
    Validator::validate_radius(query.radius_km)?;

    let bbox = BoundingBox::around(query.lat, query.lon, query.radius_km);
    let since = Utc::now() - Duration::hours(query.hours.clamp(1, MAX_NEARBY_HOURS));
    let (limit, _) = db::clamp_page(query.limit, 0);

    Ok(Json(
        db::measurements::list_nearby(&state.pool, bbox, since, limit).await?,
    ))
}

async fn get_measurement(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Measurement>, ApiError> {
    let measurement = db::measurements::find_measurement(&state.pool, id)
        .await?
        .ok_or(ApiError::NotFound("Measurement"))?;
    Ok(Json(measurement))
}

async fn delete_measurement(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    user.require_admin()?;
    if !db::measurements::delete_measurement(&state.pool, id).await? {
        return Err(ApiError::NotFound("Measurement"));
    }
    Ok(StatusCode::NO_CONTENT)
}
