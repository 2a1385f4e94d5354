use chrono::{DateTime, Utc};
use sqlx::SqliteExecutor;

use crate::models::{CreateStationRequest, Station, StationQuery, UpdateStationRequest};

const STATION_COLUMNS: &str = "station_id, station_name, latitude, longitude, epa_name, epa_link, \
                               is_active, source, last_updated, created_at, updated_at";

pub async fn insert_station(
    db: impl SqliteExecutor<'_>,
    req: &CreateStationRequest,
) -> Result<Station, sqlx::Error> {
    sqlx::query_as::<_, Station>(&format!(
        r#"
        INSERT INTO stations (station_name, latitude, longitude, epa_name, epa_link, is_active, source, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING {STATION_COLUMNS}
        "#
    ))
    .bind(&req.station_name)
    .bind(req.latitude)
    .bind(req.longitude)
    .bind(req.epa_name.as_deref())
    .bind(req.epa_link.as_deref())
    .bind(req.is_active)
    .bind(&req.source)
    .bind(Utc::now())
    .fetch_one(db)
    .await
}

pub async fn find_station(
    db: impl SqliteExecutor<'_>,
    station_id: i64,
) -> Result<Option<Station>, sqlx::Error> {
    sqlx::query_as::<_, Station>(&format!(
        "SELECT {STATION_COLUMNS} FROM stations WHERE station_id = ?"
    ))
    .bind(station_id)
    .fetch_optional(db)
    .await
}

pub async fn station_exists(db: impl SqliteExecutor<'_>, station_id: i64) -> Result<bool, sqlx::Error> {
    let found: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM stations WHERE station_id = ?")
        .bind(station_id)
        .fetch_one(db)
        .await?;
    Ok(found > 0)
}

/// List stations, optionally restricted to a bounding box and to active ones.
/// Missing box edges are unbounded.
pub async fn list_stations(
    db: impl SqliteExecutor<'_>,
    query: &StationQuery,
) -> Result<Vec<Station>, sqlx::Error> {
    sqlx::query_as::<_, Station>(&format!(
        r#"
        SELECT {STATION_COLUMNS}
        FROM stations
        WHERE (? IS NULL OR latitude >= ?)
          AND (? IS NULL OR latitude <= ?)
          AND (? IS NULL OR longitude >= ?)
          AND (? IS NULL OR longitude <= ?)
          AND (? = 0 OR is_active = 1)
        ORDER BY station_id ASC
        "#
    ))
    .bind(query.min_lat)
    .bind(query.min_lat)
    .bind(query.max_lat)
    .bind(query.max_lat)
    .bind(query.min_lon)
    .bind(query.min_lon)
    .bind(query.max_lon)
    .bind(query.max_lon)
    .bind(query.active_only)
    .fetch_all(db)
    .await
}

/// Apply a partial update. Returns `None` if the station does not exist.
pub async fn update_station(
    db: impl SqliteExecutor<'_>,
    station_id: i64,
    req: &UpdateStationRequest,
) -> Result<Option<Station>, sqlx::Error> {
    sqlx::query_as::<_, Station>(&format!(
        r#"
        UPDATE stations
        SET station_name = COALESCE(?, station_name),
            latitude = COALESCE(?, latitude),
            longitude = COALESCE(?, longitude),
            epa_name = COALESCE(?, epa_name),
            epa_link = COALESCE(?, epa_link),
            is_active = COALESCE(?, is_active),
            source = COALESCE(?, source),
            updated_at = ?
        WHERE station_id = ?
        RETURNING {STATION_COLUMNS}
        "#
    ))
    .bind(req.station_name.as_deref())
    .bind(req.latitude)
    .bind(req.longitude)
    .bind(req.epa_name.as_deref())
    .bind(req.epa_link.as_deref())
    .bind(req.is_active)
    .bind(req.source.as_deref())
    .bind(Utc::now())
    .bind(station_id)
    .fetch_optional(db)
    .await
}

pub async fn touch_last_updated(
    db: impl SqliteExecutor<'_>,
    station_id: i64,
    at: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE stations SET last_updated = MAX(COALESCE(last_updated, ?), ?) WHERE station_id = ?",
    )
    .bind(at)
    .bind(at)
    .bind(station_id)
    .execute(db)
    .await?;
    Ok(())
}

pub async fn delete_station(db: impl SqliteExecutor<'_>, station_id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM stations WHERE station_id = ?")
        .bind(station_id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub fn station_request(name: &str, latitude: f64, longitude: f64) -> CreateStationRequest {
        CreateStationRequest {
            station_name: name.to_string(),
            latitude,
            longitude,
            epa_name: None,
            epa_link: None,
            is_active: true,
            source: "epa".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::station_request;
    use super::*;
    use crate::db::test_support::setup_test_db;

    #[tokio::test]
    async fn test_insert_and_find_station() {
        let pool = setup_test_db().await;

        let station = insert_station(&pool, &station_request("Oslo Kirkeveien", 59.93, 10.72))
            .await
            .unwrap();

        assert_eq!(station.station_id, 1);
        assert!(station.is_active);
        assert!(station.last_updated.is_none());
        let found = find_station(&pool, 1).await.unwrap().unwrap();
        assert_eq!(found.station_name, "Oslo Kirkeveien");
        assert!(station_exists(&pool, 1).await.unwrap());
        assert!(!station_exists(&pool, 2).await.unwrap());
    }

    #[tokio::test]
    async fn test_list_stations_bounding_box() {
        let pool = setup_test_db().await;
        insert_station(&pool, &station_request("Oslo", 59.91, 10.75))
            .await
            .unwrap();
        insert_station(&pool, &station_request("Bergen", 60.39, 5.32))
            .await
            .unwrap();

        let all = list_stations(&pool, &StationQuery::default()).await.unwrap();
        assert_eq!(all.len(), 2);

        let query = StationQuery {
            min_lon: Some(8.0),
            ..Default::default()
        };
        let east = list_stations(&pool, &query).await.unwrap();
        assert_eq!(east.len(), 1);
        assert_eq!(east[0].station_name, "Oslo");
    }

    #[tokio::test]
    async fn test_list_active_only() {
        let pool = setup_test_db().await;
        let mut inactive = station_request("Retired", 59.0, 10.0);
        inactive.is_active = false;
        insert_station(&pool, &inactive).await.unwrap();
        insert_station(&pool, &station_request("Live", 59.5, 10.5))
            .await
            .unwrap();

        let query = StationQuery {
            active_only: true,
            ..Default::default()
        };
        let stations = list_stations(&pool, &query).await.unwrap();
        assert_eq!(stations.len(), 1);
        assert_eq!(stations[0].station_name, "Live");
    }

    #[tokio::test]
    async fn test_update_and_delete_station() {
        let pool = setup_test_db().await;
        insert_station(&pool, &station_request("Oslo", 59.91, 10.75))
            .await
            .unwrap();

        let req = UpdateStationRequest {
            is_active: Some(false),
            ..Default::default()
        };
        let updated = update_station(&pool, 1, &req).await.unwrap().unwrap();
        assert!(!updated.is_active);
        assert_eq!(updated.latitude, 59.91);

        assert!(delete_station(&pool, 1).await.unwrap());
        assert!(!delete_station(&pool, 1).await.unwrap());
        assert!(update_station(&pool, 1, &req).await.unwrap().is_none());
    }
}
