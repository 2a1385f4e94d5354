use chrono::{DateTime, Utc};
use sqlx::SqliteExecutor;

use airwatch_core::BoundingBox;

use crate::models::{CreateMeasurementRequest, Measurement, MeasurementQuery};

const MEASUREMENT_COLUMNS: &str = "m.measurement_id, m.station_id, m.timestamp, m.pm25, m.pm10, \
                                   m.no2, m.co, m.so2, m.ozone, m.aqi, m.source, m.created_at";

/// Insert a sensor reading taken at `timestamp`.
pub async fn insert_measurement(
    db: impl SqliteExecutor<'_>,
    req: &CreateMeasurementRequest,
    timestamp: DateTime<Utc>,
) -> Result<Measurement, sqlx::Error> {
    let p = &req.pollutants;
    sqlx::query_as::<_, Measurement>(
        r#"
        INSERT INTO measurements (station_id, timestamp, pm25, pm10, no2, co, so2, ozone, aqi, source, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING measurement_id, station_id, timestamp, pm25, pm10, no2, co, so2, ozone, aqi, source, created_at
        "#,
    )
    .bind(req.station_id)
    .bind(timestamp)
    .bind(p.pm25)
    .bind(p.pm10)
    .bind(p.no2)
    .bind(p.co)
    .bind(p.so2)
    .bind(p.ozone)
    .bind(req.aqi)
    .bind(&req.source)
    .bind(Utc::now())
    .fetch_one(db)
    .await
}

pub async fn find_measurement(
    db: impl SqliteExecutor<'_>,
    measurement_id: i64,
) -> Result<Option<Measurement>, sqlx::Error> {
    sqlx::query_as::<_, Measurement>(&format!(
        "SELECT {MEASUREMENT_COLUMNS} FROM measurements m WHERE m.measurement_id = ?"
    ))
    .bind(measurement_id)
    .fetch_optional(db)
    .await
}

/// Filtered listing, newest first. `limit`/`offset` must already be clamped.
pub async fn list_measurements(
    db: impl SqliteExecutor<'_>,
    query: &MeasurementQuery,
    limit: i64,
    offset: i64,
) -> Result<Vec<Measurement>, sqlx::Error> {
    sqlx::query_as::<_, Measurement>(&format!(
        r#"
        SELECT {MEASUREMENT_COLUMNS}
        FROM measurements m
        WHERE (? IS NULL OR m.station_id = ?)
          AND (? IS NULL OR m.timestamp >= ?)
          AND (? IS NULL OR m.timestamp <= ?)
        ORDER BY m.timestamp DESC, m.measurement_id DESC
        LIMIT ? OFFSET ?
        "#
    ))
    .bind(query.station_id)
    .bind(query.station_id)
    .bind(query.start_time)
    .bind(query.start_time)
    .bind(query.end_time)
    .bind(query.end_time)
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await
}

/// Readings since `since` from stations inside `bbox`, newest first.
pub async fn list_nearby(
    db: impl SqliteExecutor<'_>,
    bbox: BoundingBox,
    since: DateTime<Utc>,
    limit: i64,
) -> Result<Vec<Measurement>, sqlx::Error> {
    sqlx::query_as::<_, Measurement>(&format!(
        r#"
        SELECT {MEASUREMENT_COLUMNS}
        FROM measurements m
        JOIN stations s ON s.station_id = m.station_id
        WHERE s.latitude BETWEEN ? AND ?
          AND s.longitude BETWEEN ? AND ?
          AND m.timestamp >= ?
        ORDER BY m.timestamp DESC, m.measurement_id DESC
        LIMIT ?
        "#
    ))
    .bind(bbox.min_lat)
    .bind(bbox.max_lat)
    .bind(bbox.min_lon)
    .bind(bbox.max_lon)
    .bind(since)
    .bind(limit)
    .fetch_all(db)
    .await
}

pub async fn delete_measurement(
    db: impl SqliteExecutor<'_>,
    measurement_id: i64,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM measurements WHERE measurement_id = ?")
        .bind(measurement_id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::stations::{insert_station, test_support::station_request};
    use crate::db::test_support::setup_test_db;
    use airwatch_core::Pollutants;
    use chrono::Duration;

    fn reading(station_id: i64, pm25: f64) -> CreateMeasurementRequest {
        CreateMeasurementRequest {
            station_id,
            pollutants: Pollutants {
                pm25: Some(pm25),
                ..Default::default()
            },
            aqi: Some(42),
            source: "sensor".to_string(),
            timestamp: None,
        }
    }

    #[tokio::test]
    async fn test_insert_and_list_newest_first() {
        let pool = setup_test_db().await;
        insert_station(&pool, &station_request("Oslo", 59.91, 10.75))
            .await
            .unwrap();
        let now = Utc::now();

        insert_measurement(&pool, &reading(1, 10.0), now - Duration::hours(2))
            .await
            .unwrap();
        let latest = insert_measurement(&pool, &reading(1, 20.0), now)
            .await
            .unwrap();
        assert_eq!(latest.pm25, Some(20.0));
        assert_eq!(latest.pm10, None);

        let query = MeasurementQuery {
            station_id: Some(1),
            start_time: None,
            end_time: None,
            limit: 100,
            offset: 0,
        };
        let all = list_measurements(&pool, &query, 100, 0).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].measurement_id, latest.measurement_id);

        let recent = MeasurementQuery {
            start_time: Some(now - Duration::hours(1)),
            ..query
        };
        let recent = list_measurements(&pool, &recent, 100, 0).await.unwrap();
        assert_eq!(recent.len(), 1);
    }

    #[tokio::test]
    async fn test_measurement_requires_existing_station() {
        let pool = setup_test_db().await;
        let result = insert_measurement(&pool, &reading(7, 10.0), Utc::now()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_nearby_filters_by_box_and_window() {
        let pool = setup_test_db().await;
        insert_station(&pool, &station_request("Oslo", 59.91, 10.75))
            .await
            .unwrap();
        insert_station(&pool, &station_request("Bergen", 60.39, 5.32))
            .await
            .unwrap();
        let now = Utc::now();

        insert_measurement(&pool, &reading(1, 10.0), now).await.unwrap();
        insert_measurement(&pool, &reading(1, 11.0), now - Duration::hours(30))
            .await
            .unwrap();
        insert_measurement(&pool, &reading(2, 12.0), now).await.unwrap();

        let bbox = BoundingBox::around(59.9, 10.7, 10.0);
        let found = list_nearby(&pool, bbox, now - Duration::hours(24), 100)
            .await
            .unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].station_id, 1);
        assert_eq!(found[0].pm25, Some(10.0));
    }

    #[tokio::test]
    async fn test_delete_measurement() {
        let pool = setup_test_db().await;
        insert_station(&pool, &station_request("Oslo", 59.91, 10.75))
            .await
            .unwrap();
        let m = insert_measurement(&pool, &reading(1, 10.0), Utc::now())
            .await
            .unwrap();

        assert!(delete_measurement(&pool, m.measurement_id).await.unwrap());
        assert!(find_measurement(&pool, m.measurement_id).await.unwrap().is_none());
    }
}
