use chrono::Utc;
use sqlx::{SqliteExecutor, SqlitePool};

use airwatch_core::AqiCategory;

use crate::models::{CreateNotificationRequest, Notification};

const NOTIFICATION_COLUMNS: &str = "notification_id, user_id, notification_type, title, message, \
                                    station_id, aqi_value, aqi_category, is_read, created_at";

/// Fan a notification out to every user in `user_ids`.
///
/// When the request carries an AQI value but no category, the category is
/// derived from the value. All rows are written in one transaction.
pub async fn insert_notifications(
    pool: &SqlitePool,
    req: &CreateNotificationRequest,
    user_ids: &[i64],
) -> Result<Vec<Notification>, sqlx::Error> {
    let category = req
        .aqi_category
        .or_else(|| req.aqi_value.map(AqiCategory::from_aqi))
        .map(AqiCategory::as_str);
    let now = Utc::now();

    let mut tx = pool.begin().await?;
    let mut created = Vec::with_capacity(user_ids.len());
    for &user_id in user_ids {
        let notification = sqlx::query_as::<_, Notification>(&format!(
            r#"
            INSERT INTO notifications
                (user_id, notification_type, title, message, station_id, aqi_value, aqi_category, is_read, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, 0, ?)
            RETURNING {NOTIFICATION_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(req.notification_type.as_str())
        .bind(&req.title)
        .bind(&req.message)
        .bind(req.station_id)
        .bind(req.aqi_value)
        .bind(category)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;
        created.push(notification);
    }
    tx.commit().await?;

    Ok(created)
}

/// A user's notifications, newest first.
pub async fn list_for_user(
    db: impl SqliteExecutor<'_>,
    user_id: i64,
    unread_only: bool,
) -> Result<Vec<Notification>, sqlx::Error> {
    sqlx::query_as::<_, Notification>(&format!(
        r#"
        SELECT {NOTIFICATION_COLUMNS}
        FROM notifications
        WHERE user_id = ? AND (? = 0 OR is_read = 0)
        ORDER BY created_at DESC, notification_id DESC
        "#
    ))
    .bind(user_id)
    .bind(unread_only)
    .fetch_all(db)
    .await
}

/// Mark one of the user's notifications read. `None` if it is not theirs.
pub async fn mark_read(
    db: impl SqliteExecutor<'_>,
    user_id: i64,
    notification_id: i64,
) -> Result<Option<Notification>, sqlx::Error> {
    sqlx::query_as::<_, Notification>(&format!(
        r#"
        UPDATE notifications
        SET is_read = 1
        WHERE notification_id = ? AND user_id = ?
        RETURNING {NOTIFICATION_COLUMNS}
        "#
    ))
    .bind(notification_id)
    .bind(user_id)
    .fetch_optional(db)
    .await
}

/// Every active account, for broadcast notifications.
pub async fn active_user_ids(db: impl SqliteExecutor<'_>) -> Result<Vec<i64>, sqlx::Error> {
    sqlx::query_scalar("SELECT user_id FROM users WHERE is_active = 1 ORDER BY user_id")
        .fetch_all(db)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::{insert_user, setup_test_db};
    use airwatch_core::{NotificationType, Role};

    fn alert(aqi_value: Option<i64>, aqi_category: Option<AqiCategory>) -> CreateNotificationRequest {
        CreateNotificationRequest {
            notification_type: NotificationType::ThresholdAlert,
            title: "PM2.5 spike".to_string(),
            message: "Stay indoors".to_string(),
            station_id: None,
            aqi_value,
            aqi_category,
            user_ids: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_category_derived_from_value() {
        let pool = setup_test_db().await;
        let user_id = insert_user(&pool, "hana", Role::User).await;

        let created = insert_notifications(&pool, &alert(Some(160), None), &[user_id])
            .await
            .unwrap();

        assert_eq!(created.len(), 1);
        assert_eq!(created[0].aqi_category, Some(AqiCategory::Unhealthy));
        assert!(!created[0].is_read);
    }

    #[tokio::test]
    async fn test_category_absent_without_value() {
        let pool = setup_test_db().await;
        let user_id = insert_user(&pool, "hana", Role::User).await;
        insert_notifications(&pool, &alert(None, None), &[user_id])
            .await
            .unwrap();

        let listed = list_for_user(&pool, user_id, false).await.unwrap();
        assert_eq!(listed[0].aqi_category, None);
        assert_eq!(listed[0].notification_type, NotificationType::ThresholdAlert);
    }

    #[tokio::test]
    async fn test_explicit_category_wins() {
        let pool = setup_test_db().await;
        let user_id = insert_user(&pool, "hana", Role::User).await;

        let created = insert_notifications(
            &pool,
            &alert(Some(160), Some(AqiCategory::Moderate)),
            &[user_id],
        )
        .await
        .unwrap();

        assert_eq!(created[0].aqi_category, Some(AqiCategory::Moderate));
    }

    #[tokio::test]
    async fn test_mark_read_only_own() {
        let pool = setup_test_db().await;
        let hana = insert_user(&pool, "hana", Role::User).await;
        let ivan = insert_user(&pool, "ivan", Role::User).await;
        let created = insert_notifications(&pool, &alert(None, None), &[hana, ivan])
            .await
            .unwrap();
        let hanas = created.iter().find(|n| n.user_id == hana).unwrap();

        assert!(mark_read(&pool, ivan, hanas.notification_id)
            .await
            .unwrap()
            .is_none());
        let read = mark_read(&pool, hana, hanas.notification_id)
            .await
            .unwrap()
            .unwrap();
        assert!(read.is_read);

        assert_eq!(list_for_user(&pool, hana, false).await.unwrap().len(), 1);
        assert!(list_for_user(&pool, hana, true).await.unwrap().is_empty());
        assert_eq!(list_for_user(&pool, ivan, true).await.unwrap().len(), 1);
    }
}
