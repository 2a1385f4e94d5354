use chrono::{DateTime, Utc};
use sqlx::SqliteExecutor;

use crate::models::User;

/// Store the digest of a freshly issued bearer token.
pub async fn insert_session(
    db: impl SqliteExecutor<'_>,
    token_hash: &str,
    user_id: i64,
    expires_at: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO sessions (token_hash, user_id, created_at, expires_at) VALUES (?, ?, ?, ?)",
    )
    .bind(token_hash)
    .bind(user_id)
    .bind(Utc::now())
    .bind(expires_at)
    .execute(db)
    .await?;
    Ok(())
}

/// Resolve an unexpired session to its user.
pub async fn find_session_user(
    db: impl SqliteExecutor<'_>,
    token_hash: &str,
    now: DateTime<Utc>,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT u.user_id, u.username, u.email, u.password_hash, u.role, u.is_active,
               u.created_at, u.updated_at, u.last_login
        FROM sessions s
        JOIN users u ON u.user_id = s.user_id
        WHERE s.token_hash = ? AND s.expires_at > ?
        "#,
    )
    .bind(token_hash)
    .bind(now)
    .fetch_optional(db)
    .await
}

pub async fn delete_session(db: impl SqliteExecutor<'_>, token_hash: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM sessions WHERE token_hash = ?")
        .bind(token_hash)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Drop sessions past their expiry. Returns how many were removed.
pub async fn purge_expired(db: impl SqliteExecutor<'_>, now: DateTime<Utc>) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
        .bind(now)
        .execute(db)
        .await?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::{insert_user, setup_test_db};
    use airwatch_core::Role;
    use chrono::Duration;

    #[tokio::test]
    async fn test_session_lookup_and_expiry() {
        let pool = setup_test_db().await;
        let user_id = insert_user(&pool, "alice", Role::User).await;
        let now = Utc::now();

        insert_session(&pool, "live", user_id, now + Duration::hours(1))
            .await
            .unwrap();
        insert_session(&pool, "stale", user_id, now - Duration::hours(1))
            .await
            .unwrap();

        let user = find_session_user(&pool, "live", now).await.unwrap().unwrap();
        assert_eq!(user.username, "alice");
        assert!(find_session_user(&pool, "stale", now).await.unwrap().is_none());
        assert!(find_session_user(&pool, "missing", now).await.unwrap().is_none());

        assert_eq!(purge_expired(&pool, now).await.unwrap(), 1);
        assert!(delete_session(&pool, "live").await.unwrap());
        assert!(!delete_session(&pool, "live").await.unwrap());
    }
}
