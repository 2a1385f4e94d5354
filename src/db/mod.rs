//! SQLite entity store.
//!
//! Each submodule owns the queries for one table family. Functions take any
//! SQLite executor so handlers can run them on the pool or inside a
//! transaction.

pub mod contributions;
pub mod forum;
pub mod measurements;
pub mod notifications;
pub mod reports;
pub mod reputation;
pub mod sessions;
pub mod stations;
pub mod users;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::time::Duration;

/// Maximum allowed limit for pagination.
pub const MAX_LIMIT: i64 = 1000;

/// Clamp client-supplied pagination to `1..=MAX_LIMIT` and a non-negative offset.
pub fn clamp_page(limit: i64, offset: i64) -> (i64, i64) {
    (limit.clamp(1, MAX_LIMIT), offset.max(0))
}

fn is_in_memory(database_url: &str) -> bool {
    database_url.contains(":memory:") || database_url.contains("mode=memory")
}

/// Initialize database connection pool with recommended pragmas.
///
/// An in-memory database lives and dies with its connection, so it gets a
/// single connection that is never recycled.
pub async fn init_pool(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5))
        .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);

    let pool_options = if is_in_memory(database_url) {
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(10)
    };

    pool_options.connect_with(options).await
}

/// Run database migrations.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::raw_sql(include_str!("../../migrations/001_init.sql"))
        .execute(pool)
        .await?;
    Ok(())
}

/// Liveness check for the health endpoint.
pub async fn ping(pool: &SqlitePool) -> bool {
    sqlx::query_scalar::<_, i64>("SELECT 1")
        .fetch_one(pool)
        .await
        .is_ok()
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let pool = setup_test_db().await;
        run_migrations(&pool).await.unwrap();
        assert!(ping(&pool).await);
    }

    #[test]
    fn test_clamp_page() {
        assert_eq!(clamp_page(100, 0), (100, 0));
        assert_eq!(clamp_page(100_000, -5), (MAX_LIMIT, 0));
        assert_eq!(clamp_page(0, 10), (1, 10));
    }

    #[tokio::test]
    async fn test_db_check_constraints() {
        let pool = setup_test_db().await;
        let now = chrono::Utc::now();

        // Invalid latitude should fail
        let result = sqlx::query(
            "INSERT INTO stations (station_name, latitude, longitude, source, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind("Bad")
        .bind(91.0)
        .bind(10.0)
        .bind("epa")
        .bind(now)
        .execute(&pool)
        .await;
        assert!(result.is_err());

        // Unknown report status should fail
        let user_id = insert_user(&pool, "alice", airwatch_core::Role::User).await;
        let result = sqlx::query(
            "INSERT INTO reports (reporter_id, reported_user_id, reason, status, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(user_id)
        .bind("spam")
        .bind("maybe")
        .bind(now)
        .execute(&pool)
        .await;
        assert!(result.is_err());

        // Negative vote counters should fail
        let result = sqlx::query(
            "INSERT INTO posts (user_id, title, content, downvotes, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind("t")
        .bind("c")
        .bind(-1)
        .bind(now)
        .execute(&pool)
        .await;
        assert!(result.is_err());
    }
}
