//! Reputation counters.
//!
//! Every change is a single upsert that increments in place, so concurrent
//! votes or moderation never lose updates. Streaks are the exception: the next
//! value depends on the stored date, so they use compare-and-set.

use chrono::NaiveDate;
use sqlx::{SqliteConnection, SqliteExecutor};

use airwatch_core::reputation::AURA_PER_UPVOTE;
use airwatch_core::{next_streak, CredibilityDelta, INITIAL_CREDIBILITY};

use crate::models::Reputation;

/// Attempts before a contended streak update gives up.
const STREAK_CAS_ATTEMPTS: usize = 5;

pub async fn find_reputation(
    db: impl SqliteExecutor<'_>,
    user_id: i64,
) -> Result<Option<Reputation>, sqlx::Error> {
    sqlx::query_as::<_, Reputation>(
        r#"
        SELECT user_id, aura_points, streak_points, credibility_points, last_streak_date
        FROM user_reputation
        WHERE user_id = ?
        "#,
    )
    .bind(user_id)
    .fetch_optional(db)
    .await
}

/// Give the author of upvoted content one aura point.
pub async fn credit_aura(db: impl SqliteExecutor<'_>, user_id: i64) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO user_reputation (user_id, aura_points, credibility_points)
        VALUES (?, ?, ?)
        ON CONFLICT(user_id) DO UPDATE SET aura_points = aura_points + excluded.aura_points
        "#,
    )
    .bind(user_id)
    .bind(AURA_PER_UPVOTE)
    .bind(INITIAL_CREDIBILITY)
    .execute(db)
    .await?;
    Ok(())
}

/// Add `delta` to a user's credibility, creating the row at the initial value.
pub async fn adjust_credibility(
    db: impl SqliteExecutor<'_>,
    user_id: i64,
    delta: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO user_reputation (user_id, credibility_points)
        VALUES (?, ?)
        ON CONFLICT(user_id) DO UPDATE SET credibility_points = credibility_points + ?
        "#,
    )
    .bind(user_id)
    .bind(INITIAL_CREDIBILITY + delta)
    .bind(delta)
    .execute(db)
    .await?;
    Ok(())
}

/// Apply a report outcome to both parties. Both rows exist afterwards even
/// when a side's delta is zero.
pub async fn apply_report_outcome(
    conn: &mut SqliteConnection,
    reporter_id: i64,
    reported_user_id: i64,
    delta: CredibilityDelta,
) -> Result<(), sqlx::Error> {
    adjust_credibility(&mut *conn, reporter_id, delta.reporter).await?;
    adjust_credibility(&mut *conn, reported_user_id, delta.reported).await?;
    Ok(())
}

/// Count activity on `today` towards the user's daily streak.
pub async fn record_streak_activity(
    conn: &mut SqliteConnection,
    user_id: i64,
    today: NaiveDate,
) -> Result<Reputation, sqlx::Error> {
    for _ in 0..STREAK_CAS_ATTEMPTS {
        let current = find_reputation(&mut *conn, user_id).await?;
        // No next streak means today is already counted, so a row exists.
        let Some(next) = next_streak(current.as_ref().and_then(Reputation::streak), today) else {
            return current.ok_or(sqlx::Error::RowNotFound);
        };

        let applied = match &current {
            None => sqlx::query(
                r#"
                INSERT INTO user_reputation (user_id, streak_points, credibility_points, last_streak_date)
                VALUES (?, ?, ?, ?)
                ON CONFLICT(user_id) DO NOTHING
                "#,
            )
            .bind(user_id)
            .bind(next.points)
            .bind(INITIAL_CREDIBILITY)
            .bind(next.last_date)
            .execute(&mut *conn)
            .await?
            .rows_affected(),
            Some(prev) => sqlx::query(
                r#"
                UPDATE user_reputation
                SET streak_points = ?, last_streak_date = ?
                WHERE user_id = ? AND streak_points = ? AND last_streak_date IS ?
                "#,
            )
            .bind(next.points)
            .bind(next.last_date)
            .bind(user_id)
            .bind(prev.streak_points)
            .bind(prev.last_streak_date)
            .execute(&mut *conn)
            .await?
            .rows_affected(),
        };

        if applied > 0 {
            return find_reputation(&mut *conn, user_id)
                .await?
                .ok_or(sqlx::Error::RowNotFound);
        }
        tracing::debug!("Streak update for user {} raced, retrying", user_id);
    }

    tracing::warn!("Streak update for user {} kept racing, skipping", user_id);
    find_reputation(&mut *conn, user_id)
        .await?
        .ok_or(sqlx::Error::RowNotFound)
}
