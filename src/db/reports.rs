use chrono::Utc;
use sqlx::{SqliteExecutor, SqlitePool};

use airwatch_core::{Lifecycle, ReportStatus};

use crate::db::reputation;
use crate::models::Report;

const REPORT_COLUMNS: &str = "report_id, reporter_id, reported_user_id, reason, status, created_at";

pub async fn insert_report(
    db: impl SqliteExecutor<'_>,
    reporter_id: i64,
    reported_user_id: i64,
    reason: &str,
) -> Result<Report, sqlx::Error> {
    sqlx::query_as::<_, Report>(&format!(
        r#"
        INSERT INTO reports (reporter_id, reported_user_id, reason, status, created_at)
        VALUES (?, ?, ?, ?, ?)
        RETURNING {REPORT_COLUMNS}
        "#
    ))
    .bind(reporter_id)
    .bind(reported_user_id)
    .bind(reason)
    .bind(ReportStatus::Pending.as_str())
    .bind(Utc::now())
    .fetch_one(db)
    .await
}

pub async fn find_report(db: impl SqliteExecutor<'_>, report_id: i64) -> Result<Option<Report>, sqlx::Error> {
    sqlx::query_as::<_, Report>(&format!(
        "SELECT {REPORT_COLUMNS} FROM reports WHERE report_id = ?"
    ))
    .bind(report_id)
    .fetch_optional(db)
    .await
}

/// Oldest first, so moderators work the queue in order.
pub async fn list_reports(
    db: impl SqliteExecutor<'_>,
    status: Option<ReportStatus>,
) -> Result<Vec<Report>, sqlx::Error> {
    sqlx::query_as::<_, Report>(&format!(
        r#"
        SELECT {REPORT_COLUMNS}
        FROM reports
        WHERE (? IS NULL OR status = ?)
        ORDER BY created_at ASC, report_id ASC
        "#
    ))
    .bind(status.map(ReportStatus::as_str))
    .bind(status.map(ReportStatus::as_str))
    .fetch_all(db)
    .await
}

/// Move `report` to `to` and apply the credibility outcome atomically.
///
/// The caller has already checked the transition against `report.status`.
/// Returns `None` if the stored status no longer matches, in which case
/// nothing is written.
pub async fn apply_transition(
    pool: &SqlitePool,
    report: &Report,
    to: ReportStatus,
) -> Result<Option<Report>, sqlx::Error> {
    let mut tx = pool.begin().await?;

    // Write first so SQLite takes the write lock before anything is read.
    let updated = sqlx::query_as::<_, Report>(&format!(
        r#"
        UPDATE reports
        SET status = ?
        WHERE report_id = ? AND status = ?
        RETURNING {REPORT_COLUMNS}
        "#
    ))
    .bind(to.as_str())
    .bind(report.report_id)
    .bind(report.status.as_str())
    .fetch_optional(&mut *tx)
    .await?;

    let Some(updated) = updated else {
        return Ok(None);
    };

    reputation::apply_report_outcome(
        &mut tx,
        updated.reporter_id,
        updated.reported_user_id,
        to.credibility_delta(),
    )
    .await?;

    tx.commit().await?;
    Ok(Some(updated))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::reputation::find_reputation;
    use crate::db::test_support::{insert_user, setup_test_db};
    use airwatch_core::Role;

    #[tokio::test]
    async fn test_insert_report_is_pending() {
        let pool = setup_test_db().await;
        let a = insert_user(&pool, "alice", Role::User).await;
        let b = insert_user(&pool, "bob", Role::User).await;

        let report = insert_report(&pool, a, b, "spam links").await.unwrap();

        assert_eq!(report.status, ReportStatus::Pending);
        assert_eq!(report.reporter_id, a);
        assert_eq!(report.reported_user_id, b);
    }

    #[tokio::test]
    async fn test_verify_applies_credibility_once() {
        let pool = setup_test_db().await;
        let reporter = insert_user(&pool, "alice", Role::User).await;
        let reported = insert_user(&pool, "bob", Role::User).await;
        let report = insert_report(&pool, reporter, reported, "abuse").await.unwrap();

        let updated = apply_transition(&pool, &report, ReportStatus::Verified)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.status, ReportStatus::Verified);

        // Stale snapshot still says pending; the conditional update must refuse.
        assert!(apply_transition(&pool, &report, ReportStatus::Verified)
            .await
            .unwrap()
            .is_none());

        let r = find_reputation(&pool, reporter).await.unwrap().unwrap();
        assert_eq!(r.credibility_points, 105);
        let r = find_reputation(&pool, reported).await.unwrap().unwrap();
        assert_eq!(r.credibility_points, 90);
    }

    #[tokio::test]
    async fn test_false_report_penalizes_reporter() {
        let pool = setup_test_db().await;
        let reporter = insert_user(&pool, "alice", Role::User).await;
        let reported = insert_user(&pool, "bob", Role::User).await;
        let report = insert_report(&pool, reporter, reported, "abuse").await.unwrap();

        apply_transition(&pool, &report, ReportStatus::False)
            .await
            .unwrap()
            .unwrap();

        let r = find_reputation(&pool, reporter).await.unwrap().unwrap();
        assert_eq!(r.credibility_points, 90);
        let r = find_reputation(&pool, reported).await.unwrap().unwrap();
        assert_eq!(r.credibility_points, 100);
    }

    #[tokio::test]
    async fn test_list_reports_by_status() {
        let pool = setup_test_db().await;
        let a = insert_user(&pool, "alice", Role::User).await;
        let b = insert_user(&pool, "bob", Role::User).await;
        let first = insert_report(&pool, a, b, "one").await.unwrap();
        insert_report(&pool, b, a, "two").await.unwrap();
        apply_transition(&pool, &first, ReportStatus::False)
            .await
            .unwrap();

        let pending = list_reports(&pool, Some(ReportStatus::Pending)).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].reason, "two");
        assert_eq!(list_reports(&pool, None).await.unwrap().len(), 2);
    }
}
