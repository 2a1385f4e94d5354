use chrono::Utc;
use sqlx::SqliteExecutor;

use airwatch_core::{ContributionStatus, Lifecycle};

use crate::models::{Contribution, CreateContributionRequest};

const CONTRIBUTION_COLUMNS: &str = "contribution_id, user_id, station_id, pm25, pm10, no2, co, so2, \
                                    ozone, overall_aqi, source, additional_info, status, created_at";

/// Insert a contribution in the pending state.
pub async fn insert_contribution(
    db: impl SqliteExecutor<'_>,
    user_id: i64,
    req: &CreateContributionRequest,
) -> Result<Contribution, sqlx::Error> {
    let p = &req.pollutants;
    sqlx::query_as::<_, Contribution>(&format!(
        r#"
        INSERT INTO public_contributions
            (user_id, station_id, pm25, pm10, no2, co, so2, ozone, overall_aqi, source, additional_info, status, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING {CONTRIBUTION_COLUMNS}
        "#
    ))
    .bind(user_id)
    .bind(req.station_id)
    .bind(p.pm25)
    .bind(p.pm10)
    .bind(p.no2)
    .bind(p.co)
    .bind(p.so2)
    .bind(p.ozone)
    .bind(req.overall_aqi)
    .bind(&req.source)
    .bind(req.additional_info.as_deref())
    .bind(ContributionStatus::Pending.as_str())
    .bind(Utc::now())
    .fetch_one(db)
    .await
}

pub async fn find_contribution(
    db: impl SqliteExecutor<'_>,
    contribution_id: i64,
) -> Result<Option<Contribution>, sqlx::Error> {
    sqlx::query_as::<_, Contribution>(&format!(
        "SELECT {CONTRIBUTION_COLUMNS} FROM public_contributions WHERE contribution_id = ?"
    ))
    .bind(contribution_id)
    .fetch_optional(db)
    .await
}

/// Newest first, optionally filtered by status.
pub async fn list_contributions(
    db: impl SqliteExecutor<'_>,
    status: Option<ContributionStatus>,
    limit: i64,
    offset: i64,
) -> Result<Vec<Contribution>, sqlx::Error> {
    sqlx::query_as::<_, Contribution>(&format!(
        r#"
        SELECT {CONTRIBUTION_COLUMNS}
        FROM public_contributions
        WHERE (? IS NULL OR status = ?)
        ORDER BY created_at DESC, contribution_id DESC
        LIMIT ? OFFSET ?
        "#
    ))
    .bind(status.map(ContributionStatus::as_str))
    .bind(status.map(ContributionStatus::as_str))
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await
}

/// Move a contribution from `from` to `to`.
///
/// Returns `None` when the row is gone or no longer in `from`, so a racing
/// moderator cannot overwrite a decision it did not see.
pub async fn transition_status(
    db: impl SqliteExecutor<'_>,
    contribution_id: i64,
    from: ContributionStatus,
    to: ContributionStatus,
) -> Result<Option<Contribution>, sqlx::Error> {
    sqlx::query_as::<_, Contribution>(&format!(
        r#"
        UPDATE public_contributions
        SET status = ?
        WHERE contribution_id = ? AND status = ?
        RETURNING {CONTRIBUTION_COLUMNS}
        "#
    ))
    .bind(to.as_str())
    .bind(contribution_id)
    .bind(from.as_str())
    .fetch_optional(db)
    .await
}

pub async fn delete_contribution(
    db: impl SqliteExecutor<'_>,
    contribution_id: i64,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM public_contributions WHERE contribution_id = ?")
        .bind(contribution_id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::stations::{insert_station, test_support::station_request};
    use crate::db::test_support::{insert_user, setup_test_db};
    use airwatch_core::{Pollutants, Role};

    fn contribution(station_id: Option<i64>) -> CreateContributionRequest {
        CreateContributionRequest {
            station_id,
            pollutants: Pollutants {
                pm25: Some(35.5),
                ..Default::default()
            },
            overall_aqi: Some(101.0),
            source: "handheld".to_string(),
            additional_info: Some("near the harbour".to_string()),
        }
    }

    #[tokio::test]
    async fn test_insert_contribution_is_pending() {
        let pool = setup_test_db().await;
        let user_id = insert_user(&pool, "carol", Role::DataContributor).await;
        insert_station(&pool, &station_request("Oslo", 59.91, 10.75))
            .await
            .unwrap();

        let c = insert_contribution(&pool, user_id, &contribution(Some(1)))
            .await
            .unwrap();

        assert_eq!(c.status, ContributionStatus::Pending);
        assert_eq!(c.user_id, user_id);
        assert_eq!(c.pm25, Some(35.5));
        assert_eq!(c.additional_info.as_deref(), Some("near the harbour"));
    }

    #[tokio::test]
    async fn test_transition_is_conditional_on_current_status() {
        let pool = setup_test_db().await;
        let user_id = insert_user(&pool, "carol", Role::DataContributor).await;
        let c = insert_contribution(&pool, user_id, &contribution(None))
            .await
            .unwrap();

        let approved = transition_status(
            &pool,
            c.contribution_id,
            ContributionStatus::Pending,
            ContributionStatus::Approved,
        )
        .await
        .unwrap()
        .unwrap();
        assert_eq!(approved.status, ContributionStatus::Approved);

        // A second moderator acting on the stale pending state loses.
        let stale = transition_status(
            &pool,
            c.contribution_id,
            ContributionStatus::Pending,
            ContributionStatus::Rejected,
        )
        .await
        .unwrap();
        assert!(stale.is_none());

        let current = find_contribution(&pool, c.contribution_id).await.unwrap().unwrap();
        assert_eq!(current.status, ContributionStatus::Approved);
    }

    #[tokio::test]
    async fn test_list_contributions_by_status() {
        let pool = setup_test_db().await;
        let user_id = insert_user(&pool, "carol", Role::DataContributor).await;
        for _ in 0..3 {
            insert_contribution(&pool, user_id, &contribution(None))
                .await
                .unwrap();
        }
        transition_status(&pool, 2, ContributionStatus::Pending, ContributionStatus::Rejected)
            .await
            .unwrap();

        let pending = list_contributions(&pool, Some(ContributionStatus::Pending), 100, 0)
            .await
            .unwrap();
        assert_eq!(pending.len(), 2);

        let all = list_contributions(&pool, None, 100, 0).await.unwrap();
        assert_eq!(all.len(), 3);

        let page = list_contributions(&pool, None, 1, 1).await.unwrap();
        assert_eq!(page.len(), 1);
    }
}
