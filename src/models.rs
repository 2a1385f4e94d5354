use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use airwatch_core::{
    AqiCategory, ContributionStatus, NotificationType, Pollutants, ReportStatus, Role, Streak,
};

// ============================================================================
// Users and auth
// ============================================================================

/// A registered account.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    pub user_id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    #[sqlx(try_from = "String")]
    pub role: Role,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub last_login: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Role,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_at: DateTime<Utc>,
}

/// Admin edit of an account. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
}

// ============================================================================
// Stations and measurements
// ============================================================================

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Station {
    pub station_id: i64,
    pub station_name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub epa_name: Option<String>,
    pub epa_link: Option<String>,
    pub is_active: bool,
    pub source: String,
    pub last_updated: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct CreateStationRequest {
    pub station_name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub epa_name: Option<String>,
    pub epa_link: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub source: String,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateStationRequest {
    pub station_name: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub epa_name: Option<String>,
    pub epa_link: Option<String>,
    pub is_active: Option<bool>,
    pub source: Option<String>,
}

/// Query parameters for listing stations inside an optional bounding box.
#[derive(Debug, Default, Deserialize)]
pub struct StationQuery {
    pub min_lat: Option<f64>,
    pub max_lat: Option<f64>,
    pub min_lon: Option<f64>,
    pub max_lon: Option<f64>,
    #[serde(default)]
    pub active_only: bool,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Measurement {
    pub measurement_id: i64,
    pub station_id: i64,
    pub timestamp: DateTime<Utc>,
    pub pm25: Option<f64>,
    pub pm10: Option<f64>,
    pub no2: Option<f64>,
    pub co: Option<f64>,
    pub so2: Option<f64>,
    pub ozone: Option<f64>,
    pub aqi: Option<i64>,
    pub source: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateMeasurementRequest {
    pub station_id: i64,
    #[serde(flatten)]
    pub pollutants: Pollutants,
    pub aqi: Option<i64>,
    pub source: String,
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct MeasurementQuery {
    pub station_id: Option<i64>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

#[derive(Debug, Deserialize)]
pub struct NearbyQuery {
    pub lat: f64,
    pub lon: f64,
    #[serde(default = "default_radius_km")]
    pub radius_km: f64,
    #[serde(default = "default_hours")]
    pub hours: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    100
}

fn default_radius_km() -> f64 {
    10.0
}

fn default_hours() -> i64 {
    24
}

// ============================================================================
// Contributions
// ============================================================================

/// A citizen-submitted reading awaiting review.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Contribution {
    pub contribution_id: i64,
    pub user_id: i64,
    pub station_id: Option<i64>,
    pub pm25: Option<f64>,
    pub pm10: Option<f64>,
    pub no2: Option<f64>,
    pub co: Option<f64>,
    pub so2: Option<f64>,
    pub ozone: Option<f64>,
    pub overall_aqi: Option<f64>,
    pub source: String,
    pub additional_info: Option<String>,
    #[sqlx(try_from = "String")]
    pub status: ContributionStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateContributionRequest {
    pub station_id: Option<i64>,
    #[serde(flatten)]
    pub pollutants: Pollutants,
    pub overall_aqi: Option<f64>,
    pub source: String,
    pub additional_info: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ContributionQuery {
    pub status: Option<ContributionStatus>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

/// Body of a moderation request.
#[derive(Debug, Deserialize)]
pub struct StatusUpdate<S> {
    pub status: S,
}

// ============================================================================
// Forum
// ============================================================================

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Post {
    pub post_id: i64,
    pub user_id: i64,
    pub username: String,
    pub title: String,
    pub content: String,
    pub upvotes: i64,
    pub downvotes: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Comment {
    pub comment_id: i64,
    pub post_id: i64,
    pub user_id: i64,
    pub username: String,
    pub content: String,
    pub upvotes: i64,
    pub downvotes: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    pub post_id: i64,
    pub content: String,
}

/// Vote counters of a post or comment after a vote change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct VoteCounts {
    pub upvotes: i64,
    pub downvotes: i64,
}

#[derive(Debug, Serialize)]
pub struct VoteResponse {
    pub message: &'static str,
    pub upvotes: i64,
    pub downvotes: i64,
}

impl VoteResponse {
    pub fn new(message: &'static str, counts: VoteCounts) -> Self {
        Self {
            message,
            upvotes: counts.upvotes,
            downvotes: counts.downvotes,
        }
    }
}

// ============================================================================
// Reputation and reports
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Reputation {
    pub user_id: i64,
    pub aura_points: i64,
    pub streak_points: i64,
    pub credibility_points: i64,
    pub last_streak_date: Option<NaiveDate>,
}

impl Reputation {
    /// Recorded streak, if the user has ever been active.
    pub fn streak(&self) -> Option<Streak> {
        self.last_streak_date.map(|last_date| Streak {
            points: self.streak_points,
            last_date,
        })
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Report {
    pub report_id: i64,
    pub reporter_id: i64,
    pub reported_user_id: i64,
    pub reason: String,
    #[sqlx(try_from = "String")]
    pub status: ReportStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateReportRequest {
    pub reported_user_id: i64,
    pub reason: String,
}

#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    pub status: Option<ReportStatus>,
}

// ============================================================================
// Notifications
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub notification_id: i64,
    pub user_id: i64,
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub station_id: Option<i64>,
    pub aqi_value: Option<i64>,
    pub aqi_category: Option<AqiCategory>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

fn decode_column<T, E>(column: &str, value: Result<T, E>) -> Result<T, sqlx::Error>
where
    E: std::error::Error + Send + Sync + 'static,
{
    value.map_err(|e| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}

// Written by hand because `aqi_category` is nullable.
impl<'r> sqlx::FromRow<'r, SqliteRow> for Notification {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let notification_type = decode_column(
            "notification_type",
            NotificationType::try_from(row.try_get::<String, _>("notification_type")?),
        )?;
        let aqi_category = decode_column(
            "aqi_category",
            row.try_get::<Option<String>, _>("aqi_category")?
                .map(AqiCategory::try_from)
                .transpose(),
        )?;

        Ok(Notification {
            notification_id: row.try_get("notification_id")?,
            user_id: row.try_get("user_id")?,
            notification_type,
            title: row.try_get("title")?,
            message: row.try_get("message")?,
            station_id: row.try_get("station_id")?,
            aqi_value: row.try_get("aqi_value")?,
            aqi_category,
            is_read: row.try_get("is_read")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateNotificationRequest {
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub station_id: Option<i64>,
    pub aqi_value: Option<i64>,
    pub aqi_category: Option<AqiCategory>,
    #[serde(default)]
    pub user_ids: Vec<i64>,
}

#[derive(Debug, Deserialize)]
pub struct NotificationQuery {
    #[serde(default)]
    pub unread_only: bool,
}

// ============================================================================
// System
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database_status: &'static str,
    pub environment: String,
    pub version: &'static str,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// `limit`/`offset` query for plain listings.
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}
