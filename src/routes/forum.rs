use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};

use airwatch_core::validation::POST_TITLE_MAX;
use airwatch_core::{Lifecycle, ReportStatus, Transition, ValidationError, Validator};

use crate::auth::AuthUser;
use crate::db;
use crate::db::forum::{VoteKind, VoteTarget};
use crate::error::ApiError;
use crate::models::{
    Comment, CreateCommentRequest, CreatePostRequest, CreateReportRequest, PageQuery, Post,
    Report, ReportQuery, Reputation, StatusUpdate, VoteResponse,
};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        // Posts and comments
        .route("/forum/posts", get(list_posts).post(create_post))
        .route("/forum/posts/{id}", get(get_post))
        .route("/forum/posts/{id}/comments", get(list_comments))
        .route("/forum/comments", post(create_comment))
        // Voting
        .route(
            "/forum/posts/{id}/upvote",
            post(upvote_post).delete(remove_post_upvote),
        )
        .route(
            "/forum/posts/{id}/downvote",
            post(downvote_post).delete(remove_post_downvote),
        )
        .route(
            "/forum/comments/{id}/upvote",
            post(upvote_comment).delete(remove_comment_upvote),
        )
        .route(
            "/forum/comments/{id}/downvote",
            post(downvote_comment).delete(remove_comment_downvote),
        )
        // Reputation and reports
        .route("/forum/reputation/{user_id}", get(get_reputation))
        .route("/forum/reports", get(list_reports).post(create_report))
        .route("/forum/reports/{id}", patch(update_report_status))
}

// ============================================================================
// Posts and comments
// ============================================================================

async fn create_post(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<CreatePostRequest>,
) -> Result<(StatusCode, Json<Post>), ApiError> {
    Validator::validate_text("title", &req.title, POST_TITLE_MAX)?;
    Validator::validate_content("content", &req.content)?;

    let post = db::forum::insert_post(&state.pool, user.user_id, &req.title, &req.content).await?;
    Ok((StatusCode::CREATED, Json(post)))
}

async fn list_posts(
    State(state): State<AppState>,
    Query(page): Query<PageQuery>,
) -> Result<Json<Vec<Post>>, ApiError> {
    let (limit, offset) = db::clamp_page(page.limit, page.offset);
    Ok(Json(db::forum::list_posts(&state.pool, limit, offset).await?))
}

async fn get_post(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Json<Post>, ApiError> {
    let post = db::forum::find_post(&state.pool, id)
        .await?
        .ok_or(ApiError::NotFound("Post"))?;
    Ok(Json(post))
}

async fn create_comment(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<CreateCommentRequest>,
) -> Result<(StatusCode, Json<Comment>), ApiError> {
    Validator::validate_content("content", &req.content)?;
    if !db::forum::post_exists(&state.pool, req.post_id).await? {
        return Err(ApiError::NotFound("Post"));
    }

    let comment =
        db::forum::insert_comment(&state.pool, req.post_id, user.user_id, &req.content).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

async fn list_comments(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<Comment>>, ApiError> {
    if !db::forum::post_exists(&state.pool, id).await? {
        return Err(ApiError::NotFound("Post"));
    }
    Ok(Json(db::forum::list_comments(&state.pool, id).await?))
}

// ============================================================================
// Voting
// ============================================================================

async fn cast(
    state: &AppState,
    target: VoteTarget,
    id: i64,
    kind: VoteKind,
) -> Result<Json<VoteResponse>, ApiError> {
    let counts = db::forum::cast_vote(&state.pool, target, id, kind)
        .await?
        .ok_or(ApiError::NotFound(target.label()))?;
    let message = match kind {
        VoteKind::Up => "Upvoted successfully",
        VoteKind::Down => "Downvoted successfully",
    };
    Ok(Json(VoteResponse::new(message, counts)))
}

async fn retract(
    state: &AppState,
    target: VoteTarget,
    id: i64,
    kind: VoteKind,
) -> Result<Json<VoteResponse>, ApiError> {
    let counts = db::forum::retract_vote(&state.pool, target, id, kind)
        .await?
        .ok_or(ApiError::NotFound(target.label()))?;
    let message = match kind {
        VoteKind::Up => "Upvote removed",
        VoteKind::Down => "Downvote removed",
    };
    Ok(Json(VoteResponse::new(message, counts)))
}

async fn upvote_post(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<VoteResponse>, ApiError> {
    cast(&state, VoteTarget::Post, id, VoteKind::Up).await
}

async fn remove_post_upvote(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<VoteResponse>, ApiError> {
    retract(&state, VoteTarget::Post, id, VoteKind::Up).await
}

async fn downvote_post(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<VoteResponse>, ApiError> {
    cast(&state, VoteTarget::Post, id, VoteKind::Down).await
}

async fn remove_post_downvote(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<VoteResponse>, ApiError> {
    retract(&state, VoteTarget::Post, id, VoteKind::Down).await
}

async fn upvote_comment(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<VoteResponse>, ApiError> {
    cast(&state, VoteTarget::Comment, id, VoteKind::Up).await
}

async fn remove_comment_upvote(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<VoteResponse>, ApiError> {
    retract(&state, VoteTarget::Comment, id, VoteKind::Up).await
}

async fn downvote_comment(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<VoteResponse>, ApiError> {
    cast(&state, VoteTarget::Comment, id, VoteKind::Down).await
}

async fn remove_comment_downvote(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<VoteResponse>, ApiError> {
    retract(&state, VoteTarget::Comment, id, VoteKind::Down).await
}

// ============================================================================
// Reputation and reports
// ============================================================================

async fn get_reputation(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<Reputation>, ApiError> {
    let reputation = db::reputation::find_reputation(&state.pool, user_id)
        .await?
        .ok_or(ApiError::NotFound("Reputation"))?;
    Ok(Json(reputation))
}

async fn create_report(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<CreateReportRequest>,
) -> Result<(StatusCode, Json<Report>), ApiError> {
    Validator::validate_content("reason", &req.reason)?;
    if req.reported_user_id == user.user_id {
        return Err(ValidationError::SelfReport.into());
    }
    if !db::users::exists(&state.pool, req.reported_user_id).await? {
        return Err(ApiError::NotFound("User"));
    }

    let report =
        db::reports::insert_report(&state.pool, user.user_id, req.reported_user_id, &req.reason)
            .await?;
    tracing::info!(
        "User {} reported user {} (report {})",
        user.user_id,
        report.reported_user_id,
        report.report_id
    );
    Ok((StatusCode::CREATED, Json(report)))
}

async fn list_reports(
    State(state): State<AppState>,
    admin: AuthUser,
    Query(query): Query<ReportQuery>,
) -> Result<Json<Vec<Report>>, ApiError> {
    admin.require_admin()?;
    Ok(Json(db::reports::list_reports(&state.pool, query.status).await?))
}

/// Resolve a report. Verifying or rejecting it adjusts credibility for both
/// parties in the same transaction as the status change.
async fn update_report_status(
    State(state): State<AppState>,
    admin: AuthUser,
    Path(id): Path<i64>,
    Json(update): Json<StatusUpdate<ReportStatus>>,
) -> Result<Json<Report>, ApiError> {
    admin.require_admin()?;
    let current = db::reports::find_report(&state.pool, id)
        .await?
        .ok_or(ApiError::NotFound("Report"))?;

    if current.status.transition_to(update.status)? == Transition::Unchanged {
        return Ok(Json(current));
    }

    let updated = db::reports::apply_transition(&state.pool, &current, update.status)
        .await?
        .ok_or_else(|| ApiError::Conflict("Report was modified concurrently".to_string()))?;

    tracing::info!(
        "Admin {} moved report {} from {} to {}",
        admin.user_id,
        id,
        current.status,
        updated.status
    );
    Ok(Json(updated))
}
