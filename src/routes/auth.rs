use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use chrono::Utc;

use airwatch_core::Validator;

use crate::auth::{self, AuthUser};
use crate::db;
use crate::error::{is_unique_violation, ApiError};
use crate::middleware::ClientIp;
use crate::models::{LoginRequest, MessageResponse, RegisterRequest, TokenResponse, User};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
}

async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    Validator::validate_username(&req.username)?;
    Validator::validate_email(&req.email)?;
    Validator::validate_password(&req.password)?;
    if !req.role.self_assignable() {
        return Err(ApiError::Forbidden("Cannot register with this role"));
    }

    let password_hash = auth::hash_password(&req.password)?;
    let user = db::users::insert_user(&state.pool, &req.username, &req.email, &password_hash, req.role)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                ApiError::Conflict("Username or email already registered".to_string())
            } else {
                e.into()
            }
        })?;

    tracing::info!("Registered user {} as {}", user.username, user.role);
    Ok((StatusCode::CREATED, Json(user)))
}

/// Exchange credentials for a bearer token and count the day towards the
/// user's login streak.
async fn login(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    Json(req): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    if let Err(wait) = state.login_limiter.check(ip) {
        tracing::warn!("Login rate limit hit for {}", ip);
        return Err(ApiError::TooManyRequests(wait.as_secs().max(1)));
    }

    let user = db::users::find_by_username(&state.pool, &req.username)
        .await?
        .filter(|u| auth::verify_password(&req.password, &u.password_hash));
    let Some(user) = user else {
        tracing::warn!("Failed login for {}", req.username);
        return Err(ApiError::Unauthorized("Incorrect username or password"));
    };
    if !user.is_active {
        return Err(ApiError::Forbidden("Inactive user"));
    }

    let now = Utc::now();
    let token = auth::generate_token()?;
    let expires_at = now
        .checked_add_signed(state.token_ttl)
        .ok_or_else(|| ApiError::Internal("session expiry out of range".to_string()))?;

    // Session, last login and streak land together or not at all.
    let mut tx = state.pool.begin().await?;
    db::sessions::insert_session(&mut *tx, &auth::token_digest(&token), user.user_id, expires_at)
        .await?;
    db::users::touch_last_login(&mut *tx, user.user_id).await?;
    let reputation =
        db::reputation::record_streak_activity(&mut *tx, user.user_id, now.date_naive()).await?;
    tx.commit().await?;
    tracing::debug!(
        "User {} logged in, streak {}",
        user.user_id,
        reputation.streak_points
    );

    Ok(Json(TokenResponse {
        access_token: token,
        token_type: "bearer",
        expires_at,
    }))
}

async fn logout(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<MessageResponse>, ApiError> {
    db::sessions::delete_session(&state.pool, &user.token_hash).await?;
    Ok(Json(MessageResponse {
        message: "Logged out",
    }))
}
