//! Credential hashing, bearer tokens and the authenticated-user extractor.
//!
//! Passwords are stored as argon2id PHC strings with a random 16-byte salt.
//! Bearer tokens are 32 random bytes; only their SHA-256 digest reaches the
//! database.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};
use chrono::Utc;
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;

use airwatch_core::{Role, Validator};

use crate::config::AdminBootstrap;
use crate::db;
use crate::error::ApiError;
use crate::state::AppState;

const SALT_LEN: usize = 16;
const TOKEN_LEN: usize = 32;

fn random_bytes<const N: usize>() -> Result<[u8; N], ApiError> {
    let mut buf = [0u8; N];
    getrandom::fill(&mut buf)
        .map_err(|e| ApiError::Internal(format!("failed to gather randomness: {e}")))?;
    Ok(buf)
}

pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::encode_b64(&random_bytes::<SALT_LEN>()?)
        .map_err(|e| ApiError::Internal(format!("failed to encode salt: {e}")))?;
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| ApiError::Internal(format!("failed to hash password: {e}")))?;
    Ok(hash.to_string())
}

/// Check `password` against a stored PHC string.
/// Malformed hashes never verify.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// Fresh opaque bearer token, hex encoded.
pub fn generate_token() -> Result<String, ApiError> {
    Ok(hex::encode(random_bytes::<TOKEN_LEN>()?))
}

/// Digest under which a token is stored and looked up.
pub fn token_digest(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// The caller behind a valid, unexpired bearer token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: i64,
    pub username: String,
    pub role: Role,
    /// Digest of the presented token, used to end the session.
    pub token_hash: String,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn require_admin(&self) -> Result<(), ApiError> {
        if !self.is_admin() {
            tracing::warn!("User {} denied admin action", self.user_id);
            return Err(ApiError::Forbidden("Admin privileges required"));
        }
        Ok(())
    }

    pub fn require_data_contributor(&self) -> Result<(), ApiError> {
        if self.role != Role::DataContributor {
            tracing::warn!("User {} denied contribution submit", self.user_id);
            return Err(ApiError::Forbidden("Data contributor privileges required"));
        }
        Ok(())
    }

    /// Readers of contributions: data contributors and the admins moderating them.
    pub fn require_contributions_access(&self) -> Result<(), ApiError> {
        if !self.role.can_access_contributions() {
            tracing::warn!("User {} denied contribution access", self.user_id);
            return Err(ApiError::Forbidden("Data contributor privileges required"));
        }
        Ok(())
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or(ApiError::Unauthorized("Not authenticated"))?;
        let token_hash = token_digest(token);

        let user = db::sessions::find_session_user(&state.pool, &token_hash, Utc::now())
            .await?
            .ok_or(ApiError::Unauthorized("Invalid or expired token"))?;

        if !user.is_active {
            return Err(ApiError::Forbidden("Inactive user"));
        }

        Ok(AuthUser {
            user_id: user.user_id,
            username: user.username,
            role: user.role,
            token_hash,
        })
    }
}

/// Create the configured admin account unless the username is already taken.
pub async fn bootstrap_admin(pool: &SqlitePool, admin: &AdminBootstrap) -> Result<(), ApiError> {
    if db::users::find_by_username(pool, &admin.username)
        .await?
        .is_some()
    {
        tracing::info!("Admin account {} already present", admin.username);
        return Ok(());
    }

    Validator::validate_username(&admin.username)?;
    Validator::validate_email(&admin.email)?;
    Validator::validate_password(&admin.password)?;

    let password_hash = hash_password(&admin.password)?;
    let user = db::users::insert_user(pool, &admin.username, &admin.email, &password_hash, Role::Admin)
        .await?;
    tracing::info!("Created admin account {} (id {})", user.username, user.user_id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::setup_test_db;

    #[test]
    fn test_hash_and_verify() {
        let stored = hash_password("correct horse").unwrap();

        assert!(stored.starts_with("$argon2id$"));
        assert!(verify_password("correct horse", &stored));
        assert!(!verify_password("wrong horse", &stored));
    }

    #[test]
    fn test_hashes_are_salted() {
        let a = hash_password("same password").unwrap();
        let b = hash_password("same password").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_malformed_hash_never_verifies() {
        assert!(!verify_password("pw", ""));
        assert!(!verify_password("pw", "$argon2id$v=19$garbage"));
        assert!(!verify_password("pw", "md5$00$00"));
        assert!(!verify_password("pw", "!"));
    }

    #[test]
    fn test_stored_hash_is_not_a_plain_digest() {
        let stored = hash_password("correct horse").unwrap();
        let plain = hex::encode(Sha256::digest(b"correct horse"));

        assert!(!stored.contains(&plain));
        let parsed = PasswordHash::new(&stored).unwrap();
        assert_eq!(parsed.algorithm.as_str(), "argon2id");
        assert!(parsed.salt.is_some());
        assert!(verify_password("correct horse", &stored));
        assert!(!verify_password("correct horse", &plain));
    }

    #[test]
    fn test_token_shape() {
        let token = generate_token().unwrap();
        assert_eq!(token.len(), TOKEN_LEN * 2);
        assert_ne!(token, generate_token().unwrap());

        let digest = token_digest(&token);
        assert_eq!(digest.len(), 64);
        assert_eq!(digest, token_digest(&token));
    }

    #[tokio::test]
    async fn test_bootstrap_admin_once() {
        let pool = setup_test_db().await;
        let admin = AdminBootstrap {
            username: "root".to_string(),
            password: "change-me-now".to_string(),
            email: "root@example.com".to_string(),
        };

        bootstrap_admin(&pool, &admin).await.unwrap();
        bootstrap_admin(&pool, &admin).await.unwrap();

        let user = db::users::find_by_username(&pool, "root").await.unwrap().unwrap();
        assert_eq!(user.role, Role::Admin);
        assert!(verify_password("change-me-now", &user.password_hash));
    }
}
