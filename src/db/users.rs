use chrono::Utc;
use sqlx::SqliteExecutor;

use airwatch_core::Role;

use crate::models::{UpdateUserRequest, User};

const USER_COLUMNS: &str =
    "user_id, username, email, password_hash, role, is_active, created_at, updated_at, last_login";

/// Insert a new account.
pub async fn insert_user(
    db: impl SqliteExecutor<'_>,
    username: &str,
    email: &str,
    password_hash: &str,
    role: Role,
) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        r#"
        INSERT INTO users (username, email, password_hash, role, is_active, created_at)
        VALUES (?, ?, ?, ?, 1, ?)
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(username)
    .bind(email)
    .bind(password_hash)
    .bind(role.as_str())
    .bind(Utc::now())
    .fetch_one(db)
    .await
}

pub async fn find_by_id(db: impl SqliteExecutor<'_>, user_id: i64) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = ?"))
        .bind(user_id)
        .fetch_optional(db)
        .await
}

pub async fn find_by_username(
    db: impl SqliteExecutor<'_>,
    username: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?"))
        .bind(username)
        .fetch_optional(db)
        .await
}

pub async fn exists(db: impl SqliteExecutor<'_>, user_id: i64) -> Result<bool, sqlx::Error> {
    let found: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE user_id = ?")
        .bind(user_id)
        .fetch_one(db)
        .await?;
    Ok(found > 0)
}

pub async fn list_users(
    db: impl SqliteExecutor<'_>,
    limit: i64,
    offset: i64,
) -> Result<Vec<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users ORDER BY user_id ASC LIMIT ? OFFSET ?"
    ))
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await
}

/// Apply an admin edit. Returns `None` if the user does not exist.
pub async fn update_user(
    db: impl SqliteExecutor<'_>,
    user_id: i64,
    update: &UpdateUserRequest,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        r#"
        UPDATE users
        SET email = COALESCE(?, email),
            role = COALESCE(?, role),
            is_active = COALESCE(?, is_active),
            updated_at = ?
        WHERE user_id = ?
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(update.email.as_deref())
    .bind(update.role.map(Role::as_str))
    .bind(update.is_active)
    .bind(Utc::now())
    .bind(user_id)
    .fetch_optional(db)
    .await
}

pub async fn touch_last_login(db: impl SqliteExecutor<'_>, user_id: i64) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET last_login = ? WHERE user_id = ?")
        .bind(Utc::now())
        .bind(user_id)
        .execute(db)
        .await?;
    Ok(())
}
