use chrono::Duration;
use sqlx::SqlitePool;
use std::sync::Arc;

use crate::config::{Config, MAX_TOKEN_TTL_HOURS};
use crate::middleware::{login_limiter, RateLimiter};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub environment: Arc<str>,
    pub token_ttl: Duration,
    pub login_limiter: Arc<RateLimiter>,
}

impl AppState {
    pub fn new(pool: SqlitePool, config: &Config) -> Self {
        Self {
            pool,
            environment: Arc::from(config.environment.as_str()),
            token_ttl: Duration::hours(config.token_ttl_hours.clamp(1, MAX_TOKEN_TTL_HOURS)),
            login_limiter: Arc::new(login_limiter(config.login_rate_limit)),
        }
    }
}
