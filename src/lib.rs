//! Airwatch - crowd-sourced air-quality REST backend.
//!
//! Stations, sensor measurements and citizen contributions, plus a community
//! forum whose votes and moderation feed a per-user reputation.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod state;

pub use config::Config;
pub use db::{init_pool, run_migrations};
pub use error::ApiError;
pub use routes::{cors_layer, create_router};
pub use state::AppState;
