//! Airwatch Core - Domain rules, lifecycles, and validation.
//!
//! This crate holds the air-quality and forum domain logic with no I/O:
//! roles, moderation lifecycles, reputation point rules, and input checks.

pub mod aqi;
pub mod error;
pub mod lifecycle;
pub mod reading;
pub mod reputation;
pub mod role;
pub mod validation;

// Re-exports for convenience
pub use aqi::{AqiCategory, NotificationType};
pub use error::{TransitionError, ValidationError};
pub use lifecycle::{ContributionStatus, Lifecycle, ReportStatus, Transition};
pub use reading::{BoundingBox, Pollutants};
pub use reputation::{next_streak, CredibilityDelta, Streak, INITIAL_CREDIBILITY};
pub use role::Role;
pub use validation::Validator;
