//! Moderation lifecycles for contributions and reports.
//!
//! Each status type carries an explicit transition table. Asking for the
//! current status is reported as [`Transition::Unchanged`] so callers can skip
//! side effects; anything outside the table is a [`TransitionError`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{TransitionError, ValidationError};

/// Outcome of checking a requested status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Target equals the current status; nothing to do.
    Unchanged,
    /// Target is reachable; persist it and run side effects.
    Apply,
}

pub trait Lifecycle: Copy + Eq + 'static {
    /// Entity name used in error messages.
    const ENTITY: &'static str;
    /// Allowed `(from, to)` pairs.
    const TRANSITIONS: &'static [(Self, Self)];

    fn as_str(self) -> &'static str;

    fn transition_to(self, next: Self) -> Result<Transition, TransitionError> {
        if self == next {
            return Ok(Transition::Unchanged);
        }
        if Self::TRANSITIONS
            .iter()
            .any(|&(from, to)| from == self && to == next)
        {
            Ok(Transition::Apply)
        } else {
            Err(TransitionError {
                entity: Self::ENTITY,
                from: self.as_str(),
                to: next.as_str(),
            })
        }
    }
}

/// Review state of a citizen contribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContributionStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl Lifecycle for ContributionStatus {
    const ENTITY: &'static str = "contribution";
    const TRANSITIONS: &'static [(Self, Self)] = &[
        (ContributionStatus::Pending, ContributionStatus::Approved),
        (ContributionStatus::Pending, ContributionStatus::Rejected),
    ];

    fn as_str(self) -> &'static str {
        match self {
            ContributionStatus::Pending => "pending",
            ContributionStatus::Approved => "approved",
            ContributionStatus::Rejected => "rejected",
        }
    }
}

impl FromStr for ContributionStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ContributionStatus::Pending),
            "approved" => Ok(ContributionStatus::Approved),
            "rejected" => Ok(ContributionStatus::Rejected),
            other => Err(ValidationError::UnknownVariant {
                kind: "contribution status",
                value: other.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for ContributionStatus {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for ContributionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of an abuse report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    #[default]
    Pending,
    Verified,
    False,
}

impl Lifecycle for ReportStatus {
    const ENTITY: &'static str = "report";
    const TRANSITIONS: &'static [(Self, Self)] = &[
        (ReportStatus::Pending, ReportStatus::Verified),
        (ReportStatus::Pending, ReportStatus::False),
    ];

    fn as_str(self) -> &'static str {
        match self {
            ReportStatus::Pending => "pending",
            ReportStatus::Verified => "verified",
            ReportStatus::False => "false",
        }
    }
}

impl FromStr for ReportStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ReportStatus::Pending),
            "verified" => Ok(ReportStatus::Verified),
            "false" => Ok(ReportStatus::False),
            other => Err(ValidationError::UnknownVariant {
                kind: "report status",
                value: other.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for ReportStatus {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contribution_forward_transitions() {
        use ContributionStatus::*;
        assert_eq!(Pending.transition_to(Approved), Ok(Transition::Apply));
        assert_eq!(Pending.transition_to(Rejected), Ok(Transition::Apply));
    }

    #[test]
    fn test_contribution_backward_transitions_rejected() {
        use ContributionStatus::*;
        let err = Approved.transition_to(Pending).unwrap_err();
        assert_eq!(err.entity, "contribution");
        assert_eq!(err.from, "approved");
        assert_eq!(err.to, "pending");
        assert!(Rejected.transition_to(Approved).is_err());
        assert!(Approved.transition_to(Rejected).is_err());
    }

    #[test]
    fn test_same_status_is_unchanged() {
        assert_eq!(
            ContributionStatus::Approved.transition_to(ContributionStatus::Approved),
            Ok(Transition::Unchanged)
        );
        assert_eq!(
            ReportStatus::Verified.transition_to(ReportStatus::Verified),
            Ok(Transition::Unchanged)
        );
    }

    #[test]
    fn test_report_transitions() {
        use ReportStatus::*;
        assert_eq!(Pending.transition_to(Verified), Ok(Transition::Apply));
        assert_eq!(Pending.transition_to(False), Ok(Transition::Apply));
        assert!(Verified.transition_to(False).is_err());
        assert!(False.transition_to(Pending).is_err());
    }

    #[test]
    fn test_report_status_serializes_false_as_string() {
        let json = serde_json::to_string(&ReportStatus::False).unwrap();
        assert_eq!(json, "\"false\"");
        let parsed: ReportStatus = serde_json::from_str("\"verified\"").unwrap();
        assert_eq!(parsed, ReportStatus::Verified);
    }

    #[test]
    fn test_unknown_status_rejected() {
        assert!("archived".parse::<ContributionStatus>().is_err());
        assert!("true".parse::<ReportStatus>().is_err());
    }
}
