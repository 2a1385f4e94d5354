//! Point rules for user reputation.
//!
//! Storage applies these as atomic increments; this module only decides the
//! numbers.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::lifecycle::ReportStatus;

/// Credibility every user starts from.
pub const INITIAL_CREDIBILITY: i64 = 100;

/// Aura granted to an author per upvote received.
pub const AURA_PER_UPVOTE: i64 = 1;

/// Penalty for the reported user when a report is verified.
pub const VERIFIED_REPORT_PENALTY: i64 = 10;

/// Reward for the reporter when a report is verified.
pub const VERIFIED_REPORT_REWARD: i64 = 5;

/// Penalty for the reporter when a report is found false.
pub const FALSE_REPORT_PENALTY: i64 = 10;

/// Credibility changes produced by a report reaching a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CredibilityDelta {
    pub reporter: i64,
    pub reported: i64,
}

impl CredibilityDelta {
    pub fn is_zero(&self) -> bool {
        self.reporter == 0 && self.reported == 0
    }
}

impl ReportStatus {
    /// Credibility effect of a report moving into this status.
    pub fn credibility_delta(self) -> CredibilityDelta {
        match self {
            ReportStatus::Verified => CredibilityDelta {
                reporter: VERIFIED_REPORT_REWARD,
                reported: -VERIFIED_REPORT_PENALTY,
            },
            ReportStatus::False => CredibilityDelta {
                reporter: -FALSE_REPORT_PENALTY,
                reported: 0,
            },
            ReportStatus::Pending => CredibilityDelta::default(),
        }
    }
}

/// Consecutive-day activity counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Streak {
    pub points: i64,
    pub last_date: NaiveDate,
}

impl Streak {
    pub fn start(today: NaiveDate) -> Self {
        Self {
            points: 1,
            last_date: today,
        }
    }

    /// Streak after activity on `today`, or `None` if already counted today.
    ///
    /// A gap of more than one day resets the count to 1. Dates before the
    /// last recorded one are treated as already counted.
    pub fn advance(self, today: NaiveDate) -> Option<Self> {
        if today <= self.last_date {
            return None;
        }
        let yesterday = today.checked_sub_days(Days::new(1));
        if yesterday == Some(self.last_date) {
            Some(Self {
                points: self.points + 1,
                last_date: today,
            })
        } else {
            Some(Self::start(today))
        }
    }
}

/// Streak for a user with `current` recorded state, or `None` for a no-op.
///
/// A user without a reputation row, or with a row that never logged
/// activity, starts a new streak.
pub fn next_streak(current: Option<Streak>, today: NaiveDate) -> Option<Streak> {
    match current {
        None => Some(Streak::start(today)),
        Some(streak) => streak.advance(today),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_first_activity_starts_streak() {
        let today = date(2024, 3, 10);
        assert_eq!(next_streak(None, today), Some(Streak::start(today)));
    }

    #[test]
    fn test_same_day_is_noop() {
        let today = date(2024, 3, 10);
        let streak = Streak {
            points: 4,
            last_date: today,
        };
        assert_eq!(next_streak(Some(streak), today), None);
    }

    #[test]
    fn test_consecutive_day_increments() {
        let streak = Streak {
            points: 4,
            last_date: date(2024, 3, 9),
        };
        let next = next_streak(Some(streak), date(2024, 3, 10)).unwrap();
        assert_eq!(next.points, 5);
        assert_eq!(next.last_date, date(2024, 3, 10));
    }

    #[test]
    fn test_consecutive_day_across_month_boundary() {
        let streak = Streak {
            points: 2,
            last_date: date(2024, 2, 29),
        };
        let next = streak.advance(date(2024, 3, 1)).unwrap();
        assert_eq!(next.points, 3);
    }

    #[test]
    fn test_gap_resets_to_one() {
        let streak = Streak {
            points: 12,
            last_date: date(2024, 3, 7),
        };
        let next = next_streak(Some(streak), date(2024, 3, 10)).unwrap();
        assert_eq!(next.points, 1);
        assert_eq!(next.last_date, date(2024, 3, 10));
    }

    #[test]
    fn test_earlier_date_is_noop() {
        let streak = Streak {
            points: 3,
            last_date: date(2024, 3, 10),
        };
        assert_eq!(streak.advance(date(2024, 3, 9)), None);
    }

    #[test]
    fn test_credibility_deltas() {
        assert_eq!(
            ReportStatus::Verified.credibility_delta(),
            CredibilityDelta {
                reporter: 5,
                reported: -10
            }
        );
        assert_eq!(
            ReportStatus::False.credibility_delta(),
            CredibilityDelta {
                reporter: -10,
                reported: 0
            }
        );
        assert!(ReportStatus::Pending.credibility_delta().is_zero());
    }
}
