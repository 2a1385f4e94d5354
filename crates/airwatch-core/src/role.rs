use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Role attached to every user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    #[default]
    User,
    DataContributor,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
            Role::DataContributor => "data_contributor",
        }
    }

    /// Whether an account may pick this role for itself at registration.
    pub fn self_assignable(self) -> bool {
        !matches!(self, Role::Admin)
    }

    /// Whether this role may read and submit citizen contributions.
    pub fn can_access_contributions(self) -> bool {
        matches!(self, Role::Admin | Role::DataContributor)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "user" => Ok(Role::User),
            "data_contributor" => Ok(Role::DataContributor),
            other => Err(ValidationError::UnknownVariant {
                kind: "role",
                value: other.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trips_through_str() {
        for role in [Role::Admin, Role::User, Role::DataContributor] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert!("moderator".parse::<Role>().is_err());
    }

    #[test]
    fn test_admin_is_not_self_assignable() {
        assert!(!Role::Admin.self_assignable());
        assert!(Role::User.self_assignable());
        assert!(Role::DataContributor.self_assignable());
    }

    #[test]
    fn test_standard_users_cannot_access_contributions() {
        assert!(!Role::User.can_access_contributions());
        assert!(Role::DataContributor.can_access_contributions());
        assert!(Role::Admin.can_access_contributions());
    }
}
