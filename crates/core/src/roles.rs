//! The closed set of company roles.
//!
//! Role names are persisted as snake_case text in `user_roles.role` and
//! carried in access-token claims. These must match the `CHECK` constraint in
//! `20260301000001_create_tenancy_tables.sql`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    ProjectManager,
    Developer,
    Submitter,
}

/// Roles allowed to create, edit, archive and staff projects.
pub const MANAGER_ROLES: &[Role] = &[Role::Admin, Role::ProjectManager];

/// Roles whose holders can be selected as ordinary project members.
pub const MEMBER_ROLES: &[Role] = &[Role::Developer, Role::Submitter];

impl Role {
    pub const ALL: [Role; 4] = [
        Role::Admin,
        Role::ProjectManager,
        Role::Developer,
        Role::Submitter,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::ProjectManager => "project_manager",
            Role::Developer => "developer",
            Role::Submitter => "submitter",
        }
    }

    /// Admins and project managers see company-wide data without
    /// per-project membership filtering.
    pub fn is_elevated(self) -> bool {
        match self {
            Role::Admin | Role::ProjectManager => true,
            Role::Developer | Role::Submitter => false,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| {
                CoreError::Validation(format!(
                    "Invalid role '{s}'. Must be one of: {}",
                    Role::ALL.map(Role::as_str).join(", ")
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_round_trips_every_role_name() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
    }

    #[test]
    fn test_unknown_role_rejected() {
        let result = "Admin".parse::<Role>();
        assert_matches!(result, Err(CoreError::Validation(msg)) if msg.contains("Invalid role"));
    }

    #[test]
    fn test_elevated_roles() {
        assert!(Role::Admin.is_elevated());
        assert!(Role::ProjectManager.is_elevated());
        assert!(!Role::Developer.is_elevated());
        assert!(!Role::Submitter.is_elevated());
    }

    #[test]
    fn test_serde_uses_snake_case() {
        let json = serde_json::to_string(&Role::ProjectManager).unwrap();
        assert_eq!(json, "\"project_manager\"");

        let parsed: Vec<Role> = serde_json::from_str(r#"["admin", "submitter"]"#).unwrap();
        assert_eq!(parsed, vec![Role::Admin, Role::Submitter]);
    }
}
