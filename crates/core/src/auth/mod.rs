//! Authentication and authorization rules.
//!
//! This module provides:
//! - Password hashing with Argon2id and the hash-on-write guard
//! - User role definitions
//! - Role allowlists used to gate routes

mod password;

pub use password::{
    HASH_PREFIX, PasswordError, PasswordPolicy, ensure_hashed, hash_password, looks_hashed,
    verify_missing, verify_password,
};

use serde::{Deserialize, Serialize};

/// User roles within a company.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Full access, manages users and company settings.
    Admin,
    /// Runs projects and their tasks.
    ProjectManager,
    /// Works on tasks and logs time.
    TeamMember,
    /// Owns invoicing, bills, and expenses.
    Finance,
}

impl UserRole {
    /// All roles, in privilege order.
    pub const ALL: [Self; 4] = [
        Self::Admin,
        Self::ProjectManager,
        Self::TeamMember,
        Self::Finance,
    ];

    /// Returns true if this role may be set as a project manager.
    #[must_use]
    pub const fn can_manage_projects(&self) -> bool {
        matches!(self, Self::Admin | Self::ProjectManager)
    }

    /// Returns true if this role can manage users.
    #[must_use]
    pub const fn can_manage_users(&self) -> bool {
        matches!(self, Self::Admin)
    }

    /// Returns the wire representation of the role.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::ProjectManager => "project_manager",
            Self::TeamMember => "team_member",
            Self::Finance => "finance",
        }
    }

    /// Parses a role from its wire representation.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|role| role.as_str() == value)
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Roles allowed to perform an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleSet(&'static [UserRole]);

impl RoleSet {
    /// Every authenticated user.
    pub const ANY: Self = Self(&UserRole::ALL);
    /// Admins only.
    pub const ADMIN: Self = Self(&[UserRole::Admin]);
    /// Admins and project managers.
    pub const MANAGERS: Self = Self(&[UserRole::Admin, UserRole::ProjectManager]);
    /// Anyone working on delivery.
    pub const DELIVERY: Self = Self(&[
        UserRole::Admin,
        UserRole::ProjectManager,
        UserRole::TeamMember,
    ]);
    /// Admins and finance.
    pub const FINANCE: Self = Self(&[UserRole::Admin, UserRole::Finance]);
    /// Everyone but team members.
    pub const OFFICE: Self = Self(&[
        UserRole::Admin,
        UserRole::ProjectManager,
        UserRole::Finance,
    ]);

    /// Returns true if the role is in this set.
    #[must_use]
    pub fn allows(&self, role: UserRole) -> bool {
        self.0.contains(&role)
    }

    /// Returns the roles in this set.
    #[must_use]
    pub const fn roles(&self) -> &'static [UserRole] {
        self.0
    }
}
