//! Reference resolution failures.
//!
//! Every foreign key arrives on the wire as a UUID and is resolved to an
//! internal id inside the caller's company. When that fails, the error names
//! the request field so the client can point at it.

use serde::Serialize;
use thiserror::Error;

/// A request field that carries a reference to another entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceField {
    /// `project_uuid`
    Project,
    /// `client_uuid`
    Client,
    /// `vendor_uuid`
    Vendor,
    /// `manager_uuid`
    Manager,
    /// `assignee_uuid`
    Assignee,
    /// `user_uuid`
    User,
    /// `task_uuid`
    Task,
    /// `assignment_user_uuids`
    AssignmentUsers,
}

impl ReferenceField {
    /// Wire name of the request field.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::Project => "project_uuid",
            Self::Client => "client_uuid",
            Self::Vendor => "vendor_uuid",
            Self::Manager => "manager_uuid",
            Self::Assignee => "assignee_uuid",
            Self::User => "user_uuid",
            Self::Task => "task_uuid",
            Self::AssignmentUsers => "assignment_user_uuids",
        }
    }

    /// Stable machine-readable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Project => "INVALID_PROJECT",
            Self::Client => "INVALID_CLIENT",
            Self::Vendor => "INVALID_VENDOR",
            Self::Manager => "INVALID_MANAGER",
            Self::Assignee => "INVALID_ASSIGNEE",
            Self::User => "INVALID_USER",
            Self::Task => "INVALID_TASK",
            Self::AssignmentUsers => "INVALID_ASSIGNMENT_USERS",
        }
    }

    const fn message(self) -> &'static str {
        match self {
            Self::Project => "Project not found",
            Self::Client => "Client not found or is not a client contact",
            Self::Vendor => "Vendor not found or is not a vendor contact",
            Self::Manager => "Manager not found or cannot manage projects",
            Self::Assignee => "Assignee not found",
            Self::User => "User not found",
            Self::Task => "Task not found in the given project",
            Self::AssignmentUsers => "One or more assigned users were not found",
        }
    }
}

/// A reference that could not be resolved inside the tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{}", .field.message())]
pub struct ReferenceError {
    /// Field that carried the bad reference.
    pub field: ReferenceField,
}

impl ReferenceError {
    /// Creates an error for the given field.
    #[must_use]
    pub const fn new(field: ReferenceField) -> Self {
        Self { field }
    }

    /// Wire name of the offending field.
    #[must_use]
    pub const fn field_name(&self) -> &'static str {
        self.field.field()
    }

    /// Error code for the offending field.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.field.code()
    }
}

impl From<ReferenceField> for ReferenceError {
    fn from(field: ReferenceField) -> Self {
        Self::new(field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ReferenceField::Project, "project_uuid", "INVALID_PROJECT")]
    #[case(ReferenceField::Client, "client_uuid", "INVALID_CLIENT")]
    #[case(ReferenceField::Vendor, "vendor_uuid", "INVALID_VENDOR")]
    #[case(ReferenceField::Manager, "manager_uuid", "INVALID_MANAGER")]
    #[case(ReferenceField::Assignee, "assignee_uuid", "INVALID_ASSIGNEE")]
    #[case(ReferenceField::User, "user_uuid", "INVALID_USER")]
    #[case(ReferenceField::Task, "task_uuid", "INVALID_TASK")]
    #[case(
        ReferenceField::AssignmentUsers,
        "assignment_user_uuids",
        "INVALID_ASSIGNMENT_USERS"
    )]
    fn test_field_and_code(
        #[case] field: ReferenceField,
        #[case] name: &str,
        #[case] code: &str,
    ) {
        let err = ReferenceError::new(field);
        assert_eq!(err.field_name(), name);
        assert_eq!(err.code(), code);
    }

    #[test]
    fn test_display_is_human_readable() {
        let err = ReferenceError::from(ReferenceField::Client);
        assert_eq!(
            err.to_string(),
            "Client not found or is not a client contact"
        );
    }
}
