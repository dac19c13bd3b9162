//! `SeaORM` active enums mapped to the Postgres enum types.

use opsdesk_core::auth::UserRole as CoreUserRole;
use opsdesk_core::contact::ContactType as CoreContactType;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "user_role")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    #[sea_orm(string_value = "admin")]
    Admin,
    #[sea_orm(string_value = "project_manager")]
    ProjectManager,
    #[sea_orm(string_value = "team_member")]
    TeamMember,
    #[sea_orm(string_value = "finance")]
    Finance,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "contact_type")]
#[serde(rename_all = "snake_case")]
pub enum ContactType {
    #[sea_orm(string_value = "client")]
    Client,
    #[sea_orm(string_value = "vendor")]
    Vendor,
    #[sea_orm(string_value = "both")]
    Both,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "project_status")]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    #[sea_orm(string_value = "planned")]
    Planned,
    #[sea_orm(string_value = "active")]
    Active,
    #[sea_orm(string_value = "on_hold")]
    OnHold,
    #[sea_orm(string_value = "completed")]
    Completed,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "task_status")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[sea_orm(string_value = "todo")]
    Todo,
    #[sea_orm(string_value = "in_progress")]
    InProgress,
    #[sea_orm(string_value = "review")]
    Review,
    #[sea_orm(string_value = "done")]
    Done,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "task_priority")]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    #[sea_orm(string_value = "low")]
    Low,
    #[sea_orm(string_value = "medium")]
    Medium,
    #[sea_orm(string_value = "high")]
    High,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "document_status")]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    #[sea_orm(string_value = "draft")]
    Draft,
    #[sea_orm(string_value = "sent")]
    Sent,
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "paid")]
    Paid,
    #[sea_orm(string_value = "declined")]
    Declined,
}

impl From<UserRole> for CoreUserRole {
    fn from(role: UserRole) -> Self {
        match role {
            UserRole::Admin => Self::Admin,
            UserRole::ProjectManager => Self::ProjectManager,
            UserRole::TeamMember => Self::TeamMember,
            UserRole::Finance => Self::Finance,
        }
    }
}

impl From<CoreUserRole> for UserRole {
    fn from(role: CoreUserRole) -> Self {
        match role {
            CoreUserRole::Admin => Self::Admin,
            CoreUserRole::ProjectManager => Self::ProjectManager,
            CoreUserRole::TeamMember => Self::TeamMember,
            CoreUserRole::Finance => Self::Finance,
        }
    }
}

impl From<ContactType> for CoreContactType {
    fn from(kind: ContactType) -> Self {
        match kind {
            ContactType::Client => Self::Client,
            ContactType::Vendor => Self::Vendor,
            ContactType::Both => Self::Both,
        }
    }
}

impl DocumentStatus {
    /// Invoice statuses that count as revenue.
    pub const REVENUE: [Self; 3] = [Self::Sent, Self::Approved, Self::Paid];

    /// Bill and expense statuses that count as cost.
    pub const COST: [Self; 2] = [Self::Approved, Self::Paid];

    /// Quoted SQL literals for an `IN (...)` list.
    #[must_use]
    pub fn sql_list(statuses: &[Self]) -> String {
        statuses
            .iter()
            .map(|status| format!("'{}'", status.to_value()))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl TaskStatus {
    /// Statuses that count as open work.
    pub const OPEN: [Self; 3] = [Self::Todo, Self::InProgress, Self::Review];
}
