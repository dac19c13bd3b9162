//! Tenant-scoped UUID to id resolution for foreign keys.
//!
//! Every write resolves all of its references here before touching any row,
//! so a bad reference never leaves a partial write behind. Lookups are always
//! restricted to the caller's company: a UUID from another tenant behaves
//! exactly like one that does not exist.

use std::collections::HashMap;

use opsdesk_core::auth::UserRole;
use opsdesk_core::contact::{ContactType, CounterpartSide};
use opsdesk_core::reference::{ReferenceError, ReferenceField};
use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter};
use uuid::Uuid;

use super::common::RefFilter;
use crate::entities::{contacts, projects, tasks, users};

/// Error types for reference resolution.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// The reference does not exist in the tenant or fails a semantic check.
    #[error(transparent)]
    Reference(#[from] ReferenceError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<ReferenceField> for ResolveError {
    fn from(field: ReferenceField) -> Self {
        Self::Reference(ReferenceError::new(field))
    }
}

/// Resolves wire UUIDs into internal ids within one company.
#[derive(Debug, Clone)]
pub struct Resolver {
    db: DatabaseConnection,
}

impl Resolver {
    /// Creates a new resolver.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn find_project(&self, company_id: i32, uuid: Uuid) -> Result<Option<projects::Model>, DbErr> {
        projects::Entity::find()
            .filter(projects::Column::CompanyId.eq(company_id))
            .filter(projects::Column::Uuid.eq(uuid))
            .one(&self.db)
            .await
    }

    async fn find_contact(&self, company_id: i32, uuid: Uuid) -> Result<Option<contacts::Model>, DbErr> {
        contacts::Entity::find()
            .filter(contacts::Column::CompanyId.eq(company_id))
            .filter(contacts::Column::Uuid.eq(uuid))
            .one(&self.db)
            .await
    }

    async fn find_user(&self, company_id: i32, uuid: Uuid) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find()
            .filter(users::Column::CompanyId.eq(company_id))
            .filter(users::Column::Uuid.eq(uuid))
            .one(&self.db)
            .await
    }

    async fn find_task(&self, company_id: i32, uuid: Uuid) -> Result<Option<tasks::Model>, DbErr> {
        tasks::Entity::find()
            .filter(tasks::Column::CompanyId.eq(company_id))
            .filter(tasks::Column::Uuid.eq(uuid))
            .one(&self.db)
            .await
    }

    /// Resolves a project reference.
    ///
    /// # Errors
    ///
    /// Returns `INVALID_PROJECT` if the project is not in the company.
    pub async fn project(
        &self,
        company_id: i32,
        uuid: Option<Uuid>,
    ) -> Result<Option<i32>, ResolveError> {
        let Some(uuid) = uuid else {
            return Ok(None);
        };
        let project = self
            .find_project(company_id, uuid)
            .await?
            .ok_or(ReferenceField::Project)?;
        Ok(Some(project.id))
    }

    /// Resolves a required project reference.
    ///
    /// # Errors
    ///
    /// Returns `INVALID_PROJECT` if the project is not in the company.
    pub async fn required_project(&self, company_id: i32, uuid: Uuid) -> Result<i32, ResolveError> {
        self.project(company_id, Some(uuid))
            .await?
            .ok_or_else(|| ReferenceField::Project.into())
    }

    /// Resolves a document counterpart, checking it may trade on `side`.
    ///
    /// # Errors
    ///
    /// Returns `INVALID_CLIENT` or `INVALID_VENDOR` if the contact is missing
    /// or is a pure vendor on the sales side (pure client on the purchase side).
    pub async fn counterpart(
        &self,
        company_id: i32,
        uuid: Option<Uuid>,
        side: CounterpartSide,
    ) -> Result<Option<i32>, ResolveError> {
        let field = match side {
            CounterpartSide::Sales => ReferenceField::Client,
            CounterpartSide::Purchase => ReferenceField::Vendor,
        };
        let Some(uuid) = uuid else {
            return Ok(None);
        };
        match self.find_contact(company_id, uuid).await? {
            Some(contact) if ContactType::from(contact.contact_type).can_serve(side) => {
                Ok(Some(contact.id))
            }
            _ => Err(field.into()),
        }
    }

    /// Resolves a project manager.
    ///
    /// # Errors
    ///
    /// Returns `INVALID_MANAGER` if the user is missing or cannot manage projects.
    pub async fn manager(
        &self,
        company_id: i32,
        uuid: Option<Uuid>,
    ) -> Result<Option<i32>, ResolveError> {
        let Some(uuid) = uuid else {
            return Ok(None);
        };
        match self.find_user(company_id, uuid).await? {
            Some(user) if UserRole::from(user.role).can_manage_projects() => Ok(Some(user.id)),
            _ => Err(ReferenceField::Manager.into()),
        }
    }

    /// Resolves a user reference, reporting failures on `field`.
    ///
    /// # Errors
    ///
    /// Returns the code of `field` if the user is not in the company.
    pub async fn user(
        &self,
        company_id: i32,
        uuid: Option<Uuid>,
        field: ReferenceField,
    ) -> Result<Option<users::Model>, ResolveError> {
        let Some(uuid) = uuid else {
            return Ok(None);
        };
        let user = self.find_user(company_id, uuid).await?.ok_or(field)?;
        Ok(Some(user))
    }

    /// Resolves a task that must belong to `project_id`.
    ///
    /// # Errors
    ///
    /// Returns `INVALID_TASK` if the task is missing or in another project.
    pub async fn task_in_project(
        &self,
        company_id: i32,
        uuid: Option<Uuid>,
        project_id: i32,
    ) -> Result<Option<i32>, ResolveError> {
        let Some(uuid) = uuid else {
            return Ok(None);
        };
        match self.find_task(company_id, uuid).await? {
            Some(task) if task.project_id == project_id => Ok(Some(task.id)),
            _ => Err(ReferenceField::Task.into()),
        }
    }

    /// Checks that an already linked task still belongs to `project_id`.
    ///
    /// # Errors
    ///
    /// Returns `INVALID_TASK` if the task is in another project.
    pub async fn check_task_project(&self, task_id: i32, project_id: i32) -> Result<(), ResolveError> {
        let task = tasks::Entity::find_by_id(task_id).one(&self.db).await?;
        match task {
            Some(task) if task.project_id == project_id => Ok(()),
            _ => Err(ReferenceField::Task.into()),
        }
    }

    /// Resolves a set of assignee UUIDs, all or nothing.
    ///
    /// Duplicates collapse; the result keeps first-seen order.
    ///
    /// # Errors
    ///
    /// Returns `INVALID_ASSIGNMENT_USERS` if any UUID is not a user of the company.
    pub async fn users(&self, company_id: i32, uuids: &[Uuid]) -> Result<Vec<i32>, ResolveError> {
        let distinct = distinct_in_order(uuids);
        if distinct.is_empty() {
            return Ok(Vec::new());
        }

        let found: HashMap<Uuid, i32> = users::Entity::find()
            .filter(users::Column::CompanyId.eq(company_id))
            .filter(users::Column::Uuid.is_in(distinct.iter().copied()))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|user| (user.uuid, user.id))
            .collect();

        distinct
            .iter()
            .map(|uuid| found.get(uuid).copied())
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| ReferenceField::AssignmentUsers.into())
    }

    /// Looks up a project filter. Unknown UUIDs match nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn project_filter(&self, company_id: i32, uuid: Option<Uuid>) -> Result<RefFilter, DbErr> {
        Ok(match uuid {
            None => RefFilter::Any,
            Some(uuid) => self
                .find_project(company_id, uuid)
                .await?
                .map_or(RefFilter::NoMatch, |p| RefFilter::Id(p.id)),
        })
    }

    /// Looks up a contact filter. Unknown UUIDs match nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn contact_filter(&self, company_id: i32, uuid: Option<Uuid>) -> Result<RefFilter, DbErr> {
        Ok(match uuid {
            None => RefFilter::Any,
            Some(uuid) => self
                .find_contact(company_id, uuid)
                .await?
                .map_or(RefFilter::NoMatch, |c| RefFilter::Id(c.id)),
        })
    }

    /// Looks up a user filter. Unknown UUIDs match nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn user_filter(&self, company_id: i32, uuid: Option<Uuid>) -> Result<RefFilter, DbErr> {
        Ok(match uuid {
            None => RefFilter::Any,
            Some(uuid) => self
                .find_user(company_id, uuid)
                .await?
                .map_or(RefFilter::NoMatch, |u| RefFilter::Id(u.id)),
        })
    }

    /// Looks up a task filter. Unknown UUIDs match nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn task_filter(&self, company_id: i32, uuid: Option<Uuid>) -> Result<RefFilter, DbErr> {
        Ok(match uuid {
            None => RefFilter::Any,
            Some(uuid) => self
                .find_task(company_id, uuid)
                .await?
                .map_or(RefFilter::NoMatch, |t| RefFilter::Id(t.id)),
        })
    }
}

/// Removes duplicates, keeping the first occurrence of each value.
pub(crate) fn distinct_in_order<T: Copy + Eq + std::hash::Hash>(values: &[T]) -> Vec<T> {
    let mut seen = std::collections::HashSet::with_capacity(values.len());
    values.iter().copied().filter(|v| seen.insert(*v)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distinct_in_order() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert_eq!(distinct_in_order(&[a, b, a, a, b]), vec![a, b]);
        assert_eq!(distinct_in_order(&[3, 1, 3, 2]), vec![3, 1, 2]);
        assert!(distinct_in_order::<i32>(&[]).is_empty());
    }

    #[test]
    fn test_reference_field_converts_to_resolve_error() {
        let err = ResolveError::from(ReferenceField::AssignmentUsers);
        match err {
            ResolveError::Reference(reference) => {
                assert_eq!(reference.code(), "INVALID_ASSIGNMENT_USERS");
                assert_eq!(reference.field_name(), "assignment_user_uuids");
            }
            ResolveError::Database(_) => panic!("expected a reference error"),
        }
    }
}
