//! Batch loading of referenced entities for response composition.
//!
//! Rows store integer foreign keys; responses show the referenced entity's
//! UUID and display name. Each loader issues one query per page of rows.

use std::collections::{BTreeSet, HashMap};

use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter};
use serde::Serialize;
use uuid::Uuid;

use crate::entities::{contacts, projects, tasks, users};

/// Public identity of a referenced entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityRef {
    /// Public identifier.
    pub uuid: Uuid,
    /// Display name.
    pub name: String,
}

/// Referenced entities keyed by internal id.
pub type RefMap = HashMap<i32, EntityRef>;

/// Collects the distinct non-null ids.
pub(crate) fn ids<I>(values: I) -> Vec<i32>
where
    I: IntoIterator<Item = Option<i32>>,
{
    values
        .into_iter()
        .flatten()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Looks up an id in a ref map.
pub(crate) fn pick(map: &RefMap, id: Option<i32>) -> Option<EntityRef> {
    id.and_then(|id| map.get(&id).cloned())
}

macro_rules! ref_loader {
    ($(#[$doc:meta])* $fn_name:ident, $entity:ident, $name:ident) => {
        $(#[$doc])*
        pub(crate) async fn $fn_name<C: ConnectionTrait>(
            db: &C,
            ids: &[i32],
        ) -> Result<RefMap, DbErr> {
            if ids.is_empty() {
                return Ok(RefMap::new());
            }
            let rows = $entity::Entity::find()
                .filter($entity::Column::Id.is_in(ids.iter().copied()))
                .all(db)
                .await?;
            Ok(rows
                .into_iter()
                .map(|row| {
                    (
                        row.id,
                        EntityRef {
                            uuid: row.uuid,
                            name: row.$name,
                        },
                    )
                })
                .collect())
        }
    };
}

ref_loader!(
    /// Loads users by id.
    user_refs, users, name
);
ref_loader!(
    /// Loads contacts by id.
    contact_refs, contacts, name
);
ref_loader!(
    /// Loads projects by id.
    project_refs, projects, name
);
ref_loader!(
    /// Loads tasks by id, named by title.
    task_refs, tasks, title
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_distinct_and_skip_nulls() {
        assert_eq!(ids([Some(3), None, Some(1), Some(3)]), vec![1, 3]);
        assert!(ids(std::iter::empty::<Option<i32>>()).is_empty());
    }

    #[test]
    fn test_pick() {
        let mut map = RefMap::new();
        let uuid = Uuid::new_v4();
        map.insert(
            7,
            EntityRef {
                uuid,
                name: "Acme".to_string(),
            },
        );

        assert_eq!(pick(&map, Some(7)).map(|r| r.uuid), Some(uuid));
        assert_eq!(pick(&map, Some(8)), None);
        assert_eq!(pick(&map, None), None);
    }
}
