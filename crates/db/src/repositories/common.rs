//! Query helpers shared by the entity repositories.

use chrono::NaiveDate;
use opsdesk_shared::types::{PageRequest, Paged};
use sea_orm::sea_query::{Expr, Func, SimpleExpr};
use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait, QuerySelect,
    Select,
};

/// A related-entity filter after its UUID was looked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefFilter {
    /// No filter was requested.
    Any,
    /// Match rows pointing at this internal id.
    Id(i32),
    /// The UUID is unknown in the tenant, so nothing can match.
    NoMatch,
}

impl RefFilter {
    /// Applies the filter to a condition on the given column.
    pub(crate) fn apply<C: ColumnTrait>(self, cond: Condition, column: C) -> Condition {
        match self {
            Self::Any => cond,
            Self::Id(id) => cond.add(column.eq(id)),
            Self::NoMatch => cond.add(Expr::val(1).eq(0)),
        }
    }
}

/// Builds a `%term%` pattern for a case-insensitive substring match.
///
/// Returns `None` for blank terms. `%`, `_` and `\` in the term match literally.
#[must_use]
pub fn search_pattern(term: Option<&str>) -> Option<String> {
    let term = term?.trim();
    if term.is_empty() {
        return None;
    }
    let escaped = term
        .to_lowercase()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    Some(format!("%{escaped}%"))
}

/// `lower(column) LIKE pattern`.
pub(crate) fn lower_like<C: ColumnTrait>(column: C, pattern: &str) -> SimpleExpr {
    Expr::expr(Func::lower(Expr::col(column))).like(pattern)
}

/// Matches the pattern against any of the columns.
pub(crate) fn search_any<C: ColumnTrait>(
    cond: Condition,
    columns: &[C],
    term: Option<&str>,
) -> Condition {
    let Some(pattern) = search_pattern(term) else {
        return cond;
    };
    let any = columns
        .iter()
        .fold(Condition::any(), |acc, col| acc.add(lower_like(*col, &pattern)));
    cond.add(any)
}

/// Restricts a date column to an inclusive range.
pub(crate) fn date_between<C: ColumnTrait>(
    mut cond: Condition,
    column: C,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Condition {
    if let Some(from) = from {
        cond = cond.add(column.gte(from));
    }
    if let Some(to) = to {
        cond = cond.add(column.lte(to));
    }
    cond
}

/// Counts the matching rows, then fetches one page.
pub(crate) async fn fetch_page<E, C>(
    select: Select<E>,
    db: &C,
    page: PageRequest,
) -> Result<Paged<E::Model>, DbErr>
where
    E: EntityTrait,
    E::Model: Sync + 'static,
    C: ConnectionTrait,
{
    let total_count = select.clone().count(db).await?;
    let rows = select
        .offset(page.offset())
        .limit(page.limit())
        .all(db)
        .await?;
    Ok(Paged::new(rows, total_count))
}
