//! Dashboard analytics queries.
//!
//! Each series is one grouped aggregate over a single table, bucketed by
//! `YYYY-MM`. The queries are independent and run concurrently; the month
//! alignment and KPI math live in `opsdesk_core::analytics`.

use chrono::NaiveDate;
use opsdesk_core::analytics::{
    Dashboard, Month, MonthRows, MonthWindow, MonthlyAggregates, UtilizationCounts,
};
use rust_decimal::Decimal;
use sea_orm::{DatabaseConnection, DbBackend, DbErr, FromQueryResult, Statement, Value};
use tracing::debug;

use crate::entities::sea_orm_active_enums::DocumentStatus;

const PROJECTS_SQL: &str = r"
SELECT to_char(date_trunc('month', created_at), 'YYYY-MM') AS month,
       COUNT(*) FILTER (WHERE status = 'active') AS active,
       COUNT(*) FILTER (WHERE status = 'completed') AS completed
FROM projects
WHERE company_id = $1 AND created_at >= to_date($2, 'YYYY-MM')
GROUP BY 1
";

const COMPLETED_TASKS_SQL: &str = r"
SELECT to_char(date_trunc('month', updated_at), 'YYYY-MM') AS month,
       COUNT(*) AS value
FROM tasks
WHERE company_id = $1 AND status = 'done' AND updated_at >= to_date($2, 'YYYY-MM')
GROUP BY 1
";

const BILLED_HOURS_SQL: &str = r"
SELECT to_char(date_trunc('month', date), 'YYYY-MM') AS month,
       SUM(hours) AS value
FROM timesheets
WHERE company_id = $1 AND billable AND date >= to_date($2, 'YYYY-MM')
GROUP BY 1
";

const REVENUE_SQL: &str = r"
SELECT to_char(date_trunc('month', date), 'YYYY-MM') AS month,
       SUM(total_amount) AS value
FROM invoices
WHERE company_id = $1 AND status IN ({statuses})
  AND date >= to_date($2, 'YYYY-MM')
GROUP BY 1
";

const TIMESHEET_COSTS_SQL: &str = r"
SELECT to_char(date_trunc('month', date), 'YYYY-MM') AS month,
       SUM(hours * cost_rate) AS value
FROM timesheets
WHERE company_id = $1 AND date >= to_date($2, 'YYYY-MM')
GROUP BY 1
";

const VENDOR_BILL_COSTS_SQL: &str = r"
SELECT to_char(date_trunc('month', date), 'YYYY-MM') AS month,
       SUM(total_amount) AS value
FROM vendor_bills
WHERE company_id = $1 AND status IN ({statuses})
  AND date >= to_date($2, 'YYYY-MM')
GROUP BY 1
";

const EXPENSE_COSTS_SQL: &str = r"
SELECT to_char(date_trunc('month', date), 'YYYY-MM') AS month,
       SUM(amount) AS value
FROM expenses
WHERE company_id = $1 AND status IN ({statuses})
  AND date >= to_date($2, 'YYYY-MM')
GROUP BY 1
";

const UTILIZATION_SQL: &str = r"
SELECT
    (SELECT COUNT(*) FROM users WHERE company_id = $1) AS total_users,
    (SELECT COUNT(DISTINCT assignee_id) FROM tasks
      WHERE company_id = $1 AND assignee_id IS NOT NULL
        AND status IN ('todo', 'in_progress', 'review')) AS allocated_users,
    (SELECT COUNT(*) FROM tasks
      WHERE company_id = $1 AND status <> 'done'
        AND due_date IS NOT NULL AND due_date < $2) AS overdue_tasks
";

#[derive(Debug, FromQueryResult)]
struct ProjectMonth {
    month: String,
    active: i64,
    completed: i64,
}

#[derive(Debug, FromQueryResult)]
struct MonthCount {
    month: String,
    value: i64,
}

#[derive(Debug, FromQueryResult)]
struct MonthAmount {
    month: String,
    value: Decimal,
}

#[derive(Debug, FromQueryResult)]
struct UtilizationRow {
    total_users: i64,
    allocated_users: i64,
    overdue_tasks: i64,
}

/// Fills the `{statuses}` slot of a query with a fixed status set.
fn with_statuses(sql: &str, statuses: &[DocumentStatus]) -> String {
    sql.replace("{statuses}", &DocumentStatus::sql_list(statuses))
}

fn counts(rows: Vec<MonthCount>) -> MonthRows<i64> {
    rows.into_iter().map(|r| (r.month, r.value)).collect()
}

fn amounts(rows: Vec<MonthAmount>) -> MonthRows<Decimal> {
    rows.into_iter().map(|r| (r.month, r.value)).collect()
}

/// Runs the dashboard aggregates for one company.
#[derive(Debug, Clone)]
pub struct AnalyticsRepository {
    db: DatabaseConnection,
}

impl AnalyticsRepository {
    /// Creates a new analytics repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn statement<I>(sql: &str, values: I) -> Statement
    where
        I: IntoIterator<Item = Value>,
    {
        Statement::from_sql_and_values(DbBackend::Postgres, sql, values)
    }

    async fn monthly<T: FromQueryResult>(
        &self,
        sql: &str,
        company_id: i32,
        since: &str,
    ) -> Result<Vec<T>, DbErr> {
        T::find_by_statement(Self::statement(sql, [company_id.into(), since.into()]))
            .all(&self.db)
            .await
    }

    async fn utilization(&self, company_id: i32, today: NaiveDate) -> Result<UtilizationCounts, DbErr> {
        let row = UtilizationRow::find_by_statement(Self::statement(
            UTILIZATION_SQL,
            [company_id.into(), today.into()],
        ))
        .one(&self.db)
        .await?
        .ok_or_else(|| DbErr::Custom("utilization query returned no row".to_string()))?;

        Ok(UtilizationCounts {
            total_users: row.total_users,
            allocated_users: row.allocated_users,
            overdue_tasks: row.overdue_tasks,
        })
    }

    /// Builds the dashboard for the six months ending with `today`'s month.
    ///
    /// # Errors
    ///
    /// Returns the first query error; no partial dashboard is produced.
    pub async fn dashboard(&self, company_id: i32, today: NaiveDate) -> Result<Dashboard, DbErr> {
        let window = MonthWindow::ending_at(today, MonthWindow::DASHBOARD_MONTHS);
        let since = window
            .first_key()
            .unwrap_or_else(|| Month::of(today).key());
        debug!(company_id, since = %since, "Running dashboard aggregates");
        let revenue_sql = with_statuses(REVENUE_SQL, &DocumentStatus::REVENUE);
        let bill_costs_sql = with_statuses(VENDOR_BILL_COSTS_SQL, &DocumentStatus::COST);
        let expense_costs_sql = with_statuses(EXPENSE_COSTS_SQL, &DocumentStatus::COST);

        let (projects, tasks, hours, revenue, timesheet_costs, bill_costs, expense_costs, usage) =
            tokio::try_join!(
                self.monthly::<ProjectMonth>(PROJECTS_SQL, company_id, &since),
                self.monthly::<MonthCount>(COMPLETED_TASKS_SQL, company_id, &since),
                self.monthly::<MonthAmount>(BILLED_HOURS_SQL, company_id, &since),
                self.monthly::<MonthAmount>(&revenue_sql, company_id, &since),
                self.monthly::<MonthAmount>(TIMESHEET_COSTS_SQL, company_id, &since),
                self.monthly::<MonthAmount>(&bill_costs_sql, company_id, &since),
                self.monthly::<MonthAmount>(&expense_costs_sql, company_id, &since),
                self.utilization(company_id, today),
            )?;

        let aggregates = MonthlyAggregates {
            active_projects: projects.iter().map(|p| (p.month.clone(), p.active)).collect(),
            completed_projects: projects
                .into_iter()
                .map(|p| (p.month, p.completed))
                .collect(),
            completed_tasks: counts(tasks),
            billed_hours: amounts(hours),
            revenue: amounts(revenue),
            timesheet_costs: amounts(timesheet_costs),
            vendor_bill_costs: amounts(bill_costs),
            expense_costs: amounts(expense_costs),
        };

        Ok(Dashboard::assemble(&window, &aggregates, usage))
    }
}
