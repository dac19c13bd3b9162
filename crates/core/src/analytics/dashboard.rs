//! Dashboard assembly from monthly aggregate rows.

use std::collections::HashMap;
use std::ops::{Add, Sub};

use rust_decimal::Decimal;
use serde::Serialize;

use super::months::MonthWindow;

/// Rows of `(YYYY-MM, value)` as returned by an aggregate query.
pub type MonthRows<T> = Vec<(String, T)>;

/// Raw aggregate results for one tenant.
#[derive(Debug, Clone, Default)]
pub struct MonthlyAggregates {
    /// Projects created per month that are active.
    pub active_projects: MonthRows<i64>,
    /// Projects created per month that are completed.
    pub completed_projects: MonthRows<i64>,
    /// Tasks moved to done per month.
    pub completed_tasks: MonthRows<i64>,
    /// Billable hours logged per month.
    pub billed_hours: MonthRows<Decimal>,
    /// Invoiced revenue per month.
    pub revenue: MonthRows<Decimal>,
    /// Timesheet labour cost per month.
    pub timesheet_costs: MonthRows<Decimal>,
    /// Vendor bill cost per month.
    pub vendor_bill_costs: MonthRows<Decimal>,
    /// Expense cost per month.
    pub expense_costs: MonthRows<Decimal>,
}

/// Point-in-time staffing counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UtilizationCounts {
    /// Users in the company.
    pub total_users: i64,
    /// Distinct assignees of open tasks.
    pub allocated_users: i64,
    /// Tasks past their due date and not done.
    pub overdue_tasks: i64,
}

/// Aligns sparse rows to the window, filling gaps with zero.
#[must_use]
pub fn align<T>(window: &MonthWindow, rows: &[(String, T)]) -> Vec<T>
where
    T: Copy + Default + Add<Output = T>,
{
    let mut by_month: HashMap<&str, T> = HashMap::with_capacity(rows.len());
    for (month, value) in rows {
        let slot = by_month.entry(month.as_str()).or_default();
        *slot = *slot + *value;
    }
    window
        .months()
        .iter()
        .map(|m| by_month.get(m.key().as_str()).copied().unwrap_or_default())
        .collect()
}

/// Element-wise sum of aligned series of equal length.
#[must_use]
pub fn sum_series(series: &[&[Decimal]]) -> Vec<Decimal> {
    let len = series.iter().map(|s| s.len()).max().unwrap_or(0);
    (0..len)
        .map(|i| series.iter().filter_map(|s| s.get(i)).copied().sum())
        .collect()
}

/// Latest value and its change against the prior month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Kpi<T> {
    /// Value for the latest month.
    pub current: T,
    /// `current - previous`; zero with fewer than two months.
    pub delta: T,
}

impl<T> Kpi<T>
where
    T: Copy + Default + Sub<Output = T>,
{
    /// Builds a KPI from an aligned series.
    #[must_use]
    pub fn from_series(series: &[T]) -> Self {
        match series {
            [.., previous, current] => Self {
                current: *current,
                delta: *current - *previous,
            },
            [current] => Self {
                current: *current,
                delta: T::default(),
            },
            [] => Self {
                current: T::default(),
                delta: T::default(),
            },
        }
    }
}

/// Monthly series, aligned with `months`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardSeries {
    /// Active projects created per month.
    pub active_projects: Vec<i64>,
    /// Completed projects created per month.
    pub completed_projects: Vec<i64>,
    /// Tasks completed per month.
    pub completed_tasks: Vec<i64>,
    /// Billable hours per month.
    pub billed_hours: Vec<Decimal>,
    /// Revenue per month.
    pub revenue: Vec<Decimal>,
    /// Combined costs per month.
    pub costs: Vec<Decimal>,
}

/// Month-over-month KPIs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DashboardKpis {
    /// Active projects.
    pub active_projects: Kpi<i64>,
    /// Completed tasks.
    pub completed_tasks: Kpi<i64>,
    /// Billable hours, one decimal place.
    pub billed_hours: Kpi<Decimal>,
    /// Invoiced revenue.
    pub revenue: Kpi<Decimal>,
}

/// One slice of the utilization chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartSegment {
    /// Display label.
    pub label: &'static str,
    /// Slice value.
    pub value: i64,
    /// Hex color.
    pub color: &'static str,
}

/// Resource utilization snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceUtilization {
    /// Users without open work.
    pub available: i64,
    /// Users with open work.
    pub allocated: i64,
    /// Overdue open tasks.
    pub overallocated: i64,
    /// The same numbers as chart segments.
    pub segments: Vec<ChartSegment>,
}

impl ResourceUtilization {
    /// Builds the snapshot from raw counts.
    #[must_use]
    pub fn from_counts(counts: UtilizationCounts) -> Self {
        let available = (counts.total_users - counts.allocated_users).max(0);
        let allocated = counts.allocated_users;
        let overallocated = counts.overdue_tasks;
        Self {
            available,
            allocated,
            overallocated,
            segments: vec![
                ChartSegment {
                    label: "Available",
                    value: available,
                    color: "#22c55e",
                },
                ChartSegment {
                    label: "Allocated",
                    value: allocated,
                    color: "#3b82f6",
                },
                ChartSegment {
                    label: "Overallocated",
                    value: overallocated,
                    color: "#ef4444",
                },
            ],
        }
    }
}

/// The assembled dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dashboard {
    /// Short month labels, oldest first.
    pub months: Vec<String>,
    /// `YYYY-MM` keys matching `months`.
    pub month_keys: Vec<String>,
    /// Monthly series.
    pub series: DashboardSeries,
    /// Month-over-month KPIs.
    pub kpis: DashboardKpis,
    /// Staffing snapshot.
    pub resource_utilization: ResourceUtilization,
}

impl Dashboard {
    /// Merges aggregate rows into the dashboard for a window.
    #[must_use]
    pub fn assemble(
        window: &MonthWindow,
        aggregates: &MonthlyAggregates,
        counts: UtilizationCounts,
    ) -> Self {
        let timesheet_costs = align(window, &aggregates.timesheet_costs);
        let vendor_bill_costs = align(window, &aggregates.vendor_bill_costs);
        let expense_costs = align(window, &aggregates.expense_costs);

        let series = DashboardSeries {
            active_projects: align(window, &aggregates.active_projects),
            completed_projects: align(window, &aggregates.completed_projects),
            completed_tasks: align(window, &aggregates.completed_tasks),
            billed_hours: align(window, &aggregates.billed_hours),
            revenue: align(window, &aggregates.revenue),
            costs: sum_series(&[
                timesheet_costs.as_slice(),
                vendor_bill_costs.as_slice(),
                expense_costs.as_slice(),
            ]),
        };

        let hours = Kpi::from_series(&series.billed_hours);
        let kpis = DashboardKpis {
            active_projects: Kpi::from_series(&series.active_projects),
            completed_tasks: Kpi::from_series(&series.completed_tasks),
            billed_hours: Kpi {
                current: hours.current.round_dp(1),
                delta: hours.delta.round_dp(1),
            },
            revenue: Kpi::from_series(&series.revenue),
        };

        Self {
            months: window.labels(),
            month_keys: window.keys(),
            series,
            kpis,
            resource_utilization: ResourceUtilization::from_counts(counts),
        }
    }
}
