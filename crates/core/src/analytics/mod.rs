//! Dashboard analytics.
//!
//! This module provides:
//! - Month windows with `YYYY-MM` keys and short labels
//! - Alignment of sparse aggregate rows onto a window
//! - Month-over-month KPIs and the resource utilization snapshot

pub mod dashboard;
pub mod months;

#[cfg(test)]
mod tests;

pub use dashboard::{
    ChartSegment, Dashboard, DashboardKpis, DashboardSeries, Kpi, MonthRows, MonthlyAggregates,
    ResourceUtilization, UtilizationCounts, align, sum_series,
};
pub use months::{Month, MonthWindow};
