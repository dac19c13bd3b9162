//! Tests for dashboard analytics.

use chrono::NaiveDate;
use proptest::prelude::*;
use rstest::rstest;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::*;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn rows<T>(items: &[(&str, T)]) -> MonthRows<T>
where
    T: Copy,
{
    items.iter().map(|(k, v)| ((*k).to_string(), *v)).collect()
}

#[test]
fn test_window_is_six_months_oldest_first() {
    let window = MonthWindow::ending_at(date(2026, 10, 18), MonthWindow::DASHBOARD_MONTHS);

    assert_eq!(
        window.keys(),
        vec!["2026-05", "2026-06", "2026-07", "2026-08", "2026-09", "2026-10"]
    );
    assert_eq!(window.labels(), vec!["May", "Jun", "Jul", "Aug", "Sep", "Oct"]);
    assert_eq!(window.first_key().as_deref(), Some("2026-05"));
}

#[test]
fn test_window_crosses_year_boundary() {
    let window = MonthWindow::ending_at(date(2026, 2, 1), 6);

    assert_eq!(
        window.keys(),
        vec!["2025-09", "2025-10", "2025-11", "2025-12", "2026-01", "2026-02"]
    );
    assert_eq!(window.labels()[3], "Dec");
}

#[rstest]
#[case(date(2026, 1, 31), 1, "2025-12")]
#[case(date(2026, 3, 15), 2, "2026-01")]
#[case(date(2026, 12, 1), 12, "2025-12")]
#[case(date(2026, 6, 30), 0, "2026-06")]
fn test_month_back(#[case] today: NaiveDate, #[case] back: u32, #[case] expected: &str) {
    assert_eq!(Month::of(today).back(back).key(), expected);
}

#[test]
fn test_align_fills_missing_months_with_zero() {
    let window = MonthWindow::ending_at(date(2026, 10, 1), 6);
    let aligned = align(&window, &rows(&[("2026-07", 3i64), ("2026-10", 1)]));

    assert_eq!(aligned, vec![0, 0, 3, 0, 0, 1]);
}

#[test]
fn test_align_ignores_months_outside_window() {
    let window = MonthWindow::ending_at(date(2026, 10, 1), 6);
    let aligned = align(&window, &rows(&[("2025-01", dec!(99)), ("2026-09", dec!(2.5))]));

    assert_eq!(aligned.iter().copied().sum::<Decimal>(), dec!(2.5));
}

#[test]
fn test_combined_costs() {
    let window = MonthWindow::ending_at(date(2026, 10, 1), 6);
    let aggregates = MonthlyAggregates {
        timesheet_costs: rows(&[("2026-10", dec!(100))]),
        vendor_bill_costs: rows(&[("2026-10", dec!(50))]),
        expense_costs: rows(&[("2026-10", dec!(25))]),
        ..MonthlyAggregates::default()
    };

    let dashboard = Dashboard::assemble(&window, &aggregates, UtilizationCounts::default());

    assert_eq!(dashboard.series.costs[5], dec!(175));
    assert_eq!(dashboard.series.costs[..5], [Decimal::ZERO; 5]);
}

#[test]
fn test_empty_tenant_dashboard() {
    let window = MonthWindow::ending_at(date(2026, 10, 1), 6);
    let counts = UtilizationCounts {
        total_users: 4,
        allocated_users: 0,
        overdue_tasks: 0,
    };

    let dashboard = Dashboard::assemble(&window, &MonthlyAggregates::default(), counts);

    assert_eq!(dashboard.months.len(), 6);
    assert!(dashboard.series.active_projects.iter().all(|v| *v == 0));
    assert!(dashboard.series.costs.iter().all(Decimal::is_zero));
    assert_eq!(dashboard.kpis.revenue, Kpi { current: Decimal::ZERO, delta: Decimal::ZERO });
    assert_eq!(dashboard.kpis.active_projects.delta, 0);
    assert_eq!(dashboard.resource_utilization.available, 4);
    assert_eq!(dashboard.resource_utilization.allocated, 0);
    assert_eq!(dashboard.resource_utilization.overallocated, 0);
}

#[test]
fn test_kpis_compare_last_two_months() {
    let window = MonthWindow::ending_at(date(2026, 10, 1), 6);
    let aggregates = MonthlyAggregates {
        completed_tasks: rows(&[("2026-09", 5i64), ("2026-10", 3)]),
        billed_hours: rows(&[("2026-09", dec!(10.04)), ("2026-10", dec!(12.46))]),
        revenue: rows(&[("2026-10", dec!(1500))]),
        ..MonthlyAggregates::default()
    };

    let kpis = Dashboard::assemble(&window, &aggregates, UtilizationCounts::default()).kpis;

    assert_eq!(kpis.completed_tasks, Kpi { current: 3, delta: -2 });
    assert_eq!(kpis.billed_hours.current, dec!(12.5));
    assert_eq!(kpis.billed_hours.delta, dec!(2.4));
    assert_eq!(kpis.revenue.delta, dec!(1500));
}

#[test]
fn test_kpi_with_short_series() {
    assert_eq!(Kpi::from_series(&[7i64]), Kpi { current: 7, delta: 0 });
    assert_eq!(Kpi::<i64>::from_series(&[]), Kpi { current: 0, delta: 0 });
}

#[rstest]
#[case(10, 3, 2, 7)]
#[case(2, 5, 0, 0)]
#[case(0, 0, 0, 0)]
fn test_utilization_available_never_negative(
    #[case] total_users: i64,
    #[case] allocated_users: i64,
    #[case] overdue_tasks: i64,
    #[case] expected_available: i64,
) {
    let snapshot = ResourceUtilization::from_counts(UtilizationCounts {
        total_users,
        allocated_users,
        overdue_tasks,
    });

    assert_eq!(snapshot.available, expected_available);
    assert_eq!(snapshot.allocated, allocated_users);
    assert_eq!(snapshot.overallocated, overdue_tasks);
    let labels: Vec<_> = snapshot.segments.iter().map(|s| s.label).collect();
    assert_eq!(labels, vec!["Available", "Allocated", "Overallocated"]);
}

proptest! {
    /// Aligned series always has one value per window month.
    #[test]
    fn test_align_length_matches_window(
        n in 1u32..24,
        entries in prop::collection::vec((0u32..36, 0i64..1_000), 0..40),
    ) {
        let window = MonthWindow::ending_at(date(2026, 10, 1), n);
        let data: MonthRows<i64> = entries
            .iter()
            .map(|(back, v)| (Month::of(date(2026, 10, 1)).back(*back).key(), *v))
            .collect();

        let aligned = align(&window, &data);
        prop_assert_eq!(aligned.len(), n as usize);

        let in_window: i64 = entries
            .iter()
            .filter(|(back, _)| *back < n)
            .map(|(_, v)| *v)
            .sum();
        prop_assert_eq!(aligned.iter().sum::<i64>(), in_window);
    }

    /// Combined costs equal the sum of each source.
    #[test]
    fn test_sum_series_is_additive(
        a in prop::collection::vec(0i64..100_000, 6),
        b in prop::collection::vec(0i64..100_000, 6),
        c in prop::collection::vec(0i64..100_000, 6),
    ) {
        let to_dec = |v: &Vec<i64>| v.iter().map(|x| Decimal::new(*x, 2)).collect::<Vec<_>>();
        let (a, b, c) = (to_dec(&a), to_dec(&b), to_dec(&c));

        let combined = sum_series(&[a.as_slice(), b.as_slice(), c.as_slice()]);
        let total: Decimal = combined.iter().copied().sum();
        let expected: Decimal = a.iter().chain(&b).chain(&c).copied().sum();
        prop_assert_eq!(total, expected);
    }
}
