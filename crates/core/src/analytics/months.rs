//! Calendar month windows.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

const LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// A calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Month {
    /// Year.
    pub year: i32,
    /// Month number, 1 to 12.
    pub month: u32,
}

impl Month {
    /// Month containing the given date.
    #[must_use]
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// The month `n` months before this one.
    #[must_use]
    pub fn back(self, n: u32) -> Self {
        let index = self.year * 12 + i32::try_from(self.month).unwrap_or(1) - 1
            - i32::try_from(n).unwrap_or(0);
        Self {
            year: index.div_euclid(12),
            month: index.rem_euclid(12).unsigned_abs() + 1,
        }
    }

    /// Sortable key, `YYYY-MM`.
    #[must_use]
    pub fn key(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }

    /// Short month name.
    #[must_use]
    pub fn label(&self) -> &'static str {
        LABELS[(self.month as usize).saturating_sub(1) % 12]
    }
}

/// The most recent `n` months ending at a given month, oldest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthWindow {
    months: Vec<Month>,
}

impl MonthWindow {
    /// Window length used by the dashboard.
    pub const DASHBOARD_MONTHS: u32 = 6;

    /// Builds the window of `n` months ending at the month of `today`.
    #[must_use]
    pub fn ending_at(today: NaiveDate, n: u32) -> Self {
        let current = Month::of(today);
        let months = (0..n).rev().map(|back| current.back(back)).collect();
        Self { months }
    }

    /// Months in the window, oldest first.
    #[must_use]
    pub fn months(&self) -> &[Month] {
        &self.months
    }

    /// `YYYY-MM` keys, oldest first.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.months.iter().map(Month::key).collect()
    }

    /// Short labels, oldest first.
    #[must_use]
    pub fn labels(&self) -> Vec<String> {
        self.months.iter().map(|m| m.label().to_string()).collect()
    }

    /// Key of the oldest month, used as the lower query bound.
    #[must_use]
    pub fn first_key(&self) -> Option<String> {
        self.months.first().map(Month::key)
    }
}
