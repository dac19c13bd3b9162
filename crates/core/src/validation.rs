//! Cross-field input rules that plain field validators cannot express.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

/// Largest hour count a timesheet column holds, `NUMERIC(6,2)`.
pub const MAX_HOURS: Decimal = Decimal::from_parts(999_999, 0, 0, false, 2);

/// Largest hourly or cost rate, `NUMERIC(12,2)`.
pub const MAX_RATE: Decimal = Decimal::from_parts(3_567_587_327, 232, 0, false, 2);

/// Largest money amount, budget or document total, `NUMERIC(14,2)`.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(276_447_231, 23_283, 0, false, 2);

/// A rule broken by an input value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("{field}: {message}")]
pub struct RuleViolation {
    /// Wire name of the offending field.
    pub field: &'static str,
    /// Machine-readable code.
    pub code: &'static str,
    /// Human-readable message.
    pub message: &'static str,
}

/// Checks that an interval does not end before it starts.
///
/// Open ends are always valid.
///
/// # Errors
///
/// Returns `INVALID_DATE_RANGE` on `end_field` when `start > end`.
pub fn check_date_range(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    end_field: &'static str,
) -> Result<(), RuleViolation> {
    match (start, end) {
        (Some(start), Some(end)) if start > end => Err(RuleViolation {
            field: end_field,
            code: "INVALID_DATE_RANGE",
            message: "End date must not be before start date",
        }),
        _ => Ok(()),
    }
}

/// Checks that a quantity is strictly positive.
///
/// # Errors
///
/// Returns `MUST_BE_POSITIVE` when `value <= 0`.
pub fn check_positive(value: Decimal, field: &'static str) -> Result<(), RuleViolation> {
    if value > Decimal::ZERO {
        Ok(())
    } else {
        Err(RuleViolation {
            field,
            code: "MUST_BE_POSITIVE",
            message: "Must be greater than zero",
        })
    }
}

/// Checks that an amount is not negative.
///
/// # Errors
///
/// Returns `MUST_NOT_BE_NEGATIVE` when `value < 0`.
pub fn check_non_negative(value: Decimal, field: &'static str) -> Result<(), RuleViolation> {
    if value.is_sign_negative() && !value.is_zero() {
        Err(RuleViolation {
            field,
            code: "MUST_NOT_BE_NEGATIVE",
            message: "Must not be negative",
        })
    } else {
        Ok(())
    }
}

/// Checks that a value fits under the column limit `max`.
///
/// # Errors
///
/// Returns `TOO_LARGE` when `value > max`.
pub fn check_at_most(value: Decimal, max: Decimal, field: &'static str) -> Result<(), RuleViolation> {
    if value > max {
        Err(RuleViolation {
            field,
            code: "TOO_LARGE",
            message: "Exceeds the largest storable value",
        })
    } else {
        Ok(())
    }
}
