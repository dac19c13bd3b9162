//! Document line items.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::validation::{MAX_AMOUNT, RuleViolation, check_at_most};

/// One line on a financial document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// What was sold or bought.
    pub description: String,
    /// Number of units.
    #[serde(default = "one")]
    pub quantity: Decimal,
    /// Price per unit.
    #[serde(default)]
    pub unit_price: Decimal,
}

fn one() -> Decimal {
    Decimal::ONE
}

impl LineItem {
    /// Line amount: quantity times unit price. `None` when the product overflows.
    #[must_use]
    pub fn amount(&self) -> Option<Decimal> {
        self.quantity.checked_mul(self.unit_price)
    }
}

/// Sum of all line amounts. `None` when any step overflows.
#[must_use]
pub fn items_total(items: &[LineItem]) -> Option<Decimal> {
    items
        .iter()
        .try_fold(Decimal::ZERO, |sum, item| sum.checked_add(item.amount()?))
}

/// Picks the total to store for a write.
///
/// An explicit total wins. Otherwise, if items were supplied, their sum is used.
/// Returns `Ok(None)` when neither was supplied, leaving the stored total untouched.
///
/// # Errors
///
/// Returns `TOO_LARGE` when the total does not fit a stored amount.
pub fn resolve_total(
    items: Option<&[LineItem]>,
    total: Option<Decimal>,
) -> Result<Option<Decimal>, RuleViolation> {
    let too_large = |field| RuleViolation {
        field,
        code: "TOO_LARGE",
        message: "Exceeds the largest storable value",
    };
    if let Some(total) = total {
        check_at_most(total, MAX_AMOUNT, "total_amount")?;
        return Ok(Some(total));
    }
    let Some(items) = items else {
        return Ok(None);
    };
    let sum = items_total(items).ok_or_else(|| too_large("items"))?;
    check_at_most(sum, MAX_AMOUNT, "items")?;
    Ok(Some(sum))
}
