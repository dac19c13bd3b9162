//! Tests for financial document rules.

use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::*;
use crate::contact::{ContactType, CounterpartSide};

fn item(description: &str, quantity: Decimal, unit_price: Decimal) -> LineItem {
    LineItem {
        description: description.to_string(),
        quantity,
        unit_price,
    }
}

#[test]
fn test_kind_sides() {
    assert_eq!(DocumentKind::SalesOrder.side(), CounterpartSide::Sales);
    assert_eq!(DocumentKind::Invoice.side(), CounterpartSide::Sales);
    assert_eq!(DocumentKind::PurchaseOrder.side(), CounterpartSide::Purchase);
    assert_eq!(DocumentKind::VendorBill.side(), CounterpartSide::Purchase);
}

#[test]
fn test_due_date_only_on_bills() {
    let with_due: Vec<_> = DocumentKind::ALL
        .into_iter()
        .filter(DocumentKind::has_due_date)
        .collect();
    assert_eq!(with_due, vec![DocumentKind::Invoice, DocumentKind::VendorBill]);
}

#[test]
fn test_vendor_cannot_receive_invoice() {
    let side = DocumentKind::Invoice.side();
    assert!(!ContactType::Vendor.can_serve(side));
    assert!(ContactType::Both.can_serve(side));
}

#[test]
fn test_items_total() {
    let items = vec![
        item("Design", dec!(10), dec!(85.50)),
        item("Hosting", dec!(1), dec!(120)),
    ];
    assert_eq!(items_total(&items), Some(dec!(975.00)));
    assert_eq!(items_total(&[]), Some(Decimal::ZERO));
}

#[test]
fn test_huge_line_overflows_to_none() {
    let huge = Decimal::from_i128_with_scale(100_000_000_000_000_000_000, 0);
    let items = vec![item("Everything", huge, huge)];
    assert_eq!(items[0].amount(), None);
    assert_eq!(items_total(&items), None);

    let err = resolve_total(Some(&items), None).unwrap_err();
    assert_eq!(err.field, "items");
    assert_eq!(err.code, "TOO_LARGE");
}

#[test]
fn test_sum_past_the_column_is_rejected() {
    let items = vec![
        item("First half", dec!(1), dec!(600000000000)),
        item("Second half", dec!(1), dec!(600000000000)),
    ];
    assert_eq!(items_total(&items), Some(dec!(1200000000000)));
    assert_eq!(resolve_total(Some(&items), None).unwrap_err().code, "TOO_LARGE");
    assert_eq!(
        resolve_total(None, Some(dec!(1000000000000))).unwrap_err().field,
        "total_amount"
    );
}

#[test]
fn test_resolve_total_prefers_explicit_total() {
    let items = vec![item("Design", dec!(2), dec!(50))];
    assert_eq!(resolve_total(Some(&items), Some(dec!(80))), Ok(Some(dec!(80))));
    assert_eq!(resolve_total(Some(&items), None), Ok(Some(dec!(100))));
    assert_eq!(resolve_total(None, None), Ok(None));
}

#[test]
fn test_line_item_defaults() {
    let parsed: LineItem = serde_json::from_str(r#"{"description":"Consulting"}"#).unwrap();
    assert_eq!(parsed.quantity, Decimal::ONE);
    assert_eq!(parsed.unit_price, Decimal::ZERO);
}

proptest! {
    /// The total never depends on line order.
    #[test]
    fn test_items_total_order_independent(
        lines in prop::collection::vec((0i64..1_000, 0i64..100_000), 0..20),
    ) {
        let items: Vec<LineItem> = lines
            .iter()
            .map(|(q, p)| item("line", Decimal::from(*q), Decimal::new(*p, 2)))
            .collect();
        let mut reversed = items.clone();
        reversed.reverse();

        prop_assert_eq!(items_total(&items), items_total(&reversed));
        prop_assert!(items_total(&items).is_some());
    }
}
