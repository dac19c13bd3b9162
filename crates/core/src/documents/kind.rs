//! Document kinds.

use serde::{Deserialize, Serialize};

use crate::contact::CounterpartSide;

/// The four financial document kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    /// Order placed by a client.
    SalesOrder,
    /// Bill sent to a client.
    Invoice,
    /// Order placed with a vendor.
    PurchaseOrder,
    /// Bill received from a vendor.
    VendorBill,
}

impl DocumentKind {
    /// All kinds.
    pub const ALL: [Self; 4] = [
        Self::SalesOrder,
        Self::Invoice,
        Self::PurchaseOrder,
        Self::VendorBill,
    ];

    /// Trade side of the counterpart.
    #[must_use]
    pub const fn side(&self) -> CounterpartSide {
        match self {
            Self::SalesOrder | Self::Invoice => CounterpartSide::Sales,
            Self::PurchaseOrder | Self::VendorBill => CounterpartSide::Purchase,
        }
    }

    /// Invoices and vendor bills carry a due date.
    #[must_use]
    pub const fn has_due_date(&self) -> bool {
        matches!(self, Self::Invoice | Self::VendorBill)
    }

    /// Human label used in messages and logs.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::SalesOrder => "Sales order",
            Self::Invoice => "Invoice",
            Self::PurchaseOrder => "Purchase order",
            Self::VendorBill => "Vendor bill",
        }
    }
}
