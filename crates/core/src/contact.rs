//! Contact types and counterpart eligibility.

use serde::{Deserialize, Serialize};

/// What a contact is to the company.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactType {
    /// Buys from the company.
    Client,
    /// Sells to the company.
    Vendor,
    /// Both directions.
    Both,
}

/// Which side of a trade a document sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CounterpartSide {
    /// Sales orders and invoices; the counterpart is a client.
    Sales,
    /// Purchase orders and vendor bills; the counterpart is a vendor.
    Purchase,
}

impl ContactType {
    /// Returns true if a contact of this type may act on the given side.
    ///
    /// A pure vendor cannot be billed, and a pure client cannot bill us.
    #[must_use]
    pub const fn can_serve(&self, side: CounterpartSide) -> bool {
        match side {
            CounterpartSide::Sales => !matches!(self, Self::Vendor),
            CounterpartSide::Purchase => !matches!(self, Self::Client),
        }
    }

    /// Returns the wire representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Client => "client",
            Self::Vendor => "vendor",
            Self::Both => "both",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ContactType::Client, CounterpartSide::Sales, true)]
    #[case(ContactType::Both, CounterpartSide::Sales, true)]
    #[case(ContactType::Vendor, CounterpartSide::Sales, false)]
    #[case(ContactType::Vendor, CounterpartSide::Purchase, true)]
    #[case(ContactType::Both, CounterpartSide::Purchase, true)]
    #[case(ContactType::Client, CounterpartSide::Purchase, false)]
    fn test_can_serve(
        #[case] contact: ContactType,
        #[case] side: CounterpartSide,
        #[case] expected: bool,
    ) {
        assert_eq!(contact.can_serve(side), expected);
    }
}
