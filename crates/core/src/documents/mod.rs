//! Financial documents: sales orders, invoices, purchase orders, vendor bills.
//!
//! The four kinds share one shape and differ only in which side of the trade
//! the counterpart sits on and whether they carry a due date.

pub mod items;
pub mod kind;

#[cfg(test)]
mod tests;

pub use items::{LineItem, items_total, resolve_total};
pub use kind::DocumentKind;
