//! `SeaORM` entity definitions.
//!
//! One module per table, plus the shared Postgres enums.

#![allow(missing_docs)]

pub mod prelude;

pub mod companies;
pub mod contacts;
pub mod expenses;
pub mod invoices;
pub mod projects;
pub mod purchase_orders;
pub mod sales_orders;
pub mod sea_orm_active_enums;
pub mod task_assignments;
pub mod tasks;
pub mod timesheets;
pub mod users;
pub mod vendor_bills;
