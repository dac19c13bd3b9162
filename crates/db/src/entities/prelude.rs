//! Entity re-exports.

pub use super::companies::Entity as Companies;
pub use super::contacts::Entity as Contacts;
pub use super::expenses::Entity as Expenses;
pub use super::invoices::Entity as Invoices;
pub use super::projects::Entity as Projects;
pub use super::purchase_orders::Entity as PurchaseOrders;
pub use super::sales_orders::Entity as SalesOrders;
pub use super::task_assignments::Entity as TaskAssignments;
pub use super::tasks::Entity as Tasks;
pub use super::timesheets::Entity as Timesheets;
pub use super::users::Entity as Users;
pub use super::vendor_bills::Entity as VendorBills;
