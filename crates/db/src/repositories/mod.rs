//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.
//! Every query is scoped to one company; rows of other tenants are invisible.

pub mod analytics;
pub mod common;
pub mod company;
pub mod contact;
pub mod document;
pub mod expense;
pub mod lookup;
pub mod project;
pub mod resolver;
pub mod task;
pub mod timesheet;
pub mod user;

pub use analytics::AnalyticsRepository;
pub use common::{RefFilter, search_pattern};
pub use company::{CompanyError, CompanyRepository, SignupInput};
pub use contact::{
    ContactError, ContactFilter, ContactRepository, CreateContactInput, UpdateContactInput,
};
pub use document::{
    CreateDocumentInput, DocumentError, DocumentFilter, DocumentRecord, DocumentRepository,
    DocumentView, UpdateDocumentInput,
};
pub use expense::{
    CreateExpenseInput, ExpenseError, ExpenseFilter, ExpenseRepository, ExpenseView,
    UpdateExpenseInput,
};
pub use lookup::{EntityRef, RefMap};
pub use project::{
    CreateProjectInput, ProjectError, ProjectFilter, ProjectRepository, ProjectView,
    UpdateProjectInput,
};
pub use resolver::{ResolveError, Resolver};
pub use task::{
    CreateTaskInput, TaskError, TaskFilter, TaskRepository, TaskView, UpdateTaskInput,
    replace_assignments,
};
pub use timesheet::{
    CreateTimesheetInput, TimesheetError, TimesheetFilter, TimesheetRepository, TimesheetView,
    UpdateTimesheetInput,
};
pub use user::{
    CreateUserInput, UpdateUserInput, UserError, UserFilter, UserRepository, normalize_email,
};
