//! Initial database migration.
//!
//! Creates the enums and every tenant-owned table. Each row has an integer
//! primary key for joins and a public UUID for the wire.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: ENUMS
        // ============================================================
        db.execute_unprepared(ENUMS_SQL).await?;

        // ============================================================
        // PART 2: TENANTS AND PEOPLE
        // ============================================================
        db.execute_unprepared(COMPANIES_SQL).await?;
        db.execute_unprepared(USERS_SQL).await?;
        db.execute_unprepared(CONTACTS_SQL).await?;

        // ============================================================
        // PART 3: DELIVERY
        // ============================================================
        db.execute_unprepared(PROJECTS_SQL).await?;
        db.execute_unprepared(TASKS_SQL).await?;
        db.execute_unprepared(TASK_ASSIGNMENTS_SQL).await?;
        db.execute_unprepared(TIMESHEETS_SQL).await?;

        // ============================================================
        // PART 4: FINANCIAL DOCUMENTS
        // ============================================================
        db.execute_unprepared(SALES_ORDERS_SQL).await?;
        db.execute_unprepared(INVOICES_SQL).await?;
        db.execute_unprepared(PURCHASE_ORDERS_SQL).await?;
        db.execute_unprepared(VENDOR_BILLS_SQL).await?;
        db.execute_unprepared(EXPENSES_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const ENUMS_SQL: &str = r"
CREATE TYPE user_role AS ENUM ('admin', 'project_manager', 'team_member', 'finance');

CREATE TYPE contact_type AS ENUM ('client', 'vendor', 'both');

CREATE TYPE project_status AS ENUM ('planned', 'active', 'on_hold', 'completed');

CREATE TYPE task_status AS ENUM ('todo', 'in_progress', 'review', 'done');

CREATE TYPE task_priority AS ENUM ('low', 'medium', 'high');

-- Shared by sales orders, invoices, purchase orders, vendor bills and expenses
CREATE TYPE document_status AS ENUM ('draft', 'sent', 'approved', 'paid', 'declined');
";

const COMPANIES_SQL: &str = r"
CREATE TABLE companies (
    id SERIAL PRIMARY KEY,
    uuid UUID NOT NULL UNIQUE DEFAULT gen_random_uuid(),
    name VARCHAR(255) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
";

const USERS_SQL: &str = r"
CREATE TABLE users (
    id SERIAL PRIMARY KEY,
    uuid UUID NOT NULL UNIQUE DEFAULT gen_random_uuid(),
    company_id INTEGER NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
    name VARCHAR(255) NOT NULL,
    email VARCHAR(255) NOT NULL UNIQUE,
    password_hash VARCHAR(255) NOT NULL,
    role user_role NOT NULL DEFAULT 'team_member',
    hourly_rate NUMERIC(12, 2),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_hourly_rate CHECK (hourly_rate IS NULL OR hourly_rate >= 0)
);

CREATE INDEX idx_users_company ON users(company_id);
";

const CONTACTS_SQL: &str = r"
CREATE TABLE contacts (
    id SERIAL PRIMARY KEY,
    uuid UUID NOT NULL UNIQUE DEFAULT gen_random_uuid(),
    company_id INTEGER NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
    name VARCHAR(255) NOT NULL,
    type contact_type NOT NULL DEFAULT 'client',
    email VARCHAR(255),
    phone VARCHAR(50),
    address TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_contacts_company ON contacts(company_id);
";

const PROJECTS_SQL: &str = r"
CREATE TABLE projects (
    id SERIAL PRIMARY KEY,
    uuid UUID NOT NULL UNIQUE DEFAULT gen_random_uuid(),
    company_id INTEGER NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
    name VARCHAR(255) NOT NULL,
    description TEXT,
    client_id INTEGER REFERENCES contacts(id) ON DELETE SET NULL,
    manager_id INTEGER REFERENCES users(id) ON DELETE SET NULL,
    status project_status NOT NULL DEFAULT 'planned',
    start_date DATE,
    end_date DATE,
    budget NUMERIC(14, 2),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_project_dates CHECK (start_date IS NULL OR end_date IS NULL OR start_date <= end_date),
    CONSTRAINT chk_project_budget CHECK (budget IS NULL OR budget >= 0)
);

CREATE INDEX idx_projects_company ON projects(company_id);
CREATE INDEX idx_projects_created ON projects(company_id, created_at);
";

const TASKS_SQL: &str = r"
CREATE TABLE tasks (
    id SERIAL PRIMARY KEY,
    uuid UUID NOT NULL UNIQUE DEFAULT gen_random_uuid(),
    company_id INTEGER NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
    project_id INTEGER NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
    title VARCHAR(255) NOT NULL,
    description TEXT,
    status task_status NOT NULL DEFAULT 'todo',
    priority task_priority NOT NULL DEFAULT 'medium',
    assignee_id INTEGER REFERENCES users(id) ON DELETE SET NULL,
    due_date DATE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_tasks_company ON tasks(company_id);
CREATE INDEX idx_tasks_project ON tasks(project_id);
CREATE INDEX idx_tasks_assignee ON tasks(assignee_id) WHERE assignee_id IS NOT NULL;
";

const TASK_ASSIGNMENTS_SQL: &str = r"
CREATE TABLE task_assignments (
    id SERIAL PRIMARY KEY,
    uuid UUID NOT NULL UNIQUE DEFAULT gen_random_uuid(),
    task_id INTEGER NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    assigned_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_task_assignment UNIQUE (task_id, user_id)
);

CREATE INDEX idx_task_assignments_user ON task_assignments(user_id);
";

const TIMESHEETS_SQL: &str = r"
CREATE TABLE timesheets (
    id SERIAL PRIMARY KEY,
    uuid UUID NOT NULL UNIQUE DEFAULT gen_random_uuid(),
    company_id INTEGER NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
    project_id INTEGER NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
    task_id INTEGER REFERENCES tasks(id) ON DELETE SET NULL,
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    date DATE NOT NULL,
    hours NUMERIC(6, 2) NOT NULL,
    description TEXT,
    billable BOOLEAN NOT NULL DEFAULT true,
    cost_rate NUMERIC(12, 2) NOT NULL DEFAULT 0,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_timesheet_hours CHECK (hours > 0),
    CONSTRAINT chk_timesheet_rate CHECK (cost_rate >= 0)
);

CREATE INDEX idx_timesheets_company_date ON timesheets(company_id, date);
CREATE INDEX idx_timesheets_project ON timesheets(project_id);
";

const SALES_ORDERS_SQL: &str = r"
CREATE TABLE sales_orders (
    id SERIAL PRIMARY KEY,
    uuid UUID NOT NULL UNIQUE DEFAULT gen_random_uuid(),
    company_id INTEGER NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
    project_id INTEGER REFERENCES projects(id) ON DELETE SET NULL,
    client_id INTEGER REFERENCES contacts(id) ON DELETE SET NULL,
    date DATE NOT NULL,
    status document_status NOT NULL DEFAULT 'draft',
    items JSONB NOT NULL DEFAULT '[]',
    total_amount NUMERIC(14, 2) NOT NULL DEFAULT 0,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_sales_orders_company_date ON sales_orders(company_id, date);
";

const INVOICES_SQL: &str = r"
CREATE TABLE invoices (
    id SERIAL PRIMARY KEY,
    uuid UUID NOT NULL UNIQUE DEFAULT gen_random_uuid(),
    company_id INTEGER NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
    project_id INTEGER REFERENCES projects(id) ON DELETE SET NULL,
    client_id INTEGER REFERENCES contacts(id) ON DELETE SET NULL,
    date DATE NOT NULL,
    due_date DATE,
    status document_status NOT NULL DEFAULT 'draft',
    items JSONB NOT NULL DEFAULT '[]',
    total_amount NUMERIC(14, 2) NOT NULL DEFAULT 0,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_invoice_due CHECK (due_date IS NULL OR due_date >= date)
);

CREATE INDEX idx_invoices_company_date ON invoices(company_id, date);
";

const PURCHASE_ORDERS_SQL: &str = r"
CREATE TABLE purchase_orders (
    id SERIAL PRIMARY KEY,
    uuid UUID NOT NULL UNIQUE DEFAULT gen_random_uuid(),
    company_id INTEGER NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
    project_id INTEGER REFERENCES projects(id) ON DELETE SET NULL,
    vendor_id INTEGER REFERENCES contacts(id) ON DELETE SET NULL,
    date DATE NOT NULL,
    status document_status NOT NULL DEFAULT 'draft',
    items JSONB NOT NULL DEFAULT '[]',
    total_amount NUMERIC(14, 2) NOT NULL DEFAULT 0,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_purchase_orders_company_date ON purchase_orders(company_id, date);
";

const VENDOR_BILLS_SQL: &str = r"
CREATE TABLE vendor_bills (
    id SERIAL PRIMARY KEY,
    uuid UUID NOT NULL UNIQUE DEFAULT gen_random_uuid(),
    company_id INTEGER NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
    project_id INTEGER REFERENCES projects(id) ON DELETE SET NULL,
    vendor_id INTEGER REFERENCES contacts(id) ON DELETE SET NULL,
    date DATE NOT NULL,
    due_date DATE,
    status document_status NOT NULL DEFAULT 'draft',
    items JSONB NOT NULL DEFAULT '[]',
    total_amount NUMERIC(14, 2) NOT NULL DEFAULT 0,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_vendor_bill_due CHECK (due_date IS NULL OR due_date >= date)
);

CREATE INDEX idx_vendor_bills_company_date ON vendor_bills(company_id, date);
";

const EXPENSES_SQL: &str = r"
CREATE TABLE expenses (
    id SERIAL PRIMARY KEY,
    uuid UUID NOT NULL UNIQUE DEFAULT gen_random_uuid(),
    company_id INTEGER NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
    project_id INTEGER NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
    user_id INTEGER REFERENCES users(id) ON DELETE SET NULL,
    description TEXT NOT NULL,
    amount NUMERIC(14, 2) NOT NULL,
    date DATE NOT NULL,
    billable BOOLEAN NOT NULL DEFAULT false,
    status document_status NOT NULL DEFAULT 'draft',
    receipt_url TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_expense_amount CHECK (amount >= 0)
);

CREATE INDEX idx_expenses_company_date ON expenses(company_id, date);
CREATE INDEX idx_expenses_project ON expenses(project_id);
";

const DROP_ALL_SQL: &str = r"
-- Drop tables (reverse order of creation)
DROP TABLE IF EXISTS expenses CASCADE;
DROP TABLE IF EXISTS vendor_bills CASCADE;
DROP TABLE IF EXISTS purchase_orders CASCADE;
DROP TABLE IF EXISTS invoices CASCADE;
DROP TABLE IF EXISTS sales_orders CASCADE;
DROP TABLE IF EXISTS timesheets CASCADE;
DROP TABLE IF EXISTS task_assignments CASCADE;
DROP TABLE IF EXISTS tasks CASCADE;
DROP TABLE IF EXISTS projects CASCADE;
DROP TABLE IF EXISTS contacts CASCADE;
DROP TABLE IF EXISTS users CASCADE;
DROP TABLE IF EXISTS companies CASCADE;

-- Drop enums
DROP TYPE IF EXISTS document_status;
DROP TYPE IF EXISTS task_priority;
DROP TYPE IF EXISTS task_status;
DROP TYPE IF EXISTS project_status;
DROP TYPE IF EXISTS contact_type;
DROP TYPE IF EXISTS user_role;
";
