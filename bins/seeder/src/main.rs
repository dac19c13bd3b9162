//! Demo data seeder for Opsdesk development.
//!
//! Signs up a demo company and fills it with users, contacts, projects, tasks,
//! logged time, documents and expenses spread over the last few months, so
//! every list and the analytics dashboard have something to show.
//!
//! Usage: cargo run --bin seeder

use anyhow::Context;
use chrono::{Duration, NaiveDate, Utc};
use opsdesk_core::auth::PasswordPolicy;
use opsdesk_core::documents::{DocumentKind, LineItem};
use opsdesk_db::entities::sea_orm_active_enums::{
    ContactType, DocumentStatus, ProjectStatus, TaskPriority, TaskStatus, UserRole,
};
use opsdesk_db::repositories::{
    CreateContactInput, CreateDocumentInput, CreateExpenseInput, CreateProjectInput,
    CreateTaskInput, CreateTimesheetInput, CreateUserInput, SignupInput,
};
use opsdesk_db::{
    CompanyRepository, ContactRepository, DocumentRepository, ExpenseRepository,
    ProjectRepository, TaskRepository, TimesheetRepository, UserRepository,
};
use opsdesk_shared::config::DatabaseConfig;
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;

const DEMO_ADMIN_EMAIL: &str = "admin@opsdesk.dev";
const DEMO_PASSWORD: &str = "opsdesk-demo";

struct Team {
    company_id: i32,
    admin_id: i32,
    manager_id: i32,
    member_id: i32,
    finance_id: i32,
}

struct Contacts {
    client_id: i32,
    vendor_id: i32,
    partner_id: i32,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set in environment")?;

    println!("Connecting to database...");
    let db = opsdesk_db::connect(&DatabaseConfig {
        url,
        max_connections: 5,
        min_connections: 1,
    })
    .await
    .context("Failed to connect to database")?;

    let users = UserRepository::new(db.clone(), PasswordPolicy::default());
    if users.email_exists(DEMO_ADMIN_EMAIL).await? {
        println!("  Demo company already exists, skipping...");
        return Ok(());
    }

    println!("Seeding demo company and team...");
    let team = seed_team(&db, &users).await?;

    println!("Seeding contacts...");
    let contacts = seed_contacts(&db, team.company_id).await?;

    println!("Seeding projects, tasks and time...");
    let website_id = seed_projects(&db, &team, &contacts).await?;

    println!("Seeding documents and expenses...");
    seed_finance(&db, &team, &contacts, website_id).await?;

    println!("Seeding complete! Log in as {DEMO_ADMIN_EMAIL} / {DEMO_PASSWORD}");
    Ok(())
}

fn days_ago(days: i64) -> NaiveDate {
    Utc::now().date_naive() - Duration::days(days)
}

async fn seed_team(db: &DatabaseConnection, users: &UserRepository) -> anyhow::Result<Team> {
    let (company, admin) = CompanyRepository::new(db.clone())
        .signup(
            users,
            SignupInput {
                company_name: "Demo Studio".to_string(),
                name: "Avery Admin".to_string(),
                email: DEMO_ADMIN_EMAIL.to_string(),
                password: DEMO_PASSWORD.to_string(),
            },
        )
        .await?;
    println!("  Created company: {}", company.name);

    let mut ids = Vec::new();
    for (name, email, role, rate) in [
        ("Morgan Manager", "manager@opsdesk.dev", UserRole::ProjectManager, 65),
        ("Riley Member", "member@opsdesk.dev", UserRole::TeamMember, 45),
        ("Fin Ledger", "finance@opsdesk.dev", UserRole::Finance, 55),
    ] {
        let user = users
            .create(CreateUserInput {
                company_id: company.id,
                name: name.to_string(),
                email: email.to_string(),
                password: DEMO_PASSWORD.to_string(),
                role,
                hourly_rate: Some(Decimal::from(rate)),
            })
            .await?;
        println!("  Created user: {email}");
        ids.push(user.id);
    }

    Ok(Team {
        company_id: company.id,
        admin_id: admin.id,
        manager_id: ids[0],
        member_id: ids[1],
        finance_id: ids[2],
    })
}

async fn seed_contacts(db: &DatabaseConnection, company_id: i32) -> anyhow::Result<Contacts> {
    let repo = ContactRepository::new(db.clone());
    let mut ids = Vec::new();
    for (name, contact_type, email) in [
        ("Northwind Traders", ContactType::Client, "billing@northwind.test"),
        ("Contoso Supplies", ContactType::Vendor, "ar@contoso.test"),
        ("Fabrikam Partners", ContactType::Both, "hello@fabrikam.test"),
    ] {
        let contact = repo
            .create(CreateContactInput {
                company_id,
                name: name.to_string(),
                contact_type,
                email: Some(email.to_string()),
                phone: None,
                address: None,
            })
            .await?;
        ids.push(contact.id);
    }

    Ok(Contacts {
        client_id: ids[0],
        vendor_id: ids[1],
        partner_id: ids[2],
    })
}

async fn seed_projects(
    db: &DatabaseConnection,
    team: &Team,
    contacts: &Contacts,
) -> anyhow::Result<i32> {
    let projects = ProjectRepository::new(db.clone());
    let tasks = TaskRepository::new(db.clone());
    let timesheets = TimesheetRepository::new(db.clone());

    let website = projects
        .create(CreateProjectInput {
            company_id: team.company_id,
            name: "Website Redesign".to_string(),
            description: Some("New marketing site and CMS migration".to_string()),
            client_id: Some(contacts.client_id),
            manager_id: Some(team.manager_id),
            status: ProjectStatus::Active,
            start_date: Some(days_ago(120)),
            end_date: Some(days_ago(-30)),
            budget: Some(Decimal::from(48_000)),
        })
        .await?;
    let app = projects
        .create(CreateProjectInput {
            company_id: team.company_id,
            name: "Partner Portal".to_string(),
            description: None,
            client_id: Some(contacts.partner_id),
            manager_id: Some(team.admin_id),
            status: ProjectStatus::Planned,
            start_date: Some(days_ago(-14)),
            end_date: None,
            budget: None,
        })
        .await?;

    let mut website_tasks = Vec::new();
    for (title, status, priority, due_in) in [
        ("Content audit", TaskStatus::Done, TaskPriority::Medium, -60),
        ("Wireframes", TaskStatus::Done, TaskPriority::High, -30),
        ("Visual design", TaskStatus::Review, TaskPriority::High, -3),
        ("CMS migration", TaskStatus::InProgress, TaskPriority::Medium, 10),
        ("Launch checklist", TaskStatus::Todo, TaskPriority::Low, 30),
    ] {
        let task = tasks
            .create(CreateTaskInput {
                company_id: team.company_id,
                project_id: website.id,
                title: title.to_string(),
                description: None,
                status,
                priority,
                assignee_id: Some(team.member_id),
                due_date: Some(days_ago(-due_in)),
                assignment_user_ids: Some(vec![team.member_id, team.manager_id]),
            })
            .await?;
        website_tasks.push(task.id);
    }
    tasks
        .create(CreateTaskInput {
            company_id: team.company_id,
            project_id: app.id,
            title: "Discovery workshop".to_string(),
            description: Some("Agree scope with Fabrikam".to_string()),
            status: TaskStatus::Todo,
            priority: TaskPriority::Medium,
            assignee_id: Some(team.manager_id),
            due_date: None,
            assignment_user_ids: None,
        })
        .await?;

    let mut entries = 0;
    for week in 0..16_i64 {
        for (user_id, rate, hours) in [
            (team.member_id, 45, Decimal::new(65, 1)),
            (team.manager_id, 65, Decimal::from(2)),
        ] {
            let task_id = website_tasks[usize::try_from(week % 5)?];
            timesheets
                .create(CreateTimesheetInput {
                    company_id: team.company_id,
                    project_id: website.id,
                    task_id: Some(task_id),
                    user_id,
                    date: days_ago(week * 7),
                    hours,
                    description: Some("Weekly delivery".to_string()),
                    billable: user_id == team.member_id,
                    cost_rate: Decimal::from(rate),
                })
                .await?;
            entries += 1;
        }
    }
    println!("  Created {entries} timesheet entries");

    Ok(website.id)
}

fn item(description: &str, quantity: i64, unit_price: i64) -> LineItem {
    LineItem {
        description: description.to_string(),
        quantity: Decimal::from(quantity),
        unit_price: Decimal::from(unit_price),
    }
}

async fn seed_finance(
    db: &DatabaseConnection,
    team: &Team,
    contacts: &Contacts,
    website_id: i32,
) -> anyhow::Result<()> {
    let website = Some(website_id);

    let sales_orders = DocumentRepository::new(db.clone(), DocumentKind::SalesOrder);
    sales_orders
        .create(CreateDocumentInput {
            company_id: team.company_id,
            project_id: website,
            counterpart_id: Some(contacts.client_id),
            date: days_ago(125),
            due_date: None,
            status: DocumentStatus::Approved,
            items: vec![item("Website redesign, fixed fee", 1, 48_000)],
            total_amount: None,
        })
        .await?;

    let invoices = DocumentRepository::new(db.clone(), DocumentKind::Invoice);
    for (months_back, status) in [
        (4, DocumentStatus::Paid),
        (3, DocumentStatus::Paid),
        (2, DocumentStatus::Paid),
        (1, DocumentStatus::Sent),
        (0, DocumentStatus::Draft),
    ] {
        let date = days_ago(months_back * 30);
        invoices
            .create(CreateDocumentInput {
                company_id: team.company_id,
                project_id: website,
                counterpart_id: Some(contacts.client_id),
                date,
                due_date: Some(date + Duration::days(30)),
                status,
                items: vec![
                    item("Design and development", 1, 8_000),
                    item("Project management", 10, 120),
                ],
                total_amount: None,
            })
            .await?;
    }

    let purchase_orders = DocumentRepository::new(db.clone(), DocumentKind::PurchaseOrder);
    purchase_orders
        .create(CreateDocumentInput {
            company_id: team.company_id,
            project_id: website,
            counterpart_id: Some(contacts.vendor_id),
            date: days_ago(90),
            due_date: None,
            status: DocumentStatus::Approved,
            items: vec![item("Stock photography licence", 1, 1_200)],
            total_amount: None,
        })
        .await?;

    let bills = DocumentRepository::new(db.clone(), DocumentKind::VendorBill);
    bills
        .create(CreateDocumentInput {
            company_id: team.company_id,
            project_id: website,
            counterpart_id: Some(contacts.vendor_id),
            date: days_ago(60),
            due_date: Some(days_ago(30)),
            status: DocumentStatus::Paid,
            items: vec![item("Stock photography licence", 1, 1_200)],
            total_amount: None,
        })
        .await?;

    let expenses = ExpenseRepository::new(db.clone());
    for (days, description, amount, status) in [
        (70, "Client workshop catering", 180, DocumentStatus::Paid),
        (40, "Usability test incentives", 300, DocumentStatus::Approved),
        (5, "Taxi to client office", 25, DocumentStatus::Draft),
    ] {
        expenses
            .create(CreateExpenseInput {
                company_id: team.company_id,
                project_id: website_id,
                user_id: Some(team.finance_id),
                description: description.to_string(),
                amount: Decimal::from(amount),
                date: days_ago(days),
                billable: true,
                status,
                receipt_url: None,
            })
            .await?;
    }

    Ok(())
}
