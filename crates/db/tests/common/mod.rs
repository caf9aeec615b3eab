//! Seed helpers shared by the repository integration tests.

#![allow(dead_code)]

use bugtracker_core::roles::Role;
use bugtracker_core::types::DbId;
use bugtracker_db::models::company::{Company, CreateCompany};
use bugtracker_db::models::project::{CreateProject, Project};
use bugtracker_db::models::ticket::{CreateTicket, Ticket};
use bugtracker_db::models::user::{CreateUser, User};
use bugtracker_db::repositories::{CompanyRepo, ProjectRepo, RoleRepo, TicketRepo, UserRepo};
use sqlx::PgPool;

pub fn new_project(name: &str) -> CreateProject {
    CreateProject {
        name: name.to_string(),
        description: Some("integration test".to_string()),
        start_date: None,
        end_date: None,
        project_priority_id: Some(1),
    }
}

pub async fn seed_company(pool: &PgPool, name: &str) -> Company {
    CompanyRepo::create(
        pool,
        &CreateCompany {
            name: name.to_string(),
            description: None,
        },
    )
    .await
    .unwrap()
}

/// Create a user in `company_id` holding `roles`. The email is derived from
/// the name so it stays unique per test database.
pub async fn seed_user(pool: &PgPool, company_id: DbId, name: &str, roles: &[Role]) -> User {
    let user = UserRepo::create(
        pool,
        &CreateUser {
            company_id,
            first_name: name.to_string(),
            last_name: "Tester".to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
        },
    )
    .await
    .unwrap();
    for role in roles {
        RoleRepo::add_role(pool, user.id, *role).await.unwrap();
    }
    user
}

pub async fn seed_project(pool: &PgPool, company_id: DbId, name: &str) -> Project {
    ProjectRepo::create(pool, company_id, &new_project(name), None)
        .await
        .unwrap()
}

pub async fn seed_ticket(
    pool: &PgPool,
    company_id: DbId,
    project_id: DbId,
    owner: DbId,
    title: &str,
) -> Ticket {
    TicketRepo::create(
        pool,
        company_id,
        &CreateTicket {
            project_id,
            title: title.to_string(),
            description: None,
            ticket_type_id: 1,
            ticket_priority_id: 1,
            ticket_status_id: 1,
            owner_user_id: owner,
            developer_user_id: None,
        },
    )
    .await
    .unwrap()
}

pub fn ids(users: &[User]) -> Vec<DbId> {
    users.iter().map(|u| u.id).collect()
}
