//! Cross-tenant access through the repositories.
//!
//! Rows belonging to one company must never be returned, modified or
//! referenced by a call scoped to another company.

mod common;

use assert_matches::assert_matches;
use bugtracker_core::error::CoreError;
use bugtracker_core::roles::Role;
use bugtracker_db::error::RepoError;
use bugtracker_db::models::project::UpdateProject;
use bugtracker_db::repositories::{
    CompanyInfoRepo, ProjectRepo, RoleRepo, TicketRepo, UserRepo,
};
use common::{seed_company, seed_project, seed_ticket, seed_user};
use sqlx::PgPool;

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_project_reads_are_company_scoped(pool: PgPool) {
    let a = seed_company(&pool, "Acme").await;
    let b = seed_company(&pool, "Globex").await;
    let project = seed_project(&pool, a.id, "Apollo").await;

    assert!(ProjectRepo::find_by_id(&pool, a.id, project.id)
        .await
        .unwrap()
        .is_some());
    assert!(ProjectRepo::find_by_id(&pool, b.id, project.id)
        .await
        .unwrap()
        .is_none());
    assert!(!ProjectRepo::exists(&pool, b.id, project.id).await.unwrap());
    assert!(ProjectRepo::list_by_company(&pool, b.id)
        .await
        .unwrap()
        .is_empty());
    assert!(ProjectRepo::list_unassigned(&pool, b.id)
        .await
        .unwrap()
        .is_empty());
    assert!(ProjectRepo::find_detail(&pool, b.id, project.id)
        .await
        .unwrap()
        .is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_project_writes_are_company_scoped(pool: PgPool) {
    let a = seed_company(&pool, "Acme").await;
    let b = seed_company(&pool, "Globex").await;
    let project = seed_project(&pool, a.id, "Apollo").await;

    assert!(!ProjectRepo::archive(&pool, b.id, project.id).await.unwrap());
    let still_active = ProjectRepo::find_by_id(&pool, a.id, project.id)
        .await
        .unwrap()
        .unwrap();
    assert!(!still_active.archived);

    let update = UpdateProject {
        name: "Hijacked".to_string(),
        description: None,
        start_date: None,
        end_date: None,
        project_priority_id: None,
        row_version: project.row_version,
    };
    let result = ProjectRepo::update(&pool, b.id, project.id, &update, None).await;
    assert_matches!(result, Err(RepoError::Core(CoreError::Concurrency { .. })));

    let outsider = seed_user(&pool, b.id, "Mallory", &[Role::Developer]).await;
    let result = ProjectRepo::replace_members(&pool, b.id, project.id, &[outsider.id]).await;
    assert_matches!(result, Err(RepoError::Core(CoreError::NotFound { .. })));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_users_and_roles_are_company_scoped(pool: PgPool) {
    let a = seed_company(&pool, "Acme").await;
    let b = seed_company(&pool, "Globex").await;
    let alice = seed_user(&pool, a.id, "Alice", &[Role::Admin]).await;
    seed_user(&pool, b.id, "Bob", &[Role::Admin]).await;

    let admins_a = RoleRepo::users_in_role(&pool, Role::Admin, a.id).await.unwrap();
    assert_eq!(admins_a.len(), 1);
    assert_eq!(admins_a[0].id, alice.id);

    assert!(UserRepo::find_in_company(&pool, b.id, alice.id)
        .await
        .unwrap()
        .is_none());

    let result = RoleRepo::set_roles(&pool, b.id, alice.id, &[Role::Submitter]).await;
    assert_matches!(result, Err(RepoError::Core(CoreError::NotFound { .. })));
    let roles = RoleRepo::roles_for_user(&pool, alice.id).await.unwrap();
    assert_eq!(roles, vec![Role::Admin]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_users_in_role_empty_when_none_match(pool: PgPool) {
    let a = seed_company(&pool, "Acme").await;
    seed_user(&pool, a.id, "Dev", &[Role::Developer]).await;

    let managers = RoleRepo::users_in_role(&pool, Role::ProjectManager, a.id)
        .await
        .unwrap();
    assert!(managers.is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_tickets_are_company_scoped(pool: PgPool) {
    let a = seed_company(&pool, "Acme").await;
    let b = seed_company(&pool, "Globex").await;
    let owner_a = seed_user(&pool, a.id, "Alice", &[Role::Submitter]).await;
    let owner_b = seed_user(&pool, b.id, "Bob", &[Role::Submitter]).await;
    let project = seed_project(&pool, a.id, "Apollo").await;
    let ticket = seed_ticket(&pool, a.id, project.id, owner_a.id, "Crash on save").await;

    assert!(TicketRepo::find_by_id(&pool, b.id, ticket.id)
        .await
        .unwrap()
        .is_none());
    assert!(CompanyInfoRepo::all_tickets(&pool, b.id)
        .await
        .unwrap()
        .is_empty());
    assert!(CompanyInfoRepo::all_projects(&pool, b.id)
        .await
        .unwrap()
        .is_empty());

    // A company-B user cannot comment on a company-A ticket, even via company A.
    let result = TicketRepo::add_comment(&pool, a.id, ticket.id, owner_b.id, "hi").await;
    assert_matches!(result, Err(RepoError::Core(CoreError::NotFound { .. })));
}
