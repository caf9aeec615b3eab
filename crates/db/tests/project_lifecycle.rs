//! Project create, edit, archive and restore against a real database.

mod common;

use assert_matches::assert_matches;
use bugtracker_core::error::CoreError;
use bugtracker_core::roles::Role;
use bugtracker_core::upload::ImageUpload;
use bugtracker_db::error::RepoError;
use bugtracker_db::models::project::UpdateProject;
use bugtracker_db::repositories::{ProjectRepo, TicketRepo};
use common::{ids, new_project, seed_company, seed_project, seed_ticket, seed_user};
use sqlx::PgPool;

fn edit(name: &str, row_version: i32) -> UpdateProject {
    UpdateProject {
        name: name.to_string(),
        description: Some("edited".to_string()),
        start_date: None,
        end_date: None,
        project_priority_id: Some(2),
        row_version,
    }
}

fn png(bytes: &[u8]) -> ImageUpload {
    ImageUpload::new("logo.png", "image/png", bytes.to_vec(), 1024).unwrap()
}

// ---------------------------------------------------------------------------
// Create / update
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_create_assigns_company_and_defaults(pool: PgPool) {
    let company = seed_company(&pool, "Acme").await;
    let project = ProjectRepo::create(&pool, company.id, &new_project("Apollo"), None)
        .await
        .unwrap();

    assert_eq!(project.company_id, company.id);
    assert_eq!(project.name, "Apollo");
    assert!(!project.archived);
    assert_eq!(project.row_version, 1);
    assert!(project.image_file_name.is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_update_bumps_row_version(pool: PgPool) {
    let company = seed_company(&pool, "Acme").await;
    let project = seed_project(&pool, company.id, "Apollo").await;

    let updated = ProjectRepo::update(&pool, company.id, project.id, &edit("Artemis", 1), None)
        .await
        .unwrap();
    assert_eq!(updated.name, "Artemis");
    assert_eq!(updated.project_priority_id, Some(2));
    assert_eq!(updated.row_version, 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_stale_update_is_concurrency_conflict(pool: PgPool) {
    let company = seed_company(&pool, "Acme").await;
    let project = seed_project(&pool, company.id, "Apollo").await;

    ProjectRepo::update(&pool, company.id, project.id, &edit("First", 1), None)
        .await
        .unwrap();
    let result =
        ProjectRepo::update(&pool, company.id, project.id, &edit("Second", 1), None).await;
    assert_matches!(
        result,
        Err(RepoError::Core(CoreError::Concurrency { entity: "Project", id })) if id == project.id
    );

    let stored = ProjectRepo::find_by_id(&pool, company.id, project.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.name, "First");
}

async fn project_count(pool: &PgPool, company_id: i64) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM projects WHERE company_id = $1")
        .bind(company_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_create_with_manager_assigns_in_one_step(pool: PgPool) {
    let company = seed_company(&pool, "Acme").await;
    let pm = seed_user(&pool, company.id, "Pam", &[Role::ProjectManager]).await;

    let project = ProjectRepo::create_with_manager(
        &pool,
        company.id,
        &new_project("Apollo"),
        None,
        Some(pm.id),
    )
    .await
    .unwrap();

    let manager = ProjectRepo::manager(&pool, company.id, project.id).await.unwrap();
    assert_eq!(manager.map(|u| u.id), Some(pm.id));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_create_with_rejected_manager_writes_nothing(pool: PgPool) {
    let company = seed_company(&pool, "Acme").await;
    let dev = seed_user(&pool, company.id, "Dev", &[Role::Developer]).await;

    // The insert succeeds inside the transaction; the pick fails after it.
    let result = ProjectRepo::create_with_manager(
        &pool,
        company.id,
        &new_project("Apollo"),
        None,
        Some(dev.id),
    )
    .await;
    assert_matches!(result, Err(RepoError::Core(CoreError::Validation(_))));
    assert_eq!(project_count(&pool, company.id).await, 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_update_with_rejected_manager_rolls_back(pool: PgPool) {
    let company = seed_company(&pool, "Acme").await;
    let dev = seed_user(&pool, company.id, "Dev", &[Role::Developer]).await;
    let project = seed_project(&pool, company.id, "Apollo").await;

    let result = ProjectRepo::update_with_manager(
        &pool,
        company.id,
        project.id,
        &edit("Artemis", 1),
        None,
        Some(dev.id),
    )
    .await;
    assert_matches!(result, Err(RepoError::Core(CoreError::Validation(_))));

    let stored = ProjectRepo::find_by_id(&pool, company.id, project.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.name, "Apollo");
    assert_eq!(stored.row_version, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_update_keeps_image_unless_replaced(pool: PgPool) {
    let company = seed_company(&pool, "Acme").await;
    let project = ProjectRepo::create(
        &pool,
        company.id,
        &new_project("Apollo"),
        Some(&png(&[1, 2, 3])),
    )
    .await
    .unwrap();

    ProjectRepo::update(&pool, company.id, project.id, &edit("Apollo", 1), None)
        .await
        .unwrap();
    let image = ProjectRepo::find_image(&pool, company.id, project.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(image.data, vec![1, 2, 3]);
    assert_eq!(image.content_type, "image/png");

    ProjectRepo::update(
        &pool,
        company.id,
        project.id,
        &edit("Apollo", 2),
        Some(&png(&[9])),
    )
    .await
    .unwrap();
    let image = ProjectRepo::find_image(&pool, company.id, project.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(image.data, vec![9]);
}

// ---------------------------------------------------------------------------
// Archive / restore
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_archive_then_restore_scenario(pool: PgPool) {
    let company = seed_company(&pool, "Acme").await;
    let p1 = seed_project(&pool, company.id, "P1").await;

    assert!(ProjectRepo::archive(&pool, company.id, p1.id).await.unwrap());
    let active = ProjectRepo::list_by_company(&pool, company.id).await.unwrap();
    let archived = ProjectRepo::list_archived_by_company(&pool, company.id)
        .await
        .unwrap();
    assert!(active.iter().all(|p| p.id != p1.id));
    assert!(archived.iter().any(|p| p.id == p1.id));

    // Archived projects remain addressable by id.
    let found = ProjectRepo::find_by_id(&pool, company.id, p1.id)
        .await
        .unwrap()
        .unwrap();
    assert!(found.archived);

    assert!(ProjectRepo::restore(&pool, company.id, p1.id).await.unwrap());
    let active = ProjectRepo::list_by_company(&pool, company.id).await.unwrap();
    let archived = ProjectRepo::list_archived_by_company(&pool, company.id)
        .await
        .unwrap();
    assert!(active.iter().any(|p| p.id == p1.id));
    assert!(archived.is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_archive_is_idempotent_and_round_trips_members(pool: PgPool) {
    let company = seed_company(&pool, "Acme").await;
    let dev = seed_user(&pool, company.id, "Dev", &[Role::Developer]).await;
    let pm = seed_user(&pool, company.id, "Pam", &[Role::ProjectManager]).await;
    let project = seed_project(&pool, company.id, "Apollo").await;
    ProjectRepo::add_member(&pool, company.id, dev.id, project.id)
        .await
        .unwrap();
    ProjectRepo::add_manager(&pool, company.id, pm.id, project.id)
        .await
        .unwrap();
    let before = ids(&ProjectRepo::members(&pool, company.id, project.id).await.unwrap());

    assert!(ProjectRepo::archive(&pool, company.id, project.id).await.unwrap());
    assert!(ProjectRepo::archive(&pool, company.id, project.id).await.unwrap());
    assert!(ProjectRepo::restore(&pool, company.id, project.id).await.unwrap());
    assert!(ProjectRepo::restore(&pool, company.id, project.id).await.unwrap());

    let after = ProjectRepo::find_by_id(&pool, company.id, project.id)
        .await
        .unwrap()
        .unwrap();
    assert!(!after.archived);
    let members = ids(&ProjectRepo::members(&pool, company.id, project.id).await.unwrap());
    assert_eq!(members, before);
    let manager = ProjectRepo::manager(&pool, company.id, project.id).await.unwrap();
    assert_eq!(manager.map(|u| u.id), Some(pm.id));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_archive_flags_tickets(pool: PgPool) {
    let company = seed_company(&pool, "Acme").await;
    let owner = seed_user(&pool, company.id, "Sub", &[Role::Submitter]).await;
    let project = seed_project(&pool, company.id, "Apollo").await;
    let ticket = seed_ticket(&pool, company.id, project.id, owner.id, "Broken link").await;

    ProjectRepo::archive(&pool, company.id, project.id).await.unwrap();
    let archived = TicketRepo::find_by_id(&pool, company.id, ticket.id)
        .await
        .unwrap()
        .unwrap();
    assert!(archived.ticket.archived_by_project);

    ProjectRepo::restore(&pool, company.id, project.id).await.unwrap();
    let restored = TicketRepo::find_by_id(&pool, company.id, ticket.id)
        .await
        .unwrap()
        .unwrap();
    assert!(!restored.ticket.archived_by_project);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_archive_missing_project_returns_false(pool: PgPool) {
    let company = seed_company(&pool, "Acme").await;
    assert!(!ProjectRepo::archive(&pool, company.id, 999_999).await.unwrap());
    assert!(!ProjectRepo::restore(&pool, company.id, 999_999).await.unwrap());
}
