//! Project membership and project-manager assignment.

mod common;

use assert_matches::assert_matches;
use bugtracker_core::error::CoreError;
use bugtracker_core::roles::Role;
use bugtracker_db::error::RepoError;
use bugtracker_db::repositories::{ProjectRepo, RoleRepo};
use common::{ids, seed_company, seed_project, seed_user};
use sqlx::PgPool;

async fn manager_count(pool: &PgPool, project_id: i64) -> i64 {
    sqlx::query_scalar(
        "SELECT COUNT(*) FROM project_members WHERE project_id = $1 AND is_manager",
    )
    .bind(project_id)
    .fetch_one(pool)
    .await
    .unwrap()
}

// ---------------------------------------------------------------------------
// Project manager
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_assign_pm_twice_leaves_exactly_one(pool: PgPool) {
    let company = seed_company(&pool, "Acme").await;
    let first = seed_user(&pool, company.id, "Pam", &[Role::ProjectManager]).await;
    let second = seed_user(&pool, company.id, "Quinn", &[Role::ProjectManager]).await;
    let project = seed_project(&pool, company.id, "Apollo").await;

    ProjectRepo::add_manager(&pool, company.id, first.id, project.id)
        .await
        .unwrap();
    ProjectRepo::add_manager(&pool, company.id, second.id, project.id)
        .await
        .unwrap();

    assert_eq!(manager_count(&pool, project.id).await, 1);
    let manager = ProjectRepo::manager(&pool, company.id, project.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(manager.id, second.id);

    // The previous manager no longer belongs to the project.
    let members = ids(&ProjectRepo::members(&pool, company.id, project.id).await.unwrap());
    assert_eq!(members, vec![second.id]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_assign_same_pm_twice_is_noop(pool: PgPool) {
    let company = seed_company(&pool, "Acme").await;
    let pm = seed_user(&pool, company.id, "Pam", &[Role::ProjectManager]).await;
    let project = seed_project(&pool, company.id, "Apollo").await;

    ProjectRepo::add_manager(&pool, company.id, pm.id, project.id)
        .await
        .unwrap();
    ProjectRepo::add_manager(&pool, company.id, pm.id, project.id)
        .await
        .unwrap();

    assert_eq!(manager_count(&pool, project.id).await, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_pm_from_other_company_is_validation_error(pool: PgPool) {
    let acme = seed_company(&pool, "Acme").await;
    let globex = seed_company(&pool, "Globex").await;
    let outsider = seed_user(&pool, globex.id, "Otto", &[Role::ProjectManager]).await;
    let project = seed_project(&pool, acme.id, "Apollo").await;

    let result = ProjectRepo::add_manager(&pool, acme.id, outsider.id, project.id).await;
    assert_matches!(result, Err(RepoError::Core(CoreError::Validation(_))));
    assert_eq!(manager_count(&pool, project.id).await, 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_pm_without_role_is_validation_error(pool: PgPool) {
    let company = seed_company(&pool, "Acme").await;
    let dev = seed_user(&pool, company.id, "Dev", &[Role::Developer]).await;
    let project = seed_project(&pool, company.id, "Apollo").await;

    let result = ProjectRepo::add_manager(&pool, company.id, dev.id, project.id).await;
    assert_matches!(result, Err(RepoError::Core(CoreError::Validation(_))));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_unknown_pm_is_validation_error(pool: PgPool) {
    let company = seed_company(&pool, "Acme").await;
    let project = seed_project(&pool, company.id, "Apollo").await;

    let result = ProjectRepo::add_manager(&pool, company.id, 424_242, project.id).await;
    assert_matches!(result, Err(RepoError::Core(CoreError::Validation(_))));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_unassigned_lists_only_projects_without_pm(pool: PgPool) {
    let company = seed_company(&pool, "Acme").await;
    let pm = seed_user(&pool, company.id, "Pam", &[Role::ProjectManager]).await;
    let managed = seed_project(&pool, company.id, "Managed").await;
    let orphan = seed_project(&pool, company.id, "Orphan").await;
    let archived_orphan = seed_project(&pool, company.id, "Shelved").await;
    ProjectRepo::add_manager(&pool, company.id, pm.id, managed.id)
        .await
        .unwrap();
    ProjectRepo::archive(&pool, company.id, archived_orphan.id)
        .await
        .unwrap();

    let unassigned = ProjectRepo::list_unassigned(&pool, company.id).await.unwrap();
    let unassigned: Vec<i64> = unassigned.iter().map(|p| p.id).collect();
    assert_eq!(unassigned, vec![orphan.id]);

    assert!(ProjectRepo::remove_manager(&pool, company.id, managed.id)
        .await
        .unwrap());
    let unassigned = ProjectRepo::list_unassigned(&pool, company.id).await.unwrap();
    assert_eq!(unassigned.len(), 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_revoking_pm_role_unassigns_managed_projects(pool: PgPool) {
    let company = seed_company(&pool, "Acme").await;
    let pm = seed_user(&pool, company.id, "Pam", &[Role::ProjectManager]).await;
    let dev = seed_user(&pool, company.id, "Dev", &[Role::Developer]).await;
    let project = seed_project(&pool, company.id, "Apollo").await;
    ProjectRepo::add_manager(&pool, company.id, pm.id, project.id)
        .await
        .unwrap();
    ProjectRepo::add_member(&pool, company.id, dev.id, project.id)
        .await
        .unwrap();

    let roles = RoleRepo::set_roles(&pool, company.id, pm.id, &[Role::Developer])
        .await
        .unwrap();
    assert_eq!(roles, vec![Role::Developer]);

    assert!(ProjectRepo::manager(&pool, company.id, project.id)
        .await
        .unwrap()
        .is_none());
    let unassigned = ProjectRepo::list_unassigned(&pool, company.id).await.unwrap();
    assert_eq!(unassigned.iter().map(|p| p.id).collect::<Vec<_>>(), vec![project.id]);

    // Ordinary members are untouched.
    let members = ids(&ProjectRepo::members(&pool, company.id, project.id).await.unwrap());
    assert_eq!(members, vec![dev.id]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_keeping_pm_role_keeps_managed_projects(pool: PgPool) {
    let company = seed_company(&pool, "Acme").await;
    let pm = seed_user(&pool, company.id, "Pam", &[Role::ProjectManager]).await;
    let project = seed_project(&pool, company.id, "Apollo").await;
    ProjectRepo::add_manager(&pool, company.id, pm.id, project.id)
        .await
        .unwrap();

    RoleRepo::set_roles(&pool, company.id, pm.id, &[Role::ProjectManager, Role::Developer])
        .await
        .unwrap();

    assert_eq!(manager_count(&pool, project.id).await, 1);
}

// ---------------------------------------------------------------------------
// Members
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_replace_members_yields_exact_selection(pool: PgPool) {
    let company = seed_company(&pool, "Acme").await;
    let a = seed_user(&pool, company.id, "Ann", &[Role::Developer]).await;
    let b = seed_user(&pool, company.id, "Ben", &[Role::Developer]).await;
    let c = seed_user(&pool, company.id, "Cat", &[Role::Submitter]).await;
    let pm = seed_user(&pool, company.id, "Pam", &[Role::ProjectManager]).await;
    let project = seed_project(&pool, company.id, "Apollo").await;

    ProjectRepo::add_manager(&pool, company.id, pm.id, project.id)
        .await
        .unwrap();
    ProjectRepo::replace_members(&pool, company.id, project.id, &[a.id, b.id])
        .await
        .unwrap();
    let plan = ProjectRepo::replace_members(&pool, company.id, project.id, &[b.id, c.id])
        .await
        .unwrap();
    assert_eq!(plan.to_remove, vec![a.id]);
    assert_eq!(plan.to_add, vec![c.id]);

    let members = ids(
        &ProjectRepo::members_except_manager(&pool, company.id, project.id)
            .await
            .unwrap(),
    );
    assert_eq!(members, vec![b.id, c.id]);

    // The manager survives every replacement.
    let manager = ProjectRepo::manager(&pool, company.id, project.id).await.unwrap();
    assert_eq!(manager.map(|u| u.id), Some(pm.id));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_replace_members_is_all_or_nothing(pool: PgPool) {
    let acme = seed_company(&pool, "Acme").await;
    let globex = seed_company(&pool, "Globex").await;
    let a = seed_user(&pool, acme.id, "Ann", &[Role::Developer]).await;
    let b = seed_user(&pool, acme.id, "Ben", &[Role::Developer]).await;
    let outsider = seed_user(&pool, globex.id, "Otto", &[Role::Developer]).await;
    let project = seed_project(&pool, acme.id, "Apollo").await;

    ProjectRepo::replace_members(&pool, acme.id, project.id, &[a.id])
        .await
        .unwrap();
    let result =
        ProjectRepo::replace_members(&pool, acme.id, project.id, &[b.id, outsider.id]).await;
    assert_matches!(
        result,
        Err(RepoError::Core(CoreError::Validation(msg))) if msg.contains(&outsider.id.to_string())
    );

    let members = ids(&ProjectRepo::members(&pool, acme.id, project.id).await.unwrap());
    assert_eq!(members, vec![a.id]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_add_and_remove_member_are_idempotent(pool: PgPool) {
    let company = seed_company(&pool, "Acme").await;
    let dev = seed_user(&pool, company.id, "Dev", &[Role::Developer]).await;
    let project = seed_project(&pool, company.id, "Apollo").await;

    assert!(ProjectRepo::add_member(&pool, company.id, dev.id, project.id)
        .await
        .unwrap());
    assert!(!ProjectRepo::add_member(&pool, company.id, dev.id, project.id)
        .await
        .unwrap());
    assert_eq!(
        ProjectRepo::members(&pool, company.id, project.id)
            .await
            .unwrap()
            .len(),
        1
    );

    assert!(ProjectRepo::remove_member(&pool, company.id, dev.id, project.id)
        .await
        .unwrap());
    assert!(!ProjectRepo::remove_member(&pool, company.id, dev.id, project.id)
        .await
        .unwrap());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_add_member_from_other_company_rejected(pool: PgPool) {
    let acme = seed_company(&pool, "Acme").await;
    let globex = seed_company(&pool, "Globex").await;
    let outsider = seed_user(&pool, globex.id, "Otto", &[Role::Developer]).await;
    let project = seed_project(&pool, acme.id, "Apollo").await;

    let result = ProjectRepo::add_member(&pool, acme.id, outsider.id, project.id).await;
    assert_matches!(result, Err(RepoError::Core(CoreError::Validation(_))));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_user_projects_scenario(pool: PgPool) {
    let company = seed_company(&pool, "Acme").await;
    let dev = seed_user(&pool, company.id, "Dev", &[Role::Developer]).await;
    let p1 = seed_project(&pool, company.id, "P1").await;
    seed_project(&pool, company.id, "P2").await;

    ProjectRepo::add_member(&pool, company.id, dev.id, p1.id)
        .await
        .unwrap();

    let projects = ProjectRepo::list_for_user(&pool, dev.id).await.unwrap();
    let project_ids: Vec<i64> = projects.iter().map(|p| p.id).collect();
    assert_eq!(project_ids, vec![p1.id]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_detail_separates_manager_from_members(pool: PgPool) {
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

    let detail = ProjectRepo::find_detail(&pool, company.id, project.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(detail.manager.map(|u| u.id), Some(pm.id));
    assert_eq!(ids(&detail.members), vec![dev.id]);
}
