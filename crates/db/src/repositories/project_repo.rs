//! Repository for the `projects` and `project_members` tables.
//!
//! Every method is scoped by company. Archiving is a reversible soft delete:
//! archived projects drop out of the default listings but stay addressable by
//! id. Membership edits and project-manager assignment lock the project row
//! and run in a single transaction; create and edit with a manager pick share
//! one transaction with the assignment.

use bugtracker_core::error::CoreError;
use bugtracker_core::membership::{
    plan_member_replacement, validate_manager_candidate, validate_selection, MemberCandidate,
    MembershipPlan,
};
use bugtracker_core::types::DbId;
use bugtracker_core::upload::ImageUpload;
use sqlx::{PgConnection, PgPool};

use crate::error::{RepoError, RepoResult};
use crate::models::project::{CreateProject, Project, ProjectDetail, ProjectImage, UpdateProject};
use crate::models::user::User;
use crate::repositories::role_repo::RoleRepo;
use crate::repositories::user_repo::{UserRepo, U_COLUMNS};

/// Column list shared across queries. Image bytes are loaded only by
/// [`ProjectRepo::find_image`].
pub(crate) const COLUMNS: &str = "id, company_id, name, description, start_date, end_date, \
    project_priority_id, image_file_name, image_content_type, archived, row_version, \
    created_at, updated_at";

/// Same columns qualified with the `p` alias, for joins.
const P_COLUMNS: &str = "p.id, p.company_id, p.name, p.description, p.start_date, p.end_date, \
    p.project_priority_id, p.image_file_name, p.image_content_type, p.archived, p.row_version, \
    p.created_at, p.updated_at";

/// Provides CRUD, lifecycle and membership operations for projects.
pub struct ProjectRepo;

impl ProjectRepo {
    // -----------------------------------------------------------------------
    // CRUD
    // -----------------------------------------------------------------------

    /// Insert a new project for `company_id`, returning the created row.
    pub async fn create(
        pool: &PgPool,
        company_id: DbId,
        input: &CreateProject,
        image: Option<&ImageUpload>,
    ) -> Result<Project, sqlx::Error> {
        let mut conn = pool.acquire().await?;
        let project = Self::insert(&mut *conn, company_id, input, image).await?;
        tracing::info!(company_id, project_id = project.id, "Created project");
        Ok(project)
    }

    /// Insert a new project and, when `manager_id` is given, assign its
    /// manager in the same transaction.
    ///
    /// A rejected manager pick rolls the insert back, so nothing is written.
    pub async fn create_with_manager(
        pool: &PgPool,
        company_id: DbId,
        input: &CreateProject,
        image: Option<&ImageUpload>,
        manager_id: Option<DbId>,
    ) -> RepoResult<Project> {
        let mut tx = pool.begin().await?;
        let project = Self::insert(&mut *tx, company_id, input, image).await?;
        if let Some(user_id) = manager_id {
            Self::assign_manager(&mut *tx, company_id, user_id, project.id).await?;
        }
        tx.commit().await?;

        tracing::info!(
            company_id,
            project_id = project.id,
            manager_id = ?manager_id,
            "Created project"
        );
        Ok(project)
    }

    async fn insert(
        conn: &mut PgConnection,
        company_id: DbId,
        input: &CreateProject,
        image: Option<&ImageUpload>,
    ) -> Result<Project, sqlx::Error> {
        let query = format!(
            "INSERT INTO projects
                (company_id, name, description, start_date, end_date, project_priority_id,
                 image_file_name, image_content_type, image_data)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(company_id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(input.start_date)
            .bind(input.end_date)
            .bind(input.project_priority_id)
            .bind(image.map(|i| i.file_name.as_str()))
            .bind(image.map(|i| i.content_type.as_str()))
            .bind(image.map(|i| i.data.as_slice()))
            .fetch_one(conn)
            .await
    }

    /// Find a project by id within a company. Archived projects are included.
    pub async fn find_by_id(
        pool: &PgPool,
        company_id: DbId,
        id: DbId,
    ) -> Result<Option<Project>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM projects WHERE id = $1 AND company_id = $2");
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .bind(company_id)
            .fetch_optional(pool)
            .await
    }

    /// Whether the project exists in the company, archived or not.
    pub async fn exists(pool: &PgPool, company_id: DbId, id: DbId) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM projects WHERE id = $1 AND company_id = $2)",
        )
        .bind(id)
        .bind(company_id)
        .fetch_one(pool)
        .await
    }

    /// Update a project's editable fields using optimistic concurrency.
    ///
    /// The write only applies when the stored `row_version` still equals
    /// `input.row_version`; the version is then incremented. A mismatch, or a
    /// project that no longer exists in the company, yields
    /// [`CoreError::Concurrency`]. When `image` is `None` the stored image is
    /// kept.
    pub async fn update(
        pool: &PgPool,
        company_id: DbId,
        id: DbId,
        input: &UpdateProject,
        image: Option<&ImageUpload>,
    ) -> RepoResult<Project> {
        let mut conn = pool.acquire().await?;
        Self::apply_update(&mut *conn, company_id, id, input, image).await
    }

    /// [`ProjectRepo::update`] followed by a manager assignment, committed
    /// together.
    ///
    /// A stale version or a rejected manager pick leaves the project as it
    /// was.
    pub async fn update_with_manager(
        pool: &PgPool,
        company_id: DbId,
        id: DbId,
        input: &UpdateProject,
        image: Option<&ImageUpload>,
        manager_id: Option<DbId>,
    ) -> RepoResult<Project> {
        let mut tx = pool.begin().await?;
        let project = Self::apply_update(&mut *tx, company_id, id, input, image).await?;
        if let Some(user_id) = manager_id {
            Self::assign_manager(&mut *tx, company_id, user_id, id).await?;
        }
        tx.commit().await?;
        Ok(project)
    }

    async fn apply_update(
        conn: &mut PgConnection,
        company_id: DbId,
        id: DbId,
        input: &UpdateProject,
        image: Option<&ImageUpload>,
    ) -> RepoResult<Project> {
        let query = format!(
            "UPDATE projects SET
                name = $4,
                description = $5,
                start_date = $6,
                end_date = $7,
                project_priority_id = $8,
                image_file_name = CASE WHEN $9 THEN $10 ELSE image_file_name END,
                image_content_type = CASE WHEN $9 THEN $11 ELSE image_content_type END,
                image_data = CASE WHEN $9 THEN $12 ELSE image_data END,
                row_version = row_version + 1,
                updated_at = NOW()
             WHERE id = $1 AND company_id = $2 AND row_version = $3
             RETURNING {COLUMNS}"
        );
        let updated = sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .bind(company_id)
            .bind(input.row_version)
            .bind(&input.name)
            .bind(&input.description)
            .bind(input.start_date)
            .bind(input.end_date)
            .bind(input.project_priority_id)
            .bind(image.is_some())
            .bind(image.map(|i| i.file_name.as_str()))
            .bind(image.map(|i| i.content_type.as_str()))
            .bind(image.map(|i| i.data.as_slice()))
            .fetch_optional(conn)
            .await?;

        match updated {
            Some(project) => {
                tracing::info!(
                    company_id,
                    project_id = id,
                    row_version = project.row_version,
                    "Updated project"
                );
                Ok(project)
            }
            None => {
                tracing::warn!(company_id, project_id = id, "Stale or missing project on update");
                Err(RepoError::Core(CoreError::Concurrency {
                    entity: "Project",
                    id,
                }))
            }
        }
    }

    /// Load the stored image of a project, if it has one.
    pub async fn find_image(
        pool: &PgPool,
        company_id: DbId,
        id: DbId,
    ) -> Result<Option<ProjectImage>, sqlx::Error> {
        sqlx::query_as::<_, ProjectImage>(
            "SELECT image_file_name AS file_name, image_content_type AS content_type,
                    image_data AS data
             FROM projects
             WHERE id = $1 AND company_id = $2
               AND image_data IS NOT NULL
               AND image_file_name IS NOT NULL
               AND image_content_type IS NOT NULL",
        )
        .bind(id)
        .bind(company_id)
        .fetch_optional(pool)
        .await
    }

    // -----------------------------------------------------------------------
    // Listings
    // -----------------------------------------------------------------------

    /// Active projects the user is a member of (including as manager).
    ///
    /// Not filtered by company: a user belongs to exactly one company, so
    /// their memberships cannot cross tenants.
    pub async fn list_for_user(pool: &PgPool, user_id: DbId) -> Result<Vec<Project>, sqlx::Error> {
        let query = format!(
            "SELECT {P_COLUMNS} FROM projects p
             JOIN project_members pm ON pm.project_id = p.id
             WHERE pm.user_id = $1 AND p.archived = false
             ORDER BY p.created_at DESC, p.id DESC"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Active (non-archived) projects of a company, newest first.
    pub async fn list_by_company(
        pool: &PgPool,
        company_id: DbId,
    ) -> Result<Vec<Project>, sqlx::Error> {
        Self::list_with_archived_flag(pool, company_id, false).await
    }

    /// Archived projects of a company, newest first.
    pub async fn list_archived_by_company(
        pool: &PgPool,
        company_id: DbId,
    ) -> Result<Vec<Project>, sqlx::Error> {
        Self::list_with_archived_flag(pool, company_id, true).await
    }

    async fn list_with_archived_flag(
        pool: &PgPool,
        company_id: DbId,
        archived: bool,
    ) -> Result<Vec<Project>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM projects
             WHERE company_id = $1 AND archived = $2
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(company_id)
            .bind(archived)
            .fetch_all(pool)
            .await
    }

    /// Active projects of a company that have no project manager.
    pub async fn list_unassigned(
        pool: &PgPool,
        company_id: DbId,
    ) -> Result<Vec<Project>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM projects p
             WHERE p.company_id = $1 AND p.archived = false
               AND NOT EXISTS (
                   SELECT 1 FROM project_members pm
                   WHERE pm.project_id = p.id AND pm.is_manager
               )
             ORDER BY p.created_at DESC, p.id DESC"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(company_id)
            .fetch_all(pool)
            .await
    }

    // -----------------------------------------------------------------------
    // Archive / restore
    // -----------------------------------------------------------------------

    /// Archive a project and flag its tickets as archived with it.
    ///
    /// Idempotent: archiving an archived project succeeds. Returns `false`
    /// when the project does not exist in the company.
    pub async fn archive(pool: &PgPool, company_id: DbId, id: DbId) -> Result<bool, sqlx::Error> {
        Self::set_archived(pool, company_id, id, true).await
    }

    /// Restore an archived project and the tickets archived with it.
    ///
    /// Idempotent, like [`ProjectRepo::archive`].
    pub async fn restore(pool: &PgPool, company_id: DbId, id: DbId) -> Result<bool, sqlx::Error> {
        Self::set_archived(pool, company_id, id, false).await
    }

    async fn set_archived(
        pool: &PgPool,
        company_id: DbId,
        id: DbId,
        archived: bool,
    ) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let result = sqlx::query(
            "UPDATE projects SET archived = $3, updated_at = NOW()
             WHERE id = $1 AND company_id = $2",
        )
        .bind(id)
        .bind(company_id)
        .bind(archived)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(false);
        }

        sqlx::query(
            "UPDATE tickets SET archived_by_project = $2, updated_at = NOW()
             WHERE project_id = $1 AND archived_by_project <> $2",
        )
        .bind(id)
        .bind(archived)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(company_id, project_id = id, archived, "Changed project archive state");
        Ok(true)
    }

    // -----------------------------------------------------------------------
    // Membership reads
    // -----------------------------------------------------------------------

    /// A project with its manager and ordinary members.
    pub async fn find_detail(
        pool: &PgPool,
        company_id: DbId,
        id: DbId,
    ) -> Result<Option<ProjectDetail>, sqlx::Error> {
        let Some(project) = Self::find_by_id(pool, company_id, id).await? else {
            return Ok(None);
        };
        let manager = Self::manager(pool, company_id, id).await?;
        let members = Self::members_except_manager(pool, company_id, id).await?;
        Ok(Some(ProjectDetail {
            project,
            manager,
            members,
        }))
    }

    /// Every member of a project, manager included.
    pub async fn members(
        pool: &PgPool,
        company_id: DbId,
        project_id: DbId,
    ) -> Result<Vec<User>, sqlx::Error> {
        Self::members_filtered(pool, company_id, project_id, "").await
    }

    /// Members of a project other than its manager.
    pub async fn members_except_manager(
        pool: &PgPool,
        company_id: DbId,
        project_id: DbId,
    ) -> Result<Vec<User>, sqlx::Error> {
        Self::members_filtered(pool, company_id, project_id, "AND NOT pm.is_manager").await
    }

    /// The project's manager, if one is assigned.
    pub async fn manager(
        pool: &PgPool,
        company_id: DbId,
        project_id: DbId,
    ) -> Result<Option<User>, sqlx::Error> {
        let mut managers =
            Self::members_filtered(pool, company_id, project_id, "AND pm.is_manager").await?;
        Ok(managers.pop())
    }

    async fn members_filtered(
        pool: &PgPool,
        company_id: DbId,
        project_id: DbId,
        filter: &str,
    ) -> Result<Vec<User>, sqlx::Error> {
        let query = format!(
            "SELECT {U_COLUMNS} FROM project_members pm
             JOIN projects p ON p.id = pm.project_id
             JOIN users u ON u.id = pm.user_id
             WHERE pm.project_id = $1 AND p.company_id = $2 {filter}
             ORDER BY u.last_name, u.first_name, u.id"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(project_id)
            .bind(company_id)
            .fetch_all(pool)
            .await
    }

    // -----------------------------------------------------------------------
    // Membership writes
    // -----------------------------------------------------------------------

    /// Make `user_id` the project's manager, replacing any previous one.
    ///
    /// The user must exist, belong to the project's company and hold the
    /// project-manager role; otherwise the call fails with
    /// [`CoreError::Validation`] and nothing changes. The previous manager is
    /// removed from the project. Assigning the current manager again is a
    /// no-op.
    pub async fn add_manager(
        pool: &PgPool,
        company_id: DbId,
        user_id: DbId,
        project_id: DbId,
    ) -> RepoResult<()> {
        let mut tx = pool.begin().await?;
        Self::assign_manager(&mut *tx, company_id, user_id, project_id).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn assign_manager(
        conn: &mut PgConnection,
        company_id: DbId,
        user_id: DbId,
        project_id: DbId,
    ) -> RepoResult<()> {
        Self::lock_project(&mut *conn, company_id, project_id).await?;

        let user = UserRepo::find_any_for_share(&mut *conn, user_id).await?.ok_or_else(|| {
            CoreError::Validation(format!("User {user_id} cannot manage this project"))
        })?;
        let roles = RoleRepo::roles_for_user_inner(&mut *conn, user_id).await?;
        validate_manager_candidate(
            company_id,
            &MemberCandidate {
                user_id,
                company_id: user.company_id,
                roles,
            },
        )?;

        let current: Option<DbId> = sqlx::query_scalar(
            "SELECT user_id FROM project_members WHERE project_id = $1 AND is_manager",
        )
        .bind(project_id)
        .fetch_optional(&mut *conn)
        .await?;

        if current == Some(user_id) {
            return Ok(());
        }

        if let Some(previous) = current {
            sqlx::query("DELETE FROM project_members WHERE project_id = $1 AND user_id = $2")
                .bind(project_id)
                .bind(previous)
                .execute(&mut *conn)
                .await?;
        }

        sqlx::query(
            "INSERT INTO project_members (project_id, user_id, is_manager)
             VALUES ($1, $2, true)
             ON CONFLICT (project_id, user_id) DO UPDATE SET is_manager = true",
        )
        .bind(project_id)
        .bind(user_id)
        .execute(&mut *conn)
        .await?;

        tracing::info!(
            company_id,
            project_id,
            user_id,
            previous_manager = ?current,
            "Assigned project manager"
        );
        Ok(())
    }

    /// Remove the project's manager from the project.
    ///
    /// Returns `false` when the project had no manager.
    pub async fn remove_manager(
        pool: &PgPool,
        company_id: DbId,
        project_id: DbId,
    ) -> RepoResult<bool> {
        let mut tx = pool.begin().await?;
        Self::lock_project(&mut *tx, company_id, project_id).await?;

        let result =
            sqlx::query("DELETE FROM project_members WHERE project_id = $1 AND is_manager")
                .bind(project_id)
                .execute(&mut *tx)
                .await?;
        tx.commit().await?;

        let removed = result.rows_affected() > 0;
        if removed {
            tracing::info!(company_id, project_id, "Removed project manager");
        }
        Ok(removed)
    }

    /// Add a company user to the project as an ordinary member.
    ///
    /// Idempotent: returns `false` when the user already was a member.
    pub async fn add_member(
        pool: &PgPool,
        company_id: DbId,
        user_id: DbId,
        project_id: DbId,
    ) -> RepoResult<bool> {
        let mut tx = pool.begin().await?;
        Self::lock_project(&mut *tx, company_id, project_id).await?;

        let in_company = UserRepo::ids_in_company(&mut *tx, company_id, &[user_id]).await?;
        validate_selection(&[user_id], &in_company)?;

        let result = sqlx::query(
            "INSERT INTO project_members (project_id, user_id) VALUES ($1, $2)
             ON CONFLICT (project_id, user_id) DO NOTHING",
        )
        .bind(project_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        Ok(result.rows_affected() > 0)
    }

    /// Remove a user from the project, whatever their membership kind.
    ///
    /// Idempotent: returns `false` when the user was not a member.
    pub async fn remove_member(
        pool: &PgPool,
        company_id: DbId,
        user_id: DbId,
        project_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM project_members pm
             USING projects p
             WHERE pm.project_id = p.id
               AND pm.project_id = $1 AND pm.user_id = $2 AND p.company_id = $3",
        )
        .bind(project_id)
        .bind(user_id)
        .bind(company_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Replace the project's ordinary members with exactly `selected`.
    ///
    /// All-or-nothing: every selected user must belong to the company, the
    /// manager is left in place, and the removals and additions commit
    /// together. Returns the applied plan.
    pub async fn replace_members(
        pool: &PgPool,
        company_id: DbId,
        project_id: DbId,
        selected: &[DbId],
    ) -> RepoResult<MembershipPlan> {
        let mut tx = pool.begin().await?;
        Self::lock_project(&mut *tx, company_id, project_id).await?;

        let in_company = UserRepo::ids_in_company(&mut *tx, company_id, selected).await?;
        validate_selection(selected, &in_company)?;

        let rows: Vec<(DbId, bool)> = sqlx::query_as(
            "SELECT user_id, is_manager FROM project_members WHERE project_id = $1",
        )
        .bind(project_id)
        .fetch_all(&mut *tx)
        .await?;
        let manager = rows.iter().find(|(_, is_manager)| *is_manager).map(|(id, _)| *id);
        let current: Vec<DbId> = rows
            .iter()
            .filter(|(_, is_manager)| !*is_manager)
            .map(|(id, _)| *id)
            .collect();

        let plan = plan_member_replacement(&current, selected, manager);

        if !plan.to_remove.is_empty() {
            sqlx::query(
                "DELETE FROM project_members
                 WHERE project_id = $1 AND user_id = ANY($2) AND NOT is_manager",
            )
            .bind(project_id)
            .bind(&plan.to_remove)
            .execute(&mut *tx)
            .await?;
        }

        if !plan.to_add.is_empty() {
            sqlx::query(
                "INSERT INTO project_members (project_id, user_id)
                 SELECT $1, UNNEST($2::bigint[])
                 ON CONFLICT (project_id, user_id) DO NOTHING",
            )
            .bind(project_id)
            .bind(&plan.to_add)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        tracing::info!(
            company_id,
            project_id,
            removed = plan.to_remove.len(),
            added = plan.to_add.len(),
            "Replaced project members"
        );
        Ok(plan)
    }

    /// Lock the project row for the rest of the transaction, or fail with
    /// `NotFound` when it is not in the company.
    async fn lock_project(
        conn: &mut PgConnection,
        company_id: DbId,
        project_id: DbId,
    ) -> RepoResult<()> {
        let found: Option<DbId> = sqlx::query_scalar(
            "SELECT id FROM projects WHERE id = $1 AND company_id = $2 FOR UPDATE",
        )
        .bind(project_id)
        .bind(company_id)
        .fetch_optional(conn)
        .await?;

        match found {
            Some(_) => Ok(()),
            None => Err(RepoError::Core(CoreError::NotFound {
                entity: "Project",
                id: project_id,
            })),
        }
    }
}
