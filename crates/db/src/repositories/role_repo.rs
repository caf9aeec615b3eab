//! Repository for the `user_roles` table.

use std::collections::HashMap;

use bugtracker_core::error::CoreError;
use bugtracker_core::roles::Role;
use bugtracker_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::error::{RepoError, RepoResult};
use crate::models::user::User;
use crate::repositories::user_repo::{UserRepo, U_COLUMNS};

/// Provides role lookups and role assignment.
pub struct RoleRepo;

impl RoleRepo {
    /// All users of a company holding `role`, ordered by name.
    ///
    /// Returns an empty list when nobody matches.
    pub async fn users_in_role(
        pool: &PgPool,
        role: Role,
        company_id: DbId,
    ) -> Result<Vec<User>, sqlx::Error> {
        let query = format!(
            "SELECT {U_COLUMNS} FROM users u
             JOIN user_roles r ON r.user_id = u.id
             WHERE r.role = $1 AND u.company_id = $2
             ORDER BY u.last_name, u.first_name, u.id"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(role.as_str())
            .bind(company_id)
            .fetch_all(pool)
            .await
    }

    /// Users of a company holding any of `roles`, each listed once.
    pub async fn users_in_any_role(
        pool: &PgPool,
        roles: &[Role],
        company_id: DbId,
    ) -> Result<Vec<User>, sqlx::Error> {
        let names: Vec<&str> = roles.iter().map(|r| r.as_str()).collect();
        let query = format!(
            "SELECT DISTINCT {U_COLUMNS} FROM users u
             JOIN user_roles r ON r.user_id = u.id
             WHERE r.role = ANY($1) AND u.company_id = $2
             ORDER BY u.last_name, u.first_name, u.id"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(names)
            .bind(company_id)
            .fetch_all(pool)
            .await
    }

    /// Roles held by a user.
    pub async fn roles_for_user(pool: &PgPool, user_id: DbId) -> RepoResult<Vec<Role>> {
        let mut conn = pool.acquire().await?;
        Self::roles_for_user_inner(&mut *conn, user_id).await
    }

    pub(crate) async fn roles_for_user_inner(
        conn: &mut PgConnection,
        user_id: DbId,
    ) -> RepoResult<Vec<Role>> {
        let names: Vec<String> =
            sqlx::query_scalar("SELECT role FROM user_roles WHERE user_id = $1 ORDER BY role")
                .bind(user_id)
                .fetch_all(conn)
                .await?;
        names.iter().map(|name| parse_role(name)).collect()
    }

    /// Roles for many users in one query, keyed by user id.
    ///
    /// Users without roles are absent from the map.
    pub async fn roles_for_users(
        pool: &PgPool,
        user_ids: &[DbId],
    ) -> RepoResult<HashMap<DbId, Vec<Role>>> {
        let rows: Vec<(DbId, String)> = sqlx::query_as(
            "SELECT user_id, role FROM user_roles WHERE user_id = ANY($1) ORDER BY user_id, role",
        )
        .bind(user_ids)
        .fetch_all(pool)
        .await?;

        let mut by_user: HashMap<DbId, Vec<Role>> = HashMap::new();
        for (user_id, name) in rows {
            by_user.entry(user_id).or_default().push(parse_role(&name)?);
        }
        Ok(by_user)
    }

    /// Grant a role. Granting a role the user already holds is a no-op.
    pub async fn add_role(pool: &PgPool, user_id: DbId, role: Role) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO user_roles (user_id, role) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(user_id)
        .bind(role.as_str())
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Replace a company member's roles with exactly `roles`.
    ///
    /// Runs in one transaction. Dropping the project-manager role also
    /// removes the user from every project they manage, leaving those
    /// projects unassigned. A user outside the company is reported as not
    /// found.
    pub async fn set_roles(
        pool: &PgPool,
        company_id: DbId,
        user_id: DbId,
        roles: &[Role],
    ) -> RepoResult<Vec<Role>> {
        let mut tx = pool.begin().await?;

        let in_company = UserRepo::lock_in_company(&mut *tx, company_id, user_id).await?;
        if !in_company {
            return Err(RepoError::Core(CoreError::NotFound {
                entity: "User",
                id: user_id,
            }));
        }

        sqlx::query("DELETE FROM user_roles WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        let mut names: Vec<&str> = roles.iter().map(|r| r.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        sqlx::query("INSERT INTO user_roles (user_id, role) SELECT $1, UNNEST($2::text[])")
            .bind(user_id)
            .bind(&names)
            .execute(&mut *tx)
            .await?;

        let stored = Self::roles_for_user_inner(&mut *tx, user_id).await?;

        // Only project managers may manage a project.
        let mut unassigned = 0;
        if !stored.contains(&Role::ProjectManager) {
            unassigned = sqlx::query(
                "DELETE FROM project_members WHERE user_id = $1 AND is_manager",
            )
            .bind(user_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        }
        tx.commit().await?;

        tracing::info!(
            company_id,
            user_id,
            roles = ?stored,
            unassigned_projects = unassigned,
            "Replaced user roles"
        );
        Ok(stored)
    }
}

fn parse_role(name: &str) -> RepoResult<Role> {
    name.parse::<Role>()
        .map_err(|_| RepoError::Core(CoreError::Internal(format!("Unknown stored role '{name}'"))))
}
