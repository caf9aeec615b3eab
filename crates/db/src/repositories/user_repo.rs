//! Repository for the `users` table.

use bugtracker_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::user::{CreateUser, User};

/// Column list shared across queries to avoid repetition.
pub(crate) const COLUMNS: &str =
    "id, company_id, first_name, last_name, email, created_at, updated_at";

/// Same columns qualified with the `u` alias, for joins.
pub(crate) const U_COLUMNS: &str =
    "u.id, u.company_id, u.first_name, u.last_name, u.email, u.created_at, u.updated_at";

/// Provides CRUD operations for users.
pub struct UserRepo;

impl UserRepo {
    /// Insert a new user, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateUser) -> Result<User, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (company_id, first_name, last_name, email)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(input.company_id)
            .bind(&input.first_name)
            .bind(&input.last_name)
            .bind(&input.email)
            .fetch_one(pool)
            .await
    }

    /// Find a user by id within a company.
    pub async fn find_in_company(
        pool: &PgPool,
        company_id: DbId,
        id: DbId,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1 AND company_id = $2");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(company_id)
            .fetch_optional(pool)
            .await
    }

    /// List a company's users ordered by last name, first name.
    pub async fn list_by_company(pool: &PgPool, company_id: DbId) -> Result<Vec<User>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM users WHERE company_id = $1 ORDER BY last_name, first_name, id"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(company_id)
            .fetch_all(pool)
            .await
    }

    /// Subset of `ids` that belong to the company. Usable inside a transaction.
    pub(crate) async fn ids_in_company(
        conn: &mut PgConnection,
        company_id: DbId,
        ids: &[DbId],
    ) -> Result<Vec<DbId>, sqlx::Error> {
        sqlx::query_scalar("SELECT id FROM users WHERE company_id = $1 AND id = ANY($2)")
            .bind(company_id)
            .bind(ids)
            .fetch_all(conn)
            .await
    }

    /// Find a user by id regardless of company and share-lock the row, so
    /// their roles cannot be replaced until the transaction ends.
    ///
    /// Only for validation paths that must distinguish "wrong company" from
    /// "no such user"; never return the row to a caller from another tenant.
    pub(crate) async fn find_any_for_share(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1 FOR SHARE");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Lock a company member's row for the rest of the transaction.
    ///
    /// Returns `false` when the user is absent or belongs to another company.
    pub(crate) async fn lock_in_company(
        conn: &mut PgConnection,
        company_id: DbId,
        id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let found: Option<DbId> =
            sqlx::query_scalar("SELECT id FROM users WHERE id = $1 AND company_id = $2 FOR UPDATE")
                .bind(id)
                .bind(company_id)
                .fetch_optional(conn)
                .await?;
        Ok(found.is_some())
    }
}
