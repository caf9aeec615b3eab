//! Repository for the `tickets` and `ticket_comments` tables.
//!
//! Tickets have no company column; tenancy is enforced through the owning
//! project.

use bugtracker_core::error::CoreError;
use bugtracker_core::membership::validate_selection;
use bugtracker_core::types::DbId;
use sqlx::PgPool;

use crate::error::{RepoError, RepoResult};
use crate::models::ticket::{CreateTicket, Ticket, TicketComment, TicketWithLookups};
use crate::repositories::user_repo::UserRepo;

pub(crate) const COLUMNS: &str = "id, project_id, title, description, ticket_type_id, \
    ticket_priority_id, ticket_status_id, owner_user_id, developer_user_id, archived, \
    archived_by_project, created_at, updated_at";

/// Ticket columns qualified with `t` plus the resolved lookup names.
pub(crate) const WITH_LOOKUPS: &str = "t.id, t.project_id, t.title, t.description, \
    t.ticket_type_id, t.ticket_priority_id, t.ticket_status_id, t.owner_user_id, \
    t.developer_user_id, t.archived, t.archived_by_project, t.created_at, t.updated_at, \
    s.name AS status_name, pr.name AS priority_name, ty.name AS type_name";

/// Joins needed by [`WITH_LOOKUPS`].
pub(crate) const LOOKUP_JOINS: &str = "JOIN projects p ON p.id = t.project_id
     JOIN ticket_statuses s ON s.id = t.ticket_status_id
     JOIN ticket_priorities pr ON pr.id = t.ticket_priority_id
     JOIN ticket_types ty ON ty.id = t.ticket_type_id";

pub(crate) const COMMENT_COLUMNS: &str = "id, ticket_id, user_id, comment, created_at";

/// Provides create and read operations for tickets and their comments.
pub struct TicketRepo;

impl TicketRepo {
    /// Insert a ticket into a project of the company.
    ///
    /// The project, the owner and the optional developer must all belong to
    /// `company_id`.
    pub async fn create(
        pool: &PgPool,
        company_id: DbId,
        input: &CreateTicket,
    ) -> RepoResult<Ticket> {
        let mut tx = pool.begin().await?;

        let project: Option<DbId> = sqlx::query_scalar(
            "SELECT id FROM projects WHERE id = $1 AND company_id = $2",
        )
        .bind(input.project_id)
        .bind(company_id)
        .fetch_optional(&mut *tx)
        .await?;
        if project.is_none() {
            return Err(RepoError::Core(CoreError::NotFound {
                entity: "Project",
                id: input.project_id,
            }));
        }

        let mut users = vec![input.owner_user_id];
        users.extend(input.developer_user_id);
        let in_company = UserRepo::ids_in_company(&mut *tx, company_id, &users).await?;
        validate_selection(&users, &in_company)?;

        let query = format!(
            "INSERT INTO tickets
                (project_id, title, description, ticket_type_id, ticket_priority_id,
                 ticket_status_id, owner_user_id, developer_user_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {COLUMNS}"
        );
        let ticket = sqlx::query_as::<_, Ticket>(&query)
            .bind(input.project_id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(input.ticket_type_id)
            .bind(input.ticket_priority_id)
            .bind(input.ticket_status_id)
            .bind(input.owner_user_id)
            .bind(input.developer_user_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(
            company_id,
            project_id = input.project_id,
            ticket_id = ticket.id,
            "Created ticket"
        );
        Ok(ticket)
    }

    /// Find a ticket by id within a company, with lookup names resolved.
    pub async fn find_by_id(
        pool: &PgPool,
        company_id: DbId,
        id: DbId,
    ) -> Result<Option<TicketWithLookups>, sqlx::Error> {
        let query = format!(
            "SELECT {WITH_LOOKUPS} FROM tickets t {LOOKUP_JOINS}
             WHERE t.id = $1 AND p.company_id = $2"
        );
        sqlx::query_as::<_, TicketWithLookups>(&query)
            .bind(id)
            .bind(company_id)
            .fetch_optional(pool)
            .await
    }

    /// Every ticket of the company's projects, archived projects included.
    pub async fn list_by_company(
        pool: &PgPool,
        company_id: DbId,
    ) -> Result<Vec<TicketWithLookups>, sqlx::Error> {
        let query = format!(
            "SELECT {WITH_LOOKUPS} FROM tickets t {LOOKUP_JOINS}
             WHERE p.company_id = $1
             ORDER BY t.created_at DESC, t.id DESC"
        );
        sqlx::query_as::<_, TicketWithLookups>(&query)
            .bind(company_id)
            .fetch_all(pool)
            .await
    }

    /// Tickets of the given projects in one query.
    pub async fn list_by_projects(
        pool: &PgPool,
        company_id: DbId,
        project_ids: &[DbId],
    ) -> Result<Vec<TicketWithLookups>, sqlx::Error> {
        let query = format!(
            "SELECT {WITH_LOOKUPS} FROM tickets t {LOOKUP_JOINS}
             WHERE t.project_id = ANY($1) AND p.company_id = $2
             ORDER BY t.project_id, t.created_at DESC, t.id DESC"
        );
        sqlx::query_as::<_, TicketWithLookups>(&query)
            .bind(project_ids)
            .bind(company_id)
            .fetch_all(pool)
            .await
    }

    /// Add a comment by a company user to a company ticket.
    pub async fn add_comment(
        pool: &PgPool,
        company_id: DbId,
        ticket_id: DbId,
        user_id: DbId,
        comment: &str,
    ) -> RepoResult<TicketComment> {
        if comment.trim().is_empty() {
            return Err(RepoError::Core(CoreError::Validation(
                "Comment must not be empty".into(),
            )));
        }

        let query = format!(
            "INSERT INTO ticket_comments (ticket_id, user_id, comment)
             SELECT t.id, u.id, $4
             FROM tickets t
             JOIN projects p ON p.id = t.project_id
             JOIN users u ON u.id = $3 AND u.company_id = p.company_id
             WHERE t.id = $1 AND p.company_id = $2
             RETURNING {COMMENT_COLUMNS}"
        );
        let created = sqlx::query_as::<_, TicketComment>(&query)
            .bind(ticket_id)
            .bind(company_id)
            .bind(user_id)
            .bind(comment)
            .fetch_optional(pool)
            .await?;

        created.ok_or(RepoError::Core(CoreError::NotFound {
            entity: "Ticket",
            id: ticket_id,
        }))
    }

    /// Comments of the given tickets in one query, oldest first.
    pub async fn comments_for_tickets(
        pool: &PgPool,
        ticket_ids: &[DbId],
    ) -> Result<Vec<TicketComment>, sqlx::Error> {
        let query = format!(
            "SELECT {COMMENT_COLUMNS} FROM ticket_comments
             WHERE ticket_id = ANY($1)
             ORDER BY ticket_id, created_at, id"
        );
        sqlx::query_as::<_, TicketComment>(&query)
            .bind(ticket_ids)
            .fetch_all(pool)
            .await
    }
}
