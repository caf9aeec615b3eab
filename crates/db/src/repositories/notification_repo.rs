//! Repository for the `notifications` table.

use bugtracker_core::error::CoreError;
use bugtracker_core::membership::validate_selection;
use bugtracker_core::types::DbId;
use sqlx::PgPool;

use crate::error::{RepoError, RepoResult};
use crate::models::notification::{CreateNotification, Notification, NotificationDetail};
use crate::repositories::user_repo::UserRepo;

const COLUMNS: &str =
    "id, company_id, ticket_id, title, message, sender_id, recipient_id, viewed, created_at";

/// Notification columns qualified with `n`, plus resolved names.
const DETAIL_SELECT: &str = "SELECT n.id, n.company_id, n.ticket_id, n.title, n.message,
        n.sender_id, n.recipient_id, n.viewed, n.created_at,
        s.first_name || ' ' || s.last_name AS sender_name, s.email AS sender_email,
        r.first_name || ' ' || r.last_name AS recipient_name, r.email AS recipient_email,
        t.title AS ticket_title, p.id AS project_id, p.name AS project_name
     FROM notifications n
     JOIN users s ON s.id = n.sender_id
     JOIN users r ON r.id = n.recipient_id
     LEFT JOIN tickets t ON t.id = n.ticket_id
     LEFT JOIN projects p ON p.id = t.project_id";

/// Provides create and read operations for notifications.
pub struct NotificationRepo;

impl NotificationRepo {
    /// Record a notification inside a company.
    ///
    /// Sender and recipient must be company users; a referenced ticket must
    /// belong to one of the company's projects.
    pub async fn create(
        pool: &PgPool,
        company_id: DbId,
        input: &CreateNotification,
    ) -> RepoResult<Notification> {
        let mut conn = pool.acquire().await?;

        let parties = [input.sender_id, input.recipient_id];
        let in_company = UserRepo::ids_in_company(&mut *conn, company_id, &parties).await?;
        validate_selection(&parties, &in_company)?;

        if let Some(ticket_id) = input.ticket_id {
            let found: bool = sqlx::query_scalar(
                "SELECT EXISTS (
                     SELECT 1 FROM tickets t JOIN projects p ON p.id = t.project_id
                     WHERE t.id = $1 AND p.company_id = $2
                 )",
            )
            .bind(ticket_id)
            .bind(company_id)
            .fetch_one(&mut *conn)
            .await?;
            if !found {
                return Err(RepoError::Core(CoreError::Validation(format!(
                    "Ticket {ticket_id} is not part of this company"
                ))));
            }
        }

        let query = format!(
            "INSERT INTO notifications (company_id, ticket_id, title, message, sender_id, recipient_id)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        let notification = sqlx::query_as::<_, Notification>(&query)
            .bind(company_id)
            .bind(input.ticket_id)
            .bind(&input.title)
            .bind(&input.message)
            .bind(input.sender_id)
            .bind(input.recipient_id)
            .fetch_one(&mut *conn)
            .await?;

        tracing::info!(
            company_id,
            notification_id = notification.id,
            sender_id = input.sender_id,
            recipient_id = input.recipient_id,
            "Created notification"
        );
        Ok(notification)
    }

    /// Find a notification by id within a company, with names resolved.
    pub async fn find_by_id(
        pool: &PgPool,
        company_id: DbId,
        id: DbId,
    ) -> Result<Option<NotificationDetail>, sqlx::Error> {
        let query = format!("{DETAIL_SELECT} WHERE n.id = $1 AND n.company_id = $2");
        sqlx::query_as::<_, NotificationDetail>(&query)
            .bind(id)
            .bind(company_id)
            .fetch_optional(pool)
            .await
    }

    /// Notifications addressed to the user, newest first.
    pub async fn list_received(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<NotificationDetail>, sqlx::Error> {
        Self::list_where(pool, "n.recipient_id = $1", user_id).await
    }

    /// Notifications sent by the user, newest first.
    pub async fn list_sent(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<NotificationDetail>, sqlx::Error> {
        Self::list_where(pool, "n.sender_id = $1", user_id).await
    }

    async fn list_where(
        pool: &PgPool,
        condition: &str,
        user_id: DbId,
    ) -> Result<Vec<NotificationDetail>, sqlx::Error> {
        let query =
            format!("{DETAIL_SELECT} WHERE {condition} ORDER BY n.created_at DESC, n.id DESC");
        sqlx::query_as::<_, NotificationDetail>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }
}
