//! Ticket and ticket comment models.

use bugtracker_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `tickets` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Ticket {
    pub id: DbId,
    pub project_id: DbId,
    pub title: String,
    pub description: Option<String>,
    pub ticket_type_id: DbId,
    pub ticket_priority_id: DbId,
    pub ticket_status_id: DbId,
    pub owner_user_id: DbId,
    pub developer_user_id: Option<DbId>,
    pub archived: bool,
    /// Set when the owning project is archived, cleared on restore.
    pub archived_by_project: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a ticket.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTicket {
    pub project_id: DbId,
    pub title: String,
    pub description: Option<String>,
    pub ticket_type_id: DbId,
    pub ticket_priority_id: DbId,
    pub ticket_status_id: DbId,
    pub owner_user_id: DbId,
    pub developer_user_id: Option<DbId>,
}

/// A ticket with its status, priority and type names resolved.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TicketWithLookups {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub ticket: Ticket,
    pub status_name: String,
    pub priority_name: String,
    pub type_name: String,
}

/// A row from the `ticket_comments` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TicketComment {
    pub id: DbId,
    pub ticket_id: DbId,
    pub user_id: DbId,
    pub comment: String,
    pub created_at: Timestamp,
}

/// A ticket with lookups and comments, as shown in project overviews.
#[derive(Debug, Clone, Serialize)]
pub struct TicketDetail {
    #[serde(flatten)]
    pub ticket: TicketWithLookups,
    pub comments: Vec<TicketComment>,
}
