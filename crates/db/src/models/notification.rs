//! Notification entity model and DTOs.
//!
//! Notifications are immutable once written.

use bugtracker_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `notifications` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Notification {
    pub id: DbId,
    pub company_id: DbId,
    pub ticket_id: Option<DbId>,
    pub title: String,
    pub message: String,
    pub sender_id: DbId,
    pub recipient_id: DbId,
    pub viewed: bool,
    pub created_at: Timestamp,
}

/// DTO for creating a notification. The company comes from the tenant context.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateNotification {
    pub ticket_id: Option<DbId>,
    pub title: String,
    pub message: String,
    pub sender_id: DbId,
    pub recipient_id: DbId,
}

/// A notification with sender, recipient, ticket and project resolved.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct NotificationDetail {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub notification: Notification,
    pub sender_name: String,
    pub sender_email: String,
    pub recipient_name: String,
    pub recipient_email: String,
    pub ticket_title: Option<String>,
    pub project_id: Option<DbId>,
    pub project_name: Option<String>,
}
