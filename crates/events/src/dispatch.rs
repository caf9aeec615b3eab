//! Email dispatch for stored notifications.
//!
//! The dispatcher never writes notifications; it only renders an already
//! persisted one into an [`EmailMessage`] and hands it to the configured
//! [`EmailSender`].

use std::sync::Arc;

use bugtracker_core::email::{EmailMessage, EmailSender};
use bugtracker_core::error::CoreError;
use bugtracker_core::roles::Role;
use bugtracker_core::types::DbId;
use bugtracker_db::models::notification::NotificationDetail;
use bugtracker_db::models::user::User;
use bugtracker_db::repositories::RoleRepo;
use sqlx::PgPool;

/// Sends notification emails through a pluggable [`EmailSender`].
#[derive(Clone)]
pub struct NotificationDispatcher {
    sender: Arc<dyn EmailSender>,
}

impl NotificationDispatcher {
    pub fn new(sender: Arc<dyn EmailSender>) -> Self {
        Self { sender }
    }

    /// Email a notification to its recipient.
    ///
    /// Returns `Ok(true)` once the message is handed off and `Ok(false)` when
    /// delivery failed for a recoverable reason (logged). An unconfigured
    /// sender fails with [`CoreError::NotImplemented`].
    pub async fn send_email_notification(
        &self,
        notification: &NotificationDetail,
        subject: &str,
    ) -> Result<bool, CoreError> {
        let message = compose(notification, &notification.recipient_email, subject);
        self.deliver(notification.notification.id, message).await
    }

    /// Email a notification to every company user holding `role`.
    ///
    /// Returns how many messages were handed off.
    pub async fn send_by_role(
        &self,
        pool: &PgPool,
        notification: &NotificationDetail,
        company_id: DbId,
        role: Role,
    ) -> Result<usize, CoreError> {
        let users = RoleRepo::users_in_role(pool, role, company_id)
            .await
            .map_err(|e| CoreError::Internal(format!("Failed to load users in role: {e}")))?;
        tracing::debug!(
            notification_id = notification.notification.id,
            company_id,
            role = %role,
            recipients = users.len(),
            "Dispatching notification by role"
        );
        self.send_to_members(notification, &users).await
    }

    /// Email a notification to each of `members`.
    ///
    /// Returns how many messages were handed off. Stops at the first
    /// [`CoreError::NotImplemented`].
    pub async fn send_to_members(
        &self,
        notification: &NotificationDetail,
        members: &[User],
    ) -> Result<usize, CoreError> {
        let subject = notification.notification.title.clone();
        let mut sent = 0;
        for member in members {
            let message = compose(notification, &member.email, &subject);
            if self.deliver(notification.notification.id, message).await? {
                sent += 1;
            }
        }
        Ok(sent)
    }

    async fn deliver(
        &self,
        notification_id: DbId,
        message: EmailMessage,
    ) -> Result<bool, CoreError> {
        match self.sender.send(&message).await {
            Ok(()) => Ok(true),
            Err(err @ CoreError::NotImplemented(_)) => Err(err),
            Err(err) => {
                tracing::error!(
                    notification_id,
                    to = %message.to,
                    error = %err,
                    "Failed to send notification email"
                );
                Ok(false)
            }
        }
    }
}

/// Render a notification as a plain-text email.
fn compose(notification: &NotificationDetail, to: &str, subject: &str) -> EmailMessage {
    let mut body = format!(
        "{}\n\nFrom: {} <{}>\n",
        notification.notification.message, notification.sender_name, notification.sender_email
    );
    if let Some(project) = &notification.project_name {
        body.push_str(&format!("Project: {project}\n"));
    }
    if let Some(ticket) = &notification.ticket_title {
        body.push_str(&format!("Ticket: {ticket}\n"));
    }
    EmailMessage::new(to, subject, body)
}
