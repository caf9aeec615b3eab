//! Handlers for the `/notifications` resource.

use axum::extract::{Path, State};
use axum::response::Redirect;
use axum::Json;
use bugtracker_core::error::CoreError;
use bugtracker_core::roles::Role;
use bugtracker_core::types::DbId;
use bugtracker_db::models::notification::{CreateNotification, NotificationDetail};
use bugtracker_db::repositories::{NotificationRepo, ProjectRepo};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{api_path, empty_string_as_none, not_found};
use crate::error::AppResult;
use crate::middleware::form::FormData;
use crate::middleware::rbac::RequireTenant;
use crate::response::DataResponse;
use crate::state::AppState;

/// New notification form. The sender is always the caller.
#[derive(Debug, Deserialize, Validate)]
pub struct NotificationForm {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub ticket_id: Option<DbId>,
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,
    #[validate(length(min = 1, max = 2000, message = "Message must be 1-2000 characters"))]
    pub message: String,
    /// An unselected recipient arrives as `recipient_id=`.
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub recipient_id: Option<DbId>,
}

/// Who an email for a stored notification goes to. With neither field set
/// the notification's recipient is emailed.
#[derive(Debug, Default, Deserialize)]
pub struct EmailForm {
    /// Every member of this project.
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub project_id: Option<DbId>,
    /// Every company user holding this role.
    #[serde(default)]
    pub role: Option<Role>,
}

#[derive(Debug, Serialize)]
pub struct EmailOutcome {
    /// Messages handed off to the mail relay.
    pub delivered: usize,
}

/// GET /api/v1/notifications/received
pub async fn received(
    State(state): State<AppState>,
    RequireTenant(tenant): RequireTenant,
) -> AppResult<Json<DataResponse<Vec<NotificationDetail>>>> {
    let notifications = NotificationRepo::list_received(&state.pool, tenant.user_id).await?;
    Ok(Json(DataResponse {
        data: notifications,
    }))
}

/// GET /api/v1/notifications/sent
pub async fn sent(
    State(state): State<AppState>,
    RequireTenant(tenant): RequireTenant,
) -> AppResult<Json<DataResponse<Vec<NotificationDetail>>>> {
    let notifications = NotificationRepo::list_sent(&state.pool, tenant.user_id).await?;
    Ok(Json(DataResponse {
        data: notifications,
    }))
}

/// POST /api/v1/notifications
///
/// There is no form view for notifications, so a rejected submission
/// answers 400 with the usual JSON error body instead of redirecting.
pub async fn create(
    State(state): State<AppState>,
    RequireTenant(tenant): RequireTenant,
    FormData(form): FormData<NotificationForm>,
) -> AppResult<Redirect> {
    form.validate()?;
    let recipient_id = form
        .recipient_id
        .ok_or_else(|| CoreError::Validation("Select a recipient".into()))?;
    let input = CreateNotification {
        ticket_id: form.ticket_id,
        title: form.title.trim().to_string(),
        message: form.message,
        sender_id: tenant.user_id,
        recipient_id,
    };
    let notification = NotificationRepo::create(&state.pool, tenant.company_id, &input).await?;
    tracing::info!(
        notification_id = notification.id,
        sender_id = tenant.user_id,
        recipient_id = notification.recipient_id,
        "Notification sent"
    );
    Ok(Redirect::to(&api_path("/notifications/sent")))
}

/// POST /api/v1/notifications/{id}/email
///
/// Only the sender may email a notification. Answers 501 when no mail relay
/// is configured.
pub async fn email(
    State(state): State<AppState>,
    RequireTenant(tenant): RequireTenant,
    Path(id): Path<DbId>,
    FormData(form): FormData<EmailForm>,
) -> AppResult<Json<DataResponse<EmailOutcome>>> {
    let detail = NotificationRepo::find_by_id(&state.pool, tenant.company_id, id)
        .await?
        .ok_or_else(|| not_found("Notification", id))?;
    if detail.notification.sender_id != tenant.user_id {
        return Err(CoreError::Forbidden(
            "Only the sender can email this notification".into(),
        )
        .into());
    }

    let dispatcher = &state.dispatcher;
    let delivered = match (form.project_id, form.role) {
        (Some(project_id), _) => {
            let members = ProjectRepo::members(&state.pool, tenant.company_id, project_id).await?;
            if members.is_empty()
                && !ProjectRepo::exists(&state.pool, tenant.company_id, project_id).await?
            {
                return Err(not_found("Project", project_id));
            }
            dispatcher.send_to_members(&detail, &members).await?
        }
        (None, Some(role)) => {
            dispatcher
                .send_by_role(&state.pool, &detail, tenant.company_id, role)
                .await?
        }
        (None, None) => {
            let subject = detail.notification.title.clone();
            usize::from(dispatcher.send_email_notification(&detail, &subject).await?)
        }
    };

    Ok(Json(DataResponse {
        data: EmailOutcome { delivered },
    }))
}
