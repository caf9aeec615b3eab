//! Project entity model, DTOs and read-side aggregates.

use bugtracker_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::lookup::LookupEntry;
use crate::models::ticket::TicketDetail;
use crate::models::user::User;

/// A project row from the `projects` table, without the image bytes.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Project {
    pub id: DbId,
    pub company_id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub start_date: Option<Timestamp>,
    pub end_date: Option<Timestamp>,
    pub project_priority_id: Option<DbId>,
    pub image_file_name: Option<String>,
    pub image_content_type: Option<String>,
    pub archived: bool,
    /// Optimistic concurrency token, incremented on every update.
    pub row_version: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a new project. The company comes from the tenant context.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateProject {
    pub name: String,
    pub description: Option<String>,
    pub start_date: Option<Timestamp>,
    pub end_date: Option<Timestamp>,
    pub project_priority_id: Option<DbId>,
}

/// DTO for editing a project.
///
/// All editable fields are replaced. `row_version` must be the version the
/// caller loaded.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateProject {
    pub name: String,
    pub description: Option<String>,
    pub start_date: Option<Timestamp>,
    pub end_date: Option<Timestamp>,
    pub project_priority_id: Option<DbId>,
    pub row_version: i32,
}

/// Stored project image.
#[derive(Debug, Clone, FromRow)]
pub struct ProjectImage {
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// A project with its manager and ordinary members.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectDetail {
    #[serde(flatten)]
    pub project: Project,
    pub manager: Option<User>,
    pub members: Vec<User>,
}

/// A project with every nested aggregate the company-wide views need.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectOverview {
    #[serde(flatten)]
    pub project: Project,
    pub priority: Option<LookupEntry>,
    pub manager_id: Option<DbId>,
    pub members: Vec<User>,
    pub tickets: Vec<TicketDetail>,
}
