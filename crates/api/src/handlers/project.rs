//! Handlers for the `/projects` resource.
//!
//! Create and edit arrive as multipart forms because of the optional image;
//! the membership forms are url-encoded.

use axum::extract::{Multipart, Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Redirect};
use axum::Json;
use bugtracker_core::error::CoreError;
use bugtracker_core::history::TicketHistoryEntry;
use bugtracker_core::roles::{Role, MEMBER_ROLES};
use bugtracker_core::tenant::TenantContext;
use bugtracker_core::types::{DbId, Timestamp};
use bugtracker_core::upload::ImageUpload;
use bugtracker_db::error::RepoError;
use bugtracker_db::models::lookup::LookupEntry;
use bugtracker_db::models::project::{
    CreateProject, Project, ProjectDetail, ProjectOverview, UpdateProject,
};
use bugtracker_db::models::user::User;
use bugtracker_db::repositories::{CompanyInfoRepo, LookupRepo, ProjectRepo, RoleRepo};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use super::{empty_string_as_none, not_found, parse_id_list, redirect_after};
use crate::error::{AppError, AppResult};
use crate::middleware::form::FormData;
use crate::middleware::rbac::{RequireAdmin, RequireManager, RequireTenant};
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Forms and view models
// ---------------------------------------------------------------------------

/// Fields of the create/edit project form.
#[derive(Debug, Default, Validate)]
#[validate(schema(function = "validate_date_range"))]
pub struct ProjectForm {
    #[validate(length(min = 1, max = 100, message = "Project name must be 1-100 characters"))]
    pub name: String,
    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,
    pub start_date: Option<Timestamp>,
    pub end_date: Option<Timestamp>,
    pub project_priority_id: Option<DbId>,
    pub pm_id: Option<DbId>,
    /// Required on edit.
    pub row_version: Option<i32>,
    pub image: Option<ImageUpload>,
}

fn validate_date_range(form: &ProjectForm) -> Result<(), ValidationError> {
    match (form.start_date, form.end_date) {
        (Some(start), Some(end)) if end < start => {
            let mut err = ValidationError::new("date_range");
            err.message = Some("End date must not precede start date".into());
            Err(err)
        }
        _ => Ok(()),
    }
}

impl ProjectForm {
    fn to_create(&self) -> CreateProject {
        CreateProject {
            name: self.name.trim().to_string(),
            description: self.description.clone(),
            start_date: self.start_date,
            end_date: self.end_date,
            project_priority_id: self.project_priority_id,
        }
    }

    fn to_update(&self, row_version: i32) -> UpdateProject {
        UpdateProject {
            name: self.name.trim().to_string(),
            description: self.description.clone(),
            start_date: self.start_date,
            end_date: self.end_date,
            project_priority_id: self.project_priority_id,
            row_version,
        }
    }
}

/// Read a multipart project form. An empty file input means "no image".
async fn read_project_form(
    mut multipart: Multipart,
    max_image_bytes: usize,
) -> AppResult<ProjectForm> {
    let mut form = ProjectForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or("").to_string();
        if name == "image" {
            let file_name = field.file_name().unwrap_or("").to_string();
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(e.to_string()))?;
            if file_name.is_empty() && data.is_empty() {
                continue;
            }
            form.image = Some(ImageUpload::new(
                &file_name,
                &content_type,
                data.to_vec(),
                max_image_bytes,
            )?);
            continue;
        }

        let text = field
            .text()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        let value = text.trim();
        match name.as_str() {
            "name" => form.name = value.to_string(),
            "description" => form.description = (!value.is_empty()).then(|| value.to_string()),
            "start_date" => form.start_date = parse_date(value)?,
            "end_date" => form.end_date = parse_date(value)?,
            "project_priority_id" => form.project_priority_id = parse_number(&name, value)?,
            "pm_id" => form.pm_id = parse_number(&name, value)?,
            "row_version" => form.row_version = parse_number(&name, value)?,
            _ => {} // ignore unknown fields
        }
    }

    Ok(form)
}

/// Parse an RFC 3339 timestamp or a bare `YYYY-MM-DD` date (midnight UTC).
fn parse_date(value: &str) -> Result<Option<Timestamp>, CoreError> {
    if value.is_empty() {
        return Ok(None);
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(Some(ts.with_timezone(&Utc)));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(|date| Some(date.and_time(NaiveTime::MIN).and_utc()))
        .map_err(|_| CoreError::Validation(format!("Invalid date '{value}'")))
}

fn parse_number<T: std::str::FromStr>(field: &str, value: &str) -> Result<Option<T>, CoreError> {
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse()
        .map(Some)
        .map_err(|_| CoreError::Validation(format!("Invalid value for {field}: '{value}'")))
}

/// Project listing: the eager company view for Admin/PM, plain rows otherwise.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ProjectListing {
    Overview(Vec<ProjectOverview>),
    Basic(Vec<Project>),
}

/// Model behind the create and edit forms.
#[derive(Debug, Serialize)]
pub struct ProjectFormModel {
    /// `None` on the create form.
    pub project: Option<Project>,
    pub manager_id: Option<DbId>,
    pub pm_list: Vec<User>,
    pub priorities: Vec<LookupEntry>,
}

#[derive(Debug, Serialize)]
pub struct AssignPmModel {
    pub project: Project,
    pub manager: Option<User>,
    pub pm_list: Vec<User>,
}

/// Model behind the member selection form. `selected` holds the ids of the
/// current ordinary members.
#[derive(Debug, Serialize)]
pub struct MembersModel {
    pub project: Project,
    pub manager: Option<User>,
    pub users: Vec<User>,
    pub selected: Vec<DbId>,
}

#[derive(Debug, Deserialize)]
pub struct AssignPmForm {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub pm_id: Option<DbId>,
}

/// Member selection as a comma-separated id list. An absent field means the
/// form was submitted without a selection control.
#[derive(Debug, Deserialize)]
pub struct MembersForm {
    pub selected_users: Option<String>,
}

// ---------------------------------------------------------------------------
// Listings
// ---------------------------------------------------------------------------

/// GET /api/v1/projects/my
pub async fn my_projects(
    State(state): State<AppState>,
    RequireTenant(tenant): RequireTenant,
) -> AppResult<Json<DataResponse<Vec<Project>>>> {
    let projects = ProjectRepo::list_for_user(&state.pool, tenant.user_id).await?;
    Ok(Json(DataResponse { data: projects }))
}

/// GET /api/v1/projects/all
///
/// Admins and project managers get every project with members, tickets and
/// comments loaded; everyone else gets the plain rows.
pub async fn all_projects(
    State(state): State<AppState>,
    RequireTenant(tenant): RequireTenant,
) -> AppResult<Json<DataResponse<ProjectListing>>> {
    let listing = if tenant.is_elevated() {
        ProjectListing::Overview(
            CompanyInfoRepo::all_projects(&state.pool, tenant.company_id).await?,
        )
    } else {
        ProjectListing::Basic(ProjectRepo::list_by_company(&state.pool, tenant.company_id).await?)
    };
    Ok(Json(DataResponse { data: listing }))
}

/// GET /api/v1/projects/archived
pub async fn archived_projects(
    State(state): State<AppState>,
    RequireTenant(tenant): RequireTenant,
) -> AppResult<Json<DataResponse<Vec<Project>>>> {
    let projects = ProjectRepo::list_archived_by_company(&state.pool, tenant.company_id).await?;
    Ok(Json(DataResponse { data: projects }))
}

/// GET /api/v1/projects/unassigned
pub async fn unassigned_projects(
    State(state): State<AppState>,
    RequireAdmin(tenant): RequireAdmin,
) -> AppResult<Json<DataResponse<Vec<Project>>>> {
    let projects = ProjectRepo::list_unassigned(&state.pool, tenant.company_id).await?;
    Ok(Json(DataResponse { data: projects }))
}

// ---------------------------------------------------------------------------
// Create / read / edit
// ---------------------------------------------------------------------------

/// GET /api/v1/projects/create
pub async fn create_form(
    State(state): State<AppState>,
    RequireManager(tenant): RequireManager,
) -> AppResult<Json<DataResponse<ProjectFormModel>>> {
    let model = form_model(&state, &tenant, None).await?;
    Ok(Json(DataResponse { data: model }))
}

/// POST /api/v1/projects/create
pub async fn create(
    State(state): State<AppState>,
    RequireManager(tenant): RequireManager,
    multipart: Multipart,
) -> AppResult<Redirect> {
    let result = create_project(&state, &tenant, multipart).await;
    redirect_after(result, "/projects/create")
}

async fn create_project(
    state: &AppState,
    tenant: &TenantContext,
    multipart: Multipart,
) -> AppResult<String> {
    let form = read_project_form(multipart, state.config.max_image_bytes).await?;
    form.validate()?;

    let project = ProjectRepo::create_with_manager(
        &state.pool,
        tenant.company_id,
        &form.to_create(),
        form.image.as_ref(),
        form.pm_id,
    )
    .await?;

    tracing::info!(
        user_id = tenant.user_id,
        project_id = project.id,
        "Project created via form"
    );
    Ok(format!("/projects/{}", project.id))
}

/// GET /api/v1/projects/{id}
pub async fn detail(
    State(state): State<AppState>,
    RequireTenant(tenant): RequireTenant,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<ProjectDetail>>> {
    let detail = ProjectRepo::find_detail(&state.pool, tenant.company_id, id)
        .await?
        .ok_or_else(|| not_found("Project", id))?;
    Ok(Json(DataResponse { data: detail }))
}

/// GET /api/v1/projects/{id}/image
pub async fn image(
    State(state): State<AppState>,
    RequireTenant(tenant): RequireTenant,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let image = ProjectRepo::find_image(&state.pool, tenant.company_id, id)
        .await?
        .ok_or_else(|| not_found("ProjectImage", id))?;
    Ok(([(header::CONTENT_TYPE, image.content_type)], image.data))
}

/// GET /api/v1/projects/{id}/history
///
/// A project outside the company is 404; otherwise 501 until ticket history
/// is recorded.
pub async fn history(
    State(state): State<AppState>,
    RequireTenant(tenant): RequireTenant,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<TicketHistoryEntry>>>> {
    if !ProjectRepo::exists(&state.pool, tenant.company_id, id).await? {
        return Err(not_found("Project", id));
    }
    let entries = state.history.project_histories(tenant.company_id, id).await?;
    Ok(Json(DataResponse { data: entries }))
}

/// GET /api/v1/projects/{id}/edit
pub async fn edit_form(
    State(state): State<AppState>,
    RequireManager(tenant): RequireManager,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<ProjectFormModel>>> {
    let project = find_project(&state, &tenant, id).await?;
    let model = form_model(&state, &tenant, Some(project)).await?;
    Ok(Json(DataResponse { data: model }))
}

/// POST /api/v1/projects/{id}/edit
///
/// A stale `row_version` answers 409 when the project still exists and 404
/// when it is gone.
pub async fn edit(
    State(state): State<AppState>,
    RequireManager(tenant): RequireManager,
    Path(id): Path<DbId>,
    multipart: Multipart,
) -> AppResult<Redirect> {
    let result = edit_project(&state, &tenant, id, multipart).await;
    redirect_after(result, &format!("/projects/{id}/edit"))
}

async fn edit_project(
    state: &AppState,
    tenant: &TenantContext,
    id: DbId,
    multipart: Multipart,
) -> AppResult<String> {
    let form = read_project_form(multipart, state.config.max_image_bytes).await?;
    form.validate()?;
    let row_version = form
        .row_version
        .ok_or_else(|| CoreError::Validation("row_version is required".into()))?;

    let update = form.to_update(row_version);
    match ProjectRepo::update_with_manager(
        &state.pool,
        tenant.company_id,
        id,
        &update,
        form.image.as_ref(),
        form.pm_id,
    )
    .await
    {
        Ok(_) => {}
        Err(RepoError::Core(CoreError::Concurrency { entity, .. })) => {
            if !ProjectRepo::exists(&state.pool, tenant.company_id, id).await? {
                return Err(not_found("Project", id));
            }
            tracing::warn!(project_id = id, row_version, "Stale project edit rejected");
            return Err(CoreError::Concurrency { entity, id }.into());
        }
        Err(err) => return Err(err.into()),
    }
    Ok(format!("/projects/{id}"))
}

// ---------------------------------------------------------------------------
// Archive / restore
// ---------------------------------------------------------------------------

/// GET /api/v1/projects/{id}/archive
pub async fn archive_confirm(
    State(state): State<AppState>,
    RequireManager(tenant): RequireManager,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Project>>> {
    let project = find_project(&state, &tenant, id).await?;
    Ok(Json(DataResponse { data: project }))
}

/// POST /api/v1/projects/{id}/archive
pub async fn archive(
    State(state): State<AppState>,
    RequireManager(tenant): RequireManager,
    Path(id): Path<DbId>,
) -> AppResult<Redirect> {
    if !ProjectRepo::archive(&state.pool, tenant.company_id, id).await? {
        return Err(not_found("Project", id));
    }
    Ok(Redirect::to(&super::api_path("/projects/all")))
}

/// GET /api/v1/projects/{id}/restore
pub async fn restore_confirm(
    State(state): State<AppState>,
    RequireManager(tenant): RequireManager,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Project>>> {
    let project = find_project(&state, &tenant, id).await?;
    Ok(Json(DataResponse { data: project }))
}

/// POST /api/v1/projects/{id}/restore
pub async fn restore(
    State(state): State<AppState>,
    RequireManager(tenant): RequireManager,
    Path(id): Path<DbId>,
) -> AppResult<Redirect> {
    if !ProjectRepo::restore(&state.pool, tenant.company_id, id).await? {
        return Err(not_found("Project", id));
    }
    Ok(Redirect::to(&super::api_path("/projects/archived")))
}

// ---------------------------------------------------------------------------
// Project manager and members
// ---------------------------------------------------------------------------

/// GET /api/v1/projects/{id}/assign-pm
pub async fn assign_pm_form(
    State(state): State<AppState>,
    RequireAdmin(tenant): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<AssignPmModel>>> {
    let project = find_project(&state, &tenant, id).await?;
    let manager = ProjectRepo::manager(&state.pool, tenant.company_id, id).await?;
    let pm_list =
        RoleRepo::users_in_role(&state.pool, Role::ProjectManager, tenant.company_id).await?;
    Ok(Json(DataResponse {
        data: AssignPmModel {
            project,
            manager,
            pm_list,
        },
    }))
}

/// POST /api/v1/projects/{id}/assign-pm
pub async fn assign_pm(
    State(state): State<AppState>,
    RequireAdmin(tenant): RequireAdmin,
    Path(id): Path<DbId>,
    FormData(form): FormData<AssignPmForm>,
) -> AppResult<Redirect> {
    let result: AppResult<String> = match form.pm_id {
        None => Err(CoreError::Validation("Select a project manager".into()).into()),
        Some(pm_id) => ProjectRepo::add_manager(&state.pool, tenant.company_id, pm_id, id)
            .await
            .map(|()| format!("/projects/{id}"))
            .map_err(AppError::from),
    };
    redirect_after(result, &format!("/projects/{id}/assign-pm"))
}

/// GET /api/v1/projects/{id}/members
pub async fn members_form(
    State(state): State<AppState>,
    RequireManager(tenant): RequireManager,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<MembersModel>>> {
    let project = find_project(&state, &tenant, id).await?;
    let manager = ProjectRepo::manager(&state.pool, tenant.company_id, id).await?;
    let users = RoleRepo::users_in_any_role(&state.pool, MEMBER_ROLES, tenant.company_id).await?;
    let selected = ProjectRepo::members_except_manager(&state.pool, tenant.company_id, id)
        .await?
        .into_iter()
        .map(|u| u.id)
        .collect();
    Ok(Json(DataResponse {
        data: MembersModel {
            project,
            manager,
            users,
            selected,
        },
    }))
}

/// POST /api/v1/projects/{id}/members
///
/// Replaces the ordinary members with the submitted selection. The manager
/// is never affected.
pub async fn members(
    State(state): State<AppState>,
    RequireManager(tenant): RequireManager,
    Path(id): Path<DbId>,
    FormData(form): FormData<MembersForm>,
) -> AppResult<Redirect> {
    let result: AppResult<String> = match form.selected_users {
        None => Err(CoreError::Validation("No member selection submitted".into()).into()),
        Some(raw) => replace_members(&state, &tenant, id, &raw).await,
    };
    redirect_after(result, &format!("/projects/{id}/members"))
}

async fn replace_members(
    state: &AppState,
    tenant: &TenantContext,
    id: DbId,
    raw: &str,
) -> AppResult<String> {
    let selected = parse_id_list(raw)?;
    let plan = ProjectRepo::replace_members(&state.pool, tenant.company_id, id, &selected).await?;
    tracing::info!(
        user_id = tenant.user_id,
        project_id = id,
        added = plan.to_add.len(),
        removed = plan.to_remove.len(),
        "Project members replaced"
    );
    Ok(format!("/projects/{id}"))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn find_project(state: &AppState, tenant: &TenantContext, id: DbId) -> AppResult<Project> {
    ProjectRepo::find_by_id(&state.pool, tenant.company_id, id)
        .await?
        .ok_or_else(|| not_found("Project", id))
}

async fn form_model(
    state: &AppState,
    tenant: &TenantContext,
    project: Option<Project>,
) -> AppResult<ProjectFormModel> {
    let manager_id = match &project {
        Some(p) => ProjectRepo::manager(&state.pool, tenant.company_id, p.id)
            .await?
            .map(|u| u.id),
        None => None,
    };
    let pm_list =
        RoleRepo::users_in_role(&state.pool, Role::ProjectManager, tenant.company_id).await?;
    let priorities = LookupRepo::project_priorities(&state.pool).await?;
    Ok(ProjectFormModel {
        project,
        manager_id,
        pm_list,
        priorities,
    })
}
