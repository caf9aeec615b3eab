//! Handlers for the company-wide views.

use axum::extract::State;
use axum::Json;
use bugtracker_core::history::TicketHistoryEntry;
use bugtracker_db::models::company::Company;
use bugtracker_db::models::project::ProjectOverview;
use bugtracker_db::models::ticket::TicketWithLookups;
use bugtracker_db::models::user::UserWithRoles;
use bugtracker_db::repositories::CompanyInfoRepo;
use serde::Serialize;

use super::not_found;
use crate::error::AppResult;
use crate::middleware::rbac::RequireManager;
use crate::response::DataResponse;
use crate::state::AppState;

/// The caller's company with every project, archived ones included.
#[derive(Debug, Serialize)]
pub struct CompanyModel {
    pub company: Company,
    pub projects: Vec<ProjectOverview>,
}

/// GET /api/v1/company
pub async fn info(
    State(state): State<AppState>,
    RequireManager(tenant): RequireManager,
) -> AppResult<Json<DataResponse<CompanyModel>>> {
    let company = CompanyInfoRepo::find_by_id(&state.pool, tenant.company_id)
        .await?
        .ok_or_else(|| not_found("Company", tenant.company_id))?;
    let projects = CompanyInfoRepo::all_projects(&state.pool, tenant.company_id).await?;
    Ok(Json(DataResponse {
        data: CompanyModel { company, projects },
    }))
}

/// GET /api/v1/company/members
pub async fn members(
    State(state): State<AppState>,
    RequireManager(tenant): RequireManager,
) -> AppResult<Json<DataResponse<Vec<UserWithRoles>>>> {
    let members = CompanyInfoRepo::all_members(&state.pool, tenant.company_id).await?;
    Ok(Json(DataResponse { data: members }))
}

/// GET /api/v1/company/tickets
pub async fn tickets(
    State(state): State<AppState>,
    RequireManager(tenant): RequireManager,
) -> AppResult<Json<DataResponse<Vec<TicketWithLookups>>>> {
    let tickets = CompanyInfoRepo::all_tickets(&state.pool, tenant.company_id).await?;
    Ok(Json(DataResponse { data: tickets }))
}

/// GET /api/v1/company/history
///
/// Answers 501 until ticket history is recorded.
pub async fn history(
    State(state): State<AppState>,
    RequireManager(tenant): RequireManager,
) -> AppResult<Json<DataResponse<Vec<TicketHistoryEntry>>>> {
    let entries = state.history.company_histories(tenant.company_id).await?;
    Ok(Json(DataResponse { data: entries }))
}
