//! Handlers for role management. Admin only.

use axum::extract::{Path, State};
use axum::response::Redirect;
use axum::Json;
use bugtracker_core::error::CoreError;
use bugtracker_core::roles::Role;
use bugtracker_core::types::DbId;
use bugtracker_db::models::user::UserWithRoles;
use bugtracker_db::repositories::{CompanyInfoRepo, RoleRepo};
use serde::{Deserialize, Serialize};

use super::redirect_after;
use crate::error::AppResult;
use crate::middleware::form::FormData;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ManageRolesModel {
    pub users: Vec<UserWithRoles>,
    /// Every assignable role.
    pub roles: [Role; 4],
}

/// Submitted roles as a comma-separated list of role names. Blank clears
/// every role.
#[derive(Debug, Deserialize)]
pub struct RolesForm {
    #[serde(default)]
    pub roles: String,
}

fn parse_roles(raw: &str) -> Result<Vec<Role>, CoreError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::parse)
        .collect()
}

/// GET /api/v1/roles/manage
pub async fn manage_form(
    State(state): State<AppState>,
    RequireAdmin(tenant): RequireAdmin,
) -> AppResult<Json<DataResponse<ManageRolesModel>>> {
    let users = CompanyInfoRepo::all_members(&state.pool, tenant.company_id).await?;
    Ok(Json(DataResponse {
        data: ManageRolesModel {
            users,
            roles: Role::ALL,
        },
    }))
}

/// POST /api/v1/roles/manage/{user_id}
pub async fn manage(
    State(state): State<AppState>,
    RequireAdmin(tenant): RequireAdmin,
    Path(user_id): Path<DbId>,
    FormData(form): FormData<RolesForm>,
) -> AppResult<Redirect> {
    let result: AppResult<String> = match parse_roles(&form.roles) {
        Ok(roles) => RoleRepo::set_roles(&state.pool, tenant.company_id, user_id, &roles)
            .await
            .map(|_| "/roles/manage".to_string())
            .map_err(Into::into),
        Err(err) => Err(err.into()),
    };
    redirect_after(result, "/roles/manage")
}
