//! Role-based access control (RBAC) extractors.
//!
//! Each extractor authenticates the request, resolves the tenant and then
//! checks roles. A missing company claim is rejected with 401 before any
//! role check; a missing role with 403.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use bugtracker_core::roles::{Role, MANAGER_ROLES};
use bugtracker_core::tenant::TenantContext;

use super::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

async fn tenant_with_roles(
    parts: &mut Parts,
    state: &AppState,
    allowed: Option<&[Role]>,
) -> Result<TenantContext, AppError> {
    let tenant = AuthUser::from_request_parts(parts, state)
        .await?
        .into_tenant()?;
    if let Some(allowed) = allowed {
        if let Err(err) = tenant.require_any(allowed) {
            tracing::warn!(
                user_id = tenant.user_id,
                company_id = tenant.company_id,
                path = %parts.uri.path(),
                "Rejected request lacking required role"
            );
            return Err(err.into());
        }
    }
    Ok(tenant)
}

/// Requires any authenticated principal attached to a company.
///
/// ```ignore
/// async fn my_projects(RequireTenant(tenant): RequireTenant) -> AppResult<Json<()>> {
///     Ok(Json(()))
/// }
/// ```
pub struct RequireTenant(pub TenantContext);

impl FromRequestParts<AppState> for RequireTenant {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        tenant_with_roles(parts, state, None).await.map(RequireTenant)
    }
}

/// Requires the `admin` or `project_manager` role.
pub struct RequireManager(pub TenantContext);

impl FromRequestParts<AppState> for RequireManager {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        tenant_with_roles(parts, state, Some(MANAGER_ROLES))
            .await
            .map(RequireManager)
    }
}

/// Requires the `admin` role.
pub struct RequireAdmin(pub TenantContext);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        tenant_with_roles(parts, state, Some(&[Role::Admin]))
            .await
            .map(RequireAdmin)
    }
}
