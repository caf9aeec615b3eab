//! JWT-based authentication extractor for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use bugtracker_core::error::CoreError;
use bugtracker_core::roles::Role;
use bugtracker_core::tenant::TenantContext;
use bugtracker_core::types::DbId;

use crate::auth::jwt::validate_token;
use crate::error::AppError;
use crate::state::AppState;

/// Authenticated principal extracted from a JWT Bearer token in the
/// `Authorization` header.
///
/// Most handlers want a company-scoped [`TenantContext`] instead; see the
/// extractors in [`super::rbac`].
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// The user's internal database id (from `claims.sub`).
    pub user_id: DbId,
    /// The company claim, unchecked.
    pub company_id: Option<DbId>,
    pub roles: Vec<Role>,
}

impl AuthUser {
    /// Scope the principal to its company. A missing company claim is
    /// `Unauthorized`.
    pub fn into_tenant(self) -> Result<TenantContext, CoreError> {
        TenantContext::from_claims(self.user_id, self.company_id, self.roles)
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AppError::Core(CoreError::Unauthorized(
                    "Missing Authorization header".into(),
                ))
            })?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Invalid Authorization format. Expected: Bearer <token>".into(),
            ))
        })?;

        let claims = validate_token(token, &state.config.jwt).map_err(|_| {
            AppError::Core(CoreError::Unauthorized("Invalid or expired token".into()))
        })?;

        Ok(AuthUser {
            user_id: claims.sub,
            company_id: claims.company_id(),
            roles: claims.roles,
        })
    }
}
