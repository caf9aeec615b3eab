//! Tenant (company) resolution and the per-request tenant context.
//!
//! Every scoped query takes the company id from a [`TenantContext`] that the
//! HTTP layer builds once per request from verified claims. A principal with
//! no company claim is unauthorized; there is no fallback tenant.

use crate::error::CoreError;
use crate::roles::Role;
use crate::types::DbId;

/// Turn an optional company claim into a company id.
///
/// Absence is always an authorization failure.
pub fn resolve_company(claim: Option<DbId>) -> Result<DbId, CoreError> {
    match claim {
        Some(company_id) if company_id > 0 => Ok(company_id),
        Some(company_id) => Err(CoreError::Unauthorized(format!(
            "Invalid company claim: {company_id}"
        ))),
        None => Err(CoreError::Unauthorized("Missing company claim".into())),
    }
}

/// The authenticated principal scoped to its company.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantContext {
    pub user_id: DbId,
    pub company_id: DbId,
    pub roles: Vec<Role>,
}

impl TenantContext {
    /// Build a context from raw claim values, rejecting a missing company.
    pub fn from_claims(
        user_id: DbId,
        company_claim: Option<DbId>,
        roles: Vec<Role>,
    ) -> Result<Self, CoreError> {
        let company_id = resolve_company(company_claim)?;
        Ok(Self {
            user_id,
            company_id,
            roles,
        })
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    pub fn has_any_role(&self, allowed: &[Role]) -> bool {
        allowed.iter().any(|role| self.has_role(*role))
    }

    /// Admin or project manager.
    pub fn is_elevated(&self) -> bool {
        self.roles.iter().any(|role| role.is_elevated())
    }

    /// Reject with `Forbidden` unless the principal holds one of `allowed`.
    pub fn require_any(&self, allowed: &[Role]) -> Result<(), CoreError> {
        if self.has_any_role(allowed) {
            return Ok(());
        }
        let names: Vec<&str> = allowed.iter().map(|role| role.as_str()).collect();
        Err(CoreError::Forbidden(format!(
            "One of the following roles is required: {}",
            names.join(", ")
        )))
    }
}
