//! Authentication, authorization and form extractors.
//!
//! - [`auth::AuthUser`] -- Extracts the authenticated principal from a JWT Bearer token.
//! - [`rbac::RequireTenant`] -- Requires a principal attached to a company.
//! - [`rbac::RequireManager`] -- Requires `admin` or `project_manager`.
//! - [`rbac::RequireAdmin`] -- Requires `admin`.
//! - [`form::FormData`] -- Url-encoded body with JSON rejections.

pub mod auth;
pub mod form;
pub mod rbac;
