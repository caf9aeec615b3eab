//! Request handlers.
//!
//! GET handlers return JSON view models in a [`DataResponse`](crate::response::DataResponse).
//! Form submissions follow one state machine: success redirects (303) to the
//! canonical view, a validation failure redirects back to the form, and any
//! other error becomes an error response.

pub mod company;
pub mod lookup;
pub mod notification;
pub mod project;
pub mod roles;

use std::fmt::Display;
use std::str::FromStr;

use axum::response::Redirect;
use bugtracker_core::error::CoreError;
use bugtracker_core::types::DbId;
use serde::{Deserialize, Deserializer};

use crate::error::{AppError, AppResult};

/// Prefix under which the API routes are nested.
pub const API_PREFIX: &str = "/api/v1";

/// Build an absolute API path for a redirect target.
pub(crate) fn api_path(path: &str) -> String {
    format!("{API_PREFIX}{path}")
}

/// Resolve a form submission into a redirect. `result` carries the
/// canonical view to show on success.
pub(crate) fn redirect_after(result: AppResult<String>, form: &str) -> AppResult<Redirect> {
    match result {
        Ok(success) => Ok(Redirect::to(&api_path(&success))),
        Err(err) if err.is_validation() => {
            tracing::warn!(error = %err, form, "Form rejected, redirecting back");
            Ok(Redirect::to(&api_path(form)))
        }
        Err(err) => Err(err),
    }
}

/// Treat an empty form value as absent.
///
/// HTML forms submit `field=` for an unselected option; without this an
/// `Option<i64>` field fails to parse.
pub(crate) fn empty_string_as_none<'de, D, T>(de: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    let value = Option::<String>::deserialize(de)?;
    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

/// Parse a comma-separated id list (`"3, 7,9"`). Blank input is an empty list.
pub(crate) fn parse_id_list(raw: &str) -> Result<Vec<DbId>, CoreError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<DbId>()
                .map_err(|_| CoreError::Validation(format!("Invalid user id '{s}'")))
        })
        .collect()
}

/// Shorthand for a tenant-scoped not-found.
pub(crate) fn not_found(entity: &'static str, id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound { entity, id })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use axum::response::IntoResponse;

    #[test]
    fn test_parse_id_list() {
        assert_eq!(parse_id_list("3, 7,9").unwrap(), vec![3, 7, 9]);
        assert!(parse_id_list("  ").unwrap().is_empty());
        assert_matches!(parse_id_list("1,x"), Err(CoreError::Validation(_)));
    }

    #[test]
    fn test_redirect_after_success_and_validation() {
        let ok = redirect_after(Ok("/projects/1".to_string()), "/projects/1/edit").unwrap();
        let location = ok.into_response().headers()["location"].clone();
        assert_eq!(location, "/api/v1/projects/1");

        let back = redirect_after(
            Err(AppError::Core(CoreError::Validation("bad".into()))),
            "/projects/1/edit",
        )
        .unwrap();
        let location = back.into_response().headers()["location"].clone();
        assert_eq!(location, "/api/v1/projects/1/edit");
    }

    #[test]
    fn test_redirect_after_passes_other_errors_through() {
        let result = redirect_after(Err(not_found("Project", 4)), "/b");
        assert_matches!(result, Err(AppError::Core(CoreError::NotFound { .. })));
    }

    #[derive(Deserialize)]
    struct PmForm {
        #[serde(default, deserialize_with = "empty_string_as_none")]
        pm_id: Option<DbId>,
    }

    #[test]
    fn test_empty_form_value_is_none() {
        let form: PmForm = serde_json::from_str(r#"{"pm_id": ""}"#).unwrap();
        assert_eq!(form.pm_id, None);
        let form: PmForm = serde_json::from_str(r#"{"pm_id": "12"}"#).unwrap();
        assert_eq!(form.pm_id, Some(12));
        let form: PmForm = serde_json::from_str("{}").unwrap();
        assert_eq!(form.pm_id, None);
    }
}
