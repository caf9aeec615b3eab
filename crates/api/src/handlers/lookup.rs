//! Handler for the read-only lookup catalogs.

use axum::extract::{Path, State};
use axum::Json;
use bugtracker_db::models::lookup::{LookupEntry, LookupTable};
use bugtracker_db::repositories::LookupRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireTenant;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/lookups/{slug}
///
/// `slug` is one of `project-priorities`, `ticket-priorities`,
/// `ticket-statuses` or `ticket-types`.
pub async fn list(
    State(state): State<AppState>,
    RequireTenant(_tenant): RequireTenant,
    Path(slug): Path<String>,
) -> AppResult<Json<DataResponse<Vec<LookupEntry>>>> {
    let table = LookupTable::from_slug(&slug)
        .ok_or_else(|| AppError::BadRequest(format!("Unknown lookup '{slug}'")))?;
    let entries = LookupRepo::list(&state.pool, table).await?;
    Ok(Json(DataResponse { data: entries }))
}
