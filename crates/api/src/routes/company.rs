//! Route definitions for the `/company` views.

use axum::routing::get;
use axum::Router;

use crate::handlers::company;
use crate::state::AppState;

/// Routes mounted at `/company`.
///
/// ```text
/// GET    /                          -> info
/// GET    /members                   -> members
/// GET    /tickets                   -> tickets
/// GET    /history                   -> history
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(company::info))
        .route("/members", get(company::members))
        .route("/tickets", get(company::tickets))
        .route("/history", get(company::history))
}
