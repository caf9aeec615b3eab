use axum::routing::get;
use axum::Router;

use crate::handlers::lookup;
use crate::state::AppState;

/// Routes mounted at `/lookups`.
///
/// ```text
/// GET    /{slug}                    -> list
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/{slug}", get(lookup::list))
}
