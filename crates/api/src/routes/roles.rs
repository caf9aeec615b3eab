//! Route definitions for role management.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::roles;
use crate::state::AppState;

/// Routes mounted at `/roles`.
///
/// ```text
/// GET    /manage                    -> manage_form
/// POST   /manage/{user_id}          -> manage
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/manage", get(roles::manage_form))
        .route("/manage/{user_id}", post(roles::manage))
}
