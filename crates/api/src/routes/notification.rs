//! Route definitions for the `/notifications` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::notification;
use crate::state::AppState;

/// Routes mounted at `/notifications`.
///
/// ```text
/// POST   /                          -> create
/// GET    /received                  -> received
/// GET    /sent                      -> sent
/// POST   /{id}/email                -> email
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(notification::create))
        .route("/received", get(notification::received))
        .route("/sent", get(notification::sent))
        .route("/{id}/email", post(notification::email))
}
