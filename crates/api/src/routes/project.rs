//! Route definitions for the `/projects` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::project;
use crate::state::AppState;

/// Routes mounted at `/projects`.
///
/// ```text
/// GET    /my                        -> my_projects
/// GET    /all                       -> all_projects
/// GET    /archived                  -> archived_projects
/// GET    /unassigned                -> unassigned_projects
/// GET    /create                    -> create_form
/// POST   /create                    -> create
/// GET    /{id}                      -> detail
/// GET    /{id}/image                -> image
/// GET    /{id}/history              -> history
/// GET    /{id}/edit                 -> edit_form
/// POST   /{id}/edit                 -> edit
/// GET    /{id}/archive              -> archive_confirm
/// POST   /{id}/archive              -> archive
/// GET    /{id}/restore              -> restore_confirm
/// POST   /{id}/restore              -> restore
/// GET    /{id}/assign-pm            -> assign_pm_form
/// POST   /{id}/assign-pm            -> assign_pm
/// GET    /{id}/members              -> members_form
/// POST   /{id}/members              -> members
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/my", get(project::my_projects))
        .route("/all", get(project::all_projects))
        .route("/archived", get(project::archived_projects))
        .route("/unassigned", get(project::unassigned_projects))
        .route("/create", get(project::create_form).post(project::create))
        .route("/{id}", get(project::detail))
        .route("/{id}/image", get(project::image))
        .route("/{id}/history", get(project::history))
        .route("/{id}/edit", get(project::edit_form).post(project::edit))
        .route(
            "/{id}/archive",
            get(project::archive_confirm).post(project::archive),
        )
        .route(
            "/{id}/restore",
            get(project::restore_confirm).post(project::restore),
        )
        .route(
            "/{id}/assign-pm",
            get(project::assign_pm_form).post(project::assign_pm),
        )
        .route(
            "/{id}/members",
            get(project::members_form).post(project::members),
        )
}
