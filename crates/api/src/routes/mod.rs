pub mod company;
pub mod health;
pub mod lookup;
pub mod notification;
pub mod project;
pub mod roles;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /projects/my                                     projects the caller belongs to
/// /projects/all                                    company projects (eager for Admin/PM)
/// /projects/archived                               archived projects
/// /projects/unassigned                             projects without a manager (admin)
/// /projects/create                                 form model, create (GET, POST)
/// /projects/{id}                                   detail
/// /projects/{id}/image                             stored image bytes
/// /projects/{id}/history                           ticket history (501)
/// /projects/{id}/edit                              form model, edit (GET, POST)
/// /projects/{id}/archive                           confirm, archive (GET, POST)
/// /projects/{id}/restore                           confirm, restore (GET, POST)
/// /projects/{id}/assign-pm                         form model, assign (GET, POST; admin)
/// /projects/{id}/members                           form model, replace (GET, POST)
///
/// /company                                         company with every project (Admin/PM)
/// /company/members                                 members with roles (Admin/PM)
/// /company/tickets                                 every ticket (Admin/PM)
/// /company/history                                 ticket history (Admin/PM; 501)
///
/// /roles/manage                                    users and roles (admin)
/// /roles/manage/{user_id}                          replace a user's roles (POST; admin)
///
/// /lookups/{slug}                                  priorities, statuses, types
///
/// /notifications                                   create (POST)
/// /notifications/received                          inbox
/// /notifications/sent                              outbox
/// /notifications/{id}/email                        email a notification (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/projects", project::router())
        .nest("/company", company::router())
        .nest("/roles", roles::router())
        .nest("/lookups", lookup::router())
        .nest("/notifications", notification::router())
}
