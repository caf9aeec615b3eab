//! Shared helpers for the HTTP integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE, LOCATION};
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use bugtracker_api::auth::jwt::{generate_access_token, JwtConfig};
use bugtracker_api::config::ServerConfig;
use bugtracker_api::router::build_app_router;
use bugtracker_api::state::AppState;
use bugtracker_core::history::UnsupportedTicketHistory;
use bugtracker_core::roles::Role;
use bugtracker_core::types::DbId;
use bugtracker_db::models::company::{Company, CreateCompany};
use bugtracker_db::models::user::{CreateUser, User};
use bugtracker_db::repositories::{CompanyRepo, RoleRepo, UserRepo};
use bugtracker_events::{NotificationDispatcher, UnconfiguredEmailSender};
use http_body_util::BodyExt;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tower::ServiceExt;

const BOUNDARY: &str = "bugtracker-test-boundary";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        max_image_bytes: 1024,
        db_max_connections: 5,
        jwt: JwtConfig {
            secret: "integration-test-secret-long-enough".to_string(),
            access_token_expiry_mins: 15,
        },
    }
}

/// Build the production router around `pool`. Email delivery is unconfigured
/// and ticket history is unsupported.
pub fn build_test_app(pool: PgPool) -> Router {
    let config = test_config();
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        dispatcher: NotificationDispatcher::new(Arc::new(UnconfiguredEmailSender)),
        history: Arc::new(UnsupportedTicketHistory),
    };
    build_app_router(state, &config)
}

/// A pool that never connects, for requests rejected before any query runs.
pub fn lazy_pool() -> PgPool {
    PgPoolOptions::new()
        .connect_lazy("postgres://localhost/unused")
        .unwrap()
}

pub fn token(user_id: DbId, company_id: Option<DbId>, roles: &[Role]) -> String {
    generate_access_token(user_id, company_id, roles, &test_config().jwt).unwrap()
}

/// Token for a seeded user carrying the given roles.
pub fn token_for(user: &User, roles: &[Role]) -> String {
    token(user.id, Some(user.company_id), roles)
}

// ---------------------------------------------------------------------------
// Seeding
// ---------------------------------------------------------------------------

pub async fn seed_company(pool: &PgPool, name: &str) -> Company {
    CompanyRepo::create(
        pool,
        &CreateCompany {
            name: name.to_string(),
            description: None,
        },
    )
    .await
    .unwrap()
}

pub async fn seed_user(pool: &PgPool, company_id: DbId, name: &str, roles: &[Role]) -> User {
    let user = UserRepo::create(
        pool,
        &CreateUser {
            company_id,
            first_name: name.to_string(),
            last_name: "Tester".to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
        },
    )
    .await
    .unwrap();
    for role in roles {
        RoleRepo::add_role(pool, user.id, *role).await.unwrap();
    }
    user
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

fn request(method: Method, uri: &str, token: Option<&str>) -> axum::http::request::Builder {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    builder
}

pub async fn get(app: Router, uri: &str, token: Option<&str>) -> Response {
    let req = request(Method::GET, uri, token)
        .body(Body::empty())
        .unwrap();
    app.oneshot(req).await.unwrap()
}

/// POST an `application/x-www-form-urlencoded` body.
pub async fn post_form(app: Router, uri: &str, token: Option<&str>, body: &str) -> Response {
    let req = request(Method::POST, uri, token)
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(req).await.unwrap()
}

/// An image part for [`post_multipart`].
pub struct ImagePart<'a> {
    pub file_name: &'a str,
    pub content_type: &'a str,
    pub data: &'a [u8],
}

/// POST a `multipart/form-data` body with text fields and an optional image.
pub async fn post_multipart(
    app: Router,
    uri: &str,
    token: Option<&str>,
    fields: &[(&str, &str)],
    image: Option<ImagePart<'_>>,
) -> Response {
    let mut body: Vec<u8> = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some(image) = image {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; \
                 filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                image.file_name, image.content_type
            )
            .as_bytes(),
        );
        body.extend_from_slice(image.data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    let req = request(Method::POST, uri, token)
        .header(
            CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap();
    app.oneshot(req).await.unwrap()
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_bytes(response: Response) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

/// The `Location` header of a redirect.
pub fn location(response: &Response) -> String {
    response
        .headers()
        .get(LOCATION)
        .expect("redirect should carry a Location header")
        .to_str()
        .unwrap()
        .to_string()
}
