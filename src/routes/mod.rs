pub mod account;
pub mod members;
pub mod organizations;
pub mod projects;
pub mod users;

use std::sync::LazyLock;

use axum::Router;
use axum::routing::{delete, get, post, put};
use regex::Regex;

use crate::state::SharedState;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email regex"));

pub(crate) fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// The API dispatch table. Each account/organization operation maps 1:1 to
/// a handler.
pub fn api_routes() -> Router<SharedState> {
    Router::new()
        // Account
        .route("/api/v1/account/local", post(account::create_local))
        .route("/api/v1/account/local/signin", post(account::local_signin))
        .route("/api/v1/account/google/signin", post(account::google_signin))
        .route("/api/v1/account/signout", post(account::signout))
        .route("/api/refresh_token", post(account::refresh_token))
        .route("/api/check_token", get(account::check_token))
        // Organizations
        .route("/api/v1/organizations", post(organizations::create))
        .route(
            "/api/v1/organizations/{id}",
            get(organizations::get).put(organizations::update),
        )
        .route(
            "/api/v1/organizations/by-name/{name}",
            get(organizations::get_by_name),
        )
        // Members
        .route(
            "/api/v1/organizations/{id}/members",
            get(members::list).post(members::add),
        )
        .route(
            "/api/v1/members/{id}",
            put(members::update).delete(members::remove),
        )
        // Users
        .route("/api/v1/users/{id}", get(users::get).put(users::update))
        .route("/api/v1/users/by-name/{name}", get(users::get_by_name))
        .route("/api/v1/users/{id}/memberships", get(users::memberships))
        // Projects
        .route("/api/v1/projects", post(projects::create))
        .route(
            "/api/v1/projects/{id}",
            get(projects::get)
                .put(projects::update)
                .delete(projects::delete),
        )
        .route(
            "/api/v1/organizations/{id}/projects",
            get(projects::list_by_organization),
        )
}
