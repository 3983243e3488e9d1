pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod permissions;
pub mod rate_limit;
pub mod routes;
pub mod state;

use std::sync::Arc;

use axum::Router;
use axum::http::{HeaderName, HeaderValue};
use sqlx::PgPool;
use tower_http::cors::CorsLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::auth::google::GoogleVerifier;
use crate::auth::recaptcha::RecaptchaVerifier;
use crate::config::Config;
use crate::rate_limit::SigninRateLimiter;
use crate::state::{AppState, SharedState};

pub fn build_app(pool: PgPool, config: Config) -> Router {
    let recaptcha = RecaptchaVerifier::new(
        config.recaptcha_url.clone(),
        config.recaptcha_secret.clone(),
    );
    let google = GoogleVerifier::new(
        config.google_tokeninfo_url.clone(),
        config.google_client_id.clone(),
    );

    let state: SharedState = Arc::new(AppState {
        pool,
        config,
        recaptcha,
        google,
        signin_limiter: SigninRateLimiter::new(),
    });

    // sweep expired sign-in limiter windows so the map stays bounded
    let sweep_state = state.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(10 * 60));
        loop {
            interval.tick().await;
            sweep_state.signin_limiter.cleanup(rate_limit::WINDOW);
        }
    });

    Router::new()
        .merge(routes::api_routes())
        .route("/health", axum::routing::get(health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-content-type-options"),
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-frame-options"),
            HeaderValue::from_static("DENY"),
        ))
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}
