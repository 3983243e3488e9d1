use std::sync::Arc;

use sqlx::PgPool;

use crate::auth::google::GoogleVerifier;
use crate::auth::recaptcha::RecaptchaVerifier;
use crate::config::Config;
use crate::rate_limit::SigninRateLimiter;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
    pub recaptcha: RecaptchaVerifier,
    pub google: GoogleVerifier,
    pub signin_limiter: SigninRateLimiter,
}
