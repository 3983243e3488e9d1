use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};

use crate::auth::extractor::AuthUser;
use crate::auth::jwt::{Claims, encode_token};
use crate::auth::password;
use crate::auth::tokens::{generate_refresh_token, hash_token};
use crate::db;
use crate::error::AppError;
use crate::models::{Account, User};
use crate::routes::is_valid_email;
use crate::state::SharedState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLocalRequest {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub full_name: String,
    pub password: String,
    #[serde(default)]
    pub recaptcha_token: String,
}

#[derive(Deserialize)]
pub struct LocalSigninRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleSigninRequest {
    pub id_token: String,
    pub register_pseudo: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SigninResult {
    pub bearer_token: String,
    pub refresh_token: String,
    pub account: Account,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub new_bearer_token: String,
    pub new_refresh_token: String,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

fn conflict_on_unique(e: sqlx::Error, msg: &str) -> AppError {
    match e {
        sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
            AppError::Conflict(msg.to_string())
        }
        _ => AppError::Database(e),
    }
}

/// Mint a bearer token and install a fresh refresh token on the account.
async fn issue_tokens(
    state: &SharedState,
    user: &User,
    account: &Account,
    picture: &str,
) -> Result<SigninResult, AppError> {
    let claims = Claims::new(user.id, user.name.clone(), picture.to_string());
    let bearer_token =
        encode_token(&claims, &state.config.jwt_secret).map_err(AppError::Internal)?;

    let refresh_token = generate_refresh_token();
    let account =
        db::accounts::rotate_refresh_token(&state.pool, account.id, &hash_token(&refresh_token))
            .await?;

    Ok(SigninResult {
        bearer_token,
        refresh_token,
        account,
    })
}

/// Create a user, its self organization, the "self" membership and an
/// account, all in one transaction. Registration leaves no orphan rows.
async fn register_user(
    state: &SharedState,
    name: &str,
    email: &str,
    full_name: &str,
    credential: Credential<'_>,
) -> Result<(User, Account), AppError> {
    let mut tx = state.pool.begin().await?;

    let user = db::users::create(&mut *tx, name, email, full_name)
        .await
        .map_err(|e| conflict_on_unique(e, "A user with this email or name already exists"))?;

    let organization = db::organizations::create(&mut *tx, name, "", Some(user.id))
        .await
        .map_err(|e| conflict_on_unique(e, "An organization with this name already exists"))?;

    db::organization_members::create(&mut *tx, organization.id, user.id, &["self".to_string()])
        .await?;

    let account = match credential {
        Credential::Local { password_hash } => {
            db::accounts::create_local(&mut *tx, user.id, password_hash).await?
        }
        Credential::Google { provider_sub } => {
            db::accounts::create_google(&mut *tx, user.id, provider_sub).await?
        }
    };

    tx.commit().await?;
    Ok((user, account))
}

enum Credential<'a> {
    Local { password_hash: &'a str },
    Google { provider_sub: &'a str },
}

pub async fn create_local(
    State(state): State<SharedState>,
    Json(req): Json<CreateLocalRequest>,
) -> Result<Json<Account>, AppError> {
    if !is_valid_email(&req.email) {
        return Err(AppError::BadRequest(format!(
            "\"{}\" is not a valid email address",
            req.email
        )));
    }
    if req.password.is_empty() {
        return Err(AppError::BadRequest("Invalid password".to_string()));
    }
    if req.name.is_empty() {
        return Err(AppError::BadRequest("Invalid name".to_string()));
    }
    if req.recaptcha_token.is_empty() || !state.recaptcha.verify(&req.recaptcha_token).await {
        return Err(AppError::BadRequest(
            "This application is reserved to humans.".to_string(),
        ));
    }

    let pw_hash = password::hash(&req.password).map_err(AppError::Internal)?;
    let (user, account) = register_user(
        &state,
        &req.name,
        &req.email,
        &req.full_name,
        Credential::Local {
            password_hash: &pw_hash,
        },
    )
    .await?;

    tracing::info!(user = %user.name, "registered local account");
    Ok(Json(account))
}

pub async fn local_signin(
    State(state): State<SharedState>,
    Json(req): Json<LocalSigninRequest>,
) -> Result<Json<SigninResult>, AppError> {
    if state.signin_limiter.check(&req.email).is_err() {
        return Err(AppError::RateLimited(
            "Too many sign-in attempts. Please try again later.".to_string(),
        ));
    }

    let user = db::users::find_by_email(&state.pool, &req.email)
        .await?
        .ok_or_else(|| AppError::Forbidden("Invalid credentials".to_string()))?;

    let account = db::accounts::find_local_by_user(&state.pool, user.id)
        .await?
        .ok_or_else(|| AppError::Forbidden("Invalid credentials".to_string()))?;

    if !account.active {
        return Err(AppError::Forbidden("Account is not active".to_string()));
    }

    let valid = match &account.password_hash {
        Some(hash) => password::verify(&req.password, hash).map_err(AppError::Internal)?,
        None => false,
    };
    if !valid {
        state.signin_limiter.record_failure(&req.email);
        return Err(AppError::Forbidden("Invalid credentials".to_string()));
    }

    let result = issue_tokens(&state, &user, &account, "").await?;
    Ok(Json(result))
}

pub async fn google_signin(
    State(state): State<SharedState>,
    Json(req): Json<GoogleSigninRequest>,
) -> Result<Json<SigninResult>, AppError> {
    let identity = state
        .google
        .verify(&req.id_token)
        .await
        .map_err(AppError::Forbidden)?;

    let (user, account) = match db::accounts::find_by_provider_sub(&state.pool, &identity.sub)
        .await?
    {
        Some(account) => {
            let user = db::users::find_by_id(&state.pool, account.user_id)
                .await?
                .ok_or_else(|| AppError::Internal("account without user".to_string()))?;
            (user, account)
        }
        None => {
            let pseudo = req.register_pseudo.as_deref().filter(|p| !p.is_empty());
            let Some(pseudo) = pseudo else {
                return Err(AppError::BadRequest(
                    "A pseudo is required to register a new account".to_string(),
                ));
            };
            register_user(
                &state,
                pseudo,
                &identity.email,
                &identity.name,
                Credential::Google {
                    provider_sub: &identity.sub,
                },
            )
            .await?
        }
    };

    if !account.active {
        return Err(AppError::Forbidden("Account is not active".to_string()));
    }

    let result = issue_tokens(&state, &user, &account, &identity.picture).await?;
    Ok(Json(result))
}

/// `POST /api/refresh_token`. The single conditional UPDATE makes rotation
/// atomic: a stale or unknown token gets 401, with no distinction between
/// the two.
pub async fn refresh_token(
    State(state): State<SharedState>,
    Json(req): Json<RefreshRequest>,
) -> Result<Json<RefreshResponse>, AppError> {
    let presented = req
        .refresh_token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Unauthorized("Missing refresh token".to_string()))?;

    let new_refresh = generate_refresh_token();
    let account = db::accounts::exchange_refresh_token(
        &state.pool,
        &hash_token(&presented),
        &hash_token(&new_refresh),
    )
    .await?
    .ok_or_else(|| AppError::Unauthorized("Invalid refresh token".to_string()))?;

    let user = db::users::find_by_id(&state.pool, account.user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid refresh token".to_string()))?;

    let claims = Claims::new(user.id, user.name.clone(), String::new());
    let new_bearer =
        encode_token(&claims, &state.config.jwt_secret).map_err(AppError::Internal)?;

    Ok(Json(RefreshResponse {
        new_bearer_token: new_bearer,
        new_refresh_token: new_refresh,
    }))
}

pub async fn signout(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<MessageResponse>, AppError> {
    db::accounts::clear_refresh_token(&state.pool, auth.user_id).await?;
    Ok(Json(MessageResponse {
        message: "Signed out".to_string(),
    }))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckTokenResponse {
    pub user_id: uuid::Uuid,
    pub permissions: Vec<String>,
}

pub async fn check_token(auth: AuthUser) -> Json<CheckTokenResponse> {
    Json(CheckTokenResponse {
        user_id: auth.user_id,
        permissions: auth.perms.iter().map(|p| p.to_string()).collect(),
    })
}
