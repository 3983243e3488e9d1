use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Account;
use crate::models::account::{TYPE_GOOGLE, TYPE_LOCAL};

pub async fn create_local<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    user_id: Uuid,
    password_hash: &str,
) -> Result<Account, sqlx::Error> {
    sqlx::query_as::<_, Account>(
        "INSERT INTO accounts (account_type, active, user_id, password_hash)
         VALUES ($1, TRUE, $2, $3) RETURNING *",
    )
    .bind(TYPE_LOCAL)
    .bind(user_id)
    .bind(password_hash)
    .fetch_one(executor)
    .await
}

pub async fn create_google<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    user_id: Uuid,
    provider_sub: &str,
) -> Result<Account, sqlx::Error> {
    sqlx::query_as::<_, Account>(
        "INSERT INTO accounts (account_type, active, user_id, provider_sub)
         VALUES ($1, TRUE, $2, $3) RETURNING *",
    )
    .bind(TYPE_GOOGLE)
    .bind(user_id)
    .bind(provider_sub)
    .fetch_one(executor)
    .await
}

pub async fn find_local_by_user(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Option<Account>, sqlx::Error> {
    sqlx::query_as::<_, Account>(
        "SELECT * FROM accounts WHERE user_id = $1 AND account_type = $2",
    )
    .bind(user_id)
    .bind(TYPE_LOCAL)
    .fetch_optional(pool)
    .await
}

pub async fn find_by_provider_sub(
    pool: &PgPool,
    provider_sub: &str,
) -> Result<Option<Account>, sqlx::Error> {
    sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE provider_sub = $1")
        .bind(provider_sub)
        .fetch_optional(pool)
        .await
}

/// Install a fresh refresh token for an already-authenticated account,
/// overwriting the prior value and stamping last_signin.
pub async fn rotate_refresh_token(
    pool: &PgPool,
    id: Uuid,
    new_hash: &str,
) -> Result<Account, sqlx::Error> {
    sqlx::query_as::<_, Account>(
        "UPDATE accounts SET refresh_token_hash = $2, last_signin = now()
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(new_hash)
    .fetch_one(pool)
    .await
}

/// Atomic rotation keyed on the stored value: of concurrent requests
/// presenting the same token, at most one matches the WHERE clause; the
/// others see no row, indistinguishable from a token that never existed.
pub async fn exchange_refresh_token(
    pool: &PgPool,
    old_hash: &str,
    new_hash: &str,
) -> Result<Option<Account>, sqlx::Error> {
    sqlx::query_as::<_, Account>(
        "UPDATE accounts SET refresh_token_hash = $2, last_signin = now()
         WHERE refresh_token_hash = $1 RETURNING *",
    )
    .bind(old_hash)
    .bind(new_hash)
    .fetch_optional(pool)
    .await
}

pub async fn clear_refresh_token(pool: &PgPool, user_id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE accounts SET refresh_token_hash = NULL WHERE user_id = $1")
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(())
}
