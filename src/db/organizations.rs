use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Organization;

pub async fn create<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    name: &str,
    description: &str,
    self_user_id: Option<Uuid>,
) -> Result<Organization, sqlx::Error> {
    sqlx::query_as::<_, Organization>(
        "INSERT INTO organizations (name, description, self_user_id)
         VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(name)
    .bind(description)
    .bind(self_user_id)
    .fetch_one(executor)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Organization>, sqlx::Error> {
    sqlx::query_as::<_, Organization>("SELECT * FROM organizations WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_name(pool: &PgPool, name: &str) -> Result<Option<Organization>, sqlx::Error> {
    sqlx::query_as::<_, Organization>("SELECT * FROM organizations WHERE name = $1")
        .bind(name)
        .fetch_optional(pool)
        .await
}

pub async fn update(
    pool: &PgPool,
    id: Uuid,
    name: &str,
    description: &str,
) -> Result<Organization, sqlx::Error> {
    sqlx::query_as::<_, Organization>(
        "UPDATE organizations SET name = $2, description = $3 WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(name)
    .bind(description)
    .fetch_one(pool)
    .await
}

/// Rename a user's self organization so it keeps the user's pseudo. Keyed
/// on self_user_id, not name: a rename of the organization itself does not
/// detach it, and an unrelated organization holding the old name is never
/// touched. Returns None when the user has no self organization.
pub async fn rename_self_org<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    self_user_id: Uuid,
    name: &str,
) -> Result<Option<Organization>, sqlx::Error> {
    sqlx::query_as::<_, Organization>(
        "UPDATE organizations SET name = $2 WHERE self_user_id = $1 RETURNING *",
    )
    .bind(self_user_id)
    .bind(name)
    .fetch_optional(executor)
    .await
}
