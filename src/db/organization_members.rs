use sqlx::PgPool;
use uuid::Uuid;

use crate::models::OrganizationMember;

pub async fn create<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    organization_id: Uuid,
    user_id: Uuid,
    roles: &[String],
) -> Result<OrganizationMember, sqlx::Error> {
    sqlx::query_as::<_, OrganizationMember>(
        "INSERT INTO organization_members (organization_id, user_id, roles)
         VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(organization_id)
    .bind(user_id)
    .bind(roles)
    .fetch_one(executor)
    .await
}

pub async fn find_by_id<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    id: Uuid,
) -> Result<Option<OrganizationMember>, sqlx::Error> {
    sqlx::query_as::<_, OrganizationMember>("SELECT * FROM organization_members WHERE id = $1")
        .bind(id)
        .fetch_optional(executor)
        .await
}

pub async fn find_by_org_and_user(
    pool: &PgPool,
    organization_id: Uuid,
    user_id: Uuid,
) -> Result<Option<OrganizationMember>, sqlx::Error> {
    sqlx::query_as::<_, OrganizationMember>(
        "SELECT * FROM organization_members WHERE organization_id = $1 AND user_id = $2",
    )
    .bind(organization_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

pub async fn list_by_organization(
    pool: &PgPool,
    organization_id: Uuid,
) -> Result<Vec<OrganizationMember>, sqlx::Error> {
    sqlx::query_as::<_, OrganizationMember>(
        "SELECT * FROM organization_members WHERE organization_id = $1 ORDER BY id",
    )
    .bind(organization_id)
    .fetch_all(pool)
    .await
}

/// All memberships of a user, i.e. the organizations they are involved in.
pub async fn list_by_user(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Vec<OrganizationMember>, sqlx::Error> {
    sqlx::query_as::<_, OrganizationMember>(
        "SELECT * FROM organization_members WHERE user_id = $1 ORDER BY id",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn update_roles<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    id: Uuid,
    roles: &[String],
) -> Result<OrganizationMember, sqlx::Error> {
    sqlx::query_as::<_, OrganizationMember>(
        "UPDATE organization_members SET roles = $2 WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(roles)
    .fetch_one(executor)
    .await
}

pub async fn delete<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    id: Uuid,
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM organization_members WHERE id = $1")
        .bind(id)
        .execute(executor)
        .await?;
    Ok(())
}

/// Number of members of the organization holding `role`. Takes row locks on
/// the counted members: callers run inside a transaction, and two demotions
/// racing on the same organization must not both observe the pre-race count.
pub async fn count_with_role<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    organization_id: Uuid,
    role: &str,
) -> Result<i64, sqlx::Error> {
    let row: (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM (
             SELECT id FROM organization_members
             WHERE organization_id = $1 AND $2 = ANY(roles)
             FOR UPDATE
         ) AS held",
    )
    .bind(organization_id)
    .bind(role)
    .fetch_one(executor)
    .await?;
    Ok(row.0)
}
