use axum::Json;
use axum::extract::{Path, State};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::db;
use crate::error::AppError;
use crate::models::OrganizationMember;
use crate::permissions::{assert_org_perm, check_org_perm};
use crate::state::SharedState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddMember {
    pub user_id: Uuid,
    #[serde(default)]
    pub roles: Vec<String>,
}

#[derive(Deserialize)]
pub struct UpdateMemberRoles {
    pub roles: Vec<String>,
}

fn has_role(roles: &[String], role: &str) -> bool {
    roles.iter().any(|r| r == role)
}

pub async fn list(
    State(state): State<SharedState>,
    Path(organization_id): Path<Uuid>,
) -> Result<Json<Vec<OrganizationMember>>, AppError> {
    db::organizations::find_by_id(&state.pool, organization_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Organization not found".to_string()))?;

    let members = db::organization_members::list_by_organization(&state.pool, organization_id)
        .await?;
    Ok(Json(members))
}

pub async fn add(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(organization_id): Path<Uuid>,
    Json(req): Json<AddMember>,
) -> Result<Json<OrganizationMember>, AppError> {
    let organization = db::organizations::find_by_id(&state.pool, organization_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Organization not found".to_string()))?;

    assert_org_perm(
        &state.pool,
        Some(auth.user_id),
        auth.perms,
        organization_id,
        "orgmember.create",
    )
    .await?;

    // "self" is tied to the organization's self-user linkage
    if has_role(&req.roles, "self") && organization.self_user_id != Some(req.user_id) {
        return Err(AppError::BadRequest(
            "role \"self\" is reserved for the organization's self user".to_string(),
        ));
    }

    let member =
        db::organization_members::create(&state.pool, organization_id, req.user_id, &req.roles)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                    AppError::Conflict(
                        "This user is already a member of the organization".to_string(),
                    )
                }
                sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => {
                    AppError::NotFound("User not found".to_string())
                }
                _ => AppError::Database(e),
            })?;

    Ok(Json(member))
}

pub async fn update(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateMemberRoles>,
) -> Result<Json<OrganizationMember>, AppError> {
    let mut tx = state.pool.begin().await?;

    let member = db::organization_members::find_by_id(&mut *tx, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Member not found".to_string()))?;

    assert_org_perm(
        &state.pool,
        Some(auth.user_id),
        auth.perms,
        member.organization_id,
        "orgmember.update",
    )
    .await?;

    if has_role(&member.roles, "self") != has_role(&req.roles, "self") {
        return Err(AppError::BadRequest(
            "the \"self\" role cannot be added or removed".to_string(),
        ));
    }

    // the last "admin" cannot be demoted
    if has_role(&member.roles, "admin") && !has_role(&req.roles, "admin") {
        let admins =
            db::organization_members::count_with_role(&mut *tx, member.organization_id, "admin")
                .await?;
        if admins <= 1 {
            return Err(AppError::BadRequest(
                "cannot demote the last \"admin\" member of the organization".to_string(),
            ));
        }
    }

    let member = db::organization_members::update_roles(&mut *tx, id, &req.roles).await?;
    tx.commit().await?;

    Ok(Json(member))
}

/// A member may always remove themself; removing others needs
/// orgmember.delete. The "self" member and the last "admin" stay.
pub async fn remove(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<OrganizationMember>, AppError> {
    let mut tx = state.pool.begin().await?;

    let member = db::organization_members::find_by_id(&mut *tx, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Member not found".to_string()))?;

    let self_removal = member.user_id == auth.user_id;
    if !self_removal
        && !check_org_perm(
            &state.pool,
            Some(auth.user_id),
            auth.perms,
            member.organization_id,
            "orgmember.delete",
        )
        .await?
    {
        return Err(AppError::Forbidden(
            "missing org permission: \"orgmember.delete\"".to_string(),
        ));
    }

    if has_role(&member.roles, "self") {
        return Err(AppError::BadRequest(
            "the organization's self member cannot be removed".to_string(),
        ));
    }

    if has_role(&member.roles, "admin") {
        let admins =
            db::organization_members::count_with_role(&mut *tx, member.organization_id, "admin")
                .await?;
        if admins <= 1 {
            return Err(AppError::BadRequest(
                "cannot remove the last \"admin\" member of the organization".to_string(),
            ));
        }
    }

    db::organization_members::delete(&mut *tx, id).await?;
    tx.commit().await?;

    Ok(Json(member))
}
