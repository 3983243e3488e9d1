use axum::Json;
use axum::extract::{Path, State};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::extractor::{AuthUser, OptionalAuthUser};
use crate::db;
use crate::error::AppError;
use crate::models::Organization;
use crate::permissions::assert_org_perm;
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct CreateOrganization {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Deserialize)]
pub struct UpdateOrganization {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Creating an organization makes the creator its first "admin" member.
pub async fn create(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<CreateOrganization>,
) -> Result<Json<Organization>, AppError> {
    if req.name.is_empty() {
        return Err(AppError::BadRequest("Invalid organization name".to_string()));
    }

    let mut tx = state.pool.begin().await?;

    let organization = db::organizations::create(&mut *tx, &req.name, &req.description, None)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict("An organization with this name already exists".to_string())
            }
            _ => AppError::Database(e),
        })?;

    db::organization_members::create(
        &mut *tx,
        organization.id,
        auth.user_id,
        &["admin".to_string()],
    )
    .await?;

    tx.commit().await?;

    tracing::info!(org = %organization.name, "organization created");
    Ok(Json(organization))
}

pub async fn get(
    auth: OptionalAuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Organization>, AppError> {
    assert_org_perm(&state.pool, auth.user_id, auth.perms, id, "org.read").await?;

    let organization = db::organizations::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Organization not found".to_string()))?;
    Ok(Json(organization))
}

pub async fn get_by_name(
    State(state): State<SharedState>,
    Path(name): Path<String>,
) -> Result<Json<Organization>, AppError> {
    let organization = db::organizations::find_by_name(&state.pool, &name)
        .await?
        .ok_or_else(|| AppError::NotFound("Organization not found".to_string()))?;
    Ok(Json(organization))
}

pub async fn update(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateOrganization>,
) -> Result<Json<Organization>, AppError> {
    assert_org_perm(&state.pool, Some(auth.user_id), auth.perms, id, "org.update").await?;

    let organization = db::organizations::update(&state.pool, id, &req.name, &req.description)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => AppError::NotFound("Organization not found".to_string()),
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict("An organization with this name already exists".to_string())
            }
            _ => AppError::Database(e),
        })?;

    Ok(Json(organization))
}
