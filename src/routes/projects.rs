use axum::Json;
use axum::extract::{Path, State};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::db;
use crate::error::AppError;
use crate::models::Project;
use crate::permissions::assert_org_perm;
use crate::state::SharedState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProject {
    pub organization_id: Uuid,
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Deserialize)]
pub struct UpdateProject {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

fn conflict_on_unique(e: sqlx::Error) -> AppError {
    match e {
        sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => AppError::Conflict(
            "A project with this code already exists in the organization".to_string(),
        ),
        _ => AppError::Database(e),
    }
}

pub async fn create(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<CreateProject>,
) -> Result<Json<Project>, AppError> {
    if req.code.is_empty() || req.name.is_empty() {
        return Err(AppError::BadRequest(
            "Project code and name are required".to_string(),
        ));
    }

    assert_org_perm(
        &state.pool,
        Some(auth.user_id),
        auth.perms,
        req.organization_id,
        "project.create",
    )
    .await?;

    let project = db::projects::create(
        &state.pool,
        req.organization_id,
        &req.code,
        &req.name,
        &req.description,
    )
    .await
    .map_err(conflict_on_unique)?;

    Ok(Json(project))
}

pub async fn get(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Project>, AppError> {
    let project = db::projects::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;
    Ok(Json(project))
}

pub async fn list_by_organization(
    State(state): State<SharedState>,
    Path(organization_id): Path<Uuid>,
) -> Result<Json<Vec<Project>>, AppError> {
    let projects = db::projects::list_by_organization(&state.pool, organization_id).await?;
    Ok(Json(projects))
}

pub async fn update(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateProject>,
) -> Result<Json<Project>, AppError> {
    let project = db::projects::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;

    assert_org_perm(
        &state.pool,
        Some(auth.user_id),
        auth.perms,
        project.organization_id,
        "project.update",
    )
    .await?;

    let project = db::projects::update(&state.pool, id, &req.code, &req.name, &req.description)
        .await
        .map_err(conflict_on_unique)?;

    Ok(Json(project))
}

pub async fn delete(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let project = db::projects::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;

    assert_org_perm(
        &state.pool,
        Some(auth.user_id),
        auth.perms,
        project.organization_id,
        "project.delete",
    )
    .await?;

    db::projects::delete(&state.pool, id).await?;

    Ok(Json(serde_json::json!({ "message": "Deleted" })))
}
