use axum::Json;
use axum::extract::{Path, State};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::db;
use crate::error::AppError;
use crate::models::{OrganizationMember, User};
use crate::routes::is_valid_email;
use crate::state::SharedState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUser {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub full_name: String,
}

pub async fn get(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<User>, AppError> {
    let user = db::users::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    Ok(Json(user))
}

pub async fn get_by_name(
    State(state): State<SharedState>,
    Path(name): Path<String>,
) -> Result<Json<User>, AppError> {
    let user = db::users::find_by_name(&state.pool, &name)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    Ok(Json(user))
}

/// Every organization membership of a user, their self organization included.
pub async fn memberships(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<OrganizationMember>>, AppError> {
    db::users::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let members = db::organization_members::list_by_user(&state.pool, id).await?;
    Ok(Json(members))
}

/// Users update themselves only. A rename also renames the user's self
/// organization, in the same transaction.
pub async fn update(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateUser>,
) -> Result<Json<User>, AppError> {
    if id != auth.user_id {
        return Err(AppError::Forbidden(
            "can only update self, not others".to_string(),
        ));
    }
    if !is_valid_email(&req.email) {
        return Err(AppError::BadRequest(format!(
            "\"{}\" is not a valid email address",
            req.email
        )));
    }
    if req.name.is_empty() {
        return Err(AppError::BadRequest("Invalid name".to_string()));
    }

    let user = db::users::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let conflict = |e: sqlx::Error| match e {
        sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
            AppError::Conflict("A user with this email or name already exists".to_string())
        }
        _ => AppError::Database(e),
    };

    if user.name == req.name {
        let updated = db::users::update(&state.pool, id, &req.name, &req.email, &req.full_name)
            .await
            .map_err(conflict)?;
        return Ok(Json(updated));
    }

    let mut tx = state.pool.begin().await?;
    db::organizations::rename_self_org(&mut *tx, id, &req.name)
        .await
        .map_err(conflict)?;
    let updated = db::users::update(&mut *tx, id, &req.name, &req.email, &req.full_name)
        .await
        .map_err(conflict)?;
    tx.commit().await?;

    Ok(Json(updated))
}
