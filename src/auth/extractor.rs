use axum::RequestPartsExt;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::TypedHeader;
use axum_extra::headers::Authorization;
use axum_extra::headers::authorization::Bearer;
use uuid::Uuid;

use crate::auth::jwt;
use crate::error::AppError;
use crate::permissions;
use crate::state::SharedState;

/// Identity established from a verified bearer token. This extractor is the
/// sole gate attaching a user id to a request.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub perms: &'static [&'static str],
}

/// Like [`AuthUser`], but an absent Authorization header yields the
/// anonymous context (no user id, default permission set) instead of a
/// rejection. A header that is present but fails verification still rejects.
#[derive(Debug, Clone)]
pub struct OptionalAuthUser {
    pub user_id: Option<Uuid>,
    pub perms: &'static [&'static str],
}

impl FromRequestParts<SharedState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|_| AppError::Unauthorized("Missing authentication token".to_string()))?;

        let claims = jwt::decode_token(bearer.token(), &state.config.jwt_secret)
            .map_err(|_| AppError::Forbidden("Invalid or expired token".to_string()))?;

        Ok(AuthUser {
            user_id: claims.sub,
            perms: permissions::DEFAULT_PERMS,
        })
    }
}

impl FromRequestParts<SharedState> for OptionalAuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        if parts.headers.get("authorization").is_none() {
            return Ok(OptionalAuthUser {
                user_id: None,
                perms: permissions::DEFAULT_PERMS,
            });
        }

        let auth = AuthUser::from_request_parts(parts, state).await?;
        Ok(OptionalAuthUser {
            user_id: Some(auth.user_id),
            perms: auth.perms,
        })
    }
}
