use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;

use crate::domain::user::Identity;
use crate::http::AppError;
use crate::AppState;

/// Authenticated caller. Rejects with 401.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Identity);

/// Caller for anonymous-friendly reads. A missing header is anonymous; a
/// bad token is still rejected.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<Identity>);

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::unauthorized("missing Authorization header"))?;

        resolve_identity(auth_header, state).await.map(AuthUser)
    }
}

#[axum::async_trait]
impl FromRequestParts<AppState> for MaybeAuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = match parts.headers.get(header::AUTHORIZATION) {
            Some(value) => value
                .to_str()
                .map_err(|_| AppError::unauthorized("invalid Authorization header"))?,
            None => return Ok(MaybeAuthUser(None)),
        };

        resolve_identity(auth_header, state)
            .await
            .map(|identity| MaybeAuthUser(Some(identity)))
    }
}

async fn resolve_identity(auth_header: &str, state: &AppState) -> Result<Identity, AppError> {
    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::unauthorized("invalid Authorization header"))?;

    let session = state
        .auth_service()
        .authenticate_access_token(token)
        .map_err(|err| {
            tracing::error!(error = ?err, "failed to authenticate");
            AppError::internal("failed to authenticate")
        })?
        .ok_or_else(|| AppError::unauthorized("invalid token"))?;

    state
        .users
        .find_user(session.user_id)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, user_id = session.user_id, "failed to load user");
            AppError::internal("failed to authenticate")
        })?
        .ok_or_else(|| AppError::unauthorized("unknown user"))
}
