use axum::extract::{FromRequestParts, OptionalFromRequestParts};
use axum::http::{header, request::Parts};

use crate::error::AppError;
use crate::state::AppState;
use crate::utils::jwt::{self, Claims, TokenKind};

/// Authenticated user extracted from the `Authorization: Bearer <token>` header.
///
/// Add this as a handler parameter to require an access token. Use
/// `Option<AuthUser>` where identity is optional: a missing header yields
/// `None`, but a present and invalid or revoked token is still rejected.
pub struct AuthUser {
    pub user_id: i32,
    pub jti: String,
    /// Token expiry (unix seconds), kept so revocations can expire with it.
    pub exp: i64,
}

impl AuthUser {
    /// Returns `Ok(())` if this user owns a record with the given owner id.
    pub fn require_owner(&self, owner_id: Option<i32>) -> Result<(), AppError> {
        if owner_id == Some(self.user_id) {
            Ok(())
        } else {
            tracing::debug!(user_id = self.user_id, ?owner_id, "Ownership check failed");
            Err(AppError::PermissionDenied)
        }
    }
}

/// Holder of a valid refresh token, accepted only by the token refresh endpoint.
pub struct RefreshUser {
    pub user_id: i32,
}

fn bearer_token(parts: &Parts) -> Option<Result<&str, AppError>> {
    let value = parts.headers.get(header::AUTHORIZATION)?;
    Some(
        value
            .to_str()
            .ok()
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .ok_or(AppError::TokenInvalid),
    )
}

/// Verify a bearer token of `kind` and check it against the revocation list.
fn authenticate(token: &str, kind: TokenKind, state: &AppState) -> Result<Claims, AppError> {
    let claims = jwt::verify(token, kind, &state.config.auth.jwt_secret).map_err(|e| {
        tracing::debug!("Rejected bearer token: {}", e);
        AppError::TokenInvalid
    })?;

    if state.revoked.is_revoked(&claims.jti) {
        return Err(AppError::TokenRevoked);
    }
    Ok(claims)
}

impl TryFrom<Claims> for AuthUser {
    type Error = AppError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        Ok(AuthUser {
            user_id: claims.user_id().map_err(|_| AppError::TokenInvalid)?,
            jti: claims.jti,
            exp: claims.exp,
        })
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or(AppError::TokenMissing)??;
        authenticate(token, TokenKind::Access, state)?.try_into()
    }
}

impl OptionalFromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Option<Self>, Self::Rejection> {
        match bearer_token(parts) {
            None => Ok(None),
            Some(token) => {
                let claims = authenticate(token?, TokenKind::Access, state)?;
                Ok(Some(claims.try_into()?))
            }
        }
    }
}

impl FromRequestParts<AppState> for RefreshUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or(AppError::TokenMissing)??;
        let claims = authenticate(token, TokenKind::Refresh, state)?;
        Ok(RefreshUser {
            user_id: claims.user_id().map_err(|_| AppError::TokenInvalid)?,
        })
    }
}
