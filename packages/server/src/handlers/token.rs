use axum::Json;
use axum::extract::State;
use tracing::instrument;

use crate::entity::user;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::{AuthUser, RefreshUser};
use crate::extractors::json::AppJson;
use crate::models::shared::MessageResponse;
use crate::models::token::*;
use crate::state::AppState;
use crate::utils::hash;
use crate::utils::jwt::{self, TokenKind};

#[utoipa::path(
    post,
    path = "/token",
    tag = "Auth",
    operation_id = "login",
    summary = "Log in with e-mail and password",
    description = "Returns a fresh access token and a refresh token. Inactive accounts are refused.",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = TokenResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Wrong e-mail or password (INVALID_CREDENTIALS)", body = ErrorBody),
        (status = 403, description = "Account not activated (ACCOUNT_INACTIVE)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let Credentials { email, password } = validate_login_request(payload)?;

    let model = user::find_by_email(&state.db, &email)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    let is_valid = hash::verify_password(&password, &model.password)
        .map_err(|e| AppError::Internal(format!("Password verify error: {}", e)))?;
    if !is_valid {
        return Err(AppError::InvalidCredentials);
    }

    if !model.is_active {
        return Err(AppError::AccountInactive);
    }

    let auth = &state.config.auth;
    let access_token = jwt::sign(
        model.id,
        TokenKind::Access,
        true,
        auth.access_token_ttl_secs,
        &auth.jwt_secret,
    )
    .map_err(signing_error)?;
    let refresh_token = jwt::sign(
        model.id,
        TokenKind::Refresh,
        false,
        auth.refresh_token_ttl_secs,
        &auth.jwt_secret,
    )
    .map_err(signing_error)?;

    tracing::info!(user_id = model.id, "User logged in");
    Ok(Json(TokenResponse {
        access_token,
        refresh_token,
    }))
}

#[utoipa::path(
    post,
    path = "/refresh",
    tag = "Auth",
    operation_id = "refreshToken",
    summary = "Exchange a refresh token for an access token",
    description = "Send the refresh token as the bearer token. The new access token is not fresh.",
    responses(
        (status = 200, description = "New access token", body = RefreshResponse),
        (status = 401, description = "Missing, invalid or revoked refresh token", body = ErrorBody),
        (status = 403, description = "Account not activated (ACCOUNT_INACTIVE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, refresh_user), fields(user_id = refresh_user.user_id))]
pub async fn refresh(
    refresh_user: RefreshUser,
    State(state): State<AppState>,
) -> Result<Json<RefreshResponse>, AppError> {
    let model = user::find_by_id(&state.db, refresh_user.user_id)
        .await?
        .ok_or(AppError::TokenInvalid)?;
    if !model.is_active {
        return Err(AppError::AccountInactive);
    }

    let auth = &state.config.auth;
    let access_token = jwt::sign(
        model.id,
        TokenKind::Access,
        false,
        auth.access_token_ttl_secs,
        &auth.jwt_secret,
    )
    .map_err(signing_error)?;

    Ok(Json(RefreshResponse { access_token }))
}

#[utoipa::path(
    post,
    path = "/revoke",
    tag = "Auth",
    operation_id = "logout",
    summary = "Revoke the current access token",
    description = "The token used for this request is rejected by every endpoint afterwards.",
    responses(
        (status = 200, description = "Token revoked", body = MessageResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID, TOKEN_REVOKED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn revoke(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Json<MessageResponse> {
    state.revoked.revoke(&auth_user.jti, auth_user.exp);
    tracing::info!("Access token revoked");
    Json(MessageResponse {
        message: "Successfully logged out".into(),
    })
}

fn signing_error(e: jwt::TokenError) -> AppError {
    AppError::Internal(format!("Token signing error: {}", e))
}
