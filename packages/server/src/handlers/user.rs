use axum::Json;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use sea_orm::*;
use tracing::instrument;

use crate::entity::{blog, user};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::blog::{BlogListResponse, UserBlogsQuery};
use crate::models::shared::{AVATAR_FOLDER, FieldValidator};
use crate::models::user::*;
use crate::state::AppState;
use crate::utils::upload::read_image_field;
use crate::utils::{hash, jwt};

#[utoipa::path(
    post,
    path = "/users",
    tag = "Users",
    operation_id = "registerUser",
    summary = "Register a new account",
    description = "Creates an inactive account. An activation link is issued; the account cannot log in until it is followed.",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = UserResponse),
        (status = 400, description = "Validation error or username/e-mail already taken (VALIDATION_ERROR)", body = ErrorBody),
        (status = 409, description = "Lost a race with a concurrent registration (CONFLICT)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let new_user = validate_register_request(payload)?;

    let mut v = FieldValidator::new();
    if user::find_by_username(&state.db, &new_user.username)
        .await?
        .is_some()
    {
        v.add("username", "Username is already taken.");
    }
    if user::find_by_email(&state.db, &new_user.email)
        .await?
        .is_some()
    {
        v.add("email", "Email is already registered.");
    }
    v.finish()?;

    let hash = hash::hash_password(&new_user.password)
        .map_err(|e| AppError::Internal(format!("Password hash error: {}", e)))?;

    let now = chrono::Utc::now();
    let model = user::ActiveModel {
        username: Set(new_user.username),
        email: Set(new_user.email),
        password: Set(hash),
        is_active: Set(false),
        avatar_image: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&state.db)
    .await
    .map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            tracing::debug!("Registration race: unique constraint caught on insert");
            AppError::Conflict("Username or email is already registered".into())
        }
        _ => AppError::from(e),
    })?;

    let auth = &state.config.auth;
    let token = jwt::sign_activation(&model.email, auth.activation_token_ttl_secs, &auth.jwt_secret)
        .map_err(|e| AppError::Internal(format!("Token signing error: {}", e)))?;
    let link = format!(
        "{}/users/activate/{}",
        state.config.storage.public_url.trim_end_matches('/'),
        token
    );
    tracing::info!(user_id = model.id, %link, "Account registered, activation link issued");

    Ok((
        StatusCode::CREATED,
        Json(UserResponse::private(model, &state.config.storage)),
    ))
}

#[utoipa::path(
    get,
    path = "/users/{username}",
    tag = "Users",
    operation_id = "getUser",
    summary = "Get a user profile",
    description = "The e-mail address is only included when the caller is the user themself.",
    params(("username" = String, Path, description = "Username")),
    responses(
        (status = 200, description = "User profile", body = UserResponse),
        (status = 401, description = "A token was sent but is invalid or revoked", body = ErrorBody),
        (status = 404, description = "User not found (NOT_FOUND)", body = ErrorBody),
    ),
    security((), ("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn get_user(
    auth_user: Option<AuthUser>,
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<UserResponse>, AppError> {
    let model = find_user_by_username(&state.db, &username).await?;
    let storage = &state.config.storage;

    let res = match auth_user {
        Some(ref u) if u.user_id == model.id => UserResponse::private(model, storage),
        _ => UserResponse::public(model, storage),
    };
    Ok(Json(res))
}

#[utoipa::path(
    get,
    path = "/me",
    tag = "Users",
    operation_id = "getCurrentUser",
    summary = "Get the current user",
    responses(
        (status = 200, description = "Current user profile", body = UserResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID, TOKEN_REVOKED)", body = ErrorBody),
        (status = 404, description = "Account no longer exists (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn me(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<UserResponse>, AppError> {
    let model = find_user(&state.db, auth_user.user_id).await?;
    Ok(Json(UserResponse::private(model, &state.config.storage)))
}

#[utoipa::path(
    get,
    path = "/users/{username}/blogs",
    tag = "Users",
    operation_id = "listUserBlogs",
    summary = "List a user's blogs",
    description = "The owner may ask for `private` or `all` blogs; everyone else always gets the published ones.",
    params(
        ("username" = String, Path, description = "Username"),
        UserBlogsQuery,
    ),
    responses(
        (status = 200, description = "Blogs of the user", body = BlogListResponse),
        (status = 401, description = "A token was sent but is invalid or revoked", body = ErrorBody),
        (status = 404, description = "User not found (NOT_FOUND)", body = ErrorBody),
    ),
    security((), ("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query))]
pub async fn list_user_blogs(
    auth_user: Option<AuthUser>,
    State(state): State<AppState>,
    Path(username): Path<String>,
    Query(query): Query<UserBlogsQuery>,
) -> Result<Json<BlogListResponse>, AppError> {
    let owner = find_user_by_username(&state.db, &username).await?;

    let visibility = match auth_user {
        Some(ref u) if u.user_id == owner.id => {
            blog::Visibility::from_query(query.visibility.as_deref())
        }
        _ => blog::Visibility::Public,
    };

    let rows = blog::find_all_by_user(&state.db, owner.id, visibility).await?;
    Ok(Json(BlogListResponse::new(rows, &state.config.storage)))
}

#[utoipa::path(
    get,
    path = "/users/activate/{token}",
    tag = "Users",
    operation_id = "activateUser",
    summary = "Activate an account",
    description = "Follows the activation link issued at registration.",
    params(("token" = String, Path, description = "Activation token")),
    responses(
        (status = 204, description = "Account activated"),
        (status = 400, description = "Link invalid, expired or already used (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "No account for this link (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, token))]
pub async fn activate(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let claims = jwt::verify(&token, jwt::TokenKind::Activation, &state.config.auth.jwt_secret)
        .map_err(|e| {
            tracing::debug!("Rejected activation token: {}", e);
            AppError::Validation("Activation link is invalid or has expired".into())
        })?;

    let model = user::find_by_email(&state.db, &claims.sub)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    if model.is_active {
        return Err(AppError::Validation("Account is already activated".into()));
    }

    let user_id = model.id;
    let mut active: user::ActiveModel = model.into();
    active.is_active = Set(true);
    active.updated_at = Set(chrono::Utc::now());
    active.update(&state.db).await?;

    tracing::info!(user_id, "Account activated");
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    put,
    path = "/users/avatar",
    tag = "Users",
    operation_id = "uploadAvatar",
    summary = "Upload an avatar",
    description = "Replaces the caller's avatar. The multipart field `avatar` must be a jpg, jpe, jpeg, png, gif, svg or bmp file.",
    request_body(content_type = "multipart/form-data", description = "Image in the `avatar` field"),
    responses(
        (status = 200, description = "Avatar stored", body = AvatarResponse),
        (status = 400, description = "Missing file or type not allowed (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID, TOKEN_REVOKED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(user_id = auth_user.user_id))]
pub async fn upload_avatar(
    auth_user: AuthUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<AvatarResponse>, AppError> {
    let image = read_image_field(
        &mut multipart,
        "avatar",
        state.config.storage.max_upload_size,
    )
    .await?;

    let existing = find_user(&state.db, auth_user.user_id).await?;

    if let Some(old) = existing.avatar_image.as_deref()
        && let Err(e) = state.images.delete(AVATAR_FOLDER, old).await
    {
        tracing::warn!(filename = old, "Failed to remove old avatar: {}", e);
    }

    let filename = state
        .images
        .save(AVATAR_FOLDER, &image.extension, &image.bytes)
        .await?;

    let mut active: user::ActiveModel = existing.into();
    active.avatar_image = Set(Some(filename));
    active.updated_at = Set(chrono::Utc::now());
    let model = active.update(&state.db).await?;

    Ok(Json(AvatarResponse {
        avatar_url: avatar_url(model.avatar_image.as_deref(), &state.config.storage),
    }))
}

async fn find_user<C: ConnectionTrait>(db: &C, id: i32) -> Result<user::Model, AppError> {
    user::find_by_id(db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))
}

async fn find_user_by_username<C: ConnectionTrait>(
    db: &C,
    username: &str,
) -> Result<user::Model, AppError> {
    user::find_by_username(db, username)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))
}
