use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use sea_orm::*;
use tracing::instrument;

use crate::entity::comment;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::handlers::blog::{find_blog, require_visible};
use crate::models::blog::cover_url;
use crate::models::comment::*;
use crate::models::shared::truthy_str;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/blogs/{id}/comments",
    tag = "Comments",
    operation_id = "listComments",
    summary = "List published comments of a blog",
    description = "Returns the published comments of a blog in creation order, wrapped as `{\"data\": [...]}`. The blog itself must be visible to the caller.",
    params(("id" = i32, Path, description = "Blog ID")),
    responses(
        (status = 200, description = "Published comments", body = CommentListResponse),
        (status = 403, description = "Blog is unpublished and not owned by the caller (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Blog not found (NOT_FOUND)", body = ErrorBody),
    ),
    security((), ("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn list_comments(
    auth_user: Option<AuthUser>,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<CommentListResponse>, AppError> {
    let parent = find_blog(&state.db, id).await?;
    require_visible(&parent, auth_user.as_ref())?;

    let cover = cover_url(parent.cover_image.as_deref(), &state.config.storage);
    let data = comment::find_all_published_for_blog(&state.db, id)
        .await?
        .into_iter()
        .map(|c| CommentResponse::new(c, cover.clone()))
        .collect();

    Ok(Json(CommentListResponse { data }))
}

#[utoipa::path(
    post,
    path = "/blogs/{id}/comments",
    tag = "Comments",
    operation_id = "createComment",
    summary = "Comment on a blog",
    description = "Creates an unpublished comment owned by the caller. The parent blog must be published or owned by the caller.",
    params(("id" = i32, Path, description = "Blog ID")),
    request_body = CreateCommentRequest,
    responses(
        (status = 201, description = "Comment created", body = CommentResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID, TOKEN_REVOKED)", body = ErrorBody),
        (status = 403, description = "Blog is unpublished and not owned by the caller (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Blog not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn create_comment(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<CreateCommentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let new_comment = validate_create_comment(payload)?;

    let parent = find_blog(&state.db, id).await?;
    require_visible(&parent, Some(&auth_user))?;

    let now = chrono::Utc::now();
    let model = comment::ActiveModel {
        content: Set(new_comment.content),
        author: Set(new_comment.author),
        is_publish: Set(false),
        blog_id: Set(id),
        user_id: Set(Some(auth_user.user_id)),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    tracing::info!(blog_id = id, comment_id = model.id, "Comment created");
    let cover = cover_url(parent.cover_image.as_deref(), &state.config.storage);
    Ok((StatusCode::CREATED, Json(CommentResponse::new(model, cover))))
}

#[utoipa::path(
    get,
    path = "/blogs/{id}/comments/{comment_id}",
    tag = "Comments",
    operation_id = "getComment",
    summary = "Get a comment",
    description = "Published comments are visible to everyone who can see the blog. An unpublished comment is visible only to its owner.",
    params(
        ("id" = i32, Path, description = "Blog ID"),
        ("comment_id" = i32, Path, description = "Comment ID"),
    ),
    responses(
        (status = 200, description = "Comment details", body = CommentResponse),
        (status = 401, description = "A token was sent but is invalid or revoked", body = ErrorBody),
        (status = 403, description = "Not visible to the caller (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Blog or comment not found (NOT_FOUND)", body = ErrorBody),
    ),
    security((), ("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn get_comment(
    auth_user: Option<AuthUser>,
    State(state): State<AppState>,
    Path((id, comment_id)): Path<(i32, i32)>,
) -> Result<Json<CommentResponse>, AppError> {
    let parent = find_blog(&state.db, id).await?;
    require_visible(&parent, auth_user.as_ref())?;

    let model = find_comment(&state.db, id, comment_id).await?;
    if !model.is_publish {
        match auth_user.as_ref() {
            Some(user) => user.require_owner(model.user_id)?,
            None => return Err(AppError::PermissionDenied),
        }
    }

    let cover = cover_url(parent.cover_image.as_deref(), &state.config.storage);
    Ok(Json(CommentResponse::new(model, cover)))
}

#[utoipa::path(
    patch,
    path = "/blogs/{id}/comments/{comment_id}",
    tag = "Comments",
    operation_id = "updateComment",
    summary = "Update a comment",
    description = "Partially updates a comment owned by the caller. Empty strings leave the stored value untouched.",
    params(
        ("id" = i32, Path, description = "Blog ID"),
        ("comment_id" = i32, Path, description = "Comment ID"),
    ),
    request_body = UpdateCommentRequest,
    responses(
        (status = 200, description = "Comment updated", body = CommentResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID, TOKEN_REVOKED)", body = ErrorBody),
        (status = 403, description = "Not the owner (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Blog or comment not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn update_comment(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((id, comment_id)): Path<(i32, i32)>,
    AppJson(payload): AppJson<UpdateCommentRequest>,
) -> Result<Json<CommentResponse>, AppError> {
    let changes = validate_update_comment(payload)?;

    let parent = find_blog(&state.db, id).await?;
    let existing = find_comment(&state.db, id, comment_id).await?;
    auth_user.require_owner(existing.user_id)?;

    let mut active: comment::ActiveModel = existing.into();
    if let Some(content) = truthy_str(changes.content) {
        active.content = Set(content);
    }
    if let Some(author) = truthy_str(changes.author) {
        active.author = Set(Some(author));
    }
    active.updated_at = Set(chrono::Utc::now());
    let model = active.update(&state.db).await?;

    let cover = cover_url(parent.cover_image.as_deref(), &state.config.storage);
    Ok(Json(CommentResponse::new(model, cover)))
}

#[utoipa::path(
    delete,
    path = "/blogs/{id}/comments/{comment_id}",
    tag = "Comments",
    operation_id = "deleteComment",
    summary = "Delete a comment",
    params(
        ("id" = i32, Path, description = "Blog ID"),
        ("comment_id" = i32, Path, description = "Comment ID"),
    ),
    responses(
        (status = 204, description = "Comment deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID, TOKEN_REVOKED)", body = ErrorBody),
        (status = 403, description = "Not the owner (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Blog or comment not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn delete_comment(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((id, comment_id)): Path<(i32, i32)>,
) -> Result<impl IntoResponse, AppError> {
    let existing = find_comment(&state.db, id, comment_id).await?;
    auth_user.require_owner(existing.user_id)?;

    comment::Entity::delete_by_id(comment_id)
        .exec(&state.db)
        .await?;

    tracing::info!(blog_id = id, comment_id, "Comment deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    put,
    path = "/blogs/{id}/comments/{comment_id}/publish",
    tag = "Comments",
    operation_id = "publishComment",
    summary = "Publish a comment",
    description = "Idempotent.",
    params(
        ("id" = i32, Path, description = "Blog ID"),
        ("comment_id" = i32, Path, description = "Comment ID"),
    ),
    responses(
        (status = 204, description = "Comment published"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID, TOKEN_REVOKED)", body = ErrorBody),
        (status = 403, description = "Not the owner (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Blog or comment not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn publish_comment(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((id, comment_id)): Path<(i32, i32)>,
) -> Result<impl IntoResponse, AppError> {
    set_published(&state.db, &auth_user, id, comment_id, true).await
}

#[utoipa::path(
    delete,
    path = "/blogs/{id}/comments/{comment_id}/publish",
    tag = "Comments",
    operation_id = "unpublishComment",
    summary = "Unpublish a comment",
    description = "Idempotent.",
    params(
        ("id" = i32, Path, description = "Blog ID"),
        ("comment_id" = i32, Path, description = "Comment ID"),
    ),
    responses(
        (status = 204, description = "Comment unpublished"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID, TOKEN_REVOKED)", body = ErrorBody),
        (status = 403, description = "Not the owner (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Blog or comment not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn unpublish_comment(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((id, comment_id)): Path<(i32, i32)>,
) -> Result<impl IntoResponse, AppError> {
    set_published(&state.db, &auth_user, id, comment_id, false).await
}

async fn set_published(
    db: &DatabaseConnection,
    auth_user: &AuthUser,
    blog_id: i32,
    comment_id: i32,
    value: bool,
) -> Result<StatusCode, AppError> {
    let existing = find_comment(db, blog_id, comment_id).await?;
    auth_user.require_owner(existing.user_id)?;

    let mut active: comment::ActiveModel = existing.into();
    active.is_publish = Set(value);
    active.updated_at = Set(chrono::Utc::now());
    active.update(db).await?;

    Ok(StatusCode::NO_CONTENT)
}

async fn find_comment<C: ConnectionTrait>(
    db: &C,
    blog_id: i32,
    comment_id: i32,
) -> Result<comment::Model, AppError> {
    comment::find_by_id_for_blog(db, blog_id, comment_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Comment not found".into()))
}
