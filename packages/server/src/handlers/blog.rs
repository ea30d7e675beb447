use axum::Json;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use sea_orm::*;
use tracing::instrument;

use crate::config::StorageConfig;
use crate::entity::{blog, comment, user};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::blog::*;
use crate::models::shared::{BLOG_COVER_FOLDER, truthy_int, truthy_str};
use crate::state::AppState;
use crate::utils::upload::read_image_field;

#[utoipa::path(
    get,
    path = "/blogs",
    tag = "Blogs",
    operation_id = "listBlogs",
    summary = "List published blogs",
    description = "Returns every published blog in creation order, wrapped as `{\"data\": [...]}`. No authentication required.",
    responses(
        (status = 200, description = "Published blogs", body = BlogListResponse),
    ),
)]
#[instrument(skip(state))]
pub async fn list_blogs(State(state): State<AppState>) -> Result<Json<BlogListResponse>, AppError> {
    let rows = blog::find_all_published(&state.db).await?;
    Ok(Json(BlogListResponse::new(rows, &state.config.storage)))
}

#[utoipa::path(
    post,
    path = "/blogs",
    tag = "Blogs",
    operation_id = "createBlog",
    summary = "Create a blog",
    description = "Creates an unpublished blog owned by the caller.",
    request_body = CreateBlogRequest,
    responses(
        (status = 201, description = "Blog created", body = BlogResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID, TOKEN_REVOKED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn create_blog(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateBlogRequest>,
) -> Result<impl IntoResponse, AppError> {
    let new_blog = validate_create_blog(payload)?;

    let now = chrono::Utc::now();
    let model = blog::ActiveModel {
        blog_title: Set(new_blog.blog_title),
        blog_status: Set(new_blog.blog_status),
        rating: Set(new_blog.rating),
        author: Set(new_blog.author),
        is_publish: Set(false),
        cover_image: Set(None),
        user_id: Set(Some(auth_user.user_id)),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    tracing::info!(blog_id = model.id, "Blog created");
    let body = render_blog(&state.db, model, &state.config.storage).await?;
    Ok((StatusCode::CREATED, Json(body)))
}

#[utoipa::path(
    get,
    path = "/blogs/{id}",
    tag = "Blogs",
    operation_id = "getBlog",
    summary = "Get a blog by ID",
    description = "Published blogs are visible to everyone. An unpublished blog is visible only to its owner; authentication is optional and used only for that check.",
    params(("id" = i32, Path, description = "Blog ID")),
    responses(
        (status = 200, description = "Blog details", body = BlogResponse),
        (status = 401, description = "A token was sent but is invalid or revoked", body = ErrorBody),
        (status = 403, description = "Unpublished and not owned by the caller (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Blog not found (NOT_FOUND)", body = ErrorBody),
    ),
    security((), ("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn get_blog(
    auth_user: Option<AuthUser>,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<BlogResponse>, AppError> {
    let model = find_blog(&state.db, id).await?;
    require_visible(&model, auth_user.as_ref())?;
    Ok(Json(
        render_blog(&state.db, model, &state.config.storage).await?,
    ))
}

#[utoipa::path(
    patch,
    path = "/blogs/{id}",
    tag = "Blogs",
    operation_id = "updateBlog",
    summary = "Update a blog",
    description = "Partially updates a blog owned by the caller. A field is only overwritten when the new value is non-empty and non-zero; empty strings and zero leave the stored value untouched.",
    params(("id" = i32, Path, description = "Blog ID")),
    request_body = UpdateBlogRequest,
    responses(
        (status = 200, description = "Blog updated", body = BlogResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID, TOKEN_REVOKED)", body = ErrorBody),
        (status = 403, description = "Not the owner (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Blog not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn update_blog(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateBlogRequest>,
) -> Result<Json<BlogResponse>, AppError> {
    let changes = validate_update_blog(payload)?;

    let existing = find_blog(&state.db, id).await?;
    auth_user.require_owner(existing.user_id)?;

    let mut active: blog::ActiveModel = existing.into();
    if let Some(title) = truthy_str(changes.blog_title) {
        active.blog_title = Set(title);
    }
    if let Some(status) = truthy_str(changes.blog_status) {
        active.blog_status = Set(Some(status));
    }
    if let Some(rating) = truthy_int(changes.rating) {
        active.rating = Set(Some(rating));
    }
    if let Some(author) = truthy_str(changes.author) {
        active.author = Set(Some(author));
    }
    active.updated_at = Set(chrono::Utc::now());

    let model = active.update(&state.db).await?;
    Ok(Json(
        render_blog(&state.db, model, &state.config.storage).await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/blogs/{id}",
    tag = "Blogs",
    operation_id = "deleteBlog",
    summary = "Delete a blog",
    description = "Permanently deletes a blog owned by the caller together with its comments.",
    params(("id" = i32, Path, description = "Blog ID")),
    responses(
        (status = 204, description = "Blog deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID, TOKEN_REVOKED)", body = ErrorBody),
        (status = 403, description = "Not the owner (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Blog not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn delete_blog(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let existing = find_blog(&state.db, id).await?;
    auth_user.require_owner(existing.user_id)?;

    let txn = state.db.begin().await?;
    comment::Entity::delete_many()
        .filter(comment::Column::BlogId.eq(id))
        .exec(&txn)
        .await?;
    blog::Entity::delete_by_id(id).exec(&txn).await?;
    txn.commit().await?;

    if let Some(filename) = existing.cover_image.as_deref() {
        remove_cover_file(&state, filename).await;
    }

    tracing::info!(blog_id = id, "Blog deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    put,
    path = "/blogs/{id}/publish",
    tag = "Blogs",
    operation_id = "publishBlog",
    summary = "Publish a blog",
    description = "Marks a blog owned by the caller as published. Idempotent.",
    params(("id" = i32, Path, description = "Blog ID")),
    responses(
        (status = 204, description = "Blog published"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID, TOKEN_REVOKED)", body = ErrorBody),
        (status = 403, description = "Not the owner (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Blog not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn publish_blog(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    set_published(&state.db, &auth_user, id, true).await
}

#[utoipa::path(
    delete,
    path = "/blogs/{id}/publish",
    tag = "Blogs",
    operation_id = "unpublishBlog",
    summary = "Unpublish a blog",
    description = "Hides a blog owned by the caller from everyone else. Idempotent.",
    params(("id" = i32, Path, description = "Blog ID")),
    responses(
        (status = 204, description = "Blog unpublished"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID, TOKEN_REVOKED)", body = ErrorBody),
        (status = 403, description = "Not the owner (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Blog not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn unpublish_blog(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    set_published(&state.db, &auth_user, id, false).await
}

#[utoipa::path(
    put,
    path = "/blogs/{id}/cover",
    tag = "Blogs",
    operation_id = "uploadBlogCover",
    summary = "Upload a blog cover image",
    description = "Replaces the cover image of a blog owned by the caller. The multipart field `cover` must be a jpg, jpe, jpeg, png, gif, svg or bmp file. The previous cover file is removed.",
    params(("id" = i32, Path, description = "Blog ID")),
    request_body(content_type = "multipart/form-data", description = "Image in the `cover` field"),
    responses(
        (status = 200, description = "Cover stored", body = BlogCoverResponse),
        (status = 400, description = "Missing file or type not allowed (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID, TOKEN_REVOKED)", body = ErrorBody),
        (status = 403, description = "Not the owner (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Blog not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(user_id = auth_user.user_id))]
pub async fn upload_cover(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    mut multipart: Multipart,
) -> Result<Json<BlogCoverResponse>, AppError> {
    let image = read_image_field(
        &mut multipart,
        "cover",
        state.config.storage.max_upload_size,
    )
    .await?;

    let existing = find_blog(&state.db, id).await?;
    auth_user.require_owner(existing.user_id)?;

    if let Some(old) = existing.cover_image.as_deref() {
        remove_cover_file(&state, old).await;
    }

    let filename = state
        .images
        .save(BLOG_COVER_FOLDER, &image.extension, &image.bytes)
        .await?;

    let mut active: blog::ActiveModel = existing.into();
    active.cover_image = Set(Some(filename));
    active.updated_at = Set(chrono::Utc::now());
    let model = active.update(&state.db).await?;

    Ok(Json(BlogCoverResponse {
        cover_url: cover_url(model.cover_image.as_deref(), &state.config.storage),
    }))
}

/// Unpublished blogs are only visible to their owner.
pub(crate) fn require_visible(
    model: &blog::Model,
    auth_user: Option<&AuthUser>,
) -> Result<(), AppError> {
    if model.is_publish {
        return Ok(());
    }
    match auth_user {
        Some(user) => user.require_owner(model.user_id),
        None => Err(AppError::PermissionDenied),
    }
}

async fn set_published(
    db: &DatabaseConnection,
    auth_user: &AuthUser,
    id: i32,
    value: bool,
) -> Result<StatusCode, AppError> {
    let existing = find_blog(db, id).await?;
    auth_user.require_owner(existing.user_id)?;

    let mut active: blog::ActiveModel = existing.into();
    active.is_publish = Set(value);
    active.updated_at = Set(chrono::Utc::now());
    active.update(db).await?;

    tracing::info!(blog_id = id, is_publish = value, "Blog publish flag set");
    Ok(StatusCode::NO_CONTENT)
}

/// Best effort: a missing file is fine, other failures are only logged.
async fn remove_cover_file(state: &AppState, filename: &str) {
    match state.images.delete(BLOG_COVER_FOLDER, filename).await {
        Ok(true) => tracing::debug!(filename, "Removed old cover image"),
        Ok(false) => tracing::debug!(filename, "Old cover image already gone"),
        Err(e) => tracing::warn!(filename, "Failed to remove old cover image: {}", e),
    }
}

async fn render_blog<C: ConnectionTrait>(
    db: &C,
    model: blog::Model,
    storage: &StorageConfig,
) -> Result<BlogResponse, AppError> {
    let owner = match model.user_id {
        Some(uid) => user::find_by_id(db, uid).await?,
        None => None,
    };
    Ok(BlogResponse::new(model, owner, storage))
}

pub(crate) async fn find_blog<C: ConnectionTrait>(db: &C, id: i32) -> Result<blog::Model, AppError> {
    blog::find_by_id(db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Blog not found".into()))
}
