use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::StorageConfig;
use crate::entity::{blog, user};
use crate::error::AppError;

use super::shared::{BLOG_COVER_FOLDER, DEFAULT_BLOG_COVER, Field, FieldValidator};
use super::user::BlogOwner;

pub const TITLE_MAX: usize = 100;
pub const STATUS_MAX: usize = 700;
pub const AUTHOR_MAX: usize = 100;
pub const RATING_MIN: i32 = 1;
pub const RATING_MAX: i32 = 10;

/// Request body for creating a blog.
///
/// Output-only fields (`id`, `is_publish`, timestamps) are not part of the
/// input shape; if a client sends them they are ignored.
#[derive(Deserialize, Default, utoipa::ToSchema)]
#[serde(default)]
pub struct CreateBlogRequest {
    /// Required, at most 100 characters.
    #[schema(value_type = Option<String>, example = "Morning walk")]
    pub blog_title: Field<String>,
    /// At most 700 characters.
    #[schema(value_type = Option<String>, example = "Went up the hill before sunrise.")]
    pub blog_status: Field<String>,
    /// 1 to 10.
    #[schema(value_type = Option<i32>, example = 8)]
    pub rating: Field<i32>,
    /// Display name shown with the post, at most 100 characters.
    #[schema(value_type = Option<String>, example = "Alice")]
    pub author: Field<String>,
}

/// Request body for updating a blog. Every field is optional.
///
/// Empty strings and zero are accepted but never overwrite stored values.
#[derive(Deserialize, Default, utoipa::ToSchema)]
#[serde(default)]
pub struct UpdateBlogRequest {
    #[schema(value_type = Option<String>)]
    pub blog_title: Field<String>,
    #[schema(value_type = Option<String>)]
    pub blog_status: Field<String>,
    #[schema(value_type = Option<i32>)]
    pub rating: Field<i32>,
    #[schema(value_type = Option<String>)]
    pub author: Field<String>,
}

/// A create request that passed validation.
pub struct NewBlog {
    pub blog_title: String,
    pub blog_status: Option<String>,
    pub rating: Option<i32>,
    pub author: Option<String>,
}

/// Fields of an update request that passed validation.
#[derive(Debug, Default, PartialEq)]
pub struct BlogChanges {
    pub blog_title: Option<String>,
    pub blog_status: Option<String>,
    pub rating: Option<i32>,
    pub author: Option<String>,
}

fn check_fields(
    v: &mut FieldValidator,
    title: &Field<String>,
    status: &Field<String>,
    rating: &Field<i32>,
    author: &Field<String>,
) {
    let title = v.string("blog_title", title);
    v.max_length("blog_title", title, TITLE_MAX);
    let status = v.string("blog_status", status);
    v.max_length("blog_status", status, STATUS_MAX);
    let author = v.string("author", author);
    v.max_length("author", author, AUTHOR_MAX);
    if let Some(n) = v.integer("rating", rating) {
        if n < RATING_MIN {
            v.add("rating", "Rating must be greater than 0.");
        }
        if n > RATING_MAX {
            v.add("rating", "Rating must not be greater than 10.");
        }
    }
}

pub fn validate_create_blog(req: CreateBlogRequest) -> Result<NewBlog, AppError> {
    let mut v = FieldValidator::new();
    v.required("blog_title", &req.blog_title);
    check_fields(
        &mut v,
        &req.blog_title,
        &req.blog_status,
        &req.rating,
        &req.author,
    );
    v.finish()?;

    Ok(NewBlog {
        blog_title: req.blog_title.into_present().unwrap_or_default(),
        blog_status: req.blog_status.into_present(),
        rating: req.rating.into_present(),
        author: req.author.into_present(),
    })
}

pub fn validate_update_blog(req: UpdateBlogRequest) -> Result<BlogChanges, AppError> {
    let mut v = FieldValidator::new();
    check_fields(
        &mut v,
        &req.blog_title,
        &req.blog_status,
        &req.rating,
        &req.author,
    );
    v.finish()?;

    Ok(BlogChanges {
        blog_title: req.blog_title.into_present(),
        blog_status: req.blog_status.into_present(),
        rating: req.rating.into_present(),
        author: req.author.into_present(),
    })
}

/// Absolute cover URL of a blog, falling back to the default cover asset.
pub fn cover_url(cover_image: Option<&str>, storage: &StorageConfig) -> String {
    match cover_image {
        Some(filename) => storage.static_url(&format!("images/{BLOG_COVER_FOLDER}/{filename}")),
        None => storage.static_url(DEFAULT_BLOG_COVER),
    }
}

/// Serialized blog.
#[derive(Serialize, utoipa::ToSchema)]
pub struct BlogResponse {
    pub id: i32,
    pub blog_title: String,
    pub blog_status: Option<String>,
    pub rating: Option<i32>,
    pub author: Option<String>,
    pub is_publish: bool,
    #[schema(example = "http://127.0.0.1:3000/static/images/assets/default-blog-cover.jpg")]
    pub cover_url: String,
    /// Owning account, without e-mail.
    pub user: Option<BlogOwner>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BlogResponse {
    pub fn new(m: blog::Model, owner: Option<user::Model>, storage: &StorageConfig) -> Self {
        Self {
            cover_url: cover_url(m.cover_image.as_deref(), storage),
            user: owner.map(|u| BlogOwner::new(u, storage)),
            id: m.id,
            blog_title: m.blog_title,
            blog_status: m.blog_status,
            rating: m.rating,
            author: m.author,
            is_publish: m.is_publish,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

/// List wrapper: `{"data": [...]}`.
#[derive(Serialize, utoipa::ToSchema)]
pub struct BlogListResponse {
    pub data: Vec<BlogResponse>,
}

impl BlogListResponse {
    pub fn new(rows: Vec<(blog::Model, Option<user::Model>)>, storage: &StorageConfig) -> Self {
        Self {
            data: rows
                .into_iter()
                .map(|(b, u)| BlogResponse::new(b, u, storage))
                .collect(),
        }
    }
}

/// Response of a cover upload: only the computed URL.
#[derive(Serialize, utoipa::ToSchema)]
pub struct BlogCoverResponse {
    #[schema(example = "http://127.0.0.1:3000/static/images/blogs/0b8f1e9a.png")]
    pub cover_url: String,
}

/// Query parameters for listing a user's blogs.
#[derive(Deserialize, Default, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserBlogsQuery {
    /// `public` (default), `private` or `all`. Only the owner may see the
    /// latter two; anyone else always gets `public`.
    #[param(example = "all")]
    pub visibility: Option<String>,
}
