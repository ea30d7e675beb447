use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::comment;
use crate::error::AppError;

use super::shared::{Field, FieldValidator};

pub const CONTENT_MAX: usize = 1000;
pub const AUTHOR_MAX: usize = 100;

/// Request body for creating a comment.
#[derive(Deserialize, Default, utoipa::ToSchema)]
#[serde(default)]
pub struct CreateCommentRequest {
    /// Required, at most 1000 characters.
    #[schema(value_type = Option<String>, example = "Lovely view!")]
    pub content: Field<String>,
    /// Nickname shown with the comment, at most 100 characters.
    #[serde(alias = "nickname")]
    #[schema(value_type = Option<String>, example = "bob")]
    pub author: Field<String>,
}

/// Request body for updating a comment. Empty strings never overwrite.
#[derive(Deserialize, Default, utoipa::ToSchema)]
#[serde(default)]
pub struct UpdateCommentRequest {
    #[schema(value_type = Option<String>)]
    pub content: Field<String>,
    #[serde(alias = "nickname")]
    #[schema(value_type = Option<String>)]
    pub author: Field<String>,
}

pub struct NewComment {
    pub content: String,
    pub author: Option<String>,
}

#[derive(Debug, Default, PartialEq)]
pub struct CommentChanges {
    pub content: Option<String>,
    pub author: Option<String>,
}

fn check_fields(v: &mut FieldValidator, content: &Field<String>, author: &Field<String>) {
    let content = v.string("content", content);
    v.max_length("content", content, CONTENT_MAX);
    let author = v.string("author", author);
    v.max_length("author", author, AUTHOR_MAX);
}

pub fn validate_create_comment(req: CreateCommentRequest) -> Result<NewComment, AppError> {
    let mut v = FieldValidator::new();
    v.required("content", &req.content);
    check_fields(&mut v, &req.content, &req.author);
    v.finish()?;

    Ok(NewComment {
        content: req.content.into_present().unwrap_or_default(),
        author: req.author.into_present(),
    })
}

pub fn validate_update_comment(req: UpdateCommentRequest) -> Result<CommentChanges, AppError> {
    let mut v = FieldValidator::new();
    check_fields(&mut v, &req.content, &req.author);
    v.finish()?;

    Ok(CommentChanges {
        content: req.content.into_present(),
        author: req.author.into_present(),
    })
}

/// Serialized comment.
#[derive(Serialize, utoipa::ToSchema)]
pub struct CommentResponse {
    pub id: i32,
    pub blog_id: i32,
    pub content: String,
    pub author: Option<String>,
    pub is_publish: bool,
    /// Cover URL of the parent blog.
    pub cover_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CommentResponse {
    /// `cover_url` is computed from the parent blog, see `models::blog::cover_url`.
    pub fn new(m: comment::Model, cover_url: String) -> Self {
        Self {
            id: m.id,
            blog_id: m.blog_id,
            content: m.content,
            author: m.author,
            is_publish: m.is_publish,
            cover_url,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

/// List wrapper: `{"data": [...]}`.
#[derive(Serialize, utoipa::ToSchema)]
pub struct CommentListResponse {
    pub data: Vec<CommentResponse>,
}
