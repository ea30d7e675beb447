use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::StorageConfig;
use crate::entity::user;
use crate::error::AppError;

use super::shared::{AVATAR_FOLDER, DEFAULT_AVATAR, Field, FieldValidator};

/// Request body for user registration.
#[derive(Deserialize, Default, utoipa::ToSchema)]
#[serde(default)]
pub struct RegisterRequest {
    /// Unique username (1-80 chars, letters, digits and underscores).
    #[schema(value_type = Option<String>, example = "alice_wonder")]
    pub username: Field<String>,
    /// Unique e-mail address.
    #[schema(value_type = Option<String>, example = "alice@example.com")]
    pub email: Field<String>,
    /// Password (8-128 characters). Never returned.
    #[schema(value_type = Option<String>, example = "s3cure_P@ss!")]
    pub password: Field<String>,
}

/// A registration request that passed validation.
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Loose structural e-mail check: one `@`, non-empty local part, dotted domain.
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !email.chars().any(char::is_whitespace)
        && domain
            .split('.')
            .filter(|part| !part.is_empty())
            .count()
            >= 2
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

pub fn validate_register_request(req: RegisterRequest) -> Result<NewUser, AppError> {
    let mut v = FieldValidator::new();

    let username = v.string("username", &req.username).map(str::trim);
    if v.required("username", &req.username) {
        v.length_between("username", username, 1, 80);
        if let Some(name) = username
            && !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            v.add(
                "username",
                "Username must contain only letters, digits, and underscores.",
            );
        }
    }

    let email = v.string("email", &req.email).map(str::trim);
    if v.required("email", &req.email) {
        v.max_length("email", email, 200);
        if let Some(addr) = email
            && !is_valid_email(addr)
        {
            v.add("email", "Not a valid email address.");
        }
    }

    let password = v.string("password", &req.password);
    if v.required("password", &req.password) {
        v.length_between("password", password, 8, 128);
    }

    v.finish()?;

    Ok(NewUser {
        username: username.unwrap_or_default().to_string(),
        email: email.unwrap_or_default().to_lowercase(),
        password: req.password.into_present().unwrap_or_default(),
    })
}

/// Absolute avatar URL of a user, falling back to the default avatar asset.
pub fn avatar_url(avatar_image: Option<&str>, storage: &StorageConfig) -> String {
    match avatar_image {
        Some(filename) => storage.static_url(&format!("images/{AVATAR_FOLDER}/{filename}")),
        None => storage.static_url(DEFAULT_AVATAR),
    }
}

/// Serialized user. `email` is only present when the viewer is the user themself.
#[derive(Serialize, utoipa::ToSchema)]
pub struct UserResponse {
    #[schema(example = 42)]
    pub id: i32,
    #[schema(example = "alice_wonder")]
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "alice@example.com")]
    pub email: Option<String>,
    pub is_active: bool,
    pub avatar_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserResponse {
    /// Projection shown to other users.
    pub fn public(m: user::Model, storage: &StorageConfig) -> Self {
        let mut res = Self::private(m, storage);
        res.email = None;
        res
    }

    /// Projection shown to the account owner, including the e-mail address.
    pub fn private(m: user::Model, storage: &StorageConfig) -> Self {
        Self {
            avatar_url: avatar_url(m.avatar_image.as_deref(), storage),
            id: m.id,
            username: m.username,
            email: Some(m.email),
            is_active: m.is_active,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

/// Owning account as nested in blog responses.
#[derive(Serialize, utoipa::ToSchema)]
pub struct BlogOwner {
    #[schema(example = 42)]
    pub id: i32,
    #[schema(example = "alice_wonder")]
    pub username: String,
    pub avatar_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BlogOwner {
    pub fn new(m: user::Model, storage: &StorageConfig) -> Self {
        Self {
            avatar_url: avatar_url(m.avatar_image.as_deref(), storage),
            id: m.id,
            username: m.username,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

/// Response of an avatar upload: only the computed URL.
#[derive(Serialize, utoipa::ToSchema)]
pub struct AvatarResponse {
    #[schema(example = "http://127.0.0.1:3000/static/images/avatars/5d1c.png")]
    pub avatar_url: String,
}
