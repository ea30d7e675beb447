use serde::{Deserialize, Serialize};

use crate::error::AppError;

use super::shared::{Field, FieldValidator};

/// Request body for password login.
#[derive(Deserialize, Default, utoipa::ToSchema)]
#[serde(default)]
pub struct LoginRequest {
    #[schema(value_type = Option<String>, example = "alice@example.com")]
    pub email: Field<String>,
    #[schema(value_type = Option<String>, example = "s3cure_P@ss!")]
    pub password: Field<String>,
}

/// Login input that passed validation. The e-mail is trimmed and lowercased.
pub struct Credentials {
    pub email: String,
    pub password: String,
}

pub fn validate_login_request(req: LoginRequest) -> Result<Credentials, AppError> {
    let mut v = FieldValidator::new();
    v.required("email", &req.email);
    v.string("email", &req.email);
    v.required("password", &req.password);
    v.string("password", &req.password);
    v.finish()?;

    Ok(Credentials {
        email: req
            .email
            .into_present()
            .unwrap_or_default()
            .trim()
            .to_lowercase(),
        password: req.password.into_present().unwrap_or_default(),
    })
}

/// Tokens issued by a password login.
#[derive(Serialize, utoipa::ToSchema)]
pub struct TokenResponse {
    /// Fresh access token for the `Authorization: Bearer` header.
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub access_token: String,
    /// Long-lived token accepted only by `POST /refresh`.
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub refresh_token: String,
}

/// A new, non-fresh access token.
#[derive(Serialize, utoipa::ToSchema)]
pub struct RefreshResponse {
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub access_token: String,
}
