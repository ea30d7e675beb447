use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// What a token may be used for. Each extractor accepts exactly one kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
    Activation,
}

/// JWT Claims structure.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // User ID, or e-mail for activation tokens
    pub jti: String, // Unique token ID, the key of the revocation list
    pub kind: TokenKind,
    #[serde(default)]
    pub fresh: bool, // Issued from a password login rather than a refresh
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn user_id(&self) -> Result<i32, TokenError> {
        self.sub.parse().map_err(|_| TokenError::MalformedSubject)
    }
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("jwt error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
    #[error("expected a {expected:?} token, got {actual:?}")]
    WrongKind {
        expected: TokenKind,
        actual: TokenKind,
    },
    #[error("token subject is not a user id")]
    MalformedSubject,
}

fn sign_claims(
    sub: String,
    kind: TokenKind,
    fresh: bool,
    ttl_secs: i64,
    secret: &str,
) -> Result<String, TokenError> {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub,
        jti: Uuid::new_v4().to_string(),
        kind,
        fresh,
        iat: now,
        exp: now + ttl_secs,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

/// Sign a new access or refresh token for a user.
pub fn sign(
    user_id: i32,
    kind: TokenKind,
    fresh: bool,
    ttl_secs: i64,
    secret: &str,
) -> Result<String, TokenError> {
    sign_claims(user_id.to_string(), kind, fresh, ttl_secs, secret)
}

/// Sign an account activation token bound to an e-mail address.
pub fn sign_activation(email: &str, ttl_secs: i64, secret: &str) -> Result<String, TokenError> {
    sign_claims(
        email.to_owned(),
        TokenKind::Activation,
        false,
        ttl_secs,
        secret,
    )
}

/// Verify and decode a JWT token of the expected kind.
pub fn verify(token: &str, expected: TokenKind, secret: &str) -> Result<Claims, TokenError> {
    let mut validation = Validation::default();
    validation.leeway = 0;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )?;

    let claims = token_data.claims;
    if claims.kind != expected {
        return Err(TokenError::WrongKind {
            expected,
            actual: claims.kind,
        });
    }
    Ok(claims)
}
