use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
};
use serde::de::DeserializeOwned;

use crate::error::AppError;

/// A `Json<T>` wrapper whose rejections become `AppError::Validation`.
///
/// Request types read their fields as `models::shared::Field`, so values of
/// the wrong type reach the validator. This only covers bodies that are not a
/// JSON object at all (wrong content type, syntax errors, a bare string).
pub struct AppJson<T>(pub T);

impl<S, T> FromRequest<S> for AppJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(AppJson(value)),
            Err(rejection) => {
                tracing::debug!(status = %rejection.status(), "Rejected JSON body");
                Err(AppError::Validation(rejection.body_text()))
            }
        }
    }
}
