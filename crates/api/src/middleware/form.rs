//! Url-encoded form extractor with the API's JSON error body.

use axum::extract::{Form, FromRequest, Request};
use serde::de::DeserializeOwned;

use crate::error::AppError;

/// Like [`axum::extract::Form`], but a body that does not deserialize (a
/// missing field, an unknown role name, a non-numeric id) is rejected as
/// [`AppError::BadRequest`] instead of axum's plain-text 422.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormData<T>(pub T);

impl<S, T> FromRequest<S> for FormData<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Form(value) = Form::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
        Ok(Self(value))
    }
}
