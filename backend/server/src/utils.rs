use axum::{
    Json,
    extract::{FromRequest, Request},
};
use model::Validate;
use serde::de::DeserializeOwned;

use crate::error::AppError;

/// JSON body that failed neither parsing nor [`Validate`].
///
/// Parse failures (wrong content type, syntax, missing fields) become a 400
/// instead of axum's default 415/422.
pub struct ValidJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(payload) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::Validation(rejection.body_text()))?;

        payload.validate()?;

        Ok(ValidJson(payload))
    }
}
