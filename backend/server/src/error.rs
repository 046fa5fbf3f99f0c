use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use model::{ErrorBody, ValidationError};
use thiserror::Error;
use tracing::error;

use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Forbidden: Invalid key")]
    Forbidden,

    #[error("Note not found")]
    NotFound,

    #[error("{0}")]
    Validation(String),

    #[error("Store unavailable")]
    StoreTimeout,

    #[error("Internal error: {0}")]
    Store(#[from] StoreError),
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::StoreTimeout => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let message = match &self {
            AppError::Store(e) => {
                error!("Store operation failed: {e}");
                "Internal server error".to_string()
            }
            AppError::StoreTimeout => {
                error!("Store operation timed out");
                self.to_string()
            }
            _ => self.to_string(),
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}
