//! # Access Guard
//!
//! Every API route sits behind [`require_api_key`]. The `x-api-key` header must
//! match one of the configured secrets exactly, anything else is a 403 and the
//! handler never runs.
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use model::API_KEY_HEADER;
use tracing::{debug, warn};

use crate::{error::AppError, state::AppState};

pub async fn require_api_key(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Response {
    let key = req
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok());

    match key {
        Some(key) if state.is_allowed_key(key) => {
            debug!("Key accepted for {} {}", req.method(), req.uri().path());
            next.run(req).await
        }
        Some(_) => {
            warn!("Invalid key on {} {}", req.method(), req.uri().path());
            AppError::Forbidden.into_response()
        }
        None => {
            warn!("Missing key on {} {}", req.method(), req.uri().path());
            AppError::Forbidden.into_response()
        }
    }
}
