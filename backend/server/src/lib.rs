//! Documentation of the notes sharing backend.
//!
//! A small REST service storing short notes with a like flag and comments.
//! Every route is gated by a shared static key sent in the `x-api-key` header.
//!
//!
//!
//! # API
//!
//! | Method | Path | Body in | Success |
//! |---|---|---|---|
//! | GET | /notes | | 200, notes newest first |
//! | POST | /notes | `{title, message}` | 201, created note |
//! | PUT | /notes/{id} | `{title, message}` | 200, updated note |
//! | DELETE | /notes/{id} | | 204 |
//! | POST | /notes/{id}/like | `{liked}` | 200 |
//! | POST | /notes/{id}/comments | `{text}` | 201, created comment |
//! | GET | /notes/{id}/comments | | 200, comments in append order |
//!
//! Errors always carry `{"error": "..."}`:
//! - 400 malformed body or empty field
//! - 403 missing or unknown key
//! - 404 unknown note id (update, like, comments)
//! - 503 store timed out
//! - 500 anything else, details only in the log
//!
//! Deleting an unknown id is still a 204.
//!
//!
//!
//! # Configuration
//!
//! Environment variables.
//! - `PORT`: listening port, default `5000`
//! - `STORE_URL`: Redis URL, default `redis://127.0.0.1:6379`, `memory://` for an in-process store
//! - `STORE_TIMEOUT_MS`: per store operation, default `3000`
//! - `SECRET_KEYS`: comma separated keys, plus any of `SECRET_KEY_1` to `SECRET_KEY_16`
//! - `ALLOWED_ORIGINS`: comma separated CORS origins
//!
//! With no key in the environment, `/run/secrets/SECRET_KEYS` is read instead.
//! Rotating a key means redeploying with new values.
//!
//!
//!
//! # Setup
//!
//! Run against a local Redis.
//! ```sh
//! docker run -d -p 6379:6379 redis:7
//! SECRET_KEY_1=changeme RUST_LOG=info cargo run -p notes
//! ```
//!
//! Run without Redis.
//! ```sh
//! STORE_URL=memory:// SECRET_KEY_1=changeme cargo run -p notes
//! ```
//!
//! Try it.
//! ```sh
//! curl -H "x-api-key: changeme" http://localhost:5000/notes
//! ```
use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    http::{HeaderName, HeaderValue, Method, header::CONTENT_TYPE},
    middleware::from_fn_with_state,
    routing::{get, post, put},
};

use anyhow::Context;
use signal::{
    ctrl_c,
    unix::{SignalKind, signal},
};
use tokio::{net::TcpListener, signal};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

pub mod config;
pub mod database;
pub mod error;
pub mod guard;
pub mod memory;
pub mod routes;
pub mod state;
pub mod store;
pub mod utils;

use config::Config;
use guard::require_api_key;
use model::API_KEY_HEADER;
use routes::{
    add_comment_handler, create_note_handler, delete_note_handler, like_handler,
    list_comments_handler, list_notes_handler, update_note_handler,
};
use state::AppState;

pub async fn start_server() -> anyhow::Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Loading config...");
    let config = Config::load().context("Environment misconfigured")?;

    info!("Initializing state...");
    let state = AppState::new(config)
        .await
        .context("Failed to connect to the note store")?;

    info!("Starting server...");
    let app = build_router(state.clone());

    let address = format!("0.0.0.0:{}", state.config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {address}"))?;
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shut down");
    Ok(())
}

pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config.allowed_origins);

    Router::new()
        .route("/notes", get(list_notes_handler).post(create_note_handler))
        .route(
            "/notes/{id}",
            put(update_note_handler).delete(delete_note_handler),
        )
        .route("/notes/{id}/like", post(like_handler))
        .route(
            "/notes/{id}/comments",
            get(list_comments_handler).post(add_comment_handler),
        )
        .layer(from_fn_with_state(state.clone(), require_api_key))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| {
            HeaderValue::from_str(origin)
                .map_err(|e| warn!("Ignoring invalid origin {origin}: {e}"))
                .ok()
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, HeaderName::from_static(API_KEY_HEADER)])
        .allow_credentials(true)
        .max_age(Duration::from_secs(60 * 60))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                terminate.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
