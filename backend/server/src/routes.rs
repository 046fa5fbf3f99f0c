use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{DateTime, SubsecRound, Utc};
use model::{Comment, CommentInput, LikeInput, Note, NoteInput};
use tracing::info;
use uuid::Uuid;

use crate::{error::AppError, state::AppState, utils::ValidJson};

// millisecond precision is what the store keeps
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

pub async fn list_notes_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Note>>, AppError> {
    let notes = state.run(state.store.list_notes()).await?;

    Ok(Json(notes))
}

pub async fn create_note_handler(
    State(state): State<Arc<AppState>>,
    ValidJson(input): ValidJson<NoteInput>,
) -> Result<(StatusCode, Json<Note>), AppError> {
    let note = Note {
        id: Uuid::new_v4().to_string(),
        title: input.title,
        message: input.message,
        timestamp: now(),
        liked: false,
        comments: Vec::new(),
    };

    state.run(state.store.insert_note(&note)).await?;
    info!("Created note {}", note.id);

    Ok((StatusCode::CREATED, Json(note)))
}

pub async fn update_note_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ValidJson(input): ValidJson<NoteInput>,
) -> Result<Json<Note>, AppError> {
    let updated = state
        .run(state.store.update_note(&id, &input.title, &input.message))
        .await?;
    if !updated {
        return Err(AppError::NotFound);
    }

    // a delete can land between the update and this read
    let note = state
        .run(state.store.fetch_note(&id))
        .await?
        .ok_or(AppError::NotFound)?;
    info!("Updated note {id}");

    Ok(Json(note))
}

pub async fn delete_note_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.run(state.store.delete_note(&id)).await?;
    info!("Deleted note {id}");

    Ok(StatusCode::NO_CONTENT)
}

pub async fn like_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ValidJson(input): ValidJson<LikeInput>,
) -> Result<StatusCode, AppError> {
    if !state.run(state.store.set_liked(&id, input.liked)).await? {
        return Err(AppError::NotFound);
    }
    info!("Set liked={} on note {id}", input.liked);

    Ok(StatusCode::OK)
}

pub async fn add_comment_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ValidJson(input): ValidJson<CommentInput>,
) -> Result<(StatusCode, Json<Comment>), AppError> {
    let comment = Comment {
        text: input.text,
        timestamp: now(),
    };

    if !state.run(state.store.push_comment(&id, &comment)).await? {
        return Err(AppError::NotFound);
    }
    info!("Added comment to note {id}");

    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn list_comments_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Comment>>, AppError> {
    let comments = state
        .run(state.store.list_comments(&id))
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(Json(comments))
}
