//! # Notes Model
//!
//! Wire types shared by the server and the client.
//!
//! ## Note JSON
//! ```json
//! {
//!   "id": "5f0c...",
//!   "title": "Hi",
//!   "message": "There",
//!   "timestamp": "2026-10-18T09:12:44.120Z",
//!   "liked": false,
//!   "comments": [{ "text": "aw", "timestamp": "2026-10-18T09:13:02.001Z" }]
//! }
//! ```
//!
//! Request payloads implement [`Validate`] so both sides agree on what a
//! well-formed body is before anything reaches the store.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const API_KEY_HEADER: &str = "x-api-key";

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Note {
    pub id: String,
    pub title: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub liked: bool,
    #[serde(default)]
    pub comments: Vec<Comment>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Comment {
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

/// Body of `POST /notes` and `PUT /notes/{id}`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct NoteInput {
    pub title: String,
    pub message: String,
}

/// Body of `POST /notes/{id}/like`.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct LikeInput {
    pub liked: bool,
}

/// Body of `POST /notes/{id}/comments`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct CommentInput {
    pub text: String,
}

/// Every non-2xx response carries this body.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Field '{0}' must not be empty")]
    EmptyField(&'static str),
}

pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}

fn require_text(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::EmptyField(field));
    }

    Ok(())
}

impl Validate for NoteInput {
    fn validate(&self) -> Result<(), ValidationError> {
        require_text("title", &self.title)?;
        require_text("message", &self.message)
    }
}

impl Validate for CommentInput {
    fn validate(&self) -> Result<(), ValidationError> {
        require_text("text", &self.text)
    }
}

impl Validate for LikeInput {
    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }
}
