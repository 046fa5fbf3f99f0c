//! # Document Store
//!
//! Every note operation goes through [`NoteStore`]. Two backends exist:
//!
//! - [`RedisStore`](crate::database::RedisStore): the production store.
//! - [`MemoryStore`](crate::memory::MemoryStore): in-process, selected with `STORE_URL=memory://`.
//!
//! Writes addressed by id are conditional on the note existing and run as a
//! single store-side step, so two concurrent likes or comments on the same
//! note never overwrite each other.
use std::sync::Arc;

use async_trait::async_trait;
use model::{Comment, Note};
use thiserror::Error;
use tracing::info;

use crate::{config::Config, database::RedisStore, memory::MemoryStore};

pub const MEMORY_STORE_URL: &str = "memory://";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Failed to encode record: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Corrupt record {key}: {reason}")]
    Corrupt { key: String, reason: String },
}

#[async_trait]
pub trait NoteStore: Send + Sync {
    /// Newest first.
    async fn list_notes(&self) -> Result<Vec<Note>, StoreError>;

    async fn fetch_note(&self, id: &str) -> Result<Option<Note>, StoreError>;

    async fn insert_note(&self, note: &Note) -> Result<(), StoreError>;

    /// Returns `false` when no note has this id.
    async fn update_note(&self, id: &str, title: &str, message: &str) -> Result<bool, StoreError>;

    /// Removing an unknown id is not an error.
    async fn delete_note(&self, id: &str) -> Result<(), StoreError>;

    /// Returns `false` when no note has this id.
    async fn set_liked(&self, id: &str, liked: bool) -> Result<bool, StoreError>;

    /// Returns `false` when no note has this id.
    async fn push_comment(&self, id: &str, comment: &Comment) -> Result<bool, StoreError>;

    /// `None` when no note has this id.
    async fn list_comments(&self, id: &str) -> Result<Option<Vec<Comment>>, StoreError>;
}

pub async fn connect(config: &Config) -> Result<Arc<dyn NoteStore>, StoreError> {
    if config.store_url.starts_with(MEMORY_STORE_URL) {
        info!("Using in-memory note store, data will not survive a restart");
        return Ok(Arc::new(MemoryStore::default()));
    }

    info!("Connecting to Redis...");
    let store = RedisStore::connect(&config.store_url, config.store_timeout).await?;
    info!("Connected to Redis");

    Ok(Arc::new(store))
}
