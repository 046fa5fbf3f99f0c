use std::collections::HashMap;

use async_trait::async_trait;
use model::{Comment, Note};
use tokio::sync::Mutex;

use crate::store::{NoteStore, StoreError};

/// In-process store. One lock guards every note, so each operation is atomic.
#[derive(Default)]
pub struct MemoryStore {
    notes: Mutex<HashMap<String, Note>>,
}

#[async_trait]
impl NoteStore for MemoryStore {
    async fn list_notes(&self) -> Result<Vec<Note>, StoreError> {
        let mut notes: Vec<Note> = self.notes.lock().await.values().cloned().collect();

        // same tie order as ZREVRANGE
        notes.sort_by(|a, b| {
            b.timestamp
                .timestamp_millis()
                .cmp(&a.timestamp.timestamp_millis())
                .then_with(|| b.id.cmp(&a.id))
        });

        Ok(notes)
    }

    async fn fetch_note(&self, id: &str) -> Result<Option<Note>, StoreError> {
        Ok(self.notes.lock().await.get(id).cloned())
    }

    async fn insert_note(&self, note: &Note) -> Result<(), StoreError> {
        self.notes
            .lock()
            .await
            .insert(note.id.clone(), note.clone());

        Ok(())
    }

    async fn update_note(&self, id: &str, title: &str, message: &str) -> Result<bool, StoreError> {
        let mut notes = self.notes.lock().await;

        let Some(note) = notes.get_mut(id) else {
            return Ok(false);
        };
        note.title = title.to_string();
        note.message = message.to_string();

        Ok(true)
    }

    async fn delete_note(&self, id: &str) -> Result<(), StoreError> {
        self.notes.lock().await.remove(id);

        Ok(())
    }

    async fn set_liked(&self, id: &str, liked: bool) -> Result<bool, StoreError> {
        let mut notes = self.notes.lock().await;

        let Some(note) = notes.get_mut(id) else {
            return Ok(false);
        };
        note.liked = liked;

        Ok(true)
    }

    async fn push_comment(&self, id: &str, comment: &Comment) -> Result<bool, StoreError> {
        let mut notes = self.notes.lock().await;

        let Some(note) = notes.get_mut(id) else {
            return Ok(false);
        };
        note.comments.push(comment.clone());

        Ok(true)
    }

    async fn list_comments(&self, id: &str) -> Result<Option<Vec<Comment>>, StoreError> {
        Ok(self
            .notes
            .lock()
            .await
            .get(id)
            .map(|note| note.comments.clone()))
    }
}
