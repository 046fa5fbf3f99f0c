//! # Board
//!
//! Client-side copy of the note list.
//!
//! - Fetched whole on [`Board::refresh`], and again after every create, update or delete.
//! - Likes flip locally first and are sent in the background. A failed send is
//!   logged and the local value stays as the user left it.
//! - One note at a time can be previewed, with its comments loaded alongside.
use model::{Comment, Note, NoteInput};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::api::{ClientError, NotesClient};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Preview {
    pub note_id: String,
    pub comments: Vec<Comment>,
}

pub struct Board {
    client: NotesClient,
    notes: Vec<Note>,
    preview: Option<Preview>,
}

impl Board {
    pub fn new(client: NotesClient) -> Self {
        Self {
            client,
            notes: Vec::new(),
            preview: None,
        }
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn note(&self, id: &str) -> Option<&Note> {
        self.notes.iter().find(|note| note.id == id)
    }

    pub fn preview(&self) -> Option<&Preview> {
        self.preview.as_ref()
    }

    pub async fn refresh(&mut self) -> Result<(), ClientError> {
        self.notes = self.client.list_notes().await?;

        if let Some(preview) = &self.preview {
            if self.note(&preview.note_id).is_none() {
                self.preview = None;
            }
        }

        Ok(())
    }

    pub async fn create(&mut self, title: &str, message: &str) -> Result<Note, ClientError> {
        let note = self.client.create_note(&input(title, message)).await?;
        info!("Created note {}", note.id);

        self.refresh().await?;
        Ok(note)
    }

    pub async fn update(&mut self, id: &str, title: &str, message: &str) -> Result<Note, ClientError> {
        let note = self.client.update_note(id, &input(title, message)).await?;

        self.refresh().await?;
        Ok(note)
    }

    pub async fn delete(&mut self, id: &str) -> Result<(), ClientError> {
        self.client.delete_note(id).await?;

        self.refresh().await
    }

    /// Flips the like flag locally and sends the new value in the background.
    ///
    /// Returns `None` when the note is not on the board.
    pub fn toggle_like(&mut self, id: &str) -> Option<JoinHandle<Result<(), ClientError>>> {
        let note = self.notes.iter_mut().find(|note| note.id == id)?;
        note.liked = !note.liked;

        let liked = note.liked;
        let id = id.to_string();
        let client = self.client.clone();

        Some(tokio::spawn(async move {
            let result = client.set_liked(&id, liked).await;
            if let Err(e) = &result {
                warn!("Failed to save like on {id}: {e}");
            }
            result
        }))
    }

    pub async fn open_preview(&mut self, id: &str) -> Result<&Preview, ClientError> {
        let comments = self.client.list_comments(id).await?;

        Ok(self.preview.insert(Preview {
            note_id: id.to_string(),
            comments,
        }))
    }

    pub fn close_preview(&mut self) {
        self.preview = None;
    }

    /// Comments on the previewed note with surrounding whitespace trimmed, then
    /// reloads its comments.
    pub async fn comment(&mut self, text: &str) -> Result<Comment, ClientError> {
        let Some(note_id) = self.preview.as_ref().map(|p| p.note_id.clone()) else {
            return Err(ClientError::NoPreview);
        };

        let comment = self.client.add_comment(&note_id, text.trim()).await?;
        self.open_preview(&note_id).await?;

        Ok(comment)
    }
}

fn input(title: &str, message: &str) -> NoteInput {
    NoteInput {
        title: title.to_string(),
        message: message.to_string(),
    }
}
