use chrono::Utc;
use model::{
    API_KEY_HEADER, Comment, CommentInput, ErrorBody, LikeInput, Note, NoteInput, Validate,
    ValidationError,
};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;
use tracing::debug;

use crate::session::Session;

pub const DEFAULT_API_URL: &str = "http://localhost:5000";

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Access key expired, log in again")]
    SessionExpired,

    #[error("Access key rejected")]
    Forbidden,

    #[error("Note not found")]
    NotFound,

    #[error("No note is open")]
    NoPreview,

    #[error("Rejected by server: {0}")]
    BadRequest(String),

    #[error("Server error {status}: {message}")]
    Server { status: u16, message: String },

    #[error("Invalid input: {0}")]
    Invalid(#[from] ValidationError),

    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Typed access to the notes API for one session.
#[derive(Clone)]
pub struct NotesClient {
    http: Client,
    base_url: String,
    session: Session,
}

impl NotesClient {
    pub fn new(base_url: impl Into<String>, session: Session) -> Self {
        Self::with_client(Client::new(), base_url, session)
    }

    pub fn with_client(http: Client, base_url: impl Into<String>, session: Session) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub async fn list_notes(&self) -> Result<Vec<Note>, ClientError> {
        let response = self.send(self.request(Method::GET, "/notes")?).await?;

        Ok(response.json().await?)
    }

    pub async fn create_note(&self, input: &NoteInput) -> Result<Note, ClientError> {
        let response = self
            .send_json(self.request(Method::POST, "/notes")?, input)
            .await?;

        Ok(response.json().await?)
    }

    pub async fn update_note(&self, id: &str, input: &NoteInput) -> Result<Note, ClientError> {
        let response = self
            .send_json(self.request(Method::PUT, &format!("/notes/{id}"))?, input)
            .await?;

        Ok(response.json().await?)
    }

    pub async fn delete_note(&self, id: &str) -> Result<(), ClientError> {
        self.send(self.request(Method::DELETE, &format!("/notes/{id}"))?)
            .await?;

        Ok(())
    }

    pub async fn set_liked(&self, id: &str, liked: bool) -> Result<(), ClientError> {
        self.send_json(
            self.request(Method::POST, &format!("/notes/{id}/like"))?,
            &LikeInput { liked },
        )
        .await?;

        Ok(())
    }

    pub async fn add_comment(&self, id: &str, text: &str) -> Result<Comment, ClientError> {
        let input = CommentInput {
            text: text.to_string(),
        };
        let response = self
            .send_json(
                self.request(Method::POST, &format!("/notes/{id}/comments"))?,
                &input,
            )
            .await?;

        Ok(response.json().await?)
    }

    pub async fn list_comments(&self, id: &str) -> Result<Vec<Comment>, ClientError> {
        let response = self
            .send(self.request(Method::GET, &format!("/notes/{id}/comments"))?)
            .await?;

        Ok(response.json().await?)
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ClientError> {
        if self.session.is_expired(Utc::now()) {
            return Err(ClientError::SessionExpired);
        }

        Ok(self
            .http
            .request(method, format!("{}{path}", self.base_url))
            .header(API_KEY_HEADER, &self.session.api_key))
    }

    async fn send_json<T>(&self, request: RequestBuilder, body: &T) -> Result<Response, ClientError>
    where
        T: Serialize + Validate,
    {
        body.validate()?;

        self.send(request.json(body)).await
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, ClientError> {
        let response = request.send().await?;
        let status = response.status();
        debug!("{} {}", status, response.url());

        if status.is_success() {
            return Ok(response);
        }

        let message = error_message(response).await;
        Err(match status {
            StatusCode::FORBIDDEN => ClientError::Forbidden,
            StatusCode::NOT_FOUND => ClientError::NotFound,
            StatusCode::BAD_REQUEST => ClientError::BadRequest(message),
            _ => ClientError::Server {
                status: status.as_u16(),
                message,
            },
        })
    }
}

async fn error_message(response: Response) -> String {
    let text = response.text().await.unwrap_or_default();

    parse_error_body::<ErrorBody>(&text)
        .map(|body| body.error)
        .unwrap_or(text)
}

fn parse_error_body<T: DeserializeOwned>(text: &str) -> Option<T> {
    serde_json::from_str(text).ok()
}
