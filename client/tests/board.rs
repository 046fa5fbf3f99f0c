use std::{sync::Arc, time::Duration};

use chrono::Utc;
use client::{Board, ClientError, NotesClient, Session};
use server::{build_router, config::Config, memory::MemoryStore, state::AppState};

const KEY: &str = "alpha";

async fn spawn_server() -> String {
    let config = Config {
        port: 0,
        store_url: "memory://".to_string(),
        store_timeout: Duration::from_secs(3),
        secret_keys: vec![KEY.to_string()],
        allowed_origins: Vec::new(),
    };
    let app = build_router(AppState::with_store(config, Arc::new(MemoryStore::default())));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move { axum::serve(listener, app).await.expect("serve app") });

    format!("http://{addr}")
}

fn client(base: &str, key: &str) -> NotesClient {
    NotesClient::new(base, Session::new(key, Utc::now()))
}

#[tokio::test]
async fn board_refetches_after_writes() {
    let base = spawn_server().await;
    let mut board = Board::new(client(&base, KEY));

    board.refresh().await.unwrap();
    assert!(board.notes().is_empty());

    let first = board.create("Hi", "There").await.unwrap();
    tokio::time::sleep(Duration::from_millis(5)).await;
    let second = board.create("Again", "Hello").await.unwrap();
    let ids: Vec<&str> = board.notes().iter().map(|n| n.id.as_str()).collect();
    assert_eq!(ids, vec![second.id.as_str(), first.id.as_str()]);

    board.update(&first.id, "Hi!", "There!").await.unwrap();
    assert_eq!(board.note(&first.id).unwrap().title, "Hi!");

    board.delete(&second.id).await.unwrap();
    assert!(board.note(&second.id).is_none());
    assert_eq!(board.notes().len(), 1);
}

#[tokio::test]
async fn like_is_optimistic_and_reconciled() {
    let base = spawn_server().await;
    let mut board = Board::new(client(&base, KEY));
    let note = board.create("Hi", "There").await.unwrap();

    let pending = board.toggle_like(&note.id).expect("note on board");
    assert!(board.note(&note.id).unwrap().liked);
    pending.await.unwrap().unwrap();

    let mut other = Board::new(client(&base, KEY));
    other.refresh().await.unwrap();
    assert!(other.note(&note.id).unwrap().liked);

    assert!(board.toggle_like("missing").is_none());
}

#[tokio::test]
async fn failed_like_is_not_rolled_back() {
    let base = spawn_server().await;
    let mut board = Board::new(client(&base, KEY));
    let note = board.create("Hi", "There").await.unwrap();

    // removed behind the board's back
    client(&base, KEY).delete_note(&note.id).await.unwrap();

    let pending = board.toggle_like(&note.id).expect("note still on board");
    let result = pending.await.unwrap();

    assert!(matches!(result, Err(ClientError::NotFound)));
    assert!(board.note(&note.id).unwrap().liked);
}

#[tokio::test]
async fn preview_and_comments() {
    let base = spawn_server().await;
    let mut board = Board::new(client(&base, KEY));
    let note = board.create("Hi", "There").await.unwrap();

    assert!(matches!(
        board.comment("orphan").await,
        Err(ClientError::NoPreview)
    ));

    let preview = board.open_preview(&note.id).await.unwrap();
    assert!(preview.comments.is_empty());

    let comment = board.comment("  first \n").await.unwrap();
    assert_eq!(comment.text, "first");
    board.comment("second").await.unwrap();
    let texts: Vec<&str> = board
        .preview()
        .unwrap()
        .comments
        .iter()
        .map(|c| c.text.as_str())
        .collect();
    assert_eq!(texts, vec!["first", "second"]);

    board.delete(&note.id).await.unwrap();
    assert!(board.preview().is_none());

    assert!(matches!(
        board.open_preview(&note.id).await,
        Err(ClientError::NotFound)
    ));
}

#[tokio::test]
async fn wrong_key_is_forbidden() {
    let base = spawn_server().await;
    let mut board = Board::new(client(&base, "wrong"));

    assert!(matches!(board.refresh().await, Err(ClientError::Forbidden)));
    assert!(matches!(
        board.create("Hi", "There").await,
        Err(ClientError::Forbidden)
    ));

    let mut board = Board::new(client(&base, KEY));
    board.refresh().await.unwrap();
    assert!(board.notes().is_empty());
}

#[tokio::test]
async fn update_missing_note_is_not_found() {
    let base = spawn_server().await;
    let api = client(&base, KEY);

    let result = api
        .update_note(
            "missing",
            &model::NoteInput {
                title: "a".to_string(),
                message: "b".to_string(),
            },
        )
        .await;

    assert!(matches!(result, Err(ClientError::NotFound)));
}
