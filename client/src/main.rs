use std::{
    io::{self, BufRead, Write},
    path::PathBuf,
};

use anyhow::{Context, bail};
use chrono::{Local, Utc};
use clap::{Parser, Subcommand};
use client::{
    Board, NotesClient, Session, SessionFile,
    api::DEFAULT_API_URL,
};
use model::{Comment, Note};
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Base URL of the notes backend
    #[arg(long, env = "NOTES_API_URL", default_value = DEFAULT_API_URL)]
    url: String,

    /// Where the access key is kept between runs
    #[arg(long)]
    session_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Store an access key, prompting when none is given
    Login { key: Option<String> },
    /// Forget the stored access key
    Logout,
    /// List notes, newest first
    List,
    /// Show one note with its comments
    Show { id: String },
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        message: String,
    },
    Edit {
        id: String,
        #[arg(long)]
        title: String,
        #[arg(long)]
        message: String,
    },
    Delete { id: String },
    /// Flip the like on a note
    Like { id: String },
    Comment { id: String, text: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let session_file = SessionFile::new(
        args.session_file
            .clone()
            .unwrap_or_else(SessionFile::default_path),
    );

    match &args.command {
        Command::Login { key } => {
            let key = match key {
                Some(key) => key.clone(),
                None => prompt_key()?,
            };
            let session = Session::new(key.trim(), Utc::now());
            session_file.save(&session)?;
            println!("Key stored until {}", session.expires_at.with_timezone(&Local));
            return Ok(());
        }
        Command::Logout => {
            session_file.clear()?;
            println!("Key removed");
            return Ok(());
        }
        _ => {}
    }

    let session = match session_file.load_valid(Utc::now())? {
        Some(session) => session,
        None => {
            let session = Session::new(prompt_key()?, Utc::now());
            session_file.save(&session)?;
            session
        }
    };

    let mut board = Board::new(NotesClient::new(args.url, session));
    board.refresh().await.context("Failed to load notes")?;

    match args.command {
        Command::List => {
            for note in board.notes() {
                print_note(note);
            }
        }
        Command::Show { id } => {
            let Some(note) = board.note(&id).cloned() else {
                bail!("No note with id {id}");
            };
            print_note(&note);
            let preview = board.open_preview(&id).await?;
            print_comments(&preview.comments);
        }
        Command::Create { title, message } => {
            let note = board.create(&title, &message).await?;
            println!("Created {}", note.id);
        }
        Command::Edit { id, title, message } => {
            let note = board.update(&id, &title, &message).await?;
            print_note(&note);
        }
        Command::Delete { id } => {
            board.delete(&id).await?;
            println!("Deleted {id}");
        }
        Command::Like { id } => {
            let Some(pending) = board.toggle_like(&id) else {
                bail!("No note with id {id}");
            };
            pending.await.context("Like task failed")??;
            let liked = board.note(&id).is_some_and(|note| note.liked);
            println!("{}", if liked { "Liked" } else { "Unliked" });
        }
        Command::Comment { id, text } => {
            board.open_preview(&id).await?;
            board.comment(&text).await?;
            if let Some(preview) = board.preview() {
                print_comments(&preview.comments);
            }
        }
        Command::Login { .. } | Command::Logout => {}
    }

    Ok(())
}

fn prompt_key() -> anyhow::Result<String> {
    print!("Access key: ");
    io::stdout().flush()?;

    let mut key = String::new();
    io::stdin().lock().read_line(&mut key)?;

    let key = key.trim();
    if key.is_empty() {
        bail!("An access key is required");
    }

    Ok(key.to_string())
}

fn print_note(note: &Note) {
    let heart = if note.liked { "♥" } else { " " };
    println!(
        "{heart} {}  {}  ({} comments)\n    {}\n    {}",
        note.id,
        note.timestamp.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
        note.comments.len(),
        note.title,
        note.message,
    );
}

fn print_comments(comments: &[Comment]) {
    if comments.is_empty() {
        println!("    no comments");
    }
    for comment in comments {
        println!(
            "    - {} ({})",
            comment.text,
            comment.timestamp.with_timezone(&Local).format("%Y-%m-%d %H:%M")
        );
    }
}
