//! # Notes Client
//!
//! Talks to the notes backend on behalf of one user.
//!
//! - [`session`]: the access key and its 24 hour expiry, persisted to a file.
//! - [`api`]: one typed call per route, every request carries the key.
//! - [`board`]: the note list and preview state kept in sync with the server.
//!
//! The `notes-cli` binary wires these to a command line.
pub mod api;
pub mod board;
pub mod session;

pub use api::{ClientError, NotesClient};
pub use board::{Board, Preview};
pub use session::{Session, SessionError, SessionFile};
