//! # Session
//!
//! The access key the user typed, plus when it stops being trusted. A session
//! lives for [`KEY_LIFETIME_HOURS`] and is then dropped, forcing a new prompt.
use std::{
    fs, io,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

pub const KEY_LIFETIME_HOURS: i64 = 24;

const SESSION_FILE_NAME: &str = ".notes-session.json";

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Session file error: {0}")]
    Io(#[from] io::Error),

    #[error("Malformed session file: {0}")]
    Format(#[from] serde_json::Error),
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Session {
    pub api_key: String,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn new(api_key: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            api_key: api_key.into(),
            expires_at: now + Duration::hours(KEY_LIFETIME_HOURS),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

pub struct SessionFile {
    path: PathBuf,
}

impl SessionFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `$HOME/.notes-session.json`, or the working directory without a home.
    pub fn default_path() -> PathBuf {
        std::env::var_os("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
            .join(SESSION_FILE_NAME)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Option<Session>, SessionError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        Ok(Some(serde_json::from_str(&raw)?))
    }

    /// Loads the session, discarding it when expired at `now`.
    pub fn load_valid(&self, now: DateTime<Utc>) -> Result<Option<Session>, SessionError> {
        match self.load()? {
            Some(session) if session.is_expired(now) => {
                info!("Stored key expired at {}", session.expires_at);
                self.clear()?;
                Ok(None)
            }
            other => Ok(other),
        }
    }

    pub fn save(&self, session: &Session) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        fs::write(&self.path, serde_json::to_string_pretty(session)?)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600))?;
        }

        debug!("Saved session to {}", self.path.display());
        Ok(())
    }

    pub fn clear(&self) -> Result<(), SessionError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use tempfile::tempdir;

    use super::*;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 18, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_expiry_boundary() {
        let session = Session::new("key", at(0));

        assert_eq!(session.expires_at, at(0) + Duration::hours(24));
        assert!(!session.is_expired(at(0)));
        assert!(!session.is_expired(at(23)));
        assert!(!session.is_expired(session.expires_at - Duration::milliseconds(1)));
        assert!(session.is_expired(session.expires_at));
        assert!(session.is_expired(session.expires_at + Duration::seconds(1)));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let file = SessionFile::new(dir.path().join("nested").join("session.json"));
        let session = Session::new("key", at(1));

        assert_eq!(file.load().unwrap(), None);
        file.save(&session).unwrap();
        assert_eq!(file.load().unwrap(), Some(session.clone()));
        assert_eq!(file.load_valid(at(2)).unwrap(), Some(session));
    }

    #[test]
    fn test_expired_session_is_cleared() {
        let dir = tempdir().unwrap();
        let file = SessionFile::new(dir.path().join("session.json"));
        let session = Session::new("key", at(0));
        file.save(&session).unwrap();

        let later = session.expires_at + Duration::minutes(1);
        assert_eq!(file.load_valid(later).unwrap(), None);
        assert!(!file.path().exists());
    }

    #[test]
    fn test_malformed_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "{ nope").unwrap();

        let result = SessionFile::new(path).load();
        assert!(matches!(result, Err(SessionError::Format(_))));
    }

    #[test]
    fn test_clear_missing_file() {
        let dir = tempdir().unwrap();

        SessionFile::new(dir.path().join("absent.json")).clear().unwrap();
    }
}
