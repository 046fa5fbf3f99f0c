//! # Redis
//!
//! Persistent store for notes.
//!
//! ## Layout
//!
//! - `note:{id}`: hash with `title`, `message`, `timestamp` (RFC 3339) and `liked` (`0`/`1`)
//! - `comments:{id}`: list of comment JSON, append order
//!
//! The three prefixes never overlap, so no id can address another note's keys.
//! - `notes:timeline`: sorted set of ids scored by creation time in milliseconds
//!
//! ## Atomicity
//!
//! - Create and delete touch all three keys inside one `MULTI`/`EXEC`.
//! - Update, like and comment are Lua scripts that check `EXISTS` first, so a
//!   write never resurrects a deleted note and never races a read-modify-write.
//!
//! ## Commands
//!
//! Inspect a note.
//! ```sh
//! redis-cli HGETALL note:<id>
//! redis-cli LRANGE comments:<id> 0 -1
//! ```
use std::{collections::HashMap, time::Duration};

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use model::{Comment, Note};
use redis::{
    Client, RedisError, Script,
    aio::{ConnectionManager, ConnectionManagerConfig},
};
use tracing::debug;

use crate::store::{NoteStore, StoreError};

pub const TIMELINE_KEY: &str = "notes:timeline";

const NOTE_PREFIX: &str = "note:";
const COMMENTS_PREFIX: &str = "comments:";

const FIELD_TITLE: &str = "title";
const FIELD_MESSAGE: &str = "message";
const FIELD_TIMESTAMP: &str = "timestamp";
const FIELD_LIKED: &str = "liked";

const UPDATE_SCRIPT: &str = r"
if redis.call('EXISTS', KEYS[1]) == 0 then
    return 0
end
redis.call('HSET', KEYS[1], 'title', ARGV[1], 'message', ARGV[2])
return 1
";

const LIKE_SCRIPT: &str = r"
if redis.call('EXISTS', KEYS[1]) == 0 then
    return 0
end
redis.call('HSET', KEYS[1], 'liked', ARGV[1])
return 1
";

const COMMENT_SCRIPT: &str = r"
if redis.call('EXISTS', KEYS[1]) == 0 then
    return 0
end
redis.call('RPUSH', KEYS[2], ARGV[1])
return 1
";

pub async fn init_redis(redis_url: &str, timeout: Duration) -> Result<ConnectionManager, RedisError> {
    let config = ConnectionManagerConfig::new()
        .set_number_of_retries(0)
        .set_connection_timeout(timeout);

    let client = Client::open(redis_url)?;
    client.get_connection_manager_with_config(config).await
}

pub struct RedisStore {
    connection: ConnectionManager,
    update_script: Script,
    like_script: Script,
    comment_script: Script,
}

impl RedisStore {
    pub async fn connect(redis_url: &str, timeout: Duration) -> Result<Self, StoreError> {
        let connection = init_redis(redis_url, timeout).await?;

        Ok(Self {
            connection,
            update_script: Script::new(UPDATE_SCRIPT),
            like_script: Script::new(LIKE_SCRIPT),
            comment_script: Script::new(COMMENT_SCRIPT),
        })
    }
}

fn note_key(id: &str) -> String {
    format!("{NOTE_PREFIX}{id}")
}

fn comments_key(id: &str) -> String {
    format!("{COMMENTS_PREFIX}{id}")
}

fn encode_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn decode_note(
    id: &str,
    mut fields: HashMap<String, String>,
    comments: Vec<String>,
) -> Result<Note, StoreError> {
    let key = note_key(id);
    let mut take = |field: &str| {
        fields.remove(field).ok_or_else(|| StoreError::Corrupt {
            key: key.clone(),
            reason: format!("missing field {field}"),
        })
    };

    let title = take(FIELD_TITLE)?;
    let message = take(FIELD_MESSAGE)?;
    let raw_timestamp = take(FIELD_TIMESTAMP)?;
    let liked = take(FIELD_LIKED)? == "1";

    let timestamp = DateTime::parse_from_rfc3339(&raw_timestamp)
        .map_err(|e| StoreError::Corrupt {
            key: key.clone(),
            reason: format!("bad timestamp: {e}"),
        })?
        .with_timezone(&Utc);

    Ok(Note {
        id: id.to_string(),
        title,
        message,
        timestamp,
        liked,
        comments: decode_comments(id, comments)?,
    })
}

fn decode_comments(id: &str, comments: Vec<String>) -> Result<Vec<Comment>, StoreError> {
    comments
        .iter()
        .map(|raw| {
            serde_json::from_str(raw).map_err(|e| StoreError::Corrupt {
                key: comments_key(id),
                reason: e.to_string(),
            })
        })
        .collect()
}

#[async_trait]
impl NoteStore for RedisStore {
    async fn list_notes(&self) -> Result<Vec<Note>, StoreError> {
        let mut connection = self.connection.clone();

        let ids: Vec<String> = redis::cmd("ZREVRANGE")
            .arg(TIMELINE_KEY)
            .arg(0)
            .arg(-1)
            .query_async(&mut connection)
            .await?;

        let mut notes = Vec::with_capacity(ids.len());
        for id in ids {
            // deleted between the two reads
            if let Some(note) = self.fetch_note(&id).await? {
                notes.push(note);
            }
        }

        Ok(notes)
    }

    async fn fetch_note(&self, id: &str) -> Result<Option<Note>, StoreError> {
        let mut connection = self.connection.clone();

        let (fields, comments): (HashMap<String, String>, Vec<String>) = redis::pipe()
            .atomic()
            .cmd("HGETALL")
            .arg(note_key(id))
            .cmd("LRANGE")
            .arg(comments_key(id))
            .arg(0)
            .arg(-1)
            .query_async(&mut connection)
            .await?;

        if fields.is_empty() {
            return Ok(None);
        }

        decode_note(id, fields, comments).map(Some)
    }

    async fn insert_note(&self, note: &Note) -> Result<(), StoreError> {
        let mut connection = self.connection.clone();

        let () = redis::pipe()
            .atomic()
            .cmd("HSET")
            .arg(note_key(&note.id))
            .arg(FIELD_TITLE)
            .arg(&note.title)
            .arg(FIELD_MESSAGE)
            .arg(&note.message)
            .arg(FIELD_TIMESTAMP)
            .arg(encode_timestamp(&note.timestamp))
            .arg(FIELD_LIKED)
            .arg(if note.liked { "1" } else { "0" })
            .ignore()
            .cmd("ZADD")
            .arg(TIMELINE_KEY)
            .arg(note.timestamp.timestamp_millis())
            .arg(&note.id)
            .ignore()
            .query_async(&mut connection)
            .await?;

        debug!("Inserted note {}", note.id);
        Ok(())
    }

    async fn update_note(&self, id: &str, title: &str, message: &str) -> Result<bool, StoreError> {
        let mut connection = self.connection.clone();

        let updated: i64 = self
            .update_script
            .key(note_key(id))
            .arg(title)
            .arg(message)
            .invoke_async(&mut connection)
            .await?;

        Ok(updated == 1)
    }

    async fn delete_note(&self, id: &str) -> Result<(), StoreError> {
        let mut connection = self.connection.clone();

        let () = redis::pipe()
            .atomic()
            .cmd("DEL")
            .arg(note_key(id))
            .arg(comments_key(id))
            .ignore()
            .cmd("ZREM")
            .arg(TIMELINE_KEY)
            .arg(id)
            .ignore()
            .query_async(&mut connection)
            .await?;

        Ok(())
    }

    async fn set_liked(&self, id: &str, liked: bool) -> Result<bool, StoreError> {
        let mut connection = self.connection.clone();

        let updated: i64 = self
            .like_script
            .key(note_key(id))
            .arg(if liked { "1" } else { "0" })
            .invoke_async(&mut connection)
            .await?;

        Ok(updated == 1)
    }

    async fn push_comment(&self, id: &str, comment: &Comment) -> Result<bool, StoreError> {
        let mut connection = self.connection.clone();
        let encoded = serde_json::to_string(comment)?;

        let pushed: i64 = self
            .comment_script
            .key(note_key(id))
            .key(comments_key(id))
            .arg(encoded)
            .invoke_async(&mut connection)
            .await?;

        Ok(pushed == 1)
    }

    async fn list_comments(&self, id: &str) -> Result<Option<Vec<Comment>>, StoreError> {
        let mut connection = self.connection.clone();

        let (exists, comments): (bool, Vec<String>) = redis::pipe()
            .atomic()
            .cmd("EXISTS")
            .arg(note_key(id))
            .cmd("LRANGE")
            .arg(comments_key(id))
            .arg(0)
            .arg(-1)
            .query_async(&mut connection)
            .await?;

        if !exists {
            return Ok(None);
        }

        decode_comments(id, comments).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_decode_note() {
        let note = decode_note(
            "abc",
            fields(&[
                ("title", "Hi"),
                ("message", "There"),
                ("timestamp", "2026-10-18T09:12:44.120Z"),
                ("liked", "1"),
            ]),
            vec![r#"{"text":"aw","timestamp":"2026-10-18T09:13:02.001Z"}"#.to_string()],
        )
        .unwrap();

        assert_eq!(note.id, "abc");
        assert_eq!(note.title, "Hi");
        assert!(note.liked);
        assert_eq!(note.comments.len(), 1);
        assert_eq!(encode_timestamp(&note.timestamp), "2026-10-18T09:12:44.120Z");
    }

    #[test]
    fn test_decode_missing_field() {
        let result = decode_note("abc", fields(&[("title", "Hi")]), Vec::new());

        assert!(matches!(result, Err(StoreError::Corrupt { .. })));
    }

    #[test]
    fn test_decode_bad_comment() {
        let result = decode_comments("abc", vec!["not json".to_string()]);

        assert!(matches!(result, Err(StoreError::Corrupt { key, .. }) if key == "comments:abc"));
    }

    #[test]
    fn test_keys() {
        assert_eq!(note_key("x"), "note:x");
        assert_eq!(comments_key("x"), "comments:x");
        assert_ne!(note_key("x"), TIMELINE_KEY);
    }

    #[test]
    fn test_keys_never_alias() {
        let ids = [
            "5f0c",
            "5f0c:comments",
            "comments",
            "comments:5f0c",
            "note:5f0c",
            "timeline",
            "s:timeline",
            ":",
            "",
        ];

        for a in ids {
            for b in ids {
                assert_ne!(note_key(a), comments_key(b), "note {a:?} vs comments {b:?}");
                if a != b {
                    assert_ne!(note_key(a), note_key(b));
                    assert_ne!(comments_key(a), comments_key(b));
                }
            }
            assert_ne!(note_key(a), TIMELINE_KEY);
            assert_ne!(comments_key(a), TIMELINE_KEY);
        }
    }
}
