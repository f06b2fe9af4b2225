use std::sync::Arc;

use rusqlite::types::Type;
use rusqlite::{Result as SqlResult, Row, params};

use crate::common::{ChatMessage, MessageKind};
use crate::error::ChatResult;

use super::database::Database;

/// Append-only chat log. Entries are ordered by insertion.
pub struct MessageLog {
    db: Arc<Database>,
}

fn message_from_row(row: &Row<'_>) -> SqlResult<ChatMessage> {
    let kind: String = row.get(3)?;
    let kind = kind
        .parse::<MessageKind>()
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(err)))?;

    Ok(ChatMessage {
        from: row.get(0)?,
        to: row.get(1)?,
        text: row.get(2)?,
        kind,
        time: row.get(4)?,
    })
}

impl MessageLog {
    pub fn new(db: Arc<Database>) -> ChatResult<Self> {
        let log = Self { db };
        log.init_schema()?;
        Ok(log)
    }

    fn init_schema(&self) -> SqlResult<()> {
        self.db.with_conn(|conn| {
            conn.execute(
                "CREATE TABLE IF NOT EXISTS messages (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    sender TEXT NOT NULL,
                    recipient TEXT NOT NULL,
                    text TEXT NOT NULL,
                    kind TEXT NOT NULL,
                    time TEXT NOT NULL
                )",
                [],
            )?;

            conn.execute(
                "CREATE INDEX IF NOT EXISTS idx_messages_sender ON messages(sender)",
                [],
            )?;
            conn.execute(
                "CREATE INDEX IF NOT EXISTS idx_messages_recipient ON messages(recipient)",
                [],
            )?;

            Ok(())
        })
    }

    /// Append a fully formed message to the end of the log.
    pub fn append(&self, message: &ChatMessage) -> ChatResult<()> {
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO messages (sender, recipient, text, kind, time)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    message.from,
                    message.to,
                    message.text,
                    message.kind.as_str(),
                    message.time
                ],
            )
        })?;
        Ok(())
    }

    /// Messages `viewer` may read: public chat, status notices and private
    /// messages sent by or to `viewer`. Oldest first.
    ///
    /// With a `limit`, only the latest `limit` matches are returned, still
    /// oldest first.
    pub fn visible(&self, viewer: &str, limit: Option<usize>) -> ChatResult<Vec<ChatMessage>> {
        // SQLite treats a negative LIMIT as "no limit".
        let limit = limit.map_or(-1, |n| i64::try_from(n).unwrap_or(i64::MAX));

        let mut messages = self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT sender, recipient, text, kind, time
                 FROM messages
                 WHERE kind IN ('message', 'status') OR sender = ?1 OR recipient = ?1
                 ORDER BY id DESC
                 LIMIT ?2",
            )?;
            let rows = stmt
                .query_map(params![viewer, limit], message_from_row)?
                .collect::<SqlResult<Vec<_>>>()?;
            Ok::<_, rusqlite::Error>(rows)
        })?;

        messages.reverse();
        Ok(messages)
    }

    /// Total number of entries, regardless of visibility.
    pub fn len(&self) -> ChatResult<usize> {
        let count: i64 = self
            .db
            .with_conn(|conn| conn.query_row("SELECT COUNT(*) FROM messages", [], |row| row.get(0)))?;
        Ok(count as usize)
    }

    pub fn is_empty(&self) -> ChatResult<bool> {
        Ok(self.len()? == 0)
    }
}
