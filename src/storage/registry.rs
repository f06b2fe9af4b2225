use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use rusqlite::{ErrorCode, OptionalExtension, Result as SqlResult, Row, params};

use crate::common::Participant;
use crate::error::{ChatError, ChatResult};

use super::database::Database;

/// Authoritative set of active participants, keyed by unique name.
pub struct ParticipantRegistry {
    db: Arc<Database>,
}

fn participant_from_row(row: &Row<'_>) -> SqlResult<Participant> {
    Ok(Participant {
        name: row.get(0)?,
        last_status: row.get(1)?,
    })
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(inner, _) if inner.code == ErrorCode::ConstraintViolation
    )
}

impl ParticipantRegistry {
    pub fn new(db: Arc<Database>) -> ChatResult<Self> {
        let registry = Self { db };
        registry.init_schema()?;
        Ok(registry)
    }

    fn init_schema(&self) -> SqlResult<()> {
        self.db.with_conn(|conn| {
            conn.execute(
                "CREATE TABLE IF NOT EXISTS participants (
                    seq INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL UNIQUE,
                    last_status INTEGER NOT NULL
                )",
                [],
            )?;

            conn.execute(
                "CREATE INDEX IF NOT EXISTS idx_participants_last_status ON participants(last_status)",
                [],
            )?;

            Ok(())
        })
    }

    /// Register `name` as seen at `at`. Fails with `Conflict` if the name is taken.
    pub fn join(&self, name: &str, at: DateTime<Utc>) -> ChatResult<Participant> {
        let participant = Participant {
            name: name.to_string(),
            last_status: at.timestamp_millis(),
        };

        self.db.with_conn(|conn| {
            let taken = conn
                .query_row(
                    "SELECT 1 FROM participants WHERE name = ?1",
                    params![name],
                    |_| Ok(()),
                )
                .optional()?
                .is_some();
            if taken {
                return Err(ChatError::Conflict(name.to_string()));
            }

            conn.execute(
                "INSERT INTO participants (name, last_status) VALUES (?1, ?2)",
                params![participant.name, participant.last_status],
            )
            .map_err(|err| {
                if is_unique_violation(&err) {
                    ChatError::Conflict(name.to_string())
                } else {
                    ChatError::Storage(err)
                }
            })?;

            Ok(())
        })?;

        Ok(participant)
    }

    /// Refresh `last_status` for an existing participant.
    pub fn touch(&self, name: &str, at: DateTime<Utc>) -> ChatResult<()> {
        let updated = self.db.with_conn(|conn| {
            conn.execute(
                "UPDATE participants SET last_status = ?1 WHERE name = ?2",
                params![at.timestamp_millis(), name],
            )
        })?;

        if updated == 0 {
            return Err(ChatError::NotFound(name.to_string()));
        }
        Ok(())
    }

    /// All active participants, in join order.
    pub fn list(&self) -> ChatResult<Vec<Participant>> {
        let participants = self.db.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT name, last_status FROM participants ORDER BY seq ASC")?;
            let rows = stmt
                .query_map([], participant_from_row)?
                .collect::<SqlResult<Vec<_>>>()?;
            Ok::<_, rusqlite::Error>(rows)
        })?;
        Ok(participants)
    }

    pub fn find(&self, name: &str) -> ChatResult<Option<Participant>> {
        let participant = self.db.with_conn(|conn| {
            conn.query_row(
                "SELECT name, last_status FROM participants WHERE name = ?1",
                params![name],
                participant_from_row,
            )
            .optional()
        })?;
        Ok(participant)
    }

    pub fn exists(&self, name: &str) -> ChatResult<bool> {
        Ok(self.find(name)?.is_some())
    }

    /// Remove `name` regardless of staleness.
    pub fn remove(&self, name: &str) -> ChatResult<Participant> {
        let removed = self.db.with_conn(|conn| {
            conn.query_row(
                "DELETE FROM participants WHERE name = ?1 RETURNING name, last_status",
                params![name],
                participant_from_row,
            )
            .optional()
        })?;
        removed.ok_or_else(|| ChatError::NotFound(name.to_string()))
    }

    /// Remove every participant untouched for at least `threshold` as of `now`
    /// and return the ones actually removed.
    ///
    /// Candidates are scanned first, then deleted one by one with the same
    /// cutoff in the `WHERE` clause, so a participant refreshed between the
    /// scan and its delete survives. A failed delete is logged and skipped.
    pub fn remove_stale(
        &self,
        now: DateTime<Utc>,
        threshold: TimeDelta,
    ) -> ChatResult<Vec<Participant>> {
        let Some(cutoff) = now.checked_sub_signed(threshold) else {
            return Ok(Vec::new());
        };
        let cutoff = cutoff.timestamp_millis();

        let candidates = self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT name, last_status FROM participants
                 WHERE last_status <= ?1
                 ORDER BY seq ASC",
            )?;
            let rows = stmt
                .query_map(params![cutoff], participant_from_row)?
                .collect::<SqlResult<Vec<_>>>()?;
            Ok::<_, rusqlite::Error>(rows)
        })?;

        let mut removed = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let deleted = self.db.with_conn(|conn| {
                conn.execute(
                    "DELETE FROM participants WHERE name = ?1 AND last_status <= ?2",
                    params![candidate.name, cutoff],
                )
            });

            match deleted {
                Ok(0) => {
                    log::debug!("{} refreshed during sweep, keeping", candidate.name);
                }
                Ok(_) => removed.push(candidate),
                Err(err) => {
                    log::error!("Failed to remove stale participant {}: {err}", candidate.name);
                }
            }
        }

        Ok(removed)
    }
}
