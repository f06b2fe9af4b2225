use std::sync::Arc;

use chrono::TimeDelta;

use crate::clock::Clock;
use crate::common::{ChatMessage, Participant, validation};
use crate::error::{ChatError, ChatResult};
use crate::storage::{Database, MessageLog, ParticipantRegistry};

/// Outcome of one eviction pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SweepReport {
    /// Participants removed and announced.
    pub evicted: Vec<String>,
    /// Participants removed whose departure notice could not be written.
    pub unannounced: Vec<String>,
}

impl SweepReport {
    pub fn is_empty(&self) -> bool {
        self.evicted.is_empty() && self.unannounced.is_empty()
    }
}

/// Join, heartbeat, messaging and eviction rules on top of the participant
/// registry and the message log.
pub struct PresenceEngine {
    registry: ParticipantRegistry,
    log: MessageLog,
    clock: Arc<dyn Clock>,
}

impl PresenceEngine {
    pub fn new(registry: ParticipantRegistry, log: MessageLog, clock: Arc<dyn Clock>) -> Self {
        Self {
            registry,
            log,
            clock,
        }
    }

    /// Builds registry and log on the same store.
    pub fn open(db: Arc<Database>, clock: Arc<dyn Clock>) -> ChatResult<Self> {
        let registry = ParticipantRegistry::new(Arc::clone(&db))?;
        let log = MessageLog::new(db)?;
        Ok(Self::new(registry, log, clock))
    }

    /// Register a participant and announce the arrival.
    ///
    /// The participant insert and the status append are two writes. If the
    /// append fails the participant stays registered and the error is
    /// returned; nothing is rolled back.
    pub fn join(&self, name: &str) -> ChatResult<Participant> {
        let name = validation::participant_name(name)?;
        let now = self.clock.now();

        let participant = self.registry.join(&name, now)?;
        if let Err(err) = self.log.append(&ChatMessage::joined(&name, now)) {
            log::error!("{name} registered but join notice was not written: {err}");
            return Err(err);
        }

        log::info!("{name} joined");
        Ok(participant)
    }

    pub fn heartbeat(&self, name: &str) -> ChatResult<()> {
        self.registry.touch(name.trim(), self.clock.now())?;
        log::debug!("Heartbeat from {name}");
        Ok(())
    }

    pub fn list_active(&self) -> ChatResult<Vec<Participant>> {
        self.registry.list()
    }

    /// Append a client message from `from`. The sender must be an active
    /// participant; an unknown sender is a validation failure.
    pub fn post_message(
        &self,
        from: &str,
        to: &str,
        text: &str,
        kind: &str,
    ) -> ChatResult<ChatMessage> {
        let draft = validation::message(to, text, kind)?;
        let from = from.trim();
        if from.is_empty() {
            return Err(ChatError::invalid("sender must not be empty"));
        }
        if !self.registry.exists(from)? {
            return Err(ChatError::invalid(format!("sender `{from}` is not a participant")));
        }

        let message = ChatMessage::new(from, draft.to, draft.text, draft.kind, self.clock.now());
        self.log.append(&message)?;
        Ok(message)
    }

    /// Messages readable by `viewer`, optionally only the latest `limit`.
    pub fn fetch_messages(
        &self,
        viewer: Option<&str>,
        limit: Option<&str>,
    ) -> ChatResult<Vec<ChatMessage>> {
        let viewer = validation::viewer(viewer)?;
        let limit = validation::limit(limit)?;
        self.log.visible(&viewer, limit)
    }

    pub fn message_count(&self) -> ChatResult<usize> {
        self.log.len()
    }

    /// Evict everyone untouched for at least `threshold` and announce each
    /// departure. A failed notice is logged and does not stop the pass.
    pub fn sweep(&self, threshold: TimeDelta) -> ChatResult<SweepReport> {
        let now = self.clock.now();
        let removed = self.registry.remove_stale(now, threshold)?;

        let mut report = SweepReport::default();
        for participant in removed {
            match self.log.append(&ChatMessage::left(&participant.name, now)) {
                Ok(()) => {
                    log::info!(
                        "{} evicted after {}ms of silence",
                        participant.name,
                        now.timestamp_millis() - participant.last_status
                    );
                    report.evicted.push(participant.name);
                }
                Err(err) => {
                    log::error!("{} evicted but leave notice failed: {err}", participant.name);
                    report.unannounced.push(participant.name);
                }
            }
        }

        Ok(report)
    }
}
