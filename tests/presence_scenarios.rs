//! End-to-end presence scenarios against an in-memory store and a manual clock.

use std::sync::Arc;

use chat_presence::ChatError;
use chat_presence::clock::ManualClock;
use chat_presence::common::{BROADCAST, ChatMessage, LEAVE_TEXT, MessageKind};
use chat_presence::presence::PresenceEngine;
use chat_presence::storage::{Database, MessageLog, ParticipantRegistry};
use chrono::TimeDelta;

const T: TimeDelta = TimeDelta::milliseconds(15_000);

struct Room {
    engine: PresenceEngine,
    clock: Arc<ManualClock>,
}

impl Room {
    fn new() -> Self {
        let db = Arc::new(Database::in_memory().unwrap());
        let clock = Arc::new(ManualClock::at_epoch());
        let registry = ParticipantRegistry::new(Arc::clone(&db)).unwrap();
        let log = MessageLog::new(db).unwrap();
        let engine = PresenceEngine::new(registry, log, clock.clone());
        Self { engine, clock }
    }

    fn seen_by(&self, viewer: &str) -> Vec<ChatMessage> {
        self.engine.fetch_messages(Some(viewer), None).unwrap()
    }

    fn active(&self) -> Vec<String> {
        self.engine
            .list_active()
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect()
    }
}

#[test]
fn joining_twice_conflicts() {
    let room = Room::new();
    for name in ["alice", "bob", "zé"] {
        room.engine.join(name).unwrap();
        assert!(matches!(room.engine.join(name), Err(ChatError::Conflict(_))));
    }
}

#[test]
fn broadcast_alias_cannot_join() {
    let room = Room::new();
    assert!(matches!(room.engine.join(BROADCAST), Err(ChatError::InvalidArgument(_))));
    assert!(room.active().is_empty());
}

#[test]
fn join_is_listed_and_announced_to_everyone() {
    let room = Room::new();
    room.engine.join("alice").unwrap();

    assert_eq!(room.active(), ["alice"]);
    for viewer in ["alice", "bob", "carol"] {
        let seen = room.seen_by(viewer);
        assert!(seen.iter().any(|m| {
            m.from == "alice" && m.to == BROADCAST && m.kind == MessageKind::Status
        }));
    }
}

#[test]
fn private_messages_are_scoped_to_sender_and_recipient() {
    let room = Room::new();
    room.engine.join("alice").unwrap();
    room.engine.join("bob").unwrap();
    room.engine
        .post_message("alice", "bob", "just us", "private_message")
        .unwrap();

    let has_secret = |viewer: &str| room.seen_by(viewer).iter().any(|m| m.text == "just us");
    assert!(has_secret("alice"));
    assert!(has_secret("bob"));
    assert!(!has_secret("carol"));
}

#[test]
fn limit_returns_latest_window_oldest_first() {
    let room = Room::new();
    room.engine.join("alice").unwrap();
    for i in 0..9 {
        room.engine
            .post_message("alice", BROADCAST, &format!("msg {i}"), "message")
            .unwrap();
    }

    // join notice + 9 messages = 10 visible entries
    assert_eq!(room.seen_by("bob").len(), 10);

    let window = room.engine.fetch_messages(Some("bob"), Some("3")).unwrap();
    let texts: Vec<&str> = window.iter().map(|m| m.text.as_str()).collect();
    assert_eq!(texts, ["msg 6", "msg 7", "msg 8"]);
}

#[test]
fn malformed_limits_are_rejected() {
    let room = Room::new();
    for limit in ["-1", "abc", "0"] {
        let result = room.engine.fetch_messages(Some("bob"), Some(limit));
        assert!(matches!(result, Err(ChatError::InvalidArgument(_))), "{limit}");
    }
}

#[test]
fn silent_participant_is_evicted_and_announced() {
    let room = Room::new();
    room.engine.join("alice").unwrap();
    room.clock.advance(T);

    let report = room.engine.sweep(T).unwrap();
    assert_eq!(report.evicted, ["alice"]);
    assert!(room.active().is_empty());

    let last = room.seen_by("bob").pop().unwrap();
    assert_eq!(last.from, "alice");
    assert_eq!(last.to, BROADCAST);
    assert_eq!(last.kind, MessageKind::Status);
    assert_eq!(last.text, LEAVE_TEXT);
}

#[test]
fn heartbeat_within_window_prevents_eviction() {
    let room = Room::new();
    room.engine.join("alice").unwrap();
    room.clock.advance(T / 2);
    room.engine.heartbeat("alice").unwrap();
    room.clock.advance(T / 2);

    assert!(room.engine.sweep(T).unwrap().evicted.is_empty());
    assert_eq!(room.active(), ["alice"]);

    // A full window after the heartbeat, alice goes.
    room.clock.advance(T / 2);
    assert_eq!(room.engine.sweep(T).unwrap().evicted, ["alice"]);
}

#[test]
fn evicted_participant_can_rejoin_and_must_heartbeat_again() {
    let room = Room::new();
    room.engine.join("alice").unwrap();
    room.clock.advance(T);
    room.engine.sweep(T).unwrap();

    assert!(matches!(room.engine.heartbeat("alice"), Err(ChatError::NotFound(_))));
    assert!(matches!(
        room.engine.post_message("alice", BROADCAST, "still here?", "message"),
        Err(ChatError::InvalidArgument(_))
    ));

    room.engine.join("alice").unwrap();
    assert_eq!(room.active(), ["alice"]);
}

#[test]
fn posted_messages_round_trip() {
    let room = Room::new();
    room.engine.join("alice").unwrap();
    room.engine.join("bob").unwrap();

    let public = room
        .engine
        .post_message("alice", BROADCAST, "olá a todos", "message")
        .unwrap();
    let private = room
        .engine
        .post_message("bob", "alice", "oi alice", "private_message")
        .unwrap();

    assert!(room.seen_by("carol").contains(&public));
    assert!(room.seen_by("alice").contains(&private));
    assert!(room.seen_by("bob").contains(&private));
}
