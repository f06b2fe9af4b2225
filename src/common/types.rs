use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::clock::format_time;

/// Recipient alias meaning "everyone in the room". Never a valid participant name.
pub const BROADCAST: &str = "Todos";
pub const JOIN_TEXT: &str = "entra na sala...";
pub const LEAVE_TEXT: &str = "sai da sala...";

/// An active chat participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub name: String,
    /// Milliseconds since epoch of the last join or heartbeat.
    #[serde(rename = "lastStatus")]
    pub last_status: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Message,
    PrivateMessage,
    /// Join/leave notice, only ever written by the server.
    Status,
}

impl MessageKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MessageKind::Message => "message",
            MessageKind::PrivateMessage => "private_message",
            MessageKind::Status => "status",
        }
    }

    /// Kinds a client may post.
    pub fn is_client_kind(self) -> bool {
        !matches!(self, MessageKind::Status)
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownKind(pub String);

impl fmt::Display for UnknownKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown message type `{}`", self.0)
    }
}

impl std::error::Error for UnknownKind {}

impl FromStr for MessageKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "message" => Ok(MessageKind::Message),
            "private_message" => Ok(MessageKind::PrivateMessage),
            "status" => Ok(MessageKind::Status),
            other => Err(UnknownKind(other.to_string())),
        }
    }
}

/// A chat log entry as served to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub from: String,
    pub to: String,
    pub text: String,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    /// `HH:mm:ss`, assigned by the server when the entry is written.
    pub time: String,
}

impl ChatMessage {
    pub fn new(
        from: impl Into<String>,
        to: impl Into<String>,
        text: impl Into<String>,
        kind: MessageKind,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            text: text.into(),
            kind,
            time: format_time(at),
        }
    }

    /// Broadcast notice that `name` entered the room.
    pub fn joined(name: &str, at: DateTime<Utc>) -> Self {
        Self::new(name, BROADCAST, JOIN_TEXT, MessageKind::Status, at)
    }

    /// Broadcast notice that `name` was evicted.
    pub fn left(name: &str, at: DateTime<Utc>) -> Self {
        Self::new(name, BROADCAST, LEAVE_TEXT, MessageKind::Status, at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_serializes_with_wire_field_names() {
        let msg = ChatMessage {
            from: "alice".into(),
            to: "bob".into(),
            text: "oi".into(),
            kind: MessageKind::PrivateMessage,
            time: "12:00:00".into(),
        };

        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "private_message");
        assert_eq!(json["from"], "alice");
        assert_eq!(json["time"], "12:00:00");
    }

    #[test]
    fn participant_exposes_last_status() {
        let p = Participant {
            name: "alice".into(),
            last_status: 42,
        };
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["lastStatus"], 42);
    }

    #[test]
    fn status_notices_target_broadcast() {
        let msg = ChatMessage::left("alice", Utc::now());
        assert_eq!(msg.to, BROADCAST);
        assert_eq!(msg.kind, MessageKind::Status);
        assert_eq!(msg.text, LEAVE_TEXT);
    }

    #[test]
    fn kind_parses_known_names_only() {
        assert_eq!("status".parse::<MessageKind>(), Ok(MessageKind::Status));
        assert!("Message".parse::<MessageKind>().is_err());
        assert!(!MessageKind::Status.is_client_kind());
    }
}
