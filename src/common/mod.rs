pub mod types;
pub mod validation;

pub use types::{BROADCAST, ChatMessage, JOIN_TEXT, LEAVE_TEXT, MessageKind, Participant};
