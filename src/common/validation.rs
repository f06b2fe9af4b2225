//! Pure request checks shared by the HTTP layer and the presence engine.

use crate::error::{ChatError, ChatResult};

use super::types::{BROADCAST, MessageKind};

/// Client-supplied message fields after validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageDraft {
    pub to: String,
    pub text: String,
    pub kind: MessageKind,
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Returns the trimmed name, rejecting blanks and the broadcast alias.
pub fn participant_name(raw: &str) -> ChatResult<String> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(ChatError::invalid("name must not be empty"));
    }
    if name == BROADCAST {
        return Err(ChatError::invalid(format!("`{BROADCAST}` is reserved")));
    }
    Ok(name.to_string())
}

/// Only `message` and `private_message` may come from clients.
pub fn client_kind(raw: &str) -> ChatResult<MessageKind> {
    match raw.parse::<MessageKind>() {
        Ok(kind) if kind.is_client_kind() => Ok(kind),
        Ok(kind) => Err(ChatError::invalid(format!("type `{kind}` is server-only"))),
        Err(err) => Err(ChatError::invalid(err.to_string())),
    }
}

pub fn message(to: &str, text: &str, kind: &str) -> ChatResult<MessageDraft> {
    let kind = client_kind(kind)?;
    if is_blank(to) {
        return Err(ChatError::invalid("`to` must not be empty"));
    }
    if is_blank(text) {
        return Err(ChatError::invalid("`text` must not be empty"));
    }
    Ok(MessageDraft {
        to: to.trim().to_string(),
        text: text.to_string(),
        kind,
    })
}

/// The identity header of a reader. Missing or blank is `Unauthorized`.
pub fn viewer(raw: Option<&str>) -> ChatResult<String> {
    match raw.map(str::trim) {
        Some(name) if !name.is_empty() => Ok(name.to_string()),
        _ => Err(ChatError::Unauthorized),
    }
}

/// Parses an optional `limit`. Present values must be positive integers.
pub fn limit(raw: Option<&str>) -> ChatResult<Option<usize>> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    match raw.trim().parse::<usize>() {
        Ok(0) => Err(ChatError::invalid("limit must be positive")),
        Ok(n) => Ok(Some(n)),
        Err(_) => Err(ChatError::invalid(format!("limit `{raw}` is not a positive integer"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_invalid<T: std::fmt::Debug>(result: ChatResult<T>) -> bool {
        matches!(result, Err(ChatError::InvalidArgument(_)))
    }

    #[test]
    fn names_are_trimmed_and_checked() {
        assert_eq!(participant_name("  alice ").unwrap(), "alice");
        assert!(is_invalid(participant_name("")));
        assert!(is_invalid(participant_name("   ")));
        assert!(is_invalid(participant_name("Todos")));
        assert!(is_invalid(participant_name(" Todos ")));
    }

    #[test]
    fn status_cannot_be_posted_by_clients() {
        assert_eq!(client_kind("message").unwrap(), MessageKind::Message);
        assert_eq!(client_kind("private_message").unwrap(), MessageKind::PrivateMessage);
        assert!(is_invalid(client_kind("status")));
        assert!(is_invalid(client_kind("broadcast")));
        assert!(is_invalid(client_kind("")));
    }

    #[test]
    fn message_requires_recipient_and_text() {
        assert!(is_invalid(message("", "hi", "message")));
        assert!(is_invalid(message("Todos", "", "message")));
        assert!(is_invalid(message("Todos", "hi", "status")));

        let draft = message("bob", "psst", "private_message").unwrap();
        assert_eq!(draft.to, "bob");
        assert_eq!(draft.kind, MessageKind::PrivateMessage);
    }

    #[test]
    fn recipient_is_trimmed_like_other_names() {
        let draft = message("  bob ", " keep my spaces ", "private_message").unwrap();
        assert_eq!(draft.to, "bob");
        assert_eq!(draft.text, " keep my spaces ");
        assert_eq!(draft.kind, MessageKind::PrivateMessage);
    }

    #[test]
    fn missing_viewer_is_unauthorized() {
        assert!(matches!(viewer(None), Err(ChatError::Unauthorized)));
        assert!(matches!(viewer(Some("  ")), Err(ChatError::Unauthorized)));
        assert_eq!(viewer(Some("carol")).unwrap(), "carol");
    }

    #[test]
    fn limit_must_be_a_positive_integer() {
        assert_eq!(limit(None).unwrap(), None);
        assert_eq!(limit(Some("3")).unwrap(), Some(3));
        for bad in ["0", "-1", "abc", "1.5", ""] {
            assert!(is_invalid(limit(Some(bad))), "accepted {bad:?}");
        }
    }
}
