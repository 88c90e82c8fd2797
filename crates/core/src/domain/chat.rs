use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default title assigned at creation; replaced by a preview of the first
/// user message once the chat receives its first reply.
pub const DEFAULT_CHAT_TITLE: &str = "New chat";

/// Maximum characters of the first user message kept when deriving a title.
pub const TITLE_PREVIEW_CHARS: usize = 50;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatId(pub String);

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub String);

impl ChatId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl MessageId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl std::fmt::Display for ChatId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "user" => Some(Self::User),
            "assistant" => Some(Self::Assistant),
            _ => None,
        }
    }
}

/// A conversation container. Messages reference it by id; deleting a chat
/// cascades to its messages at the repository layer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chat {
    pub id: ChatId,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Chat {
    pub fn new(title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self { id: ChatId::generate(), title: title.into(), created_at: now, updated_at: now }
    }
}

/// One persisted turn of a chat. Only the user/assistant endpoints of an
/// exchange are stored; intermediate tool traffic stays in the loop.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub chat_id: ChatId,
    pub role: MessageRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(chat_id: ChatId, role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            id: MessageId::generate(),
            chat_id,
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Derive a chat title from the first user message: the leading
/// `TITLE_PREVIEW_CHARS` characters, with a trailing ellipsis when truncated.
pub fn title_preview(first_message: &str) -> String {
    let chars: Vec<char> = first_message.chars().collect();
    if chars.len() > TITLE_PREVIEW_CHARS {
        let mut preview: String = chars[..TITLE_PREVIEW_CHARS].iter().collect();
        preview.push_str("...");
        preview
    } else {
        first_message.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::{title_preview, Chat, ChatId, Message, MessageRole, TITLE_PREVIEW_CHARS};

    #[test]
    fn short_message_becomes_title_verbatim() {
        assert_eq!(title_preview("list active scenarios"), "list active scenarios");
    }

    #[test]
    fn long_message_is_truncated_with_ellipsis() {
        let long = "x".repeat(80);
        let title = title_preview(&long);
        assert_eq!(title.chars().count(), TITLE_PREVIEW_CHARS + 3);
        assert!(title.ends_with("..."));
    }

    #[test]
    fn boundary_length_message_is_not_truncated() {
        let exact = "y".repeat(TITLE_PREVIEW_CHARS);
        assert_eq!(title_preview(&exact), exact);
    }

    #[test]
    fn message_carries_owning_chat_id() {
        let chat = Chat::new("New chat");
        let message = Message::new(chat.id.clone(), MessageRole::User, "hello");
        assert_eq!(message.chat_id, chat.id);
        assert_eq!(message.role.as_str(), "user");
    }

    #[test]
    fn role_round_trips_through_str() {
        assert_eq!(MessageRole::parse("assistant"), Some(MessageRole::Assistant));
        assert_eq!(MessageRole::parse("system"), None);
        assert_eq!(MessageRole::parse(MessageRole::User.as_str()), Some(MessageRole::User));
    }

    #[test]
    fn generated_ids_are_unique() {
        assert_ne!(ChatId::generate(), ChatId::generate());
    }
}
