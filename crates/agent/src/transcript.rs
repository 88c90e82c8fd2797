//! The conversation transcript exchanged with the completion service.
//!
//! Turns use the Gemini wire shape directly: a `role` of `user` or `model`
//! and a list of parts, where a part is plain text, a function call issued
//! by the model, or a function response supplied by the host. The
//! completion loop appends call/response turns mid-flight; this module owns
//! only the types and the initial framing built from persisted history.

use analyst_core::domain::chat::{Message, MessageRole};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Model,
}

/// A structured call request as the model issued it. `id` is the optional
/// call identifier; the Gemini protocol correlates responses by `name`, so
/// `id` is echoed when provided and omitted from the wire otherwise.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    #[serde(default)]
    pub args: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FunctionResponse {
    pub name: String,
    pub response: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

/// One content item. The externally-tagged serde representation matches the
/// wire format: `{"text": ...}`, `{"functionCall": {...}}`,
/// `{"functionResponse": {...}}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Part {
    #[serde(rename = "text")]
    Text(String),
    #[serde(rename = "functionCall")]
    FunctionCall(FunctionCall),
    #[serde(rename = "functionResponse")]
    FunctionResponse(FunctionResponse),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: TurnRole,
    pub parts: Vec<Part>,
}

impl Turn {
    pub fn user_text(text: impl Into<String>) -> Self {
        Self { role: TurnRole::User, parts: vec![Part::Text(text.into())] }
    }

    pub fn model_text(text: impl Into<String>) -> Self {
        Self { role: TurnRole::Model, parts: vec![Part::Text(text.into())] }
    }
}

/// Frame the persisted message history for a fresh completion-loop run.
///
/// The history must already end with the inbound user message (it is
/// persisted before the loop starts). The system prompt is prepended to the
/// text of the very first user turn only; later turns never repeat it, no
/// matter how many loop iterations follow.
pub fn build_initial_transcript(history: &[Message], system_prompt: &str) -> Vec<Turn> {
    let mut turns = Vec::with_capacity(history.len());

    for message in history {
        let role = match message.role {
            MessageRole::User => TurnRole::User,
            MessageRole::Assistant => TurnRole::Model,
        };

        let text = if turns.is_empty() && role == TurnRole::User && !system_prompt.is_empty() {
            format!("{system_prompt}\n\n{}", message.content)
        } else {
            message.content.clone()
        };

        turns.push(Turn { role, parts: vec![Part::Text(text)] });
    }

    turns
}
