//! Chat session management endpoints.
//!
//! JSON API:
//! - `POST   /api/chats`                      — create a chat
//! - `GET    /api/chats`                      — list chats, most recent first
//! - `DELETE /api/chats/{chat_id}`            — delete a chat and its messages
//! - `GET    /api/chats/{chat_id}/messages`   — list messages chronologically
//! - `POST   /api/chats/{chat_id}/messages`   — post a message and run the
//!   completion loop to produce the assistant reply
//! - `GET /` and `GET /api`                   — service banner
//!
//! Posting a message persists the user turn, replays the full history
//! through the completion loop, persists the assistant turn, refreshes the
//! chat's `updated_at`, and retitles the chat from the first user message
//! the first time it gets a reply.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{error, info};

use analyst_agent::{CompletionLoop, LlmClient, ToolExecutor};
use analyst_agent::prompts::PRICING_ANALYST_PROMPT;
use analyst_agent::transcript::build_initial_transcript;
use analyst_core::domain::chat::{
    title_preview, Chat, ChatId, Message, MessageRole, DEFAULT_CHAT_TITLE,
};
use analyst_db::repositories::{ChatRepository, MessageRepository, RepositoryError};

#[derive(Clone)]
pub struct ChatState {
    chats: Arc<dyn ChatRepository>,
    messages: Arc<dyn MessageRepository>,
    llm: Arc<dyn LlmClient>,
    executor: Arc<dyn ToolExecutor>,
}

impl ChatState {
    pub fn new(
        chats: Arc<dyn ChatRepository>,
        messages: Arc<dyn MessageRepository>,
        llm: Arc<dyn LlmClient>,
        executor: Arc<dyn ToolExecutor>,
    ) -> Self {
        Self { chats, messages, llm, executor }
    }
}

// ---------------------------------------------------------------------------
// Request / Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CreateChatRequest {
    #[serde(default = "default_title")]
    pub title: String,
}

fn default_title() -> String {
    DEFAULT_CHAT_TITLE.to_string()
}

#[derive(Debug, Deserialize)]
pub struct PostMessageRequest {
    pub content: String,
}

/// Both sides of one exchange, as persisted.
#[derive(Debug, Serialize)]
pub struct ExchangeResponse {
    pub user_message: Message,
    pub assistant_message: Message,
}

#[derive(Debug, Serialize)]
pub struct ChatApiError {
    pub error: String,
}

type ApiError = (StatusCode, Json<ChatApiError>);

fn internal_error(context: &str, error: RepositoryError) -> ApiError {
    error!(error = %error, context, "chat persistence failure");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ChatApiError { error: "persistence failure".to_string() }),
    )
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn router(state: ChatState) -> Router {
    Router::new()
        .route("/", get(service_banner))
        .route("/api", get(api_banner))
        .route("/api/chats", post(create_chat).get(list_chats))
        .route("/api/chats/{chat_id}", delete(delete_chat))
        .route("/api/chats/{chat_id}/messages", get(list_messages).post(post_message))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

pub async fn service_banner() -> Json<Value> {
    Json(json!({
        "message": "ClearDemand AI Pricing Analyst API",
        "docs": "/docs",
        "api": "/api",
    }))
}

pub async fn api_banner() -> Json<Value> {
    Json(json!({ "message": "ClearDemand AI Pricing Analyst API" }))
}

pub async fn create_chat(
    State(state): State<ChatState>,
    Json(request): Json<CreateChatRequest>,
) -> Result<Json<Chat>, ApiError> {
    let chat = Chat::new(request.title);
    state.chats.insert(&chat).await.map_err(|error| internal_error("create_chat", error))?;

    info!(chat_id = %chat.id, "chat created");
    Ok(Json(chat))
}

pub async fn list_chats(State(state): State<ChatState>) -> Result<Json<Vec<Chat>>, ApiError> {
    let chats =
        state.chats.list_recent().await.map_err(|error| internal_error("list_chats", error))?;
    Ok(Json(chats))
}

pub async fn delete_chat(
    Path(chat_id): Path<String>,
    State(state): State<ChatState>,
) -> Result<Json<Value>, ApiError> {
    let chat_id = ChatId(chat_id);

    let removed = state
        .chats
        .delete(&chat_id)
        .await
        .map_err(|error| internal_error("delete_chat", error))?;

    // Cascade runs even when the chat row was already gone.
    let cascade = state
        .messages
        .delete_for_chat(&chat_id)
        .await
        .map_err(|error| internal_error("delete_chat_messages", error))?;

    if !removed {
        return Err((
            StatusCode::NOT_FOUND,
            Json(ChatApiError { error: "Chat not found".to_string() }),
        ));
    }

    info!(chat_id = %chat_id, cascade_deleted = cascade, "chat deleted");
    Ok(Json(json!({ "message": "Chat deleted" })))
}

pub async fn list_messages(
    Path(chat_id): Path<String>,
    State(state): State<ChatState>,
) -> Result<Json<Vec<Message>>, ApiError> {
    let messages = state
        .messages
        .list_for_chat(&ChatId(chat_id))
        .await
        .map_err(|error| internal_error("list_messages", error))?;
    Ok(Json(messages))
}

pub async fn post_message(
    Path(chat_id): Path<String>,
    State(state): State<ChatState>,
    Json(request): Json<PostMessageRequest>,
) -> Result<Json<ExchangeResponse>, ApiError> {
    let chat_id = ChatId(chat_id);

    let user_message = Message::new(chat_id.clone(), MessageRole::User, request.content.clone());
    state
        .messages
        .insert(&user_message)
        .await
        .map_err(|error| internal_error("persist_user_message", error))?;

    // The full history (ending with the message just persisted) is re-sent
    // every request; conversational memory is the transcript itself.
    let history = state
        .messages
        .list_for_chat(&chat_id)
        .await
        .map_err(|error| internal_error("load_history", error))?;
    let transcript = build_initial_transcript(&history, PRICING_ANALYST_PROMPT);

    let answer =
        CompletionLoop::new(state.llm.as_ref(), state.executor.as_ref()).run(transcript).await;

    let assistant_message = Message::new(chat_id.clone(), MessageRole::Assistant, answer);
    state
        .messages
        .insert(&assistant_message)
        .await
        .map_err(|error| internal_error("persist_assistant_message", error))?;

    finalize_chat(&state, &chat_id, &request.content).await?;

    Ok(Json(ExchangeResponse { user_message, assistant_message }))
}

/// Refresh the chat watermark and derive a title from the first user
/// message the first time the chat receives a reply. A missing chat row is
/// tolerated; messages keep their dangling chat id (soft invariant).
async fn finalize_chat(state: &ChatState, chat_id: &ChatId, content: &str) -> Result<(), ApiError> {
    let chat = state
        .chats
        .find_by_id(chat_id)
        .await
        .map_err(|error| internal_error("load_chat", error))?;

    let Some(chat) = chat else {
        return Ok(());
    };

    let now = Utc::now();
    if chat.title == DEFAULT_CHAT_TITLE {
        state
            .chats
            .rename(chat_id, &title_preview(content), now)
            .await
            .map_err(|error| internal_error("rename_chat", error))?;
    } else {
        state
            .chats
            .touch(chat_id, now)
            .await
            .map_err(|error| internal_error("touch_chat", error))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use axum::extract::{Path, State};
    use axum::http::StatusCode;
    use axum::Json;
    use serde_json::{json, Value};

    use analyst_agent::catalog::ToolDescriptor;
    use analyst_agent::executor::{ToolExecutor, ToolOutcome};
    use analyst_agent::llm::{LlmClient, LlmError, ModelReply};
    use analyst_agent::transcript::{FunctionCall, Part, Turn};
    use analyst_core::domain::chat::MessageRole;
    use analyst_db::repositories::{InMemoryChatRepository, InMemoryMessageRepository};

    use super::{
        create_chat, delete_chat, list_chats, list_messages, post_message, ChatState,
        CreateChatRequest, PostMessageRequest,
    };

    struct ScriptedLlm {
        replies: Mutex<VecDeque<ModelReply>>,
    }

    impl ScriptedLlm {
        fn text(text: &str) -> Self {
            Self {
                replies: Mutex::new(
                    vec![ModelReply::with_parts(vec![Part::Text(text.to_string())])].into(),
                ),
            }
        }

        fn replies(replies: Vec<ModelReply>) -> Self {
            Self { replies: Mutex::new(replies.into()) }
        }
    }

    #[async_trait]
    impl LlmClient for ScriptedLlm {
        async fn generate(
            &self,
            _transcript: &[Turn],
            _tools: &[ToolDescriptor],
        ) -> Result<ModelReply, LlmError> {
            Ok(self
                .replies
                .lock()
                .expect("lock")
                .pop_front()
                .expect("handler requested more completions than scripted"))
        }
    }

    #[derive(Default)]
    struct ScriptedExecutor {
        outcomes: Mutex<VecDeque<ToolOutcome>>,
        calls: Mutex<Vec<(String, Value)>>,
    }

    #[async_trait]
    impl ToolExecutor for ScriptedExecutor {
        async fn execute(&self, tool_name: &str, args: &Value) -> ToolOutcome {
            self.calls.lock().expect("lock").push((tool_name.to_string(), args.clone()));
            self.outcomes
                .lock()
                .expect("lock")
                .pop_front()
                .unwrap_or_else(|| ToolOutcome::ok(json!(null)))
        }
    }

    fn state_with(llm: ScriptedLlm, executor: ScriptedExecutor) -> ChatState {
        ChatState::new(
            Arc::new(InMemoryChatRepository::default()),
            Arc::new(InMemoryMessageRepository::default()),
            Arc::new(llm),
            Arc::new(executor),
        )
    }

    async fn seeded_chat(state: &ChatState, title: &str) -> String {
        let Json(chat) = create_chat(
            State(state.clone()),
            Json(CreateChatRequest { title: title.to_string() }),
        )
        .await
        .expect("create chat");
        chat.id.0
    }

    #[tokio::test]
    async fn posting_a_message_persists_both_sides_of_the_exchange() {
        let state = state_with(ScriptedLlm::text("Hello from the analyst."), ScriptedExecutor::default());
        let chat_id = seeded_chat(&state, "New chat").await;

        let Json(exchange) = post_message(
            Path(chat_id.clone()),
            State(state.clone()),
            Json(PostMessageRequest { content: "hello".to_string() }),
        )
        .await
        .expect("post message");

        assert_eq!(exchange.user_message.role, MessageRole::User);
        assert_eq!(exchange.user_message.content, "hello");
        assert_eq!(exchange.assistant_message.role, MessageRole::Assistant);
        assert_eq!(exchange.assistant_message.content, "Hello from the analyst.");

        let Json(messages) =
            list_messages(Path(chat_id), State(state)).await.expect("list messages");
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, MessageRole::User);
        assert_eq!(messages[1].role, MessageRole::Assistant);
    }

    #[tokio::test]
    async fn first_reply_derives_the_chat_title_from_the_user_message() {
        let state = state_with(
            ScriptedLlm::replies(vec![
                ModelReply::with_parts(vec![Part::Text("first".to_string())]),
                ModelReply::with_parts(vec![Part::Text("second".to_string())]),
            ]),
            ScriptedExecutor::default(),
        );
        let chat_id = seeded_chat(&state, "New chat").await;

        post_message(
            Path(chat_id.clone()),
            State(state.clone()),
            Json(PostMessageRequest { content: "show me all promotional scenarios".to_string() }),
        )
        .await
        .expect("first message");

        let Json(chats) = list_chats(State(state.clone())).await.expect("list chats");
        assert_eq!(chats[0].title, "show me all promotional scenarios");

        // The second message must not retitle the chat.
        post_message(
            Path(chat_id),
            State(state.clone()),
            Json(PostMessageRequest { content: "and the baseline ones".to_string() }),
        )
        .await
        .expect("second message");

        let Json(chats) = list_chats(State(state)).await.expect("list chats again");
        assert_eq!(chats[0].title, "show me all promotional scenarios");
    }

    #[tokio::test]
    async fn custom_titles_survive_the_first_reply() {
        let state = state_with(ScriptedLlm::text("ok"), ScriptedExecutor::default());
        let chat_id = seeded_chat(&state, "Q3 planning").await;

        post_message(
            Path(chat_id),
            State(state.clone()),
            Json(PostMessageRequest { content: "hello".to_string() }),
        )
        .await
        .expect("post message");

        let Json(chats) = list_chats(State(state)).await.expect("list chats");
        assert_eq!(chats[0].title, "Q3 planning");
    }

    #[tokio::test]
    async fn tool_requesting_reply_drives_the_executor_before_answering() {
        let executor = ScriptedExecutor {
            outcomes: Mutex::new(
                vec![ToolOutcome::ok(json!({"items": [], "total": 3}))].into(),
            ),
            calls: Mutex::default(),
        };
        let state = state_with(
            ScriptedLlm::replies(vec![
                ModelReply::with_parts(vec![Part::FunctionCall(FunctionCall {
                    name: "list_scenarios".to_string(),
                    args: json!({"active": true}),
                    id: None,
                })]),
                ModelReply::with_parts(vec![Part::Text("You have 3 active scenarios.".to_string())]),
            ]),
            executor,
        );
        let chat_id = seeded_chat(&state, "New chat").await;

        let Json(exchange) = post_message(
            Path(chat_id),
            State(state.clone()),
            Json(PostMessageRequest { content: "list active scenarios".to_string() }),
        )
        .await
        .expect("post message");

        assert_eq!(exchange.assistant_message.content, "You have 3 active scenarios.");
    }

    #[tokio::test]
    async fn deleting_a_chat_cascades_to_its_messages() {
        let state = state_with(ScriptedLlm::text("reply"), ScriptedExecutor::default());
        let chat_id = seeded_chat(&state, "New chat").await;

        post_message(
            Path(chat_id.clone()),
            State(state.clone()),
            Json(PostMessageRequest { content: "hello".to_string() }),
        )
        .await
        .expect("post message");

        delete_chat(Path(chat_id.clone()), State(state.clone())).await.expect("delete chat");

        let Json(messages) =
            list_messages(Path(chat_id), State(state.clone())).await.expect("list messages");
        assert!(messages.is_empty(), "no messages may reference a deleted chat");

        let Json(chats) = list_chats(State(state)).await.expect("list chats");
        assert!(chats.is_empty());
    }

    #[tokio::test]
    async fn deleting_an_absent_chat_returns_not_found() {
        let state = state_with(ScriptedLlm::text("unused"), ScriptedExecutor::default());

        let result = delete_chat(Path("missing".to_string()), State(state)).await;
        let (status, Json(body)) = result.expect_err("should be a 404");
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.error, "Chat not found");
    }

    #[tokio::test]
    async fn chats_list_most_recently_updated_first() {
        let state = state_with(
            ScriptedLlm::replies(vec![ModelReply::with_parts(vec![Part::Text(
                "reply".to_string(),
            )])]),
            ScriptedExecutor::default(),
        );

        let first = seeded_chat(&state, "first").await;
        let _second = seeded_chat(&state, "second").await;

        // Touch the first chat via a message; it should move to the front.
        post_message(
            Path(first),
            State(state.clone()),
            Json(PostMessageRequest { content: "bump".to_string() }),
        )
        .await
        .expect("post message");

        let Json(chats) = list_chats(State(state)).await.expect("list chats");
        assert_eq!(chats[0].title, "first");
        assert_eq!(chats[1].title, "second");
    }
}
