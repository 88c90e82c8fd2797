use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use analyst_core::domain::chat::{Chat, ChatId, Message};

pub mod chat;
pub mod memory;
pub mod message;

pub use chat::SqlChatRepository;
pub use memory::{InMemoryChatRepository, InMemoryMessageRepository};
pub use message::SqlMessageRepository;

/// Page bound for `list_recent`; mirrors the host API contract.
pub const CHAT_PAGE_LIMIT: i64 = 100;

/// Page bound for `list_for_chat`; transcripts beyond this are not replayed.
pub const MESSAGE_PAGE_LIMIT: i64 = 1000;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

#[async_trait]
pub trait ChatRepository: Send + Sync {
    async fn insert(&self, chat: &Chat) -> Result<(), RepositoryError>;
    async fn find_by_id(&self, id: &ChatId) -> Result<Option<Chat>, RepositoryError>;
    /// Most recently updated first, bounded by `CHAT_PAGE_LIMIT`.
    async fn list_recent(&self) -> Result<Vec<Chat>, RepositoryError>;
    async fn rename(
        &self,
        id: &ChatId,
        title: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError>;
    /// Refresh the `updated_at` watermark without touching the title.
    async fn touch(&self, id: &ChatId, updated_at: DateTime<Utc>) -> Result<(), RepositoryError>;
    /// Returns whether a chat row was actually removed.
    async fn delete(&self, id: &ChatId) -> Result<bool, RepositoryError>;
}

#[async_trait]
pub trait MessageRepository: Send + Sync {
    async fn insert(&self, message: &Message) -> Result<(), RepositoryError>;
    /// Chronological order, bounded by `MESSAGE_PAGE_LIMIT`.
    async fn list_for_chat(&self, chat_id: &ChatId) -> Result<Vec<Message>, RepositoryError>;
    /// Cascade hook for chat deletion; returns the number of rows removed.
    async fn delete_for_chat(&self, chat_id: &ChatId) -> Result<u64, RepositoryError>;
}
