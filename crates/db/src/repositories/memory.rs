use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use analyst_core::domain::chat::{Chat, ChatId, Message};

use super::{
    ChatRepository, MessageRepository, RepositoryError, CHAT_PAGE_LIMIT, MESSAGE_PAGE_LIMIT,
};

#[derive(Default)]
pub struct InMemoryChatRepository {
    chats: RwLock<Vec<Chat>>,
}

#[async_trait::async_trait]
impl ChatRepository for InMemoryChatRepository {
    async fn insert(&self, chat: &Chat) -> Result<(), RepositoryError> {
        let mut chats = self.chats.write().await;
        chats.push(chat.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &ChatId) -> Result<Option<Chat>, RepositoryError> {
        let chats = self.chats.read().await;
        Ok(chats.iter().find(|chat| &chat.id == id).cloned())
    }

    async fn list_recent(&self) -> Result<Vec<Chat>, RepositoryError> {
        let chats = self.chats.read().await;
        let mut sorted: Vec<Chat> = chats.clone();
        sorted.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        sorted.truncate(CHAT_PAGE_LIMIT as usize);
        Ok(sorted)
    }

    async fn rename(
        &self,
        id: &ChatId,
        title: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let mut chats = self.chats.write().await;
        if let Some(chat) = chats.iter_mut().find(|chat| &chat.id == id) {
            chat.title = title.to_string();
            chat.updated_at = updated_at;
        }
        Ok(())
    }

    async fn touch(&self, id: &ChatId, updated_at: DateTime<Utc>) -> Result<(), RepositoryError> {
        let mut chats = self.chats.write().await;
        if let Some(chat) = chats.iter_mut().find(|chat| &chat.id == id) {
            chat.updated_at = updated_at;
        }
        Ok(())
    }

    async fn delete(&self, id: &ChatId) -> Result<bool, RepositoryError> {
        let mut chats = self.chats.write().await;
        let before = chats.len();
        chats.retain(|chat| &chat.id != id);
        Ok(chats.len() < before)
    }
}

#[derive(Default)]
pub struct InMemoryMessageRepository {
    messages: RwLock<Vec<Message>>,
}

#[async_trait::async_trait]
impl MessageRepository for InMemoryMessageRepository {
    async fn insert(&self, message: &Message) -> Result<(), RepositoryError> {
        let mut messages = self.messages.write().await;
        messages.push(message.clone());
        Ok(())
    }

    async fn list_for_chat(&self, chat_id: &ChatId) -> Result<Vec<Message>, RepositoryError> {
        let messages = self.messages.read().await;
        let mut scoped: Vec<Message> =
            messages.iter().filter(|message| &message.chat_id == chat_id).cloned().collect();
        scoped.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        scoped.truncate(MESSAGE_PAGE_LIMIT as usize);
        Ok(scoped)
    }

    async fn delete_for_chat(&self, chat_id: &ChatId) -> Result<u64, RepositoryError> {
        let mut messages = self.messages.write().await;
        let before = messages.len();
        messages.retain(|message| &message.chat_id != chat_id);
        Ok((before - messages.len()) as u64)
    }
}
