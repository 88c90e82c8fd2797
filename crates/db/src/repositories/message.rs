use chrono::{DateTime, Utc};
use sqlx::Row;

use analyst_core::domain::chat::{ChatId, Message, MessageId, MessageRole};

use super::{MessageRepository, RepositoryError, MESSAGE_PAGE_LIMIT};
use crate::DbPool;

pub struct SqlMessageRepository {
    pool: DbPool,
}

impl SqlMessageRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_message(row: &sqlx::sqlite::SqliteRow) -> Result<Message, RepositoryError> {
    let role_raw: String = row.try_get("role")?;
    let role = MessageRole::parse(&role_raw)
        .ok_or_else(|| RepositoryError::Decode(format!("unknown message role `{role_raw}`")))?;

    let timestamp_raw: String = row.try_get("timestamp")?;
    let timestamp = DateTime::parse_from_rfc3339(&timestamp_raw)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|error| {
            RepositoryError::Decode(format!("bad timestamp `{timestamp_raw}`: {error}"))
        })?;

    Ok(Message {
        id: MessageId(row.try_get::<String, _>("id")?),
        chat_id: ChatId(row.try_get::<String, _>("chat_id")?),
        role,
        content: row.try_get("content")?,
        timestamp,
    })
}

#[async_trait::async_trait]
impl MessageRepository for SqlMessageRepository {
    async fn insert(&self, message: &Message) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO message (id, chat_id, role, content, timestamp) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&message.id.0)
        .bind(&message.chat_id.0)
        .bind(message.role.as_str())
        .bind(&message.content)
        .bind(message.timestamp.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_for_chat(&self, chat_id: &ChatId) -> Result<Vec<Message>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, chat_id, role, content, timestamp FROM message \
             WHERE chat_id = ? ORDER BY timestamp ASC LIMIT ?",
        )
        .bind(&chat_id.0)
        .bind(MESSAGE_PAGE_LIMIT)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_message).collect()
    }

    async fn delete_for_chat(&self, chat_id: &ChatId) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM message WHERE chat_id = ?")
            .bind(&chat_id.0)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use analyst_core::domain::chat::{ChatId, Message, MessageRole};

    use super::SqlMessageRepository;
    use crate::repositories::MessageRepository;
    use crate::{connect_with_settings, migrations};

    async fn repository() -> SqlMessageRepository {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        SqlMessageRepository::new(pool)
    }

    #[tokio::test]
    async fn messages_come_back_in_timestamp_order() {
        let repo = repository().await;
        let chat_id = ChatId("chat-1".to_string());

        let mut first = Message::new(chat_id.clone(), MessageRole::User, "first");
        first.timestamp = Utc::now() - Duration::seconds(30);
        let mut second = Message::new(chat_id.clone(), MessageRole::Assistant, "second");
        second.timestamp = Utc::now() - Duration::seconds(20);
        let third = Message::new(chat_id.clone(), MessageRole::User, "third");

        // Insert out of order; retrieval must still be chronological.
        repo.insert(&third).await.expect("insert third");
        repo.insert(&first).await.expect("insert first");
        repo.insert(&second).await.expect("insert second");

        let messages = repo.list_for_chat(&chat_id).await.expect("list");
        let contents: Vec<&str> =
            messages.iter().map(|message| message.content.as_str()).collect();
        assert_eq!(contents, vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn listing_is_scoped_to_the_requested_chat() {
        let repo = repository().await;
        let chat_a = ChatId("chat-a".to_string());
        let chat_b = ChatId("chat-b".to_string());

        repo.insert(&Message::new(chat_a.clone(), MessageRole::User, "for a"))
            .await
            .expect("insert a");
        repo.insert(&Message::new(chat_b.clone(), MessageRole::User, "for b"))
            .await
            .expect("insert b");

        let messages = repo.list_for_chat(&chat_a).await.expect("list");
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].content, "for a");
    }

    #[tokio::test]
    async fn delete_for_chat_removes_every_message() {
        let repo = repository().await;
        let chat_id = ChatId("chat-1".to_string());

        repo.insert(&Message::new(chat_id.clone(), MessageRole::User, "one"))
            .await
            .expect("insert one");
        repo.insert(&Message::new(chat_id.clone(), MessageRole::Assistant, "two"))
            .await
            .expect("insert two");

        let removed = repo.delete_for_chat(&chat_id).await.expect("delete");
        assert_eq!(removed, 2);
        assert!(repo.list_for_chat(&chat_id).await.expect("list").is_empty());
    }
}
