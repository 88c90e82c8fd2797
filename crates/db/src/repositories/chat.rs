use chrono::{DateTime, Utc};
use sqlx::Row;

use analyst_core::domain::chat::{Chat, ChatId};

use super::{ChatRepository, RepositoryError, CHAT_PAGE_LIMIT};
use crate::DbPool;

pub struct SqlChatRepository {
    pool: DbPool,
}

impl SqlChatRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_chat(row: &sqlx::sqlite::SqliteRow) -> Result<Chat, RepositoryError> {
    Ok(Chat {
        id: ChatId(row.try_get::<String, _>("id")?),
        title: row.try_get("title")?,
        created_at: parse_timestamp(row.try_get::<String, _>("created_at")?)?,
        updated_at: parse_timestamp(row.try_get::<String, _>("updated_at")?)?,
    })
}

fn parse_timestamp(raw: String) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(&raw)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|error| RepositoryError::Decode(format!("bad timestamp `{raw}`: {error}")))
}

#[async_trait::async_trait]
impl ChatRepository for SqlChatRepository {
    async fn insert(&self, chat: &Chat) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO chat (id, title, created_at, updated_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&chat.id.0)
        .bind(&chat.title)
        .bind(chat.created_at.to_rfc3339())
        .bind(chat.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_by_id(&self, id: &ChatId) -> Result<Option<Chat>, RepositoryError> {
        let row = sqlx::query("SELECT id, title, created_at, updated_at FROM chat WHERE id = ?")
            .bind(&id.0)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_chat).transpose()
    }

    async fn list_recent(&self) -> Result<Vec<Chat>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, title, created_at, updated_at FROM chat \
             ORDER BY updated_at DESC LIMIT ?",
        )
        .bind(CHAT_PAGE_LIMIT)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_chat).collect()
    }

    async fn rename(
        &self,
        id: &ChatId,
        title: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE chat SET title = ?, updated_at = ? WHERE id = ?")
            .bind(title)
            .bind(updated_at.to_rfc3339())
            .bind(&id.0)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn touch(&self, id: &ChatId, updated_at: DateTime<Utc>) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE chat SET updated_at = ? WHERE id = ?")
            .bind(updated_at.to_rfc3339())
            .bind(&id.0)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete(&self, id: &ChatId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM chat WHERE id = ?")
            .bind(&id.0)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use analyst_core::domain::chat::{Chat, ChatId};

    use super::SqlChatRepository;
    use crate::repositories::ChatRepository;
    use crate::{connect_with_settings, migrations};

    async fn repository() -> SqlChatRepository {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        SqlChatRepository::new(pool)
    }

    #[tokio::test]
    async fn insert_then_find_round_trips() {
        let repo = repository().await;
        let chat = Chat::new("New chat");

        repo.insert(&chat).await.expect("insert");
        let found = repo.find_by_id(&chat.id).await.expect("find").expect("chat exists");

        assert_eq!(found.id, chat.id);
        assert_eq!(found.title, "New chat");
    }

    #[tokio::test]
    async fn list_recent_orders_by_updated_at_descending() {
        let repo = repository().await;

        let mut older = Chat::new("older");
        older.updated_at = Utc::now() - Duration::minutes(10);
        let newer = Chat::new("newer");

        repo.insert(&older).await.expect("insert older");
        repo.insert(&newer).await.expect("insert newer");

        let chats = repo.list_recent().await.expect("list");
        assert_eq!(chats.len(), 2);
        assert_eq!(chats[0].title, "newer");
        assert_eq!(chats[1].title, "older");
    }

    #[tokio::test]
    async fn rename_updates_title_and_watermark() {
        let repo = repository().await;
        let chat = Chat::new("New chat");
        repo.insert(&chat).await.expect("insert");

        let later = Utc::now() + Duration::seconds(5);
        repo.rename(&chat.id, "list active scenarios", later).await.expect("rename");

        let found = repo.find_by_id(&chat.id).await.expect("find").expect("chat exists");
        assert_eq!(found.title, "list active scenarios");
        assert!(found.updated_at > chat.updated_at);
    }

    #[tokio::test]
    async fn delete_reports_whether_a_row_existed() {
        let repo = repository().await;
        let chat = Chat::new("to delete");
        repo.insert(&chat).await.expect("insert");

        assert!(repo.delete(&chat.id).await.expect("first delete"));
        assert!(!repo.delete(&chat.id).await.expect("second delete"));
        assert!(!repo.delete(&ChatId("missing".to_string())).await.expect("missing delete"));
    }
}
