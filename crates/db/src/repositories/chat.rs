use chrono::Utc;
use sqlx::Row;

use stocktalk_core::domain::account::AccountId;
use stocktalk_core::domain::chat::{ChatSession, ChatSessionId, ConversationTurn, TurnRole};

use super::{format_timestamp, parse_timestamp, ChatRepository, RepositoryError};
use crate::DbPool;

pub struct SqlChatRepository {
    pool: DbPool,
}

impl SqlChatRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_session(row: &sqlx::sqlite::SqliteRow) -> Result<ChatSession, RepositoryError> {
    let id: String = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let account_id: String =
        row.try_get("account_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let title: String = row.try_get("title").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let created_at: String =
        row.try_get("created_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let updated_at: String =
        row.try_get("updated_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    Ok(ChatSession {
        id: ChatSessionId(id),
        account_id: AccountId(account_id),
        title,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

fn row_to_turn(row: &sqlx::sqlite::SqliteRow) -> Result<ConversationTurn, RepositoryError> {
    let role: String = row.try_get("role").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let content: String =
        row.try_get("content").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let created_at: String =
        row.try_get("created_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    Ok(ConversationTurn {
        role: role.parse::<TurnRole>().map_err(RepositoryError::Decode)?,
        content,
        timestamp: parse_timestamp(&created_at)?,
    })
}

#[async_trait::async_trait]
impl ChatRepository for SqlChatRepository {
    async fn create_session(&self, session: ChatSession) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO chat_session (id, account_id, title, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&session.id.0)
        .bind(session.account_id.as_str())
        .bind(&session.title)
        .bind(format_timestamp(session.created_at))
        .bind(format_timestamp(session.updated_at))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_sessions(
        &self,
        account: &AccountId,
    ) -> Result<Vec<ChatSession>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, account_id, title, created_at, updated_at
             FROM chat_session
             WHERE account_id = ?
             ORDER BY updated_at DESC, rowid DESC",
        )
        .bind(account.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_session).collect()
    }

    async fn rename_session(
        &self,
        account: &AccountId,
        id: &ChatSessionId,
        title: &str,
    ) -> Result<Option<ChatSession>, RepositoryError> {
        let updated = sqlx::query(
            "UPDATE chat_session SET title = ?, updated_at = ?
             WHERE id = ? AND account_id = ?",
        )
        .bind(title)
        .bind(format_timestamp(Utc::now()))
        .bind(&id.0)
        .bind(account.as_str())
        .execute(&self.pool)
        .await?;

        if updated.rows_affected() == 0 {
            return Ok(None);
        }
        self.find_session(account, id).await
    }

    async fn delete_session(
        &self,
        account: &AccountId,
        id: &ChatSessionId,
    ) -> Result<bool, RepositoryError> {
        let deleted = sqlx::query("DELETE FROM chat_session WHERE id = ? AND account_id = ?")
            .bind(&id.0)
            .bind(account.as_str())
            .execute(&self.pool)
            .await?;

        Ok(deleted.rows_affected() > 0)
    }

    async fn delete_all_sessions(&self, account: &AccountId) -> Result<u64, RepositoryError> {
        let deleted = sqlx::query("DELETE FROM chat_session WHERE account_id = ?")
            .bind(account.as_str())
            .execute(&self.pool)
            .await?;

        Ok(deleted.rows_affected())
    }

    async fn find_session(
        &self,
        account: &AccountId,
        id: &ChatSessionId,
    ) -> Result<Option<ChatSession>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, account_id, title, created_at, updated_at
             FROM chat_session WHERE id = ? AND account_id = ?",
        )
        .bind(&id.0)
        .bind(account.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_session).transpose()
    }

    async fn list_turns(
        &self,
        id: &ChatSessionId,
    ) -> Result<Vec<ConversationTurn>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT role, content, created_at
             FROM chat_message
             WHERE session_id = ?
             ORDER BY id ASC",
        )
        .bind(&id.0)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_turn).collect()
    }

    async fn append_turn(
        &self,
        id: &ChatSessionId,
        turn: ConversationTurn,
    ) -> Result<(), RepositoryError> {
        let timestamp = format_timestamp(turn.timestamp);
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO chat_message (session_id, role, content, created_at)
             VALUES (?, ?, ?, ?)",
        )
        .bind(&id.0)
        .bind(turn.role.as_str())
        .bind(&turn.content)
        .bind(&timestamp)
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE chat_session SET updated_at = ? WHERE id = ?")
            .bind(&timestamp)
            .bind(&id.0)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}
