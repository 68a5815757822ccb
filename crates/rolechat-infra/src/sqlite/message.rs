//! SQLite message repository implementation.

use sqlx::Row;
use uuid::Uuid;

use rolechat_core::repository::MessageRepository;
use rolechat_types::error::RepositoryError;
use rolechat_types::message::{Message, MessageRole};
use rolechat_types::role::RoleId;

use super::pool::DatabasePool;

/// SQLite-backed implementation of `MessageRepository`.
pub struct SqliteMessageRepository {
    pool: DatabasePool,
}

impl SqliteMessageRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

struct MessageRow {
    id: String,
    role_id: String,
    role: String,
    content: String,
    timestamp: i64,
}

impl MessageRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            role_id: row.try_get("role_id")?,
            role: row.try_get("role")?,
            content: row.try_get("content")?,
            timestamp: row.try_get("timestamp")?,
        })
    }

    fn into_message(self) -> Result<Message, RepositoryError> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| RepositoryError::Query(format!("invalid message id: {e}")))?;
        let role_id = self
            .role_id
            .parse::<RoleId>()
            .map_err(|e| RepositoryError::Query(format!("invalid role id: {e}")))?;
        let role: MessageRole = self.role.parse().map_err(RepositoryError::Query)?;

        Ok(Message {
            id,
            role_id,
            role,
            content: self.content,
            timestamp: self.timestamp,
        })
    }
}

impl MessageRepository for SqliteMessageRepository {
    async fn append(&self, message: &Message) -> Result<Message, RepositoryError> {
        let result = sqlx::query(
            "INSERT INTO messages (id, role_id, role, content, timestamp) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(message.id.to_string())
        .bind(message.role_id.to_string())
        .bind(message.role.to_string())
        .bind(&message.content)
        .bind(message.timestamp)
        .execute(&self.pool.writer)
        .await;

        match result {
            Ok(_) => Ok(message.clone()),
            Err(sqlx::Error::Database(db_err)) if db_err.is_foreign_key_violation() => {
                Err(RepositoryError::NotFound)
            }
            Err(e) => Err(RepositoryError::Query(e.to_string())),
        }
    }

    async fn history(&self, role_id: &RoleId) -> Result<Vec<Message>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, role_id, role, content, timestamp FROM messages
             WHERE role_id = ? ORDER BY timestamp ASC, rowid ASC",
        )
        .bind(role_id.to_string())
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        rows.iter()
            .map(|row| {
                MessageRow::from_row(row)
                    .map_err(|e| RepositoryError::Query(e.to_string()))?
                    .into_message()
            })
            .collect()
    }
}
