//! SQLite role repository implementation.
//!
//! Implements `RoleRepository` from `rolechat-core` using sqlx with split read/write pools.

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::Row;

use rolechat_core::repository::RoleRepository;
use rolechat_types::error::RepositoryError;
use rolechat_types::role::{Role, RoleId};

use super::pool::DatabasePool;

/// SQLite-backed implementation of `RoleRepository`.
pub struct SqliteRoleRepository {
    pool: DatabasePool,
}

impl SqliteRoleRepository {
    /// Create a new repository backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

/// Internal row type for mapping SQLite rows to domain Role.
struct RoleRow {
    id: String,
    name: String,
    persona: String,
    human: String,
    agent_id: Option<String>,
    created_at: String,
}

impl RoleRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            persona: row.try_get("persona")?,
            human: row.try_get("human")?,
            agent_id: row.try_get("agent_id")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_role(self) -> Result<Role, RepositoryError> {
        let id = self
            .id
            .parse::<RoleId>()
            .map_err(|e| RepositoryError::Query(format!("invalid role id: {e}")))?;

        Ok(Role {
            id,
            name: self.name,
            persona: self.persona,
            human: self.human,
            agent_id: self.agent_id,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}

/// Fixed-width UTC timestamps so text ordering matches time ordering.
fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn map_row(row: &sqlx::sqlite::SqliteRow) -> Result<Role, RepositoryError> {
    RoleRow::from_row(row)
        .map_err(|e| RepositoryError::Query(e.to_string()))?
        .into_role()
}

impl RoleRepository for SqliteRoleRepository {
    async fn create(&self, role: &Role) -> Result<Role, RepositoryError> {
        let result = sqlx::query(
            "INSERT INTO roles (id, name, persona, human, agent_id, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(role.id.to_string())
        .bind(&role.name)
        .bind(&role.persona)
        .bind(&role.human)
        .bind(&role.agent_id)
        .bind(format_datetime(&role.created_at))
        .execute(&self.pool.writer)
        .await;

        match result {
            Ok(_) => Ok(role.clone()),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(RepositoryError::Conflict(format!(
                    "role '{}' or its agent already exists",
                    role.id
                )))
            }
            Err(e) => Err(RepositoryError::Query(e.to_string())),
        }
    }

    async fn get(&self, id: &RoleId) -> Result<Option<Role>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM roles WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        row.as_ref().map(map_row).transpose()
    }

    async fn get_by_agent_id(&self, agent_id: &str) -> Result<Option<Role>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM roles WHERE agent_id = ?")
            .bind(agent_id)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        row.as_ref().map(map_row).transpose()
    }

    async fn list(&self) -> Result<Vec<Role>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM roles ORDER BY created_at DESC, rowid DESC")
            .fetch_all(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        rows.iter().map(map_row).collect()
    }

    async fn bind_agent(&self, id: &RoleId, agent_id: &str) -> Result<Role, RepositoryError> {
        let result = sqlx::query("UPDATE roles SET agent_id = ? WHERE id = ? AND agent_id IS NULL")
            .bind(agent_id)
            .bind(id.to_string())
            .execute(&self.pool.writer)
            .await;

        match result {
            Ok(_) => {}
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                return Err(RepositoryError::Conflict(format!(
                    "agent '{agent_id}' is bound to another role"
                )));
            }
            Err(e) => return Err(RepositoryError::Query(e.to_string())),
        }

        // Either we just bound it, or it was already bound: check which id it carries.
        let role = self.get(id).await?.ok_or(RepositoryError::NotFound)?;
        match role.agent_id.as_deref() {
            Some(current) if current == agent_id => Ok(role),
            Some(current) => Err(RepositoryError::Conflict(format!(
                "role '{id}' is already bound to agent '{current}'"
            ))),
            None => Err(RepositoryError::Query(format!("role '{id}' was not bound"))),
        }
    }

    async fn update_profile(
        &self,
        agent_id: &str,
        name: &str,
        persona: &str,
        human: &str,
    ) -> Result<(), RepositoryError> {
        let result =
            sqlx::query("UPDATE roles SET name = ?, persona = ?, human = ? WHERE agent_id = ?")
                .bind(name)
                .bind(persona)
                .bind(human)
                .bind(agent_id)
                .execute(&self.pool.writer)
                .await
                .map_err(|e| RepositoryError::Query(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn delete(&self, id: &RoleId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM roles WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn list_agent_ids(&self) -> Result<Vec<String>, RepositoryError> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT agent_id FROM roles WHERE agent_id IS NOT NULL")
                .fetch_all(&self.pool.reader)
                .await
                .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    async fn delete_by_agent_ids(&self, agent_ids: &[String]) -> Result<u64, RepositoryError> {
        if agent_ids.is_empty() {
            return Ok(0);
        }

        let placeholders = vec!["?"; agent_ids.len()].join(", ");
        let sql = format!("DELETE FROM roles WHERE agent_id IN ({placeholders})");
        let mut query = sqlx::query(&sql);
        for id in agent_ids {
            query = query.bind(id);
        }

        let result = query
            .execute(&self.pool.writer)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    async fn test_pool() -> DatabasePool {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let url = format!("sqlite://{}?mode=rwc", db_path.display());
        // Leak tempdir so it lives for the test
        std::mem::forget(dir);
        DatabasePool::new(&url, 4).await.unwrap()
    }

    fn bound(name: &str, agent_id: &str) -> Role {
        let mut role = Role::new(name, "persona", "human");
        role.agent_id = Some(agent_id.to_string());
        role
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let repo = SqliteRoleRepository::new(test_pool().await);
        let role = Role::new("Luna", "curious", "a student");

        repo.create(&role).await.unwrap();
        let fetched = repo.get(&role.id).await.unwrap().unwrap();

        assert_eq!(fetched.name, "Luna");
        assert_eq!(fetched.persona, "curious");
        assert_eq!(fetched.human, "a student");
        assert!(fetched.agent_id.is_none());
        assert_eq!(
            fetched.created_at.timestamp_micros(),
            role.created_at.timestamp_micros()
        );
    }

    #[tokio::test]
    async fn test_get_missing_returns_none() {
        let repo = SqliteRoleRepository::new(test_pool().await);
        assert!(repo.get(&RoleId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let repo = SqliteRoleRepository::new(test_pool().await);
        let mut older = Role::new("Older", "", "");
        older.created_at = Utc::now() - Duration::seconds(60);
        let newer = Role::new("Newer", "", "");

        repo.create(&older).await.unwrap();
        repo.create(&newer).await.unwrap();

        let names: Vec<String> = repo.list().await.unwrap().into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["Newer", "Older"]);
    }

    #[tokio::test]
    async fn test_bind_agent_once() {
        let repo = SqliteRoleRepository::new(test_pool().await);
        let role = Role::new("Bot", "p", "h");
        repo.create(&role).await.unwrap();

        let bound = repo.bind_agent(&role.id, "agent-1").await.unwrap();
        assert_eq!(bound.agent_id.as_deref(), Some("agent-1"));

        // Same id again is fine, a different one is not.
        assert!(repo.bind_agent(&role.id, "agent-1").await.is_ok());
        assert!(matches!(
            repo.bind_agent(&role.id, "agent-2").await,
            Err(RepositoryError::Conflict(_))
        ));
        let fetched = repo.get_by_agent_id("agent-1").await.unwrap().unwrap();
        assert_eq!(fetched.id, role.id);
    }

    #[tokio::test]
    async fn test_bind_agent_unknown_role() {
        let repo = SqliteRoleRepository::new(test_pool().await);
        assert!(matches!(
            repo.bind_agent(&RoleId::new(), "agent-1").await,
            Err(RepositoryError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_agent_id_unique() {
        let repo = SqliteRoleRepository::new(test_pool().await);
        repo.create(&bound("A", "agent-1")).await.unwrap();
        assert!(matches!(
            repo.create(&bound("B", "agent-1")).await,
            Err(RepositoryError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_update_profile_by_agent() {
        let repo = SqliteRoleRepository::new(test_pool().await);
        let role = bound("Old", "agent-1");
        repo.create(&role).await.unwrap();

        repo.update_profile("agent-1", "New", "p2", "h2").await.unwrap();
        let fetched = repo.get(&role.id).await.unwrap().unwrap();
        assert_eq!(
            (fetched.name.as_str(), fetched.persona.as_str(), fetched.human.as_str()),
            ("New", "p2", "h2")
        );

        assert!(matches!(
            repo.update_profile("missing", "x", "", "").await,
            Err(RepositoryError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_delete_and_prune_by_agent_ids() {
        let repo = SqliteRoleRepository::new(test_pool().await);
        for (name, agent) in [("A", "a1"), ("B", "a2"), ("C", "a3")] {
            repo.create(&bound(name, agent)).await.unwrap();
        }
        let unbound = Role::new("D", "", "");
        repo.create(&unbound).await.unwrap();

        let mut ids = repo.list_agent_ids().await.unwrap();
        ids.sort();
        assert_eq!(ids, vec!["a1", "a2", "a3"]);

        let removed = repo
            .delete_by_agent_ids(&["a1".to_string(), "a3".to_string(), "zz".to_string()])
            .await
            .unwrap();
        assert_eq!(removed, 2);
        assert_eq!(repo.delete_by_agent_ids(&[]).await.unwrap(), 0);

        repo.delete(&unbound.id).await.unwrap();
        assert!(matches!(
            repo.delete(&unbound.id).await,
            Err(RepositoryError::NotFound)
        ));
        assert_eq!(repo.list().await.unwrap().len(), 1);
    }
}
