use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::{Pool, Row, Sqlite, sqlite::SqliteRow};
use uuid::Uuid;

use crate::{db::Database, ids::UserId};

pub const SESSION_TTL_SECONDS: i64 = 60 * 60 * 24 * 14;

#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: UserId,
    pub email: String,
    pub password_hash: String,
    pub name: Option<String>,
    pub created_at: i64,
}

#[derive(Debug, Clone)]
pub struct SessionRecord {
    pub id: String,
    pub user_id: UserId,
    pub created_at: i64,
    pub expires_at: i64,
}

impl SessionRecord {
    pub fn is_expired(&self, now: i64) -> bool {
        self.expires_at <= now
    }
}

#[derive(Clone)]
pub struct UserStore {
    pool: Pool<Sqlite>,
}

impl UserStore {
    pub fn new(database: &Database) -> Self {
        Self {
            pool: database.pool().clone(),
        }
    }

    pub async fn create(
        &self,
        email: &str,
        password_hash: &str,
        name: Option<&str>,
    ) -> Result<UserRecord> {
        let id = UserId::from(Uuid::new_v4().to_string());
        let created_at = Utc::now().timestamp();

        sqlx::query(
            "INSERT INTO users (id, email, password_hash, name, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(id.as_str())
        .bind(email)
        .bind(password_hash)
        .bind(name)
        .bind(created_at)
        .execute(&self.pool)
        .await
        .context("failed to insert user")?;

        Ok(UserRecord {
            id,
            email: email.to_owned(),
            password_hash: password_hash.to_owned(),
            name: name.map(|value| value.to_owned()),
            created_at,
        })
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        let row = sqlx::query(
            "SELECT id, email, password_hash, name, created_at FROM users WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Self::map_row))
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<UserRecord>> {
        let row = sqlx::query(
            "SELECT id, email, password_hash, name, created_at FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Self::map_row))
    }

    pub async fn update_password(&self, user_id: &str, password_hash: &str) -> Result<()> {
        sqlx::query("UPDATE users SET password_hash = ? WHERE id = ?")
            .bind(password_hash)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn create_session(&self, user_id: &str) -> Result<SessionRecord> {
        let id = Uuid::new_v4().to_string();
        let created_at = Utc::now().timestamp();
        let expires_at = created_at + SESSION_TTL_SECONDS;

        sqlx::query(
            "INSERT INTO sessions (id, user_id, created_at, expires_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(user_id)
        .bind(created_at)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        Ok(SessionRecord {
            id,
            user_id: UserId::from(user_id),
            created_at,
            expires_at,
        })
    }

    pub async fn find_session(&self, session_id: &str) -> Result<Option<SessionRecord>> {
        let row =
            sqlx::query("SELECT id, user_id, created_at, expires_at FROM sessions WHERE id = ?")
                .bind(session_id)
                .fetch_optional(&self.pool)
                .await?;

        let record = row.map(|row| SessionRecord {
            id: row.get("id"),
            user_id: UserId::from(row.get::<String, _>("user_id")),
            created_at: row.get("created_at"),
            expires_at: row.get("expires_at"),
        });

        let now = Utc::now().timestamp();
        if let Some(record) = record {
            if record.is_expired(now) {
                self.delete_session(&record.id).await?;
                Ok(None)
            } else {
                Ok(Some(record))
            }
        } else {
            Ok(None)
        }
    }

    pub async fn refresh_session(&self, session_id: &str) -> Result<Option<SessionRecord>> {
        if let Some(mut record) = self.find_session(session_id).await? {
            record.expires_at = Utc::now().timestamp() + SESSION_TTL_SECONDS;
            sqlx::query("UPDATE sessions SET expires_at = ? WHERE id = ?")
                .bind(record.expires_at)
                .bind(session_id)
                .execute(&self.pool)
                .await?;
            Ok(Some(record))
        } else {
            Ok(None)
        }
    }

    pub async fn delete_session(&self, session_id: &str) -> Result<()> {
        sqlx::query("DELETE FROM sessions WHERE id = ?")
            .bind(session_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    fn map_row(row: SqliteRow) -> UserRecord {
        UserRecord {
            id: UserId::from(row.get::<String, _>("id")),
            email: row.get("email"),
            password_hash: row.get("password_hash"),
            name: row.get::<Option<String>, _>("name"),
            created_at: row.get("created_at"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::setup_database;

    #[tokio::test]
    async fn create_and_find_user_by_email() -> anyhow::Result<()> {
        let (_temp_dir, database) = setup_database().await?;
        let store = UserStore::new(&database);

        let created = store
            .create("alice@example.com", "hash", Some("Alice"))
            .await?;

        let found = store
            .find_by_email("alice@example.com")
            .await?
            .expect("user present");
        assert_eq!(found.id, created.id);
        assert_eq!(found.name.as_deref(), Some("Alice"));

        assert!(store.find_by_email("nobody@example.com").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn expired_sessions_are_evicted_on_lookup() -> anyhow::Result<()> {
        let (_temp_dir, database) = setup_database().await?;
        let store = UserStore::new(&database);

        let user = store.create("bob@example.com", "hash", None).await?;
        let session = store.create_session(user.id.as_str()).await?;

        sqlx::query("UPDATE sessions SET expires_at = ? WHERE id = ?")
            .bind(Utc::now().timestamp() - 10)
            .bind(&session.id)
            .execute(database.pool())
            .await?;

        assert!(store.find_session(&session.id).await?.is_none());
        // The expired row is gone, not just filtered.
        let remaining: Option<i64> = sqlx::query_scalar("SELECT 1 FROM sessions WHERE id = ?")
            .bind(&session.id)
            .fetch_optional(database.pool())
            .await?;
        assert!(remaining.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn refresh_session_extends_expiry() -> anyhow::Result<()> {
        let (_temp_dir, database) = setup_database().await?;
        let store = UserStore::new(&database);

        let user = store.create("carol@example.com", "hash", None).await?;
        let session = store.create_session(user.id.as_str()).await?;

        sqlx::query("UPDATE sessions SET expires_at = ? WHERE id = ?")
            .bind(Utc::now().timestamp() + 60)
            .bind(&session.id)
            .execute(database.pool())
            .await?;

        let refreshed = store
            .refresh_session(&session.id)
            .await?
            .expect("session still valid");
        assert!(refreshed.expires_at > Utc::now().timestamp() + 60);
        Ok(())
    }
}
