use anyhow::Result;
use chrono::Utc;
use sqlx::{Pool, Row, Sqlite, sqlite::SqliteRow};
use uuid::Uuid;

use crate::{
    db::Database,
    ids::{MemberId, UserId, WorkspaceId},
};

pub const DEFAULT_WORKSPACE_NAME: &str = "Untitled Workspace";

#[derive(Debug, Clone)]
pub struct WorkspaceRecord {
    pub id: WorkspaceId,
    pub name: String,
    pub owner_id: UserId,
    pub created_at: i64,
}

#[derive(Debug, Clone)]
pub struct WorkspaceMemberRecord {
    pub id: MemberId,
    pub workspace_id: WorkspaceId,
    pub user_id: UserId,
    pub created_at: i64,
}

/// Member row joined with the owning workspace's owner reference. This is
/// the denormalized shape the workspace-member removal gate checks against.
#[derive(Debug, Clone)]
pub struct WorkspaceMemberWithOwner {
    pub id: MemberId,
    pub workspace_id: WorkspaceId,
    pub user_id: UserId,
    pub workspace_owner_id: UserId,
}

#[derive(Clone)]
pub struct WorkspaceStore {
    pool: Pool<Sqlite>,
}

impl WorkspaceStore {
    pub fn new(database: &Database) -> Self {
        Self {
            pool: database.pool().clone(),
        }
    }

    /// Creates the workspace and the owner's membership row in one
    /// transaction.
    pub async fn create(&self, owner_id: &str, name: Option<&str>) -> Result<WorkspaceRecord> {
        let id = WorkspaceId::from(Uuid::new_v4().to_string());
        let created_at = Utc::now().timestamp();
        let resolved_name = name
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(ToOwned::to_owned)
            .unwrap_or_else(|| DEFAULT_WORKSPACE_NAME.to_string());

        let mut tx = self.pool.begin().await?;
        sqlx::query("INSERT INTO workspaces (id, name, owner_id, created_at) VALUES (?, ?, ?, ?)")
            .bind(id.as_str())
            .bind(&resolved_name)
            .bind(owner_id)
            .bind(created_at)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "INSERT INTO workspace_members (id, workspace_id, user_id, created_at)
             VALUES (?, ?, ?, ?)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(id.as_str())
        .bind(owner_id)
        .bind(created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(WorkspaceRecord {
            id,
            name: resolved_name,
            owner_id: UserId::from(owner_id),
            created_at,
        })
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<WorkspaceRecord>> {
        let row =
            sqlx::query("SELECT id, name, owner_id, created_at FROM workspaces WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(Self::map_workspace_row))
    }

    /// Single-predicate ownership lookup: matches only when the workspace
    /// exists and is owned by `owner_id`, so callers cannot tell "missing"
    /// apart from "not yours".
    pub async fn find_owned(&self, id: &str, owner_id: &str) -> Result<Option<WorkspaceRecord>> {
        let row = sqlx::query(
            "SELECT id, name, owner_id, created_at FROM workspaces WHERE id = ? AND owner_id = ?",
        )
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Self::map_workspace_row))
    }

    pub async fn add_member(
        &self,
        workspace_id: &str,
        user_id: &str,
    ) -> Result<WorkspaceMemberRecord> {
        let id = MemberId::from(Uuid::new_v4().to_string());
        let created_at = Utc::now().timestamp();

        sqlx::query(
            "INSERT INTO workspace_members (id, workspace_id, user_id, created_at)
             VALUES (?, ?, ?, ?)",
        )
        .bind(id.as_str())
        .bind(workspace_id)
        .bind(user_id)
        .bind(created_at)
        .execute(&self.pool)
        .await?;

        Ok(WorkspaceMemberRecord {
            id,
            workspace_id: WorkspaceId::from(workspace_id),
            user_id: UserId::from(user_id),
            created_at,
        })
    }

    pub async fn find_member(
        &self,
        workspace_id: &str,
        user_id: &str,
    ) -> Result<Option<WorkspaceMemberRecord>> {
        let row = sqlx::query(
            "SELECT id, workspace_id, user_id, created_at
             FROM workspace_members
             WHERE workspace_id = ? AND user_id = ?",
        )
        .bind(workspace_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Self::map_member_row))
    }

    pub async fn find_member_with_owner(
        &self,
        member_id: &str,
    ) -> Result<Option<WorkspaceMemberWithOwner>> {
        let row = sqlx::query(
            "SELECT wm.id, wm.workspace_id, wm.user_id, w.owner_id AS workspace_owner_id
             FROM workspace_members wm
             JOIN workspaces w ON w.id = wm.workspace_id
             WHERE wm.id = ?",
        )
        .bind(member_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| WorkspaceMemberWithOwner {
            id: MemberId::from(row.get::<String, _>("id")),
            workspace_id: WorkspaceId::from(row.get::<String, _>("workspace_id")),
            user_id: UserId::from(row.get::<String, _>("user_id")),
            workspace_owner_id: UserId::from(row.get::<String, _>("workspace_owner_id")),
        }))
    }

    /// Deletes are scoped by member id and workspace id together.
    pub async fn remove_member(&self, member_id: &str, workspace_id: &str) -> Result<bool> {
        let result =
            sqlx::query("DELETE FROM workspace_members WHERE id = ? AND workspace_id = ?")
                .bind(member_id)
                .bind(workspace_id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    fn map_workspace_row(row: SqliteRow) -> WorkspaceRecord {
        WorkspaceRecord {
            id: WorkspaceId::from(row.get::<String, _>("id")),
            name: row.get("name"),
            owner_id: UserId::from(row.get::<String, _>("owner_id")),
            created_at: row.get("created_at"),
        }
    }

    fn map_member_row(row: SqliteRow) -> WorkspaceMemberRecord {
        WorkspaceMemberRecord {
            id: MemberId::from(row.get::<String, _>("id")),
            workspace_id: WorkspaceId::from(row.get::<String, _>("workspace_id")),
            user_id: UserId::from(row.get::<String, _>("user_id")),
            created_at: row.get("created_at"),
        }
    }
}
