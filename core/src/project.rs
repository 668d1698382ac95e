use anyhow::Result;
use chrono::Utc;
use sqlx::{Pool, Row, Sqlite, sqlite::SqliteRow};
use uuid::Uuid;

use crate::{
    db::Database,
    ids::{MemberId, ProjectId, UserId, WorkspaceId},
};

#[derive(Debug, Clone)]
pub struct ProjectRecord {
    pub id: ProjectId,
    pub workspace_id: WorkspaceId,
    pub name: String,
    pub owner_id: UserId,
    pub created_at: i64,
}

#[derive(Debug, Clone)]
pub struct ProjectMemberRecord {
    pub id: MemberId,
    pub project_id: ProjectId,
    pub user_id: UserId,
    pub created_at: i64,
}

#[derive(Clone)]
pub struct ProjectStore {
    pool: Pool<Sqlite>,
}

impl ProjectStore {
    pub fn new(database: &Database) -> Self {
        Self {
            pool: database.pool().clone(),
        }
    }

    pub async fn create(
        &self,
        workspace_id: &str,
        owner_id: &str,
        name: &str,
    ) -> Result<ProjectRecord> {
        let id = ProjectId::from(Uuid::new_v4().to_string());
        let created_at = Utc::now().timestamp();

        sqlx::query(
            "INSERT INTO projects (id, workspace_id, name, owner_id, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(id.as_str())
        .bind(workspace_id)
        .bind(name)
        .bind(owner_id)
        .bind(created_at)
        .execute(&self.pool)
        .await?;

        Ok(ProjectRecord {
            id,
            workspace_id: WorkspaceId::from(workspace_id),
            name: name.to_owned(),
            owner_id: UserId::from(owner_id),
            created_at,
        })
    }

    /// Ownership and existence in one predicate: a caller who does not own
    /// the project gets the same "no row" answer as one naming a project
    /// that does not exist.
    pub async fn find_owned(&self, id: &str, owner_id: &str) -> Result<Option<ProjectRecord>> {
        let row = sqlx::query(
            "SELECT id, workspace_id, name, owner_id, created_at
             FROM projects
             WHERE id = ? AND owner_id = ?",
        )
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Self::map_project_row))
    }

    /// Project access for task endpoints: owner or member, still one query.
    pub async fn find_accessible(
        &self,
        id: &str,
        user_id: &str,
    ) -> Result<Option<ProjectRecord>> {
        let row = sqlx::query(
            "SELECT p.id, p.workspace_id, p.name, p.owner_id, p.created_at
             FROM projects p
             WHERE p.id = ?
               AND (p.owner_id = ?
                    OR EXISTS (
                        SELECT 1 FROM project_members pm
                        WHERE pm.project_id = p.id AND pm.user_id = ?
                    ))",
        )
        .bind(id)
        .bind(user_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Self::map_project_row))
    }

    pub async fn add_member(
        &self,
        project_id: &str,
        user_id: &str,
    ) -> Result<ProjectMemberRecord> {
        let id = MemberId::from(Uuid::new_v4().to_string());
        let created_at = Utc::now().timestamp();

        sqlx::query(
            "INSERT INTO project_members (id, project_id, user_id, created_at)
             VALUES (?, ?, ?, ?)",
        )
        .bind(id.as_str())
        .bind(project_id)
        .bind(user_id)
        .bind(created_at)
        .execute(&self.pool)
        .await?;

        Ok(ProjectMemberRecord {
            id,
            project_id: ProjectId::from(project_id),
            user_id: UserId::from(user_id),
            created_at,
        })
    }

    /// Scoped by member id and project id together so an id collision under
    /// another project never resolves.
    pub async fn get_member(
        &self,
        member_id: &str,
        project_id: &str,
    ) -> Result<Option<ProjectMemberRecord>> {
        let row = sqlx::query(
            "SELECT id, project_id, user_id, created_at
             FROM project_members
             WHERE id = ? AND project_id = ?",
        )
        .bind(member_id)
        .bind(project_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Self::map_member_row))
    }

    pub async fn remove_member(&self, member_id: &str, project_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM project_members WHERE id = ? AND project_id = ?")
            .bind(member_id)
            .bind(project_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    fn map_project_row(row: SqliteRow) -> ProjectRecord {
        ProjectRecord {
            id: ProjectId::from(row.get::<String, _>("id")),
            workspace_id: WorkspaceId::from(row.get::<String, _>("workspace_id")),
            name: row.get("name"),
            owner_id: UserId::from(row.get::<String, _>("owner_id")),
            created_at: row.get("created_at"),
        }
    }

    fn map_member_row(row: SqliteRow) -> ProjectMemberRecord {
        ProjectMemberRecord {
            id: MemberId::from(row.get::<String, _>("id")),
            project_id: ProjectId::from(row.get::<String, _>("project_id")),
            user_id: UserId::from(row.get::<String, _>("user_id")),
            created_at: row.get("created_at"),
        }
    }
}
