use anyhow::Result;
use chrono::Utc;
use sqlx::{Pool, QueryBuilder, Row, Sqlite, sqlite::SqliteRow};
use uuid::Uuid;

use crate::{
    db::Database,
    ids::{ProjectId, TaskId},
};

pub const DEFAULT_TASK_PRIORITY: i64 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    NotStarted,
    InProgress,
    Done,
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::NotStarted => "NOT_STARTED",
            TaskStatus::InProgress => "IN_PROGRESS",
            TaskStatus::Done => "DONE",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "NOT_STARTED" => Some(TaskStatus::NotStarted),
            "IN_PROGRESS" => Some(TaskStatus::InProgress),
            "DONE" => Some(TaskStatus::Done),
            _ => None,
        }
    }
}

/// A task row. `due_at` is stored in unix milliseconds so sub-second
/// end-of-day deadlines survive the round trip; the other timestamps are
/// unix seconds.
#[derive(Debug, Clone)]
pub struct TaskRecord {
    pub id: TaskId,
    pub project_id: ProjectId,
    pub title: String,
    pub notes: Option<String>,
    pub due_at: Option<i64>,
    pub priority: i64,
    pub status: TaskStatus,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Sparse update. The outer `Option` means "field present in the patch";
/// for nullable columns the inner `Option` distinguishes "set" from
/// "clear".
#[derive(Debug, Clone, Default)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub notes: Option<Option<String>>,
    pub due_at: Option<Option<i64>>,
    pub priority: Option<i64>,
    pub status: Option<TaskStatus>,
}

impl TaskUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.notes.is_none()
            && self.due_at.is_none()
            && self.priority.is_none()
            && self.status.is_none()
    }
}

#[derive(Clone)]
pub struct TaskStore {
    pool: Pool<Sqlite>,
}

impl TaskStore {
    pub fn new(database: &Database) -> Self {
        Self {
            pool: database.pool().clone(),
        }
    }

    /// New tasks always start in `NOT_STARTED` regardless of what the
    /// caller asked for.
    pub async fn create(
        &self,
        project_id: &str,
        title: &str,
        notes: Option<&str>,
        due_at: Option<i64>,
        priority: i64,
    ) -> Result<TaskRecord> {
        let id = TaskId::from(Uuid::new_v4().to_string());
        let created_at = Utc::now().timestamp();

        sqlx::query(
            "INSERT INTO tasks (id, project_id, title, notes, due_at, priority, status, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, 'NOT_STARTED', ?, ?)",
        )
        .bind(id.as_str())
        .bind(project_id)
        .bind(title)
        .bind(notes)
        .bind(due_at)
        .bind(priority)
        .bind(created_at)
        .bind(created_at)
        .execute(&self.pool)
        .await?;

        Ok(TaskRecord {
            id,
            project_id: ProjectId::from(project_id),
            title: title.to_owned(),
            notes: notes.map(ToOwned::to_owned),
            due_at,
            priority,
            status: TaskStatus::NotStarted,
            created_at,
            updated_at: created_at,
        })
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<TaskRecord>> {
        let row = sqlx::query(
            "SELECT id, project_id, title, notes, due_at, priority, status, created_at, updated_at
             FROM tasks WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Self::map_row))
    }

    pub async fn list_for_project(&self, project_id: &str) -> Result<Vec<TaskRecord>> {
        let rows = sqlx::query(
            "SELECT id, project_id, title, notes, due_at, priority, status, created_at, updated_at
             FROM tasks WHERE project_id = ?
             ORDER BY created_at DESC, id DESC",
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Self::map_row).collect())
    }

    /// Applies the present fields of `update` and bumps `updated_at`.
    /// Returns the fresh row, or `None` when the task does not exist.
    pub async fn update(&self, id: &str, update: &TaskUpdate) -> Result<Option<TaskRecord>> {
        let updated_at = Utc::now().timestamp();

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE tasks SET ");
        let mut fields = builder.separated(", ");
        if let Some(title) = &update.title {
            fields.push("title = ").push_bind_unseparated(title);
        }
        if let Some(notes) = &update.notes {
            fields.push("notes = ").push_bind_unseparated(notes.clone());
        }
        if let Some(due_at) = &update.due_at {
            fields.push("due_at = ").push_bind_unseparated(*due_at);
        }
        if let Some(priority) = update.priority {
            fields.push("priority = ").push_bind_unseparated(priority);
        }
        if let Some(status) = update.status {
            fields.push("status = ").push_bind_unseparated(status.as_str());
        }
        fields.push("updated_at = ").push_bind_unseparated(updated_at);

        builder.push(" WHERE id = ").push_bind(id);
        let result = builder.build().execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.find_by_id(id).await
    }

    pub async fn delete(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    fn map_row(row: SqliteRow) -> TaskRecord {
        let status = TaskStatus::parse(row.get::<String, _>("status").as_str())
            .unwrap_or(TaskStatus::NotStarted);
        TaskRecord {
            id: TaskId::from(row.get::<String, _>("id")),
            project_id: ProjectId::from(row.get::<String, _>("project_id")),
            title: row.get("title"),
            notes: row.get::<Option<String>, _>("notes"),
            due_at: row.get::<Option<i64>, _>("due_at"),
            priority: row.get("priority"),
            status,
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        project::ProjectStore, test_support::setup_database, user::UserStore,
        workspace::WorkspaceStore,
    };

    async fn seed_project(database: &crate::db::Database) -> anyhow::Result<ProjectId> {
        let users = UserStore::new(database);
        let workspaces = WorkspaceStore::new(database);
        let projects = ProjectStore::new(database);

        let owner = users.create("owner@example.com", "hash", None).await?;
        let workspace = workspaces.create(owner.id.as_str(), Some("Team")).await?;
        let project = projects
            .create(workspace.id.as_str(), owner.id.as_str(), "Launch")
            .await?;
        Ok(project.id)
    }

    #[tokio::test]
    async fn create_always_starts_not_started() -> anyhow::Result<()> {
        let (_temp_dir, database) = setup_database().await?;
        let project_id = seed_project(&database).await?;
        let tasks = TaskStore::new(&database);

        let task = tasks
            .create(project_id.as_str(), "Ship it", None, Some(1_755_907_199_999), 2)
            .await?;
        assert_eq!(task.status, TaskStatus::NotStarted);
        assert_eq!(task.due_at, Some(1_755_907_199_999));

        let stored = tasks.find_by_id(task.id.as_str()).await?.expect("row");
        assert_eq!(stored.status, TaskStatus::NotStarted);
        Ok(())
    }

    #[tokio::test]
    async fn update_applies_only_present_fields() -> anyhow::Result<()> {
        let (_temp_dir, database) = setup_database().await?;
        let project_id = seed_project(&database).await?;
        let tasks = TaskStore::new(&database);

        let task = tasks
            .create(project_id.as_str(), "Draft", Some("first pass"), None, 1)
            .await?;

        let updated = tasks
            .update(
                task.id.as_str(),
                &TaskUpdate {
                    status: Some(TaskStatus::InProgress),
                    ..Default::default()
                },
            )
            .await?
            .expect("row");
        assert_eq!(updated.status, TaskStatus::InProgress);
        assert_eq!(updated.title, "Draft");
        assert_eq!(updated.notes.as_deref(), Some("first pass"));

        // Explicit null clears a nullable column.
        let cleared = tasks
            .update(
                task.id.as_str(),
                &TaskUpdate {
                    notes: Some(None),
                    ..Default::default()
                },
            )
            .await?
            .expect("row");
        assert!(cleared.notes.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn update_missing_task_returns_none() -> anyhow::Result<()> {
        let (_temp_dir, database) = setup_database().await?;
        let _ = seed_project(&database).await?;
        let tasks = TaskStore::new(&database);

        let result = tasks
            .update(
                "missing-task",
                &TaskUpdate {
                    title: Some("anything".into()),
                    ..Default::default()
                },
            )
            .await?;
        assert!(result.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn list_orders_newest_first() -> anyhow::Result<()> {
        let (_temp_dir, database) = setup_database().await?;
        let project_id = seed_project(&database).await?;
        let tasks = TaskStore::new(&database);

        let first = tasks
            .create(project_id.as_str(), "Older", None, None, 0)
            .await?;
        sqlx::query("UPDATE tasks SET created_at = created_at - 100 WHERE id = ?")
            .bind(first.id.as_str())
            .execute(database.pool())
            .await?;
        let second = tasks
            .create(project_id.as_str(), "Newer", None, None, 0)
            .await?;

        let listed = tasks.list_for_project(project_id.as_str()).await?;
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, second.id);
        assert_eq!(listed[1].id, first.id);
        Ok(())
    }

    #[tokio::test]
    async fn delete_reports_whether_a_row_went_away() -> anyhow::Result<()> {
        let (_temp_dir, database) = setup_database().await?;
        let project_id = seed_project(&database).await?;
        let tasks = TaskStore::new(&database);

        let task = tasks
            .create(project_id.as_str(), "Remove me", None, None, 0)
            .await?;
        assert!(tasks.delete(task.id.as_str()).await?);
        assert!(!tasks.delete(task.id.as_str()).await?);
        Ok(())
    }
}
