use anyhow::Result;
use chrono::Utc;
use sqlx::{Pool, Row, Sqlite, sqlite::SqliteRow};
use uuid::Uuid;

use crate::{
    db::Database,
    ids::{InvitationId, MemberId, UserId, WorkspaceId},
};

/// Lifecycle of a workspace invitation. `Pending` rows are the only ones an
/// invitee can act on; deny deletes the row instead of parking it in a
/// terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvitationStatus {
    Pending,
    Accepted,
    Declined,
}

impl InvitationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            InvitationStatus::Pending => "PENDING",
            InvitationStatus::Accepted => "ACCEPTED",
            InvitationStatus::Declined => "DECLINED",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "PENDING" => Some(InvitationStatus::Pending),
            "ACCEPTED" => Some(InvitationStatus::Accepted),
            "DECLINED" => Some(InvitationStatus::Declined),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct WorkspaceInvitationRecord {
    pub id: InvitationId,
    pub workspace_id: WorkspaceId,
    pub user_id: UserId,
    pub inviter_id: UserId,
    pub status: InvitationStatus,
    pub created_at: i64,
}

/// Inbox projection: the invitation plus the minimal workspace and inviter
/// fields an invitee is allowed to see.
#[derive(Debug, Clone)]
pub struct PendingInvitation {
    pub id: InvitationId,
    pub workspace_id: WorkspaceId,
    pub workspace_name: String,
    pub inviter_id: UserId,
    pub inviter_email: String,
    pub inviter_name: Option<String>,
    pub created_at: i64,
}

#[derive(Clone)]
pub struct InvitationStore {
    pool: Pool<Sqlite>,
}

impl InvitationStore {
    pub fn new(database: &Database) -> Self {
        Self {
            pool: database.pool().clone(),
        }
    }

    pub async fn create(
        &self,
        workspace_id: &str,
        user_id: &str,
        inviter_id: &str,
    ) -> Result<WorkspaceInvitationRecord> {
        let id = InvitationId::from(Uuid::new_v4().to_string());
        let created_at = Utc::now().timestamp();

        sqlx::query(
            "INSERT INTO workspace_invitations (id, workspace_id, user_id, inviter_id, status, created_at)
             VALUES (?, ?, ?, ?, 'PENDING', ?)",
        )
        .bind(id.as_str())
        .bind(workspace_id)
        .bind(user_id)
        .bind(inviter_id)
        .bind(created_at)
        .execute(&self.pool)
        .await?;

        Ok(WorkspaceInvitationRecord {
            id,
            workspace_id: WorkspaceId::from(workspace_id),
            user_id: UserId::from(user_id),
            inviter_id: UserId::from(inviter_id),
            status: InvitationStatus::Pending,
            created_at,
        })
    }

    /// Inbox read path: the invitee's pending invitations, newest first,
    /// joined with minimal workspace and inviter projections.
    pub async fn list_pending_for_user(&self, user_id: &str) -> Result<Vec<PendingInvitation>> {
        let rows = sqlx::query(
            "SELECT
                 i.id,
                 i.workspace_id,
                 w.name AS workspace_name,
                 i.inviter_id,
                 u.email AS inviter_email,
                 u.name AS inviter_name,
                 i.created_at
             FROM workspace_invitations i
             JOIN workspaces w ON w.id = i.workspace_id
             JOIN users u ON u.id = i.inviter_id
             WHERE i.user_id = ? AND i.status = 'PENDING'
             ORDER BY i.created_at DESC, i.id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Self::map_pending_row).collect())
    }

    /// Scoped by invitation id and invitee together so one user cannot act
    /// on another's invitation.
    pub async fn find_pending_for_invitee(
        &self,
        invitation_id: &str,
        user_id: &str,
    ) -> Result<Option<WorkspaceInvitationRecord>> {
        let row = sqlx::query(
            "SELECT id, workspace_id, user_id, inviter_id, status, created_at
             FROM workspace_invitations
             WHERE id = ? AND user_id = ? AND status = 'PENDING'",
        )
        .bind(invitation_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Self::map_invitation_row))
    }

    pub async fn find_pending(
        &self,
        workspace_id: &str,
        user_id: &str,
    ) -> Result<Option<WorkspaceInvitationRecord>> {
        let row = sqlx::query(
            "SELECT id, workspace_id, user_id, inviter_id, status, created_at
             FROM workspace_invitations
             WHERE workspace_id = ? AND user_id = ? AND status = 'PENDING'",
        )
        .bind(workspace_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Self::map_invitation_row))
    }

    /// Accept consumes the invitation exactly once: the membership insert
    /// and the status transition commit together or not at all.
    pub async fn accept(&self, invitation: &WorkspaceInvitationRecord) -> Result<()> {
        let created_at = Utc::now().timestamp();

        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "INSERT INTO workspace_members (id, workspace_id, user_id, created_at)
             VALUES (?, ?, ?, ?)",
        )
        .bind(MemberId::from(Uuid::new_v4().to_string()).as_str())
        .bind(invitation.workspace_id.as_str())
        .bind(invitation.user_id.as_str())
        .bind(created_at)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE workspace_invitations SET status = 'ACCEPTED'
             WHERE id = ? AND status = 'PENDING'",
        )
        .bind(invitation.id.as_str())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    pub async fn decline(&self, invitation_id: &str, user_id: &str) -> Result<bool> {
        let result = sqlx::query(
            "DELETE FROM workspace_invitations
             WHERE id = ? AND user_id = ? AND status = 'PENDING'",
        )
        .bind(invitation_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    fn map_invitation_row(row: SqliteRow) -> WorkspaceInvitationRecord {
        let status = InvitationStatus::parse(row.get::<String, _>("status").as_str())
            .unwrap_or(InvitationStatus::Pending);
        WorkspaceInvitationRecord {
            id: InvitationId::from(row.get::<String, _>("id")),
            workspace_id: WorkspaceId::from(row.get::<String, _>("workspace_id")),
            user_id: UserId::from(row.get::<String, _>("user_id")),
            inviter_id: UserId::from(row.get::<String, _>("inviter_id")),
            status,
            created_at: row.get("created_at"),
        }
    }

    fn map_pending_row(row: SqliteRow) -> PendingInvitation {
        PendingInvitation {
            id: InvitationId::from(row.get::<String, _>("id")),
            workspace_id: WorkspaceId::from(row.get::<String, _>("workspace_id")),
            workspace_name: row.get("workspace_name"),
            inviter_id: UserId::from(row.get::<String, _>("inviter_id")),
            inviter_email: row.get("inviter_email"),
            inviter_name: row.get::<Option<String>, _>("inviter_name"),
            created_at: row.get("created_at"),
        }
    }
}
