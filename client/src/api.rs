// API seam between the controllers and the HTTP transport

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Failure surfaced to the embedding UI. `message()` is already the
/// user-facing text, resolved through the three-tier fallback in the
/// transport.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    Http { status: u16, message: String },
    Transport(String),
}

impl ApiError {
    pub fn message(&self) -> &str {
        match self {
            ApiError::Http { message, .. } => message,
            ApiError::Transport(message) => message,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Http { status, message } => write!(f, "{message} (HTTP {status})"),
            ApiError::Transport(message) => write!(f, "{message}"),
        }
    }
}

impl std::error::Error for ApiError {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskView {
    pub id: String,
    #[serde(rename = "projectId")]
    pub project_id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_at: Option<String>,
    pub priority: i64,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InvitationView {
    pub id: String,
    pub workspace: InvitationWorkspace,
    pub inviter: InvitationInviter,
    pub status: String,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InvitationWorkspace {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InvitationInviter {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateTaskBody {
    pub title: String,
    #[serde(rename = "projectId")]
    pub project_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<i64>,
}

/// Sparse patch: only present fields go on the wire. For `notes` and
/// `due_at` a `Some(None)` serializes as an explicit `null`, which the
/// server reads as "clear".
#[derive(Debug, Clone, Default, Serialize)]
pub struct TaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_at: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl TaskPatch {
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn notes(mut self, notes: Option<String>) -> Self {
        self.notes = Some(notes);
        self
    }

    pub fn due_at(mut self, due_at: Option<String>) -> Self {
        self.due_at = Some(due_at);
        self
    }

    pub fn priority(mut self, priority: i64) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }
}

#[async_trait]
pub trait TaskApi {
    async fn create_task(&self, body: &CreateTaskBody) -> Result<TaskView, ApiError>;
    async fn update_task(&self, task_id: &str, patch: &TaskPatch) -> Result<TaskView, ApiError>;
    async fn delete_task(&self, task_id: &str) -> Result<(), ApiError>;
    async fn list_tasks(&self, project_id: &str) -> Result<Vec<TaskView>, ApiError>;
}

#[async_trait]
pub trait InvitationApi {
    async fn list_invitations(&self) -> Result<Vec<InvitationView>, ApiError>;
    async fn accept_invitation(&self, invitation_id: &str) -> Result<(), ApiError>;
    async fn decline_invitation(&self, invitation_id: &str) -> Result<(), ApiError>;
}
