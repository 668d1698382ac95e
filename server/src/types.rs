// Request and response types for REST API handlers

use chrono::{DateTime, SecondsFormat, Utc};
use kanri_core::{
    invitation::{InvitationStatus, PendingInvitation, WorkspaceInvitationRecord},
    task::{TaskRecord, TaskStatus},
    user,
};
use serde::{Deserialize, Deserializer, Serialize};

use crate::AppError;

// ========== Authentication Types ==========

pub(crate) struct AuthenticatedRestSession {
    pub(crate) user: user::UserRecord,
    pub(crate) set_cookies: Vec<String>,
}

pub(crate) struct SessionLookup {
    pub(crate) user: Option<SessionUser>,
    pub(crate) cookies: Vec<String>,
}

// ========== Request Types ==========

#[derive(Deserialize)]
pub(crate) struct SignInRequest {
    pub(crate) email: String,
    #[serde(default)]
    pub(crate) password: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateInvitationRequest {
    pub(crate) workspace_id: String,
    pub(crate) user_id: String,
}

#[derive(Deserialize)]
pub(crate) struct CreateTaskRequest {
    pub(crate) title: String,
    #[serde(rename = "projectId")]
    pub(crate) project_id: String,
    #[serde(default)]
    pub(crate) notes: Option<String>,
    /// ISO-8601; millisecond precision is preserved.
    #[serde(default)]
    pub(crate) due_at: Option<String>,
    #[serde(default)]
    pub(crate) priority: Option<i64>,
}

/// Sparse patch body. Missing fields stay untouched; `notes` and `due_at`
/// accept an explicit `null` to clear the column, which the double-`Option`
/// keeps apart from "absent".
#[derive(Deserialize, Default)]
pub(crate) struct UpdateTaskRequest {
    #[serde(default)]
    pub(crate) title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub(crate) notes: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub(crate) due_at: Option<Option<String>>,
    #[serde(default)]
    pub(crate) priority: Option<i64>,
    #[serde(default)]
    pub(crate) status: Option<String>,
}

fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

// ========== Response Types ==========

#[derive(Serialize)]
pub(crate) struct SuccessResponse {
    pub(crate) success: bool,
}

impl SuccessResponse {
    pub(crate) fn ok() -> Self {
        Self { success: true }
    }
}

#[derive(Clone, Serialize)]
pub(crate) struct SessionUser {
    pub(crate) id: String,
    pub(crate) email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) name: Option<String>,
}

impl From<&user::UserRecord> for SessionUser {
    fn from(record: &user::UserRecord) -> Self {
        Self {
            id: record.id.as_str().to_owned(),
            email: record.email.clone(),
            name: record.name.clone(),
        }
    }
}

#[derive(Default, Serialize)]
pub(crate) struct SessionUserPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) user: Option<SessionUser>,
}

#[derive(Serialize)]
pub(crate) struct TaskResponse {
    pub(crate) task: TaskBody,
}

#[derive(Serialize)]
pub(crate) struct TaskListResponse {
    pub(crate) tasks: Vec<TaskBody>,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct TaskBody {
    pub id: String,
    #[serde(rename = "projectId")]
    pub project_id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_at: Option<String>,
    pub priority: i64,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<TaskRecord> for TaskBody {
    fn from(record: TaskRecord) -> Self {
        Self {
            id: record.id.into_inner(),
            project_id: record.project_id.into_inner(),
            title: record.title,
            notes: record.notes,
            due_at: record.due_at.map(iso_from_millis),
            priority: record.priority,
            status: record.status.as_str().to_owned(),
            created_at: iso_from_seconds(record.created_at),
            updated_at: iso_from_seconds(record.updated_at),
        }
    }
}

#[derive(Serialize)]
pub(crate) struct InvitationsResponse {
    pub(crate) invitations: Vec<InvitationItem>,
}

#[derive(Serialize)]
pub struct InvitationItem {
    pub id: String,
    pub workspace: InvitationWorkspace,
    pub inviter: InvitationInviter,
    pub status: String,
    pub created_at: String,
}

#[derive(Serialize)]
pub struct InvitationWorkspace {
    pub id: String,
    pub name: String,
}

#[derive(Serialize)]
pub struct InvitationInviter {
    pub id: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl From<PendingInvitation> for InvitationItem {
    fn from(invitation: PendingInvitation) -> Self {
        Self {
            id: invitation.id.into_inner(),
            workspace: InvitationWorkspace {
                id: invitation.workspace_id.into_inner(),
                name: invitation.workspace_name,
            },
            inviter: InvitationInviter {
                id: invitation.inviter_id.into_inner(),
                email: invitation.inviter_email,
                name: invitation.inviter_name,
            },
            status: InvitationStatus::Pending.as_str().to_owned(),
            created_at: iso_from_seconds(invitation.created_at),
        }
    }
}

#[derive(Serialize)]
pub(crate) struct CreateInvitationResponse {
    pub(crate) invitation: CreatedInvitation,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreatedInvitation {
    pub(crate) id: String,
    pub(crate) workspace_id: String,
    pub(crate) user_id: String,
    pub(crate) status: String,
    #[serde(rename = "created_at")]
    pub(crate) created_at: String,
}

impl From<WorkspaceInvitationRecord> for CreatedInvitation {
    fn from(record: WorkspaceInvitationRecord) -> Self {
        Self {
            id: record.id.into_inner(),
            workspace_id: record.workspace_id.into_inner(),
            user_id: record.user_id.into_inner(),
            status: record.status.as_str().to_owned(),
            created_at: iso_from_seconds(record.created_at),
        }
    }
}

#[derive(Serialize)]
pub(crate) struct HealthResponse {
    pub(crate) status: &'static str,
}

// ========== Wire time helpers ==========

pub(crate) fn iso_from_seconds(seconds: i64) -> String {
    DateTime::<Utc>::from_timestamp(seconds, 0)
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
        .to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub(crate) fn iso_from_millis(millis: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) fn millis_from_iso(value: &str) -> Result<i64, AppError> {
    DateTime::parse_from_rfc3339(value)
        .map(|parsed| parsed.timestamp_millis())
        .map_err(|_| AppError::bad_request("Invalid date"))
}

pub(crate) fn parse_task_status(value: &str) -> Result<TaskStatus, AppError> {
    TaskStatus::parse(value).ok_or_else(|| AppError::bad_request("Invalid status"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn due_dates_keep_millisecond_precision_on_the_wire() {
        let millis = millis_from_iso("2026-03-01T23:59:59.999Z").expect("parse");
        assert_eq!(iso_from_millis(millis), "2026-03-01T23:59:59.999Z");
    }

    #[test]
    fn update_request_distinguishes_null_from_absent() {
        let cleared: UpdateTaskRequest =
            serde_json::from_str(r#"{"notes": null}"#).expect("deserialize");
        assert_eq!(cleared.notes, Some(None));
        assert!(cleared.due_at.is_none());

        let untouched: UpdateTaskRequest = serde_json::from_str("{}").expect("deserialize");
        assert!(untouched.notes.is_none());
    }

    #[test]
    fn invalid_iso_date_is_a_bad_request() {
        assert!(millis_from_iso("tomorrow").is_err());
    }
}
