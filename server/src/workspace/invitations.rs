use kanri_core::invitation::WorkspaceInvitationRecord;

use crate::{AppError, AppState, utils::db::is_unique_violation};

/// Owner-only invitation creation. The workspace lookup carries the
/// ownership predicate, so inviting into someone else's workspace reads as
/// "workspace not found".
pub async fn create_invitation(
    state: &AppState,
    requester_id: &str,
    workspace_id: &str,
    invitee_id: &str,
) -> Result<WorkspaceInvitationRecord, AppError> {
    let workspace = state
        .workspace_store
        .find_owned(workspace_id, requester_id)
        .await
        .map_err(AppError::from_anyhow)?
        .ok_or_else(AppError::workspace_not_found)?;

    let invitee = state
        .user_store
        .find_by_id(invitee_id)
        .await
        .map_err(AppError::from_anyhow)?
        .ok_or_else(AppError::user_not_found)?;

    let existing_member = state
        .workspace_store
        .find_member(workspace.id.as_str(), invitee.id.as_str())
        .await
        .map_err(AppError::from_anyhow)?;
    if existing_member.is_some() {
        return Err(AppError::bad_request("User is already a member"));
    }

    let pending = state
        .invitation_store
        .find_pending(workspace.id.as_str(), invitee.id.as_str())
        .await
        .map_err(AppError::from_anyhow)?;
    if pending.is_some() {
        return Err(AppError::conflict("Invitation already pending"));
    }

    state
        .invitation_store
        .create(workspace.id.as_str(), invitee.id.as_str(), requester_id)
        .await
        .map_err(AppError::from_anyhow)
}

/// Accept is scoped by `(invitation_id, invitee)` and only ever consumes a
/// `PENDING` row.
pub async fn accept_invitation(
    state: &AppState,
    user_id: &str,
    invitation_id: &str,
) -> Result<(), AppError> {
    let invitation = state
        .invitation_store
        .find_pending_for_invitee(invitation_id, user_id)
        .await
        .map_err(AppError::from_anyhow)?
        .ok_or_else(AppError::invitation_not_found)?;

    match state.invitation_store.accept(&invitation).await {
        Ok(()) => Ok(()),
        Err(err) if is_unique_violation(&err) => Err(AppError::conflict(
            "User is already a member of this workspace",
        )),
        Err(err) => Err(AppError::from_anyhow(err)),
    }
}

pub async fn decline_invitation(
    state: &AppState,
    user_id: &str,
    invitation_id: &str,
) -> Result<(), AppError> {
    let declined = state
        .invitation_store
        .decline(invitation_id, user_id)
        .await
        .map_err(AppError::from_anyhow)?;

    if !declined {
        return Err(AppError::invitation_not_found());
    }

    Ok(())
}
