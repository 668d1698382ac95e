use crate::{AppError, AppState};

/// Workspace-member removal gate. Unlike the project gate this one looks
/// the member up first (joined with its workspace's owner), so a caller who
/// is not the owner of an existing member's workspace gets 403 while a
/// missing member gets 404.
pub async fn remove_workspace_member(
    state: &AppState,
    requester_id: &str,
    member_id: &str,
) -> Result<(), AppError> {
    let member = state
        .workspace_store
        .find_member_with_owner(member_id)
        .await
        .map_err(AppError::from_anyhow)?
        .ok_or_else(AppError::member_not_found)?;

    if member.workspace_owner_id != requester_id {
        return Err(AppError::not_workspace_owner());
    }

    if member.user_id == member.workspace_owner_id {
        return Err(AppError::bad_request("Workspace owner cannot be removed"));
    }

    let removed = state
        .workspace_store
        .remove_member(member.id.as_str(), member.workspace_id.as_str())
        .await
        .map_err(AppError::from_anyhow)?;

    if !removed {
        return Err(AppError::member_not_found());
    }

    Ok(())
}
