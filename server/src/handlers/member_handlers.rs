// Member removal handlers for projects and workspaces

use axum::{
    Json,
    extract::{Path, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
};

use crate::{
    auth::authenticate_rest_request,
    error::AppError,
    http::append_set_cookie_headers,
    state::AppState,
    types::SuccessResponse,
    workspace::members::remove_workspace_member,
};

/// DELETE /api/projects/{id}/members/{member_id}
///
/// Single-predicate project gate: the owned lookup answers "missing" and
/// "not yours" with the same 404, then the member is resolved scoped to
/// that project.
pub(crate) async fn remove_project_member_handler(
    State(state): State<AppState>,
    Path((project_id, member_id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let session = authenticate_rest_request(&state, &headers).await?;

    let project = state
        .project_store
        .find_owned(&project_id, session.user.id.as_str())
        .await
        .map_err(AppError::from_anyhow)?
        .ok_or_else(AppError::project_not_found)?;

    let member = state
        .project_store
        .get_member(&member_id, project.id.as_str())
        .await
        .map_err(AppError::from_anyhow)?
        .ok_or_else(AppError::member_not_found)?;

    let removed = state
        .project_store
        .remove_member(member.id.as_str(), project.id.as_str())
        .await
        .map_err(AppError::from_anyhow)?;
    if !removed {
        return Err(AppError::member_not_found());
    }

    let mut response = Json(SuccessResponse::ok()).into_response();
    append_set_cookie_headers(&mut response, &session.set_cookies)?;
    Ok(response)
}

/// DELETE /api/workspace/members/{member_id}
pub(crate) async fn remove_workspace_member_handler(
    State(state): State<AppState>,
    Path(member_id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let session = authenticate_rest_request(&state, &headers).await?;

    remove_workspace_member(&state, session.user.id.as_str(), &member_id).await?;

    let mut response = Json(SuccessResponse::ok()).into_response();
    append_set_cookie_headers(&mut response, &session.set_cookies)?;
    Ok(response)
}
