// Workspace invitation handlers: inbox listing, creation, accept, decline

use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};

use crate::{
    auth::authenticate_rest_request,
    error::AppError,
    http::append_set_cookie_headers,
    state::AppState,
    types::{
        CreateInvitationRequest, CreateInvitationResponse, CreatedInvitation, InvitationItem,
        InvitationsResponse, SuccessResponse,
    },
    workspace::invitations,
};

/// GET /api/workspace/invitations
///
/// The inbox only ever shows the caller's own pending invitations.
pub(crate) async fn list_invitations_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let session = authenticate_rest_request(&state, &headers).await?;

    let pending = state
        .invitation_store
        .list_pending_for_user(session.user.id.as_str())
        .await
        .map_err(AppError::from_anyhow)?;

    let payload = InvitationsResponse {
        invitations: pending.into_iter().map(InvitationItem::from).collect(),
    };
    let mut response = Json(payload).into_response();
    append_set_cookie_headers(&mut response, &session.set_cookies)?;
    Ok(response)
}

/// POST /api/workspace/invitations
pub(crate) async fn create_invitation_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<CreateInvitationRequest>,
) -> Result<Response, AppError> {
    let session = authenticate_rest_request(&state, &headers).await?;

    if payload.workspace_id.trim().is_empty() || payload.user_id.trim().is_empty() {
        return Err(AppError::bad_request("workspaceId and userId are required"));
    }

    let record = invitations::create_invitation(
        &state,
        session.user.id.as_str(),
        &payload.workspace_id,
        &payload.user_id,
    )
    .await?;

    let body = CreateInvitationResponse {
        invitation: CreatedInvitation::from(record),
    };
    let mut response = Json(body).into_response();
    *response.status_mut() = StatusCode::CREATED;
    append_set_cookie_headers(&mut response, &session.set_cookies)?;
    Ok(response)
}

/// POST /api/workspace/invitations/{id}
pub(crate) async fn accept_invitation_handler(
    State(state): State<AppState>,
    Path(invitation_id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let session = authenticate_rest_request(&state, &headers).await?;

    invitations::accept_invitation(&state, session.user.id.as_str(), &invitation_id).await?;

    let mut response = Json(SuccessResponse::ok()).into_response();
    append_set_cookie_headers(&mut response, &session.set_cookies)?;
    Ok(response)
}

/// DELETE /api/workspace/invitations/{id}
pub(crate) async fn decline_invitation_handler(
    State(state): State<AppState>,
    Path(invitation_id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let session = authenticate_rest_request(&state, &headers).await?;

    invitations::decline_invitation(&state, session.user.id.as_str(), &invitation_id).await?;

    let mut response = Json(SuccessResponse::ok()).into_response();
    append_set_cookie_headers(&mut response, &session.set_cookies)?;
    Ok(response)
}
