// Authentication and authorization logic

use argon2::{
    Argon2,
    password_hash::{
        Error as PasswordHashError, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
        rand_core::OsRng,
    },
};
use axum::http::HeaderMap;
use kanri_core::{project::ProjectRecord, user};

use crate::{
    error::AppError,
    state::AppState,
    types::{AuthenticatedRestSession, SessionLookup},
};

pub(crate) async fn authenticate_rest_request(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<AuthenticatedRestSession, AppError> {
    state.user_service.authenticate_rest_request(headers).await
}

pub(crate) async fn pad_session_response(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<SessionLookup, AppError> {
    state.user_service.pad_session_response(headers).await
}

pub(crate) async fn authenticate_with_password(
    state: &AppState,
    email: &str,
    password: &str,
) -> Result<(user::UserRecord, user::SessionRecord), AppError> {
    let Some(user) = state
        .user_store
        .find_by_email(email)
        .await
        .map_err(AppError::from_anyhow)?
    else {
        return Err(AppError::unauthorized("Invalid credentials"));
    };

    if user.password_hash.trim().is_empty() {
        return Err(AppError::unauthorized("Invalid credentials"));
    }

    let parsed_hash =
        PasswordHash::new(&user.password_hash).map_err(|err| AppError::internal(err.into()))?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AppError::unauthorized("Invalid credentials"))?;

    let session = state
        .user_store
        .create_session(user.id.as_str())
        .await
        .map_err(AppError::from_anyhow)?;

    Ok((user, session))
}

/// Task endpoints authorize by project access: owner or project member,
/// resolved in one query. Missing and inaccessible are the same 404.
pub(crate) async fn resolve_accessible_project(
    state: &AppState,
    project_id: &str,
    user_id: &str,
) -> Result<ProjectRecord, AppError> {
    state
        .project_store
        .find_accessible(project_id, user_id)
        .await
        .map_err(AppError::from_anyhow)?
        .ok_or_else(AppError::project_not_found)
}

pub fn generate_password_hash(password: &str) -> Result<String, PasswordHashError> {
    let mut rng = OsRng;
    let salt = SaltString::generate(&mut rng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}
