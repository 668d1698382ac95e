// Task CRUD handlers, authorized through project access

use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use kanri_core::task::{DEFAULT_TASK_PRIORITY, TaskUpdate};

use crate::{
    auth::{authenticate_rest_request, resolve_accessible_project},
    error::AppError,
    http::append_set_cookie_headers,
    state::AppState,
    types::{
        CreateTaskRequest, SuccessResponse, TaskBody, TaskListResponse, TaskResponse,
        UpdateTaskRequest, millis_from_iso, parse_task_status,
    },
};

/// POST /api/tasks
pub(crate) async fn create_task_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<CreateTaskRequest>,
) -> Result<Response, AppError> {
    let session = authenticate_rest_request(&state, &headers).await?;

    let title = payload.title.trim();
    if title.is_empty() {
        return Err(AppError::bad_request("Title is required"));
    }

    let project =
        resolve_accessible_project(&state, &payload.project_id, session.user.id.as_str()).await?;

    let due_at = match payload.due_at.as_deref() {
        Some(value) => Some(millis_from_iso(value)?),
        None => None,
    };

    let task = state
        .task_store
        .create(
            project.id.as_str(),
            title,
            payload.notes.as_deref(),
            due_at,
            payload.priority.unwrap_or(DEFAULT_TASK_PRIORITY),
        )
        .await
        .map_err(AppError::from_anyhow)?;

    let body = TaskResponse {
        task: TaskBody::from(task),
    };
    let mut response = Json(body).into_response();
    *response.status_mut() = StatusCode::CREATED;
    append_set_cookie_headers(&mut response, &session.set_cookies)?;
    Ok(response)
}

/// PATCH /api/tasks/{id}
///
/// The task is looked up first, then access to its project is checked, so
/// a task in a foreign project reads as 404 for both steps.
pub(crate) async fn update_task_handler(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<UpdateTaskRequest>,
) -> Result<Response, AppError> {
    let session = authenticate_rest_request(&state, &headers).await?;

    let task = state
        .task_store
        .find_by_id(&task_id)
        .await
        .map_err(AppError::from_anyhow)?
        .ok_or_else(AppError::task_not_found)?;

    resolve_accessible_project(&state, task.project_id.as_str(), session.user.id.as_str())
        .await
        .map_err(|_| AppError::task_not_found())?;

    let mut update = TaskUpdate::default();
    if let Some(title) = payload.title {
        let title = title.trim().to_owned();
        if title.is_empty() {
            return Err(AppError::bad_request("Title is required"));
        }
        update.title = Some(title);
    }
    if let Some(notes) = payload.notes {
        update.notes = Some(notes);
    }
    if let Some(due_at) = payload.due_at {
        update.due_at = Some(match due_at.as_deref() {
            Some(value) => Some(millis_from_iso(value)?),
            None => None,
        });
    }
    if let Some(priority) = payload.priority {
        update.priority = Some(priority);
    }
    if let Some(status) = payload.status.as_deref() {
        update.status = Some(parse_task_status(status)?);
    }

    if update.is_empty() {
        return Err(AppError::bad_request("No fields to update"));
    }

    let updated = state
        .task_store
        .update(task.id.as_str(), &update)
        .await
        .map_err(AppError::from_anyhow)?
        .ok_or_else(AppError::task_not_found)?;

    let body = TaskResponse {
        task: TaskBody::from(updated),
    };
    let mut response = Json(body).into_response();
    append_set_cookie_headers(&mut response, &session.set_cookies)?;
    Ok(response)
}

/// DELETE /api/tasks/{id}
pub(crate) async fn delete_task_handler(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let session = authenticate_rest_request(&state, &headers).await?;

    let task = state
        .task_store
        .find_by_id(&task_id)
        .await
        .map_err(AppError::from_anyhow)?
        .ok_or_else(AppError::task_not_found)?;

    resolve_accessible_project(&state, task.project_id.as_str(), session.user.id.as_str())
        .await
        .map_err(|_| AppError::task_not_found())?;

    let deleted = state
        .task_store
        .delete(task.id.as_str())
        .await
        .map_err(AppError::from_anyhow)?;
    if !deleted {
        return Err(AppError::task_not_found());
    }

    let mut response = Json(SuccessResponse::ok()).into_response();
    append_set_cookie_headers(&mut response, &session.set_cookies)?;
    Ok(response)
}

/// GET /api/projects/{id}/tasks
pub(crate) async fn list_project_tasks_handler(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let session = authenticate_rest_request(&state, &headers).await?;

    let project =
        resolve_accessible_project(&state, &project_id, session.user.id.as_str()).await?;

    let tasks = state
        .task_store
        .list_for_project(project.id.as_str())
        .await
        .map_err(AppError::from_anyhow)?;

    let body = TaskListResponse {
        tasks: tasks.into_iter().map(TaskBody::from).collect(),
    };
    let mut response = Json(body).into_response();
    append_set_cookie_headers(&mut response, &session.set_cookies)?;
    Ok(response)
}
