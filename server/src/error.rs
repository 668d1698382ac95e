use std::fmt;

use anyhow::Error as AnyError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::error;

#[derive(Debug, Clone, Copy)]
struct ErrorDescriptor {
    status: StatusCode,
    default_message: &'static str,
}

const BAD_REQUEST_DESCRIPTOR: ErrorDescriptor = ErrorDescriptor {
    status: StatusCode::BAD_REQUEST,
    default_message: "Bad request",
};

const UNAUTHORIZED_DESCRIPTOR: ErrorDescriptor = ErrorDescriptor {
    status: StatusCode::UNAUTHORIZED,
    default_message: "Unauthorized",
};

const FORBIDDEN_DESCRIPTOR: ErrorDescriptor = ErrorDescriptor {
    status: StatusCode::FORBIDDEN,
    default_message: "Forbidden",
};

const NOT_FOUND_DESCRIPTOR: ErrorDescriptor = ErrorDescriptor {
    status: StatusCode::NOT_FOUND,
    default_message: "Not found",
};

const CONFLICT_DESCRIPTOR: ErrorDescriptor = ErrorDescriptor {
    status: StatusCode::CONFLICT,
    default_message: "Conflict",
};

const INTERNAL_SERVER_ERROR_DESCRIPTOR: ErrorDescriptor = ErrorDescriptor {
    status: StatusCode::INTERNAL_SERVER_ERROR,
    default_message: "Internal server error",
};

/// Every failure leaves the server as `{"error": "<message>"}` with the
/// matching status. Internal errors keep their cause for the log and never
/// leak it into the message.
#[derive(Debug)]
pub struct AppError {
    descriptor: &'static ErrorDescriptor,
    message: String,
    source: Option<AnyError>,
}

impl AppError {
    pub(crate) fn bad_request(message: impl Into<String>) -> Self {
        Self::from_descriptor(&BAD_REQUEST_DESCRIPTOR, Some(message.into()))
    }

    pub(crate) fn unauthorized(message: impl Into<String>) -> Self {
        Self::from_descriptor(&UNAUTHORIZED_DESCRIPTOR, Some(message.into()))
    }

    pub(crate) fn conflict(message: impl Into<String>) -> Self {
        Self::from_descriptor(&CONFLICT_DESCRIPTOR, Some(message.into()))
    }

    pub(crate) fn internal(error: AnyError) -> Self {
        error!(?error, "internal server error");
        Self::from_descriptor(&INTERNAL_SERVER_ERROR_DESCRIPTOR, None).with_source(error)
    }

    pub(crate) fn from_anyhow(error: AnyError) -> Self {
        Self::internal(error)
    }

    /// Ownership gates answer "missing" and "not yours" identically.
    pub(crate) fn project_not_found() -> Self {
        Self::from_descriptor(
            &NOT_FOUND_DESCRIPTOR,
            Some("Project not found or access denied".to_string()),
        )
    }

    pub(crate) fn workspace_not_found() -> Self {
        Self::from_descriptor(
            &NOT_FOUND_DESCRIPTOR,
            Some("Workspace not found or access denied".to_string()),
        )
    }

    pub(crate) fn user_not_found() -> Self {
        Self::from_descriptor(&NOT_FOUND_DESCRIPTOR, Some("User not found".to_string()))
    }

    pub(crate) fn member_not_found() -> Self {
        Self::from_descriptor(&NOT_FOUND_DESCRIPTOR, Some("Member not found".to_string()))
    }

    pub(crate) fn not_workspace_owner() -> Self {
        Self::from_descriptor(
            &FORBIDDEN_DESCRIPTOR,
            Some("Only workspace owner can remove members".to_string()),
        )
    }

    pub(crate) fn invitation_not_found() -> Self {
        Self::from_descriptor(
            &NOT_FOUND_DESCRIPTOR,
            Some("Invitation not found".to_string()),
        )
    }

    pub(crate) fn task_not_found() -> Self {
        Self::from_descriptor(&NOT_FOUND_DESCRIPTOR, Some("Task not found".to_string()))
    }

    pub(crate) fn into_payload(self) -> (StatusCode, ErrorPayload) {
        let AppError {
            descriptor,
            message,
            source: _,
        } = self;
        (descriptor.status, ErrorPayload { error: message })
    }

    fn from_descriptor(descriptor: &'static ErrorDescriptor, message: Option<String>) -> Self {
        Self {
            descriptor,
            message: message.unwrap_or_else(|| descriptor.default_message.to_owned()),
            source: None,
        }
    }

    fn with_source(mut self, error: AnyError) -> Self {
        self.source = Some(error);
        self
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, payload) = self.into_payload();
        (status, Json(payload)).into_response()
    }
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct ErrorPayload {
    pub(crate) error: String,
}
