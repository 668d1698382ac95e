// Router configuration

use axum::{
    Router,
    http::Method,
    routing::{delete, get, patch, post},
};
use tower_http::{
    cors::{AllowHeaders, AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    handlers::{
        auth_handlers::*, health_handlers::*, invitation_handlers::*, member_handlers::*,
        task_handlers::*,
    },
    state::AppState,
};

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true);

    Router::new()
        // Health
        .route("/health", get(health_handler))
        // Authentication
        .route("/api/auth/sign-in", post(sign_in_handler))
        .route("/api/auth/session", get(get_session_handler))
        .route("/api/auth/sign-out", get(sign_out_handler))
        // Project members
        .route(
            "/api/projects/{id}/members/{member_id}",
            delete(remove_project_member_handler),
        )
        // Workspace members
        .route(
            "/api/workspace/members/{member_id}",
            delete(remove_workspace_member_handler),
        )
        // Invitations
        .route(
            "/api/workspace/invitations",
            get(list_invitations_handler).post(create_invitation_handler),
        )
        .route(
            "/api/workspace/invitations/{id}",
            post(accept_invitation_handler).delete(decline_invitation_handler),
        )
        // Tasks
        .route("/api/tasks", post(create_task_handler))
        .route(
            "/api/tasks/{id}",
            patch(update_task_handler).delete(delete_task_handler),
        )
        .route(
            "/api/projects/{id}/tasks",
            get(list_project_tasks_handler),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
