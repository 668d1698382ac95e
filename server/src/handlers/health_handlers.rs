use axum::Json;

use crate::types::HealthResponse;

pub(crate) async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}
