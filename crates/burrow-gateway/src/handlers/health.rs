use crate::model::HealthResponse;
use axum::Json;

/// Liveness only; backends are not checked.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::up())
}
