use axum::Json;

use crate::types::HealthResponse;

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "Running".to_string(),
    })
}
