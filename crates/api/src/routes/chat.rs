use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use tracing::{error, info, instrument};

use crate::{
    server::AppState,
    types::{ChatRequest, ChatResponse, ErrorResponse},
};

/// Answer one query.
///
/// Body shape errors keep the extractor's status (400 for malformed JSON, 422
/// for an unknown role or mode). A blank query is rejected with 422. Any
/// request that gets past validation returns 200, including error payloads
/// produced by the pipeline.
#[instrument(skip(state, payload))]
pub async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, (StatusCode, Json<ErrorResponse>)> {
    let Json(request) = payload.map_err(|rejection| {
        error!(status = %rejection.status(), "Rejected chat request: {}", rejection.body_text());
        (
            rejection.status(),
            Json(ErrorResponse::new(rejection.body_text(), "INVALID_REQUEST")),
        )
    })?;

    if request.query.trim().is_empty() {
        error!("Missing required field: 'query'");
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ErrorResponse::new(
                "Field 'query' must be a non-empty string.",
                "EMPTY_QUERY",
            )),
        ));
    }

    info!(
        role = %request.role,
        mode = %request.mode,
        query_length = request.query.len(),
        query_preview = %request.query.chars().take(100).collect::<String>(),
        "Processing chat request"
    );

    let outcome = state.assistant.handle(&request.into_state()).await;

    info!(
        structured = outcome.is_structured(),
        degraded = outcome.is_degraded(),
        error = outcome.is_error(),
        "Chat request completed"
    );
    Ok(Json(ChatResponse { response: outcome }))
}
