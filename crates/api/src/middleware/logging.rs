use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tower_http::{
    classify::{ServerErrorsAsFailures, SharedClassifier},
    trace::TraceLayer,
};
use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Get the default tracing layer for HTTP requests
pub fn get_tracing_layer() -> TraceLayer<SharedClassifier<ServerErrorsAsFailures>> {
    TraceLayer::new_for_http()
}

/// Stamp each request with an `x-request-id` and log its outcome
pub async fn logging_middleware(mut request: Request, next: Next) -> Response {
    let start_time = Instant::now();
    let request_id = Uuid::new_v4().to_string();

    let method = request.method().clone();
    let uri = request.uri().clone();
    let user_agent = request
        .headers()
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    let header_value = HeaderValue::from_str(&request_id).ok();
    if let Some(value) = &header_value {
        request.headers_mut().insert(REQUEST_ID_HEADER, value.clone());
    }

    info!(
        request_id = %request_id,
        method = %method,
        uri = %uri,
        user_agent = %user_agent,
        "Incoming HTTP request"
    );

    let span = info_span!("http_request", request_id = %request_id, method = %method, uri = %uri);
    let mut response = next.run(request).instrument(span).await;

    if let Some(value) = header_value {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    let duration = start_time.elapsed();
    let status = response.status();
    if status.is_client_error() || status.is_server_error() {
        error!(
            request_id = %request_id,
            status = %status,
            duration_ms = %duration.as_millis(),
            "HTTP request failed"
        );
    } else {
        info!(
            request_id = %request_id,
            status = %status,
            duration_ms = %duration.as_millis(),
            "HTTP request completed"
        );
    }

    response
}
