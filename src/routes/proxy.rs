//! Structured proxy endpoints
//!
//! `/gemini/proxy` validates and reshapes a simplified body (a `prompt`
//! plus recognized generation options) before forwarding it upstream;
//! `/gemini/proxy/stream` does the same but relays the response as
//! incrementally flushed text fragments.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use futures::TryStreamExt;
use tracing::{error, info};
use uuid::Uuid;

use crate::{
    error::AppError,
    gemini::types::build_payload,
    routes::metrics::{record_request, record_upstream_status},
    streaming, AppState,
};

/// Short ID for log correlation
fn trace_id() -> String {
    Uuid::new_v4().to_string()[..8].to_string()
}

/// Handle `/gemini/proxy` requests (buffered relay)
///
/// The upstream status code and body are relayed verbatim, including
/// upstream error statuses; only transport-level failures become the 500
/// envelope.
pub async fn generate(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Response, AppError> {
    let start_time = Instant::now();
    let trace_id = trace_id();

    let payload = build_payload(&body)?;

    info!(
        trace_id = %trace_id,
        model = %state.config.model_name,
        "Forwarding generate request"
    );

    let upstream = state.gemini.generate(&payload).await.map_err(|e| {
        error!(trace_id = %trace_id, error = %e, "Upstream call failed");
        record_request("transport_error", "generate", start_time.elapsed().as_secs_f64());
        e
    })?;

    let status = upstream.status();
    record_upstream_status(status.as_u16());

    let body = upstream.bytes().await.map_err(|e| {
        let e = AppError::Upstream(e.without_url().to_string());
        error!(trace_id = %trace_id, error = %e, "Failed to read upstream body");
        e
    })?;

    let duration = start_time.elapsed().as_secs_f64();
    let label = if status.is_success() {
        "success"
    } else {
        "upstream_error"
    };
    record_request(label, "generate", duration);

    info!(
        trace_id = %trace_id,
        status = %status.as_u16(),
        duration_ms = %format!("{:.2}", duration * 1000.0),
        "Generate request completed"
    );

    Ok((
        StatusCode::from_u16(status.as_u16()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        [(header::CONTENT_TYPE, "application/json")],
        body,
    )
        .into_response())
}

/// Handle `/gemini/proxy/stream` requests (chunked relay)
///
/// On a 2xx upstream response the relay answers 200 with plain-text
/// fragments extracted from the upstream SSE events. A non-2xx upstream
/// response is relayed buffered instead, so the status code stays truthful.
pub async fn generate_stream(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Response, AppError> {
    let start_time = Instant::now();
    let trace_id = trace_id();

    let payload = build_payload(&body)?;

    info!(
        trace_id = %trace_id,
        model = %state.config.model_name,
        streaming = true,
        "Forwarding generate request"
    );

    let upstream = state.gemini.generate_stream(&payload).await.map_err(|e| {
        error!(trace_id = %trace_id, error = %e, "Upstream call failed");
        record_request("transport_error", "generate_stream", start_time.elapsed().as_secs_f64());
        e
    })?;

    let status = upstream.status();
    record_upstream_status(status.as_u16());

    if !status.is_success() {
        let body = upstream.bytes().await.map_err(|e| {
            let e = AppError::Upstream(e.without_url().to_string());
            error!(trace_id = %trace_id, error = %e, "Failed to read upstream body");
            e
        })?;

        record_request("upstream_error", "generate_stream", start_time.elapsed().as_secs_f64());
        info!(
            trace_id = %trace_id,
            status = %status.as_u16(),
            "Upstream rejected stream request, relaying buffered"
        );

        return Ok((
            StatusCode::from_u16(status.as_u16()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            [(header::CONTENT_TYPE, "application/json")],
            body,
        )
            .into_response());
    }

    record_request("streaming", "generate_stream", start_time.elapsed().as_secs_f64());
    info!(trace_id = %trace_id, "Streaming response started");

    // Dropping this stream (caller disconnect) drops the upstream response
    // and aborts the outbound transfer.
    let fragments = streaming::text_fragments(
        upstream
            .bytes_stream()
            .map_err(|e| e.without_url().to_string()),
    );

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .header(header::CACHE_CONTROL, "no-cache")
        .header("X-Accel-Buffering", "no")
        .body(Body::from_stream(fragments))
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to build response: {}", e)))?;

    Ok(response)
}
