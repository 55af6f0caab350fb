//! Pass-through proxy handler
//!
//! Forwards `/v1/models/{model}:{operation}` bodies verbatim to the
//! upstream service without parsing them. For clients that speak the
//! Gemini wire format themselves; the model comes from the route, not
//! from configuration.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::{Body, Bytes},
    extract::{Path, State},
    http::{header, StatusCode},
    response::Response,
};
use futures::TryStreamExt;
use tracing::{error, info};
use uuid::Uuid;

use crate::{
    error::AppError,
    routes::metrics::{record_request, record_upstream_status},
    AppState,
};

/// Operations the passthrough route will forward.
///
/// Restricting the set keeps the route from becoming an open relay to
/// arbitrary upstream paths.
const ALLOWED_OPERATIONS: &[&str] = &["generateContent", "streamGenerateContent"];

/// Split a `{model}:{operation}` route segment and validate both halves
fn parse_model_operation(segment: &str) -> Result<(&str, &str), AppError> {
    let (model, operation) = segment.split_once(':').ok_or_else(|| {
        AppError::BadRequest("Expected '{model}:{operation}' in path".to_string())
    })?;

    if model.is_empty() {
        return Err(AppError::BadRequest(
            "Model name must not be empty".to_string(),
        ));
    }
    if !ALLOWED_OPERATIONS.contains(&operation) {
        return Err(AppError::BadRequest(format!(
            "Unsupported operation '{operation}'"
        )));
    }

    Ok((model, operation))
}

/// Handle pass-through requests
///
/// The inbound body is forwarded byte-identical; the upstream status,
/// content type, and body are relayed back without buffering the whole
/// response.
pub async fn forward(
    State(state): State<Arc<AppState>>,
    Path(model_op): Path<String>,
    body: Bytes,
) -> Result<Response, AppError> {
    let start_time = Instant::now();
    let trace_id = Uuid::new_v4().to_string()[..8].to_string();

    let (model, operation) = parse_model_operation(&model_op)?;

    info!(
        trace_id = %trace_id,
        model = %model,
        operation = %operation,
        body_len = body.len(),
        "Forwarding pass-through request"
    );

    let upstream = state
        .gemini
        .forward_raw(model, operation, body)
        .await
        .map_err(|e| {
            error!(trace_id = %trace_id, model = %model, error = %e, "Upstream call failed");
            record_request("transport_error", "passthrough", start_time.elapsed().as_secs_f64());
            e
        })?;

    let status = upstream.status();
    record_upstream_status(status.as_u16());

    let duration = start_time.elapsed().as_secs_f64();
    let label = if status.is_success() {
        "success"
    } else {
        "upstream_error"
    };
    record_request(label, "passthrough", duration);

    info!(
        trace_id = %trace_id,
        model = %model,
        status = %status.as_u16(),
        duration_ms = %format!("{:.2}", duration * 1000.0),
        "Pass-through request completed"
    );

    convert_response(upstream)
}

/// Convert the upstream response into an outbound one, copying status and
/// content type and streaming the body through
fn convert_response(upstream: reqwest::Response) -> Result<Response, AppError> {
    let status = StatusCode::from_u16(upstream.status().as_u16())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    let content_type = upstream
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("application/json")
        .to_string();

    let body = Body::from_stream(
        upstream
            .bytes_stream()
            .map_err(|e| AppError::Upstream(e.without_url().to_string())),
    );

    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, content_type)
        .body(body)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to build response: {}", e)))
}
