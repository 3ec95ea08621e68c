//! Middleware for logging requests and responses.

use axum::{
    body::{Body, Bytes, to_bytes},
    extract::Request,
    http::{StatusCode, header::CONTENT_TYPE, request, response},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::Value;

/// Request and response bodies longer than this many characters are
/// truncated in the `info` logs.
pub const LOG_BODY_LENGTH_LIMIT: usize = 64;

/// The largest body the middleware will buffer for logging.
const MAX_BODY_BYTES: usize = 1024 * 1024;

const REDACTED_FIELDS: [&str; 2] = ["password", "confirm_password"];

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level.
/// If a body is longer than [LOG_BODY_LENGTH_LIMIT] characters, it is
/// truncated and the full body is logged at the `debug` level.
/// Passwords in JSON request bodies are redacted.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let bytes = match to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::warn!("Could not read request body: {error}");
            return StatusCode::PAYLOAD_TOO_LARGE.into_response();
        }
    };

    log_request(&parts, &display_request_body(&parts, &bytes));

    let response = next.run(Request::from_parts(parts, Body::from(bytes))).await;

    let (parts, body) = response.into_parts();
    let bytes = match to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::error!("Could not read response body: {error}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };
    log_response(&parts, &String::from_utf8_lossy(&bytes));

    Response::from_parts(parts, Body::from(bytes))
}

fn display_request_body(parts: &request::Parts, bytes: &Bytes) -> String {
    let is_json = parts
        .headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/json"));

    if is_json {
        if let Ok(mut json) = serde_json::from_slice::<Value>(bytes) {
            redact_passwords(&mut json);
            return json.to_string();
        }
    }

    String::from_utf8_lossy(bytes).to_string()
}

fn redact_passwords(json: &mut Value) {
    if let Value::Object(map) = json {
        for field in REDACTED_FIELDS {
            if let Some(value) = map.get_mut(field) {
                *value = Value::String("********".to_owned());
            }
        }
    }
}

fn truncate(body: &str) -> Option<&str> {
    body.char_indices()
        .nth(LOG_BODY_LENGTH_LIMIT)
        .map(|(index, _)| &body[..index])
}

fn log_request(parts: &request::Parts, body: &str) {
    match truncate(body) {
        Some(truncated) => {
            tracing::info!("Received request: {parts:#?}\nbody: {truncated}...");
            tracing::debug!("Full request body: {body:?}");
        }
        None => tracing::info!("Received request: {parts:#?}\nbody: {body:?}"),
    }
}

fn log_response(parts: &response::Parts, body: &str) {
    match truncate(body) {
        Some(truncated) => {
            tracing::info!("Sending response: {parts:#?}\nbody: {truncated}...");
            tracing::debug!("Full response body: {body:?}");
        }
        None => tracing::info!("Sending response: {parts:#?}\nbody: {body:?}"),
    }
}
