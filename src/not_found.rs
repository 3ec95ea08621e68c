//! The fallback for requests that match no route.

use axum::response::{IntoResponse, Response};

use crate::Error;

/// Respond with a JSON 404 body.
pub async fn get_404_not_found() -> Response {
    Error::NotFound.into_response()
}
