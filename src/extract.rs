//! Request extractors that reject malformed input with the app's JSON errors.

use axum::extract::{FromRequest, FromRequestParts};

use crate::Error;

/// Like [axum::Json], but a body that cannot be parsed is rejected with a
/// 400 JSON error instead of a plain text response.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(Error))]
pub struct ApiJson<T>(pub T);

/// Like [axum::extract::Query], but rejects with a 400 JSON error.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(Error))]
pub struct ApiQuery<T>(pub T);

/// Like [axum::extract::Path], but IDs that are not integers respond with 404.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(Error))]
pub struct ApiPath<T>(pub T);
