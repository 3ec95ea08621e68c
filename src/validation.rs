//! Field-level validation errors shared by the record handlers.

use std::collections::BTreeMap;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::Value;

use crate::Error;

/// Validation messages keyed by the name of the offending field.
///
/// Serializes as `{"field": ["message", ...]}`. Keys are kept sorted so the
/// response body is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    /// The key used for errors that concern a combination of fields.
    pub const NON_FIELD_ERRORS: &'static str = "non_field_errors";

    /// Create an empty set of errors.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a set of errors holding one message for one field.
    pub fn single(field: &str, message: &str) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    /// Record `message` against `field`.
    pub fn add(&mut self, field: &str, message: &str) {
        self.0
            .entry(field.to_owned())
            .or_default()
            .push(message.to_owned());
    }

    /// Record the error of `result` against `field` and return its value, if any.
    pub fn check<T>(&mut self, field: &str, result: Result<T, String>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(message) => {
                self.add(field, &message);
                None
            }
        }
    }

    /// Record that a required field was missing from the request.
    pub fn require<T>(&mut self, field: &str, value: Option<T>) -> Option<T> {
        if value.is_none() {
            self.add(field, "This field is required.");
        }

        value
    }

    /// Whether no errors have been recorded.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The messages recorded for `field`.
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// `Ok(())` if no errors were recorded, otherwise [Error::Validation].
    pub fn into_result(self) -> Result<(), Error> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation(self))
        }
    }
}

/// Parse an integer sent either as a JSON number or as a string of digits.
pub(crate) fn parse_integer(value: &Value) -> Result<i64, String> {
    let integer = match value {
        Value::Number(number) => number.as_i64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    };

    integer.ok_or_else(|| "A valid integer is required.".to_owned())
}

impl IntoResponse for FieldErrors {
    fn into_response(self) -> Response {
        (StatusCode::BAD_REQUEST, Json(self)).into_response()
    }
}
