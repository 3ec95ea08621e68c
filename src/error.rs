//! Defines the app level error type and its conversion to JSON error responses.
use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::validation::FieldErrors;

/// The message returned to clients when they send bad credentials.
pub const INVALID_CREDENTIALS_MSG: &str = "Invalid credentials";

/// The message returned to clients when a log-in request is missing a field.
pub const MISSING_CREDENTIALS_MSG: &str = "Please provide both username and password";

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The username and password combination does not match a user.
    ///
    /// Unknown usernames and wrong passwords map to the same error so that
    /// clients cannot probe for registered usernames.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The log-in request did not include both a username and password.
    #[error("missing username or password")]
    MissingCredentials,

    /// The request did not include an `Authorization` header.
    #[error("authentication credentials were not provided")]
    MissingToken,

    /// The bearer token is malformed, unknown, revoked or expired.
    #[error("invalid token")]
    InvalidToken,

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    /// When communicating with the application client this error should be
    /// replaced with a general error type indicating an internal server error.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// One or more fields in the request failed validation.
    #[error("validation failed: {0:?}")]
    Validation(FieldErrors),

    /// The category ID used for a transaction does not refer to a category
    /// owned by the caller.
    #[error("the category ID does not refer to a valid category")]
    InvalidCategory,

    /// A category with the same name and type already exists for the user.
    #[error("the category already exists")]
    DuplicateCategory,

    /// A budget for the same month and year already exists for the user.
    #[error("a budget for that month already exists")]
    DuplicateBudget,

    /// The username is already registered.
    #[error("the username \"{0}\" is already taken")]
    DuplicateUsername(String),

    /// The requested page is past the last page of results.
    #[error("invalid page")]
    InvalidPage,

    /// The user has not set a budget for the current month.
    #[error("no budget set for current month")]
    NoBudgetForCurrentMonth,

    /// The request body or query string could not be parsed.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// Tried to update a category that does not exist
    #[error("tried to update a category that is not in the database")]
    UpdateMissingCategory,

    /// Tried to delete a category that does not exist
    #[error("tried to delete a category that is not in the database")]
    DeleteMissingCategory,

    /// Tried to update a transaction that does not exist
    #[error("tried to update a transaction that is not in the database")]
    UpdateMissingTransaction,

    /// Tried to delete a transaction that does not exist
    #[error("tried to delete a transaction that is not in the database")]
    DeleteMissingTransaction,

    /// Tried to update a budget that does not exist
    #[error("tried to update a budget that is not in the database")]
    UpdateMissingBudget,

    /// Tried to delete a budget that does not exist
    #[error("tried to delete a budget that is not in the database")]
    DeleteMissingBudget,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    && desc.starts_with("UNIQUE constraint failed: category.") =>
            {
                Error::DuplicateCategory
            }
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    && desc.starts_with("UNIQUE constraint failed: budget.") =>
            {
                Error::DuplicateBudget
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Error::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for Error {
    fn from(rejection: QueryRejection) -> Self {
        Error::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for Error {
    fn from(rejection: PathRejection) -> Self {
        tracing::debug!("rejected path parameters: {}", rejection.body_text());
        Error::NotFound
    }
}

fn detail(status_code: StatusCode, message: &str) -> Response {
    (status_code, Json(json!({ "detail": message }))).into_response()
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": INVALID_CREDENTIALS_MSG })),
            )
                .into_response(),
            Error::MissingCredentials => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": MISSING_CREDENTIALS_MSG })),
            )
                .into_response(),
            Error::MissingToken => detail(
                StatusCode::UNAUTHORIZED,
                "Authentication credentials were not provided.",
            ),
            Error::InvalidToken => detail(StatusCode::UNAUTHORIZED, "Invalid token."),
            Error::TooWeak(feedback) => {
                FieldErrors::single("password", &feedback).into_response()
            }
            Error::Validation(errors) => errors.into_response(),
            Error::InvalidCategory => {
                FieldErrors::single("category", "Invalid category.").into_response()
            }
            Error::DuplicateCategory => FieldErrors::single(
                FieldErrors::NON_FIELD_ERRORS,
                "The fields name, type must make a unique set.",
            )
            .into_response(),
            Error::DuplicateBudget => FieldErrors::single(
                FieldErrors::NON_FIELD_ERRORS,
                "The fields month, year must make a unique set.",
            )
            .into_response(),
            Error::DuplicateUsername(_) => FieldErrors::single(
                "username",
                "A user with that username already exists.",
            )
            .into_response(),
            Error::BadRequest(message) => detail(StatusCode::BAD_REQUEST, &message),
            Error::InvalidPage => detail(StatusCode::NOT_FOUND, "Invalid page."),
            Error::NoBudgetForCurrentMonth => {
                detail(StatusCode::NOT_FOUND, "No budget set for current month")
            }
            Error::NotFound
            | Error::UpdateMissingCategory
            | Error::DeleteMissingCategory
            | Error::UpdateMissingTransaction
            | Error::DeleteMissingTransaction
            | Error::UpdateMissingBudget
            | Error::DeleteMissingBudget => detail(StatusCode::NOT_FOUND, "Not found."),
            Error::DatabaseLockError => detail(
                StatusCode::INTERNAL_SERVER_ERROR,
                "An unexpected error occurred.",
            ),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                detail(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An unexpected error occurred.",
                )
            }
        }
    }
}
