//! The log-in endpoint, which exchanges a username and password for a token.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    auth::{AuthState, TokenKey, delete_expired_tokens, issue_token},
    extract::ApiJson,
    user::{UserProfile, get_user_by_username},
};

/// The credentials sent to the log-in endpoint.
///
/// Both fields are optional here so that a missing field produces the
/// app's own error message rather than a deserialization error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogInData {
    /// The name the user registered with.
    pub username: Option<String>,
    /// The user's password in plain text.
    pub password: Option<String>,
}

/// The response to a successful log-in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogInResponse {
    /// The bearer token to send with future requests.
    pub token: TokenKey,
    /// The profile of the user that logged in.
    pub user: UserProfile,
}

/// Check the user's credentials and issue a new token.
///
/// Every successful log-in issues a fresh token, so a user may be logged in
/// from several clients at once.
///
/// # Errors
///
/// Returns:
/// - [Error::MissingCredentials] if either field is missing or empty,
/// - [Error::InvalidCredentials] if the username is unknown or the password is wrong.
pub async fn post_log_in(
    State(state): State<AuthState>,
    ApiJson(data): ApiJson<LogInData>,
) -> Result<Json<LogInResponse>, Error> {
    let (username, password) = match (data.username, data.password) {
        (Some(username), Some(password)) if !username.is_empty() && !password.is_empty() => {
            (username, password)
        }
        _ => return Err(Error::MissingCredentials),
    };

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let user = match get_user_by_username(&username, &connection) {
        Ok(user) => user,
        Err(Error::NotFound) => {
            tracing::info!("Log-in attempt for unknown user \"{username}\"");
            return Err(Error::InvalidCredentials);
        }
        Err(error) => return Err(error),
    };

    if !user.password_hash.verify(&password)? {
        tracing::info!("Log-in attempt with wrong password for user {}", user.id);
        return Err(Error::InvalidCredentials);
    }

    let now = state.clock.now();
    let expired_count = delete_expired_tokens(now, &connection)?;
    if expired_count > 0 {
        tracing::debug!("Deleted {expired_count} expired tokens");
    }

    let token = issue_token(user.id, now, state.token_duration, &connection)?;
    tracing::info!("User {} logged in", user.id);

    Ok(Json(LogInResponse {
        token: token.key,
        user: user.into(),
    }))
}
