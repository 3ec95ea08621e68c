//! The log-out endpoint.

use axum::{Extension, Json, extract::State};
use serde_json::{Value, json};

use crate::{
    Error,
    auth::{AuthState, TokenKey, revoke_token},
};

/// Revoke the token the request was authenticated with.
///
/// Other tokens issued to the same user stay valid.
pub async fn post_log_out(
    State(state): State<AuthState>,
    Extension(key): Extension<TokenKey>,
) -> Result<Json<Value>, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    revoke_token(&key, &connection)?;

    Ok(Json(json!({"message": "Successfully logged out"})))
}
