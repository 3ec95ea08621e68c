//! Authentication middleware that resolves bearer tokens to users.

use axum::{
    extract::{FromRequestParts, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};

use crate::{
    Error,
    auth::{AuthState, TokenKey, resolve_token},
    user::UserID,
};

/// Middleware function that checks for a valid bearer token.
///
/// The user ID and token key are placed into the request extensions and the
/// request executed normally if the token is valid, otherwise a 401 JSON
/// error is returned.
///
/// **Note**: Route handlers can use the function argument `Extension(user_id): Extension<UserID>` to receive the user ID.
pub async fn auth_guard(State(state): State<AuthState>, request: Request, next: Next) -> Response {
    let (mut parts, body) = request.into_parts();

    let bearer =
        match TypedHeader::<Authorization<Bearer>>::from_request_parts(&mut parts, &state).await {
            Ok(TypedHeader(Authorization(bearer))) => bearer,
            Err(rejection) if rejection.is_missing() => {
                return Error::MissingToken.into_response();
            }
            Err(rejection) => {
                tracing::debug!("Rejecting malformed authorization header: {rejection}");
                return Error::InvalidToken.into_response();
            }
        };
    let key = TokenKey::new(bearer.token());

    let user_id = match resolve_user(&state, &key) {
        Ok(user_id) => user_id,
        Err(error) => return error.into_response(),
    };

    parts.extensions.insert(user_id);
    parts.extensions.insert(key);

    next.run(Request::from_parts(parts, body)).await
}

fn resolve_user(state: &AuthState, key: &TokenKey) -> Result<UserID, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    resolve_token(key, state.clock.now(), &connection)
}
