//! The endpoint that returns the profile of the authenticated user.

use axum::{Extension, Json, extract::State};

use crate::{
    Error,
    auth::AuthState,
    user::{UserID, UserProfile, get_user_by_id},
};

/// Get the profile of the user the request was authenticated as.
pub async fn get_current_user(
    State(state): State<AuthState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<UserProfile>, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    get_user_by_id(user_id, &connection).map(|user| Json(user.into()))
}

#[cfg(test)]
mod current_user_tests {
    use serde_json::json;
    use time::macros::datetime;

    use crate::{
        clock::FixedClock,
        endpoints,
        test_utils::{create_test_token, create_test_user, get_test_server, get_test_state},
    };

    #[tokio::test]
    async fn returns_profile_of_token_owner() {
        let state = get_test_state(FixedClock(datetime!(2025-01-01 12:00 UTC)));
        create_test_user(&state, "someone_else");
        let user = create_test_user(&state, "test");
        let token = create_test_token(&state, user.id);
        let server = get_test_server(state);

        let response = server
            .get(endpoints::CURRENT_USER)
            .authorization_bearer(token.as_str())
            .await;

        response.assert_status_ok();
        response.assert_json(&json!({
            "id": user.id.as_i64(),
            "username": "test",
            "email": "test@example.com",
            "first_name": "Test",
            "last_name": "User",
        }));
    }
}
