#![allow(missing_docs)]

use std::sync::Arc;

use axum_test::TestServer;
use rusqlite::Connection;
use time::Duration;

use crate::{
    AppState,
    auth::{TokenKey, issue_token},
    clock::Clock,
    db::initialize,
    pagination::PaginationConfig,
    password::{PasswordHash, ValidatedPassword},
    routing::build_router,
    user::{NewUser, User, UserID, create_user},
};

pub(crate) const TEST_PASSWORD: &str = "averysafeandsecurepassword";

/// The lowest cost bcrypt accepts, keeps the tests fast.
const TEST_HASH_COST: u32 = 4;

#[track_caller]
pub(crate) fn get_test_connection() -> Connection {
    let connection =
        Connection::open_in_memory().expect("Could not open in-memory database");
    initialize(&connection).expect("Could not initialize database");
    connection
}

#[track_caller]
pub(crate) fn insert_test_user(connection: &Connection, username: &str) -> UserID {
    create_user(
        NewUser {
            username: username.to_owned(),
            password_hash: PasswordHash::new_unchecked("hunter2"),
            email: String::new(),
            first_name: String::new(),
            last_name: String::new(),
        },
        connection,
    )
    .expect("Could not create test user")
    .id
}

#[track_caller]
pub(crate) fn get_test_state(clock: impl Clock + 'static) -> AppState {
    AppState::new(
        Connection::open_in_memory().expect("Could not open in-memory database"),
        Arc::new(clock),
        Duration::days(1),
        PaginationConfig::default(),
    )
    .expect("Could not create app state")
}

#[track_caller]
pub(crate) fn create_test_user(state: &AppState, username: &str) -> User {
    let password_hash = PasswordHash::new(
        ValidatedPassword::new_unchecked(TEST_PASSWORD),
        TEST_HASH_COST,
    )
    .expect("Could not hash test password");

    create_user(
        NewUser {
            username: username.to_owned(),
            password_hash,
            email: format!("{username}@example.com"),
            first_name: "Test".to_owned(),
            last_name: "User".to_owned(),
        },
        &state.db_connection.lock().expect("Could not lock database"),
    )
    .expect("Could not create test user")
}

#[track_caller]
pub(crate) fn create_test_token(state: &AppState, user_id: UserID) -> TokenKey {
    issue_token(
        user_id,
        state.clock.now(),
        state.token_duration,
        &state.db_connection.lock().expect("Could not lock database"),
    )
    .expect("Could not issue test token")
    .key
}

#[track_caller]
pub(crate) fn get_test_server(state: AppState) -> TestServer {
    TestServer::new(build_router(state))
}
