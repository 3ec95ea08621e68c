//! Credential checks, bearer token issuance and request identity binding.

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use rusqlite::Connection;
use time::Duration;

use crate::{AppState, clock::Clock};

mod current_user;
mod log_in;
mod log_out;
mod middleware;
mod token;

pub use current_user::get_current_user;
pub use log_in::{LogInData, LogInResponse, post_log_in};
pub use log_out::post_log_out;
pub use middleware::auth_guard;
pub use token::{
    AuthToken, DEFAULT_TOKEN_DURATION, TokenKey, create_auth_token_table, delete_expired_tokens,
    issue_token, resolve_token, revoke_token,
};

/// The state needed to log users in and out and to check their tokens.
#[derive(Debug, Clone)]
pub struct AuthState {
    /// The database connection
    pub db_connection: Arc<Mutex<Connection>>,
    /// Token expiry is checked against this clock.
    pub clock: Arc<dyn Clock>,
    /// How long a token issued at log-in stays valid.
    pub token_duration: Duration,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            clock: state.clock.clone(),
            token_duration: state.token_duration,
        }
    }
}
