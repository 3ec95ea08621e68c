//! Opaque bearer tokens and the table that maps them to users.

use std::fmt::Display;

use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::{Error, user::UserID};

/// The default lifetime of a token issued at log-in.
pub const DEFAULT_TOKEN_DURATION: Duration = Duration::days(7);

/// The opaque value clients send in the `Authorization: Bearer` header.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenKey(String);

impl TokenKey {
    /// Generate a new random key.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Wrap a key sent by a client.
    pub fn new(raw_key: &str) -> Self {
        Self(raw_key.to_owned())
    }

    /// The key as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for TokenKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let prefix: String = self.0.chars().take(6).collect();
        write!(f, "{prefix}…")
    }
}

/// A token issued to a user at log-in.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthToken {
    /// The value the client authenticates with.
    pub key: TokenKey,
    /// The user the token identifies.
    pub user_id: UserID,
    /// When the token was issued.
    pub created_at: OffsetDateTime,
    /// The token is rejected at and after this instant.
    pub expires_at: OffsetDateTime,
}

/// Create the auth token table.
///
/// Tokens are deleted along with their user.
pub fn create_auth_token_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS auth_token (
            key TEXT PRIMARY KEY,
            user_id INTEGER NOT NULL,
            created_at INTEGER NOT NULL,
            expires_at INTEGER NOT NULL,
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_auth_token_expires_at ON auth_token(expires_at);",
    )?;

    Ok(())
}

/// Issue a new token for `user_id` that is valid for `duration` from `now`.
///
/// # Errors
///
/// Returns an [Error::SqlError] if the token could not be stored.
pub fn issue_token(
    user_id: UserID,
    now: OffsetDateTime,
    duration: Duration,
    connection: &Connection,
) -> Result<AuthToken, Error> {
    let token = AuthToken {
        key: TokenKey::generate(),
        user_id,
        created_at: now,
        expires_at: now + duration,
    };

    connection.execute(
        "INSERT INTO auth_token (key, user_id, created_at, expires_at) VALUES (?1, ?2, ?3, ?4)",
        (
            token.key.as_str(),
            user_id.as_i64(),
            token.created_at.unix_timestamp(),
            token.expires_at.unix_timestamp(),
        ),
    )?;

    Ok(token)
}

/// Get the user that `key` was issued to.
///
/// Expired tokens are deleted when they are looked up.
///
/// # Errors
///
/// Returns [Error::InvalidToken] if the token is unknown, revoked or expired.
pub fn resolve_token(
    key: &TokenKey,
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<UserID, Error> {
    let (user_id, expires_at): (i64, i64) = connection
        .prepare("SELECT user_id, expires_at FROM auth_token WHERE key = :key")?
        .query_row(&[(":key", key.as_str())], |row| {
            Ok((row.get(0)?, row.get(1)?))
        })
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::InvalidToken,
            error => error.into(),
        })?;

    if expires_at <= now.unix_timestamp() {
        tracing::debug!("Rejecting expired token {key}");
        revoke_token(key, connection)?;
        return Err(Error::InvalidToken);
    }

    Ok(UserID::new(user_id))
}

/// Invalidate `key` immediately.
///
/// # Errors
///
/// Returns [Error::InvalidToken] if the token does not exist.
pub fn revoke_token(key: &TokenKey, connection: &Connection) -> Result<(), Error> {
    let rows_affected =
        connection.execute("DELETE FROM auth_token WHERE key = ?1", [key.as_str()])?;

    if rows_affected == 0 {
        return Err(Error::InvalidToken);
    }

    Ok(())
}

/// Delete every token that has expired by `now`, returning how many were deleted.
pub fn delete_expired_tokens(now: OffsetDateTime, connection: &Connection) -> Result<usize, Error> {
    connection
        .execute(
            "DELETE FROM auth_token WHERE expires_at <= ?1",
            [now.unix_timestamp()],
        )
        .map_err(|error| error.into())
}

#[cfg(test)]
mod token_tests {
    use rusqlite::Connection;
    use time::{Duration, macros::datetime};

    use crate::{
        Error, PasswordHash,
        auth::token::{
            TokenKey, delete_expired_tokens, issue_token, resolve_token, revoke_token,
        },
        db::initialize,
        user::{NewUser, User, create_user},
    };

    fn get_test_connection() -> (Connection, User) {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let user = create_user(
            NewUser {
                username: "test".to_owned(),
                password_hash: PasswordHash::new_unchecked("hunter2"),
                email: String::new(),
                first_name: String::new(),
                last_name: String::new(),
            },
            &connection,
        )
        .unwrap();

        (connection, user)
    }

    #[test]
    fn issued_token_resolves_to_user() {
        let (connection, user) = get_test_connection();
        let now = datetime!(2025-01-01 12:00 UTC);

        let token = issue_token(user.id, now, Duration::hours(1), &connection).unwrap();

        assert_eq!(token.key.as_str().len(), 32);
        assert_eq!(resolve_token(&token.key, now, &connection), Ok(user.id));
    }

    #[test]
    fn each_log_in_gets_a_new_token() {
        let (connection, user) = get_test_connection();
        let now = datetime!(2025-01-01 12:00 UTC);

        let first = issue_token(user.id, now, Duration::hours(1), &connection).unwrap();
        let second = issue_token(user.id, now, Duration::hours(1), &connection).unwrap();

        assert_ne!(first.key, second.key);
        assert_eq!(resolve_token(&first.key, now, &connection), Ok(user.id));
        assert_eq!(resolve_token(&second.key, now, &connection), Ok(user.id));
    }

    #[test]
    fn unknown_token_is_invalid() {
        let (connection, _) = get_test_connection();

        let result = resolve_token(
            &TokenKey::new("nope"),
            datetime!(2025-01-01 12:00 UTC),
            &connection,
        );

        assert_eq!(result, Err(Error::InvalidToken));
    }

    #[test]
    fn expired_token_is_invalid_and_deleted() {
        let (connection, user) = get_test_connection();
        let issued_at = datetime!(2025-01-01 12:00 UTC);
        let token = issue_token(user.id, issued_at, Duration::hours(1), &connection).unwrap();

        let result = resolve_token(&token.key, issued_at + Duration::hours(1), &connection);

        assert_eq!(result, Err(Error::InvalidToken));
        assert_eq!(revoke_token(&token.key, &connection), Err(Error::InvalidToken));
    }

    #[test]
    fn revoked_token_is_invalid() {
        let (connection, user) = get_test_connection();
        let now = datetime!(2025-01-01 12:00 UTC);
        let token = issue_token(user.id, now, Duration::hours(1), &connection).unwrap();

        revoke_token(&token.key, &connection).unwrap();

        assert_eq!(
            resolve_token(&token.key, now, &connection),
            Err(Error::InvalidToken)
        );
    }

    #[test]
    fn delete_expired_tokens_keeps_live_tokens() {
        let (connection, user) = get_test_connection();
        let now = datetime!(2025-01-01 12:00 UTC);
        let old = issue_token(
            user.id,
            now - Duration::days(8),
            Duration::days(7),
            &connection,
        )
        .unwrap();
        let live = issue_token(user.id, now, Duration::days(7), &connection).unwrap();

        let deleted = delete_expired_tokens(now, &connection).unwrap();

        assert_eq!(deleted, 1);
        assert_eq!(resolve_token(&old.key, now, &connection), Err(Error::InvalidToken));
        assert_eq!(resolve_token(&live.key, now, &connection), Ok(user.id));
    }
}
