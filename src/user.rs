//! Code for creating the user table and fetching users from the database.

use std::fmt::Display;

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};

use crate::{Error, PasswordHash};

/// A newtype wrapper for integer user IDs.
///
/// This helps disambiguate user IDs from other types of IDs, leading to better compile time
/// errors, and more flexible generics that can have distinct implementations for multiple ID types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserID(i64);

impl UserID {
    /// Create a new user ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the user ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A registered user of the application.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    /// The user's ID in the application database.
    pub id: UserID,
    /// The name the user logs in with.
    pub username: String,
    /// The user's password hash.
    pub password_hash: PasswordHash,
    /// The user's email address, may be empty.
    pub email: String,
    /// May be empty.
    pub first_name: String,
    /// May be empty.
    pub last_name: String,
}

/// The public view of a [User], which never includes the password hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    /// The user's ID in the application database.
    pub id: UserID,
    /// The name the user logs in with.
    pub username: String,
    /// The user's email address, may be empty.
    pub email: String,
    /// May be empty.
    pub first_name: String,
    /// May be empty.
    pub last_name: String,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
        }
    }
}

/// The data needed to register a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// The name the user logs in with, must be unique.
    pub username: String,
    /// The user's password hash.
    pub password_hash: PasswordHash,
    /// The user's email address, may be empty.
    pub email: String,
    /// May be empty.
    pub first_name: String,
    /// May be empty.
    pub last_name: String,
}

/// Create the user table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id INTEGER PRIMARY KEY,
                username TEXT NOT NULL UNIQUE,
                password TEXT NOT NULL,
                email TEXT NOT NULL DEFAULT '',
                first_name TEXT NOT NULL DEFAULT '',
                last_name TEXT NOT NULL DEFAULT ''
                )",
        (),
    )?;

    Ok(())
}

/// Create and insert a new user into the database.
///
/// # Errors
///
/// Returns a:
/// - [Error::DuplicateUsername] if the username is already registered,
/// - [Error::SqlError] if some other SQL related error occurred.
pub fn create_user(new_user: NewUser, connection: &Connection) -> Result<User, Error> {
    connection
        .execute(
            "INSERT INTO user (username, password, email, first_name, last_name)
            VALUES (?1, ?2, ?3, ?4, ?5)",
            (
                &new_user.username,
                new_user.password_hash.as_ref(),
                &new_user.email,
                &new_user.first_name,
                &new_user.last_name,
            ),
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(sql_error, _)
                if sql_error.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
            {
                Error::DuplicateUsername(new_user.username.clone())
            }
            error => error.into(),
        })?;

    let id = UserID::new(connection.last_insert_rowid());

    Ok(User {
        id,
        username: new_user.username,
        password_hash: new_user.password_hash,
        email: new_user.email,
        first_name: new_user.first_name,
        last_name: new_user.last_name,
    })
}

/// Get the user from the database with an ID equal to `user_id`.
///
/// # Errors
///
/// This function will return an error if:
/// - `user_id` does not belong to a registered user.
/// - there was an error trying to access the store.
pub fn get_user_by_id(user_id: UserID, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare(
            "SELECT id, username, password, email, first_name, last_name FROM user WHERE id = :id",
        )?
        .query_row(&[(":id", &user_id.as_i64())], map_row)
        .map_err(|error| error.into())
}

/// Get the user registered under `username`.
///
/// # Errors
///
/// Returns [Error::NotFound] if no user has the username.
pub fn get_user_by_username(username: &str, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare(
            "SELECT id, username, password, email, first_name, last_name FROM user \
            WHERE username = :username",
        )?
        .query_row(&[(":username", username)], map_row)
        .map_err(|error| error.into())
}

/// Delete `user_id` along with their categories, transactions, budgets and tokens.
///
/// # Errors
///
/// Returns [Error::NotFound] if the user does not exist.
pub fn delete_user(user_id: UserID, connection: &Connection) -> Result<(), Error> {
    let rows_affected =
        connection.execute("DELETE FROM user WHERE id = ?1", [user_id.as_i64()])?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

fn map_row(row: &Row) -> Result<User, rusqlite::Error> {
    let raw_password_hash: String = row.get(2)?;

    Ok(User {
        id: UserID::new(row.get(0)?),
        username: row.get(1)?,
        password_hash: PasswordHash::new_unchecked(&raw_password_hash),
        email: row.get(3)?,
        first_name: row.get(4)?,
        last_name: row.get(5)?,
    })
}
