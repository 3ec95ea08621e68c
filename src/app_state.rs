//! Implements a struct that holds the state of the REST server.

use std::sync::{Arc, Mutex};

use rusqlite::Connection;
use time::Duration;

use crate::{Error, clock::Clock, db::initialize, pagination::PaginationConfig};

/// The state of the REST server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The database connection
    pub db_connection: Arc<Mutex<Connection>>,

    /// The source of the current date and time in the server's local timezone.
    pub clock: Arc<dyn Clock>,

    /// How long a token issued at log-in stays valid.
    pub token_duration: Duration,

    /// The config that controls how list endpoints page their results.
    pub pagination_config: PaginationConfig,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection.
    ///
    /// This function will initialize the database by adding the tables for the domain models.
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized.
    pub fn new(
        db_connection: Connection,
        clock: Arc<dyn Clock>,
        token_duration: Duration,
        pagination_config: PaginationConfig,
    ) -> Result<Self, Error> {
        initialize(&db_connection)?;

        Ok(Self {
            db_connection: Arc::new(Mutex::new(db_connection)),
            clock,
            token_duration,
            pagination_config,
        })
    }
}
