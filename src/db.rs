//! Creates the application's database schema.

use rusqlite::{Connection, Transaction, TransactionBehavior};

use crate::{
    auth::create_auth_token_table, budget::create_budget_table, category::create_category_table,
    transaction::create_transaction_table, user::create_user_table,
};

/// Create all of the application's tables if they do not already exist.
///
/// Foreign key enforcement is switched on for `connection`, since SQLite
/// leaves it off by default and the schema relies on `ON DELETE` actions.
///
/// # Errors
///
/// Returns an error if any of the tables could not be created.
pub fn initialize(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.pragma_update(None, "foreign_keys", "ON")?;

    let transaction = Transaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_user_table(&transaction)?;
    create_auth_token_table(&transaction)?;
    create_category_table(&transaction)?;
    create_transaction_table(&transaction)?;
    create_budget_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}

#[cfg(test)]
mod db_tests {
    use rusqlite::Connection;

    use super::initialize;

    #[test]
    fn initialize_is_idempotent() {
        let connection = Connection::open_in_memory().unwrap();

        initialize(&connection).expect("first initialization failed");
        initialize(&connection).expect("second initialization failed");
    }

    #[test]
    fn initialize_enables_foreign_keys() {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();

        let enabled: i64 = connection
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();

        assert_eq!(enabled, 1);
    }
}
