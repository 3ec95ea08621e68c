//! Database operations for budgets.

use rusqlite::{Connection, OptionalExtension, Row};
use time::{OffsetDateTime, UtcOffset};

use crate::{
    Error,
    budget::{Budget, BudgetId, NewBudget},
    money::Money,
    user::UserID,
};

const SELECT_BUDGET: &str =
    "SELECT id, user_id, month, year, amount, created_at, updated_at FROM budget";

/// Create a budget for `user_id` and return it with its generated ID.
///
/// # Errors
///
/// Returns [Error::DuplicateBudget] if the user already has a budget for the same month.
pub fn create_budget(
    user_id: UserID,
    new_budget: NewBudget,
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<Budget, Error> {
    let timestamp = now.to_offset(UtcOffset::UTC);

    connection.execute(
        "INSERT INTO budget (user_id, month, year, amount, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
        (
            user_id.as_i64(),
            new_budget.month,
            new_budget.year,
            new_budget.amount.cents(),
            timestamp,
        ),
    )?;

    Ok(Budget {
        id: connection.last_insert_rowid(),
        user_id,
        month: new_budget.month,
        year: new_budget.year,
        amount: new_budget.amount,
        created_at: timestamp,
        updated_at: timestamp,
    })
}

/// Retrieve a single budget owned by `user_id`.
///
/// # Errors
///
/// Returns [Error::NotFound] if the budget does not exist or belongs to another user.
pub fn get_budget(
    budget_id: BudgetId,
    user_id: UserID,
    connection: &Connection,
) -> Result<Budget, Error> {
    connection
        .prepare(&format!("{SELECT_BUDGET} WHERE id = :id AND user_id = :user_id"))?
        .query_row(
            &[(":id", &budget_id), (":user_id", &user_id.as_i64())],
            map_row,
        )
        .map_err(|error| error.into())
}

/// Retrieve the budget `user_id` set for `month` of `year`, if there is one.
pub fn get_budget_for_month(
    user_id: UserID,
    month: u8,
    year: i32,
    connection: &Connection,
) -> Result<Option<Budget>, Error> {
    connection
        .prepare(&format!(
            "{SELECT_BUDGET} WHERE user_id = ?1 AND month = ?2 AND year = ?3"
        ))?
        .query_row((user_id.as_i64(), month, year), map_row)
        .optional()
        .map_err(|error| error.into())
}

/// Retrieve a page of the budgets owned by `user_id`, latest month first.
pub fn list_budgets(
    user_id: UserID,
    limit: u64,
    offset: u64,
    connection: &Connection,
) -> Result<Vec<Budget>, Error> {
    connection
        .prepare(&format!(
            "{SELECT_BUDGET} WHERE user_id = ?1 \
            ORDER BY year DESC, month DESC LIMIT {limit} OFFSET {offset}"
        ))?
        .query_map([user_id.as_i64()], map_row)?
        .map(|maybe_budget| maybe_budget.map_err(|error| error.into()))
        .collect()
}

/// Count the budgets owned by `user_id`.
pub fn count_budgets(user_id: UserID, connection: &Connection) -> Result<u64, Error> {
    connection
        .query_row(
            "SELECT COUNT(id) FROM budget WHERE user_id = ?1",
            [user_id.as_i64()],
            |row| row.get(0),
        )
        .map_err(|error| error.into())
}

/// Replace the fields of a budget owned by `user_id`.
///
/// # Errors
///
/// Returns:
/// - [Error::UpdateMissingBudget] if the budget does not exist or belongs to another user,
/// - [Error::DuplicateBudget] if the new month clashes with another budget.
pub fn update_budget(
    budget_id: BudgetId,
    user_id: UserID,
    new_budget: NewBudget,
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<Budget, Error> {
    let rows_affected = connection.execute(
        "UPDATE budget SET month = ?1, year = ?2, amount = ?3, updated_at = ?4
        WHERE id = ?5 AND user_id = ?6",
        (
            new_budget.month,
            new_budget.year,
            new_budget.amount.cents(),
            now.to_offset(UtcOffset::UTC),
            budget_id,
            user_id.as_i64(),
        ),
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingBudget);
    }

    get_budget(budget_id, user_id, connection)
}

/// Delete a budget owned by `user_id`.
///
/// # Errors
///
/// Returns [Error::DeleteMissingBudget] if the budget does not exist or belongs to another user.
pub fn delete_budget(
    budget_id: BudgetId,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM budget WHERE id = ?1 AND user_id = ?2",
        (budget_id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingBudget);
    }

    Ok(())
}

/// Create the budget table.
pub fn create_budget_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS budget (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            month INTEGER NOT NULL CHECK (month BETWEEN 1 AND 12),
            year INTEGER NOT NULL,
            amount INTEGER NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            UNIQUE(user_id, month, year),
            FOREIGN KEY(user_id) REFERENCES user(id) ON DELETE CASCADE
        )",
        (),
    )?;

    Ok(())
}

fn map_row(row: &Row) -> Result<Budget, rusqlite::Error> {
    Ok(Budget {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        month: row.get(2)?,
        year: row.get(3)?,
        amount: Money::from_cents(row.get(4)?),
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}
