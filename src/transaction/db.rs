//! Database operations for transactions.

use rusqlite::{Connection, OptionalExtension, Row, params_from_iter, types::Value};
use time::{Date, OffsetDateTime, UtcOffset};

use crate::{
    Error,
    category::{CategoryId, escape_like},
    kind::{KindFilter, get_kind},
    money::Money,
    transaction::{NewTransaction, Transaction, TransactionId},
    user::UserID,
};

/// The sort orders clients may ask for with the `ordering` parameter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TransactionOrdering {
    /// Newest date first, then most recently created.
    #[default]
    DateDescending,
    /// Oldest date first.
    DateAscending,
    /// Smallest amount first.
    AmountAscending,
    /// Largest amount first.
    AmountDescending,
    /// Created first.
    CreatedAscending,
    /// Created last.
    CreatedDescending,
}

impl TransactionOrdering {
    /// Parse the `ordering` query parameter, falling back to the default for unknown values.
    pub fn from_param(param: Option<&str>) -> Self {
        match param {
            Some("date") => Self::DateAscending,
            Some("-date") => Self::DateDescending,
            Some("amount") => Self::AmountAscending,
            Some("-amount") => Self::AmountDescending,
            Some("created_at") => Self::CreatedAscending,
            Some("-created_at") => Self::CreatedDescending,
            _ => Self::default(),
        }
    }

    fn order_by_clause(&self) -> &'static str {
        match self {
            Self::DateDescending => {
                "ORDER BY t.date DESC, t.created_at DESC, t.id DESC"
            }
            Self::DateAscending => "ORDER BY t.date ASC, t.created_at ASC, t.id ASC",
            Self::AmountAscending => "ORDER BY t.amount ASC, t.id ASC",
            Self::AmountDescending => "ORDER BY t.amount DESC, t.id DESC",
            Self::CreatedAscending => "ORDER BY t.created_at ASC, t.id ASC",
            Self::CreatedDescending => "ORDER BY t.created_at DESC, t.id DESC",
        }
    }
}

/// Defines which transactions [list_transactions] and [count_transactions] select.
///
/// All filters are combined with AND. Date and amount bounds are inclusive.
#[derive(Debug, Clone, Default)]
pub struct TransactionQuery {
    /// Only include transactions of this kind.
    pub kind: Option<KindFilter>,
    /// Only include transactions in this category.
    pub category_id: Option<CategoryId>,
    /// Only include transactions on or after this date.
    pub start_date: Option<Date>,
    /// Only include transactions on or before this date.
    pub end_date: Option<Date>,
    /// Only include transactions of at least this amount.
    pub min_amount: Option<Money>,
    /// Only include transactions of at most this amount.
    pub max_amount: Option<Money>,
    /// Only include transactions whose description or category name contains
    /// this text, ignoring case.
    pub search: Option<String>,
    /// The order of the results.
    pub ordering: TransactionOrdering,
    /// Select at most this many transactions.
    pub limit: Option<u64>,
    /// Skip this many transactions.
    pub offset: u64,
}

impl TransactionQuery {
    fn where_clause(&self, user_id: UserID) -> (String, Vec<Value>) {
        let mut clauses = vec!["t.user_id = ?1".to_owned()];
        let mut params = vec![Value::Integer(user_id.as_i64())];

        if self.kind == Some(KindFilter::NoMatch) {
            clauses.push("0".to_owned());
        }

        let mut push = |clause: &str, value: Value| {
            params.push(value);
            clauses.push(clause.replace("{}", &format!("?{}", params.len())));
        };

        if let Some(KindFilter::Only(kind)) = self.kind {
            push("t.kind = {}", Value::Text(kind.as_str().to_owned()));
        }

        if let Some(category_id) = self.category_id {
            push("t.category_id = {}", Value::Integer(category_id));
        }

        if let Some(start_date) = self.start_date {
            push("t.date >= {}", Value::Text(start_date.to_string()));
        }

        if let Some(end_date) = self.end_date {
            push("t.date <= {}", Value::Text(end_date.to_string()));
        }

        if let Some(min_amount) = self.min_amount {
            push("t.amount >= {}", Value::Integer(min_amount.cents()));
        }

        if let Some(max_amount) = self.max_amount {
            push("t.amount <= {}", Value::Integer(max_amount.cents()));
        }

        if let Some(search) = self.search.as_deref().filter(|search| !search.is_empty()) {
            push(
                "(t.description LIKE '%' || {} || '%' ESCAPE '\\' \
                OR c.name LIKE '%' || {} || '%' ESCAPE '\\')",
                Value::Text(escape_like(search)),
            );
        }

        (format!("WHERE {}", clauses.join(" AND ")), params)
    }
}

const SELECT_TRANSACTION: &str = "SELECT t.id, t.user_id, t.category_id, c.name, t.kind, \
    t.amount, t.description, t.date, t.created_at, t.updated_at \
    FROM \"transaction\" t LEFT JOIN category c ON t.category_id = c.id";

/// Check that `category_id` refers to a category owned by `user_id`.
///
/// # Errors
///
/// Returns [Error::InvalidCategory] if the category does not exist or belongs to another user.
fn check_category_owner(
    category_id: Option<CategoryId>,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    let Some(category_id) = category_id else {
        return Ok(());
    };

    connection
        .query_row(
            "SELECT id FROM category WHERE id = ?1 AND user_id = ?2",
            (category_id, user_id.as_i64()),
            |row| row.get::<_, CategoryId>(0),
        )
        .optional()?
        .map(|_| ())
        .ok_or(Error::InvalidCategory)
}

/// Create a transaction for `user_id` and return it with its generated ID.
///
/// # Errors
///
/// Returns [Error::InvalidCategory] if the category is not owned by `user_id`.
pub fn create_transaction(
    user_id: UserID,
    new_transaction: NewTransaction,
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<Transaction, Error> {
    check_category_owner(new_transaction.category_id, user_id, connection)?;

    let timestamp = now.to_offset(UtcOffset::UTC);

    connection.execute(
        "INSERT INTO \"transaction\" \
        (user_id, category_id, kind, amount, description, date, created_at, updated_at) \
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
        (
            user_id.as_i64(),
            new_transaction.category_id,
            new_transaction.kind.as_str(),
            new_transaction.amount.cents(),
            &new_transaction.description,
            new_transaction.date,
            timestamp,
        ),
    )?;

    get_transaction(connection.last_insert_rowid(), user_id, connection)
}

/// Retrieve a single transaction owned by `user_id`.
///
/// # Errors
///
/// Returns [Error::NotFound] if the transaction does not exist or belongs to another user.
pub fn get_transaction(
    transaction_id: TransactionId,
    user_id: UserID,
    connection: &Connection,
) -> Result<Transaction, Error> {
    connection
        .prepare(&format!(
            "{SELECT_TRANSACTION} WHERE t.id = :id AND t.user_id = :user_id"
        ))?
        .query_row(
            &[(":id", &transaction_id), (":user_id", &user_id.as_i64())],
            map_row,
        )
        .map_err(|error| error.into())
}

/// Retrieve the transactions owned by `user_id` that match `query`.
pub fn list_transactions(
    user_id: UserID,
    query: &TransactionQuery,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    let (where_clause, params) = query.where_clause(user_id);
    let limit_clause = match query.limit {
        Some(limit) => format!("LIMIT {limit} OFFSET {}", query.offset),
        None => String::new(),
    };
    let sql = format!(
        "{SELECT_TRANSACTION} {where_clause} {} {limit_clause}",
        query.ordering.order_by_clause()
    );

    connection
        .prepare(&sql)?
        .query_map(params_from_iter(params.iter()), map_row)?
        .map(|maybe_transaction| maybe_transaction.map_err(|error| error.into()))
        .collect()
}

/// Count the transactions owned by `user_id` that match `query`, ignoring its limit and offset.
pub fn count_transactions(
    user_id: UserID,
    query: &TransactionQuery,
    connection: &Connection,
) -> Result<u64, Error> {
    let (where_clause, params) = query.where_clause(user_id);

    connection
        .query_row(
            &format!(
                "SELECT COUNT(t.id) FROM \"transaction\" t \
                LEFT JOIN category c ON t.category_id = c.id {where_clause}"
            ),
            params_from_iter(params.iter()),
            |row| row.get(0),
        )
        .map_err(|error| error.into())
}

/// Replace the fields of a transaction owned by `user_id`.
///
/// # Errors
///
/// Returns:
/// - [Error::UpdateMissingTransaction] if the transaction does not exist or belongs to another user,
/// - [Error::InvalidCategory] if the new category is not owned by `user_id`.
pub fn update_transaction(
    transaction_id: TransactionId,
    user_id: UserID,
    new_transaction: NewTransaction,
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<Transaction, Error> {
    check_category_owner(new_transaction.category_id, user_id, connection)?;

    let rows_affected = connection.execute(
        "UPDATE \"transaction\" \
        SET category_id = ?1, kind = ?2, amount = ?3, description = ?4, date = ?5, updated_at = ?6 \
        WHERE id = ?7 AND user_id = ?8",
        (
            new_transaction.category_id,
            new_transaction.kind.as_str(),
            new_transaction.amount.cents(),
            &new_transaction.description,
            new_transaction.date,
            now.to_offset(UtcOffset::UTC),
            transaction_id,
            user_id.as_i64(),
        ),
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingTransaction);
    }

    get_transaction(transaction_id, user_id, connection)
}

/// Delete a transaction owned by `user_id`.
///
/// # Errors
///
/// Returns [Error::DeleteMissingTransaction] if the transaction does not exist
/// or belongs to another user.
pub fn delete_transaction(
    transaction_id: TransactionId,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM \"transaction\" WHERE id = ?1 AND user_id = ?2",
        (transaction_id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingTransaction);
    }

    Ok(())
}

/// Create the transaction table.
///
/// Deleting a category keeps its transactions and clears their category.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            category_id INTEGER,
            kind TEXT NOT NULL CHECK (kind IN ('income', 'expense')),
            amount INTEGER NOT NULL CHECK (amount > 0),
            description TEXT NOT NULL DEFAULT '',
            date TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY(user_id) REFERENCES user(id) ON DELETE CASCADE,
            FOREIGN KEY(category_id) REFERENCES category(id) ON DELETE SET NULL
        )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_user_date ON \"transaction\"(user_id, date)",
        (),
    )?;

    Ok(())
}

fn map_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    Ok(Transaction {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        category_id: row.get(2)?,
        category_name: row.get(3)?,
        kind: get_kind(row, 4)?,
        amount: Money::from_cents(row.get(5)?),
        description: row.get(6)?,
        date: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}
