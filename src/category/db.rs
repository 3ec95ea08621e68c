//! Database operations for categories.
//!
//! Every query is scoped to the user that owns the categories, so a category
//! owned by someone else looks exactly like one that does not exist.

use rusqlite::{Connection, Row, params_from_iter, types::Value};
use time::{OffsetDateTime, UtcOffset};

use crate::{
    Error,
    category::{Category, CategoryId, CategoryName, NewCategory},
    kind::{KindFilter, get_kind},
    user::UserID,
};

/// The sort orders clients may ask for with the `ordering` parameter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CategoryOrdering {
    /// Alphabetical by name.
    #[default]
    NameAscending,
    /// Reverse alphabetical by name.
    NameDescending,
    /// Oldest first.
    CreatedAscending,
    /// Newest first.
    CreatedDescending,
}

impl CategoryOrdering {
    /// Parse the `ordering` query parameter, falling back to the default for unknown values.
    pub fn from_param(param: Option<&str>) -> Self {
        match param {
            Some("name") => Self::NameAscending,
            Some("-name") => Self::NameDescending,
            Some("created_at") => Self::CreatedAscending,
            Some("-created_at") => Self::CreatedDescending,
            _ => Self::default(),
        }
    }

    fn order_by_clause(&self) -> &'static str {
        match self {
            Self::NameAscending => "ORDER BY name ASC, id ASC",
            Self::NameDescending => "ORDER BY name DESC, id DESC",
            Self::CreatedAscending => "ORDER BY created_at ASC, id ASC",
            Self::CreatedDescending => "ORDER BY created_at DESC, id DESC",
        }
    }
}

/// Defines which categories [list_categories] and [count_categories] select.
#[derive(Debug, Clone, Default)]
pub struct CategoryQuery {
    /// Only include categories of this kind.
    pub kind: Option<KindFilter>,
    /// Only include categories whose name contains this text, ignoring case.
    pub search: Option<String>,
    /// The order of the results.
    pub ordering: CategoryOrdering,
    /// Select at most this many categories.
    pub limit: Option<u64>,
    /// Skip this many categories.
    pub offset: u64,
}

impl CategoryQuery {
    fn where_clause(&self, user_id: UserID) -> (String, Vec<Value>) {
        let mut clauses = vec!["user_id = ?1".to_owned()];
        let mut params = vec![Value::Integer(user_id.as_i64())];

        match self.kind {
            Some(KindFilter::Only(kind)) => {
                params.push(Value::Text(kind.as_str().to_owned()));
                clauses.push(format!("kind = ?{}", params.len()));
            }
            Some(KindFilter::NoMatch) => clauses.push("0".to_owned()),
            None => {}
        }

        if let Some(search) = self.search.as_deref().filter(|search| !search.is_empty()) {
            params.push(Value::Text(escape_like(search)));
            clauses.push(format!(
                "name LIKE '%' || ?{} || '%' ESCAPE '\\'",
                params.len()
            ));
        }

        (format!("WHERE {}", clauses.join(" AND ")), params)
    }
}

/// Escape the wildcard characters of a `LIKE` pattern.
pub(crate) fn escape_like(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Create a category for `user_id` and return it with its generated ID.
///
/// # Errors
///
/// Returns [Error::DuplicateCategory] if the user already has a category with
/// the same name and kind.
pub fn create_category(
    user_id: UserID,
    new_category: NewCategory,
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<Category, Error> {
    let timestamp = now.to_offset(UtcOffset::UTC);

    connection.execute(
        "INSERT INTO category (user_id, name, kind, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?4)",
        (
            user_id.as_i64(),
            new_category.name.as_ref(),
            new_category.kind.as_str(),
            timestamp,
        ),
    )?;

    Ok(Category {
        id: connection.last_insert_rowid(),
        user_id,
        name: new_category.name,
        kind: new_category.kind,
        created_at: timestamp,
        updated_at: timestamp,
    })
}

/// Retrieve a single category owned by `user_id`.
///
/// # Errors
///
/// Returns [Error::NotFound] if the category does not exist or belongs to another user.
pub fn get_category(
    category_id: CategoryId,
    user_id: UserID,
    connection: &Connection,
) -> Result<Category, Error> {
    connection
        .prepare(
            "SELECT id, user_id, name, kind, created_at, updated_at FROM category
            WHERE id = :id AND user_id = :user_id",
        )?
        .query_row(
            &[(":id", &category_id), (":user_id", &user_id.as_i64())],
            map_row,
        )
        .map_err(|error| error.into())
}

/// Retrieve the categories owned by `user_id` that match `query`.
pub fn list_categories(
    user_id: UserID,
    query: &CategoryQuery,
    connection: &Connection,
) -> Result<Vec<Category>, Error> {
    let (where_clause, params) = query.where_clause(user_id);
    let limit_clause = match query.limit {
        Some(limit) => format!("LIMIT {limit} OFFSET {}", query.offset),
        None => String::new(),
    };
    let sql = format!(
        "SELECT id, user_id, name, kind, created_at, updated_at FROM category {where_clause} {} {limit_clause}",
        query.ordering.order_by_clause()
    );

    connection
        .prepare(&sql)?
        .query_map(params_from_iter(params.iter()), map_row)?
        .map(|maybe_category| maybe_category.map_err(|error| error.into()))
        .collect()
}

/// Count the categories owned by `user_id` that match `query`, ignoring its limit and offset.
pub fn count_categories(
    user_id: UserID,
    query: &CategoryQuery,
    connection: &Connection,
) -> Result<u64, Error> {
    let (where_clause, params) = query.where_clause(user_id);

    connection
        .query_row(
            &format!("SELECT COUNT(id) FROM category {where_clause}"),
            params_from_iter(params.iter()),
            |row| row.get(0),
        )
        .map_err(|error| error.into())
}

/// Replace the name and kind of a category owned by `user_id`.
///
/// # Errors
///
/// Returns:
/// - [Error::UpdateMissingCategory] if the category does not exist or belongs to another user,
/// - [Error::DuplicateCategory] if the new name and kind clash with another category.
pub fn update_category(
    category_id: CategoryId,
    user_id: UserID,
    new_category: NewCategory,
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<Category, Error> {
    let rows_affected = connection.execute(
        "UPDATE category SET name = ?1, kind = ?2, updated_at = ?3 WHERE id = ?4 AND user_id = ?5",
        (
            new_category.name.as_ref(),
            new_category.kind.as_str(),
            now.to_offset(UtcOffset::UTC),
            category_id,
            user_id.as_i64(),
        ),
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingCategory);
    }

    get_category(category_id, user_id, connection)
}

/// Delete a category owned by `user_id`.
///
/// Transactions in the category are kept and become uncategorised.
///
/// # Errors
///
/// Returns [Error::DeleteMissingCategory] if the category does not exist or belongs to another user.
pub fn delete_category(
    category_id: CategoryId,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM category WHERE id = ?1 AND user_id = ?2",
        (category_id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingCategory);
    }

    Ok(())
}

/// Initialize the category table and indexes.
pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS category (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            kind TEXT NOT NULL CHECK (kind IN ('income', 'expense')),
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            UNIQUE(user_id, name, kind),
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_category_user_id ON category(user_id);",
    )?;

    Ok(())
}

fn map_row(row: &Row) -> Result<Category, rusqlite::Error> {
    let raw_name: String = row.get(2)?;

    Ok(Category {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        name: CategoryName::new_unchecked(&raw_name),
        kind: get_kind(row, 3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}
