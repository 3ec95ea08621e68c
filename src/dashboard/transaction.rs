//! Database queries for retrieving dashboard transaction data.
//!
//! The dashboard only needs the kind, amount, date and category name of each
//! transaction, so it reads a slimmer view than the transaction endpoints.

use rusqlite::Connection;
use time::Date;

use crate::{
    Error,
    kind::{Kind, get_kind},
    money::Money,
    user::UserID,
};

/// A simplified transaction view for dashboard aggregations.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct Transaction {
    pub kind: Kind,
    pub amount: Money,
    pub date: Date,
    pub category_name: Option<String>,
}

/// Gets every transaction owned by `user_id` with its category name.
pub(super) fn get_user_transactions(
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    let mut stmt = connection.prepare(
        "SELECT t.kind, t.amount, t.date, c.name
        FROM \"transaction\" t
        LEFT JOIN category c ON c.id = t.category_id
        WHERE t.user_id = ?1",
    )?;

    stmt.query_map([user_id.as_i64()], |row| {
        Ok(Transaction {
            kind: get_kind(row, 0)?,
            amount: Money::from_cents(row.get(1)?),
            date: row.get(2)?,
            category_name: row.get(3)?,
        })
    })?
    .collect::<Result<Vec<Transaction>, rusqlite::Error>>()
    .map_err(|error| error.into())
}

#[cfg(test)]
mod tests {
    use time::macros::{date, datetime};

    use crate::{
        category::{CategoryName, NewCategory, create_category},
        kind::Kind,
        money::Money,
        test_utils::{get_test_connection, insert_test_user},
        transaction::{NewTransaction, create_transaction},
    };

    use super::{Transaction, get_user_transactions};

    #[test]
    fn only_returns_own_transactions_with_category_names() {
        let connection = get_test_connection();
        let user_id = insert_test_user(&connection, "test");
        let other_user_id = insert_test_user(&connection, "other");
        let now = datetime!(2025-03-15 09:30 UTC);
        let category = create_category(
            user_id,
            NewCategory {
                name: CategoryName::new_unchecked("Food"),
                kind: Kind::Expense,
            },
            now,
            &connection,
        )
        .unwrap();
        for (owner, category_id) in [(user_id, Some(category.id)), (other_user_id, None)] {
            create_transaction(
                owner,
                NewTransaction {
                    category_id,
                    kind: Kind::Expense,
                    amount: Money::from_cents(12_34),
                    description: String::new(),
                    date: date!(2025 - 03 - 14),
                },
                now,
                &connection,
            )
            .unwrap();
        }

        let got = get_user_transactions(user_id, &connection).unwrap();

        assert_eq!(
            got,
            vec![Transaction {
                kind: Kind::Expense,
                amount: Money::from_cents(12_34),
                date: date!(2025 - 03 - 14),
                category_name: Some("Food".to_owned()),
            }]
        );
    }
}
