//! Budget domain types and validation.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

use crate::{
    Error,
    database_id::DatabaseId,
    money::{AmountInput, Money},
    user::UserID,
    validation::{FieldErrors, parse_integer},
};

/// Database identifier for budgets.
pub type BudgetId = DatabaseId;

/// The earliest year a budget may be set for.
pub const MIN_BUDGET_YEAR: i32 = 2000;

/// How many years past the current year a budget may be set for.
pub const MAX_YEARS_AHEAD: i32 = 10;

/// The amount a user plans to spend in one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Budget {
    /// The ID of the budget.
    pub id: BudgetId,
    /// The user that owns the budget.
    #[serde(skip)]
    pub user_id: UserID,
    /// The month, from 1 to 12.
    pub month: u8,
    /// The year.
    pub year: i32,
    /// The planned spending.
    pub amount: Money,
    /// When the budget was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// When the budget was last changed.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// The fields of a budget sent by a client.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BudgetData {
    /// A number or string of digits.
    pub month: Option<Value>,
    /// A number or string of digits.
    pub year: Option<Value>,
    /// A positive amount with at most two decimal places.
    pub amount: Option<AmountInput>,
}

/// A validated budget that is ready to be stored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NewBudget {
    /// The month, from 1 to 12.
    pub month: u8,
    /// The year.
    pub year: i32,
    /// The planned spending.
    pub amount: Money,
}

/// Validate the fields sent by a client.
///
/// `current_year` bounds the year a budget may be set for. When `existing`
/// is given, as for partial updates, missing fields keep their current values.
///
/// # Errors
///
/// Returns [Error::Validation] with a message for every invalid field. Range
/// errors for the month and year are only checked once every field is valid
/// and are reported as non-field errors.
pub fn validate_budget(
    data: BudgetData,
    existing: Option<&Budget>,
    current_year: i32,
) -> Result<NewBudget, Error> {
    let mut errors = FieldErrors::new();

    let month = match (data.month, existing) {
        (Some(raw_month), _) => errors.check("month", parse_integer(&raw_month)),
        (None, Some(budget)) => Some(budget.month.into()),
        (None, None) => errors.require("month", None),
    };

    let year = match (data.year, existing) {
        (Some(raw_year), _) => errors.check("year", parse_integer(&raw_year)),
        (None, Some(budget)) => Some(budget.year.into()),
        (None, None) => errors.require("year", None),
    };

    let amount = match (data.amount, existing) {
        (Some(raw_amount), _) => errors.check("amount", Money::parse_positive(&raw_amount)),
        (None, Some(budget)) => Some(budget.amount),
        (None, None) => errors.require("amount", None),
    };

    let (Some(month), Some(year), Some(amount)) = (month, year, amount) else {
        return Err(Error::Validation(errors));
    };
    errors.into_result()?;

    let max_year = current_year + MAX_YEARS_AHEAD;

    let Some(month) = u8::try_from(month).ok().filter(|month| (1..=12).contains(month)) else {
        return Err(Error::Validation(FieldErrors::single(
            FieldErrors::NON_FIELD_ERRORS,
            "Month must be between 1 and 12",
        )));
    };

    let Some(year) = i32::try_from(year)
        .ok()
        .filter(|year| (MIN_BUDGET_YEAR..=max_year).contains(year))
    else {
        return Err(Error::Validation(FieldErrors::single(
            FieldErrors::NON_FIELD_ERRORS,
            &format!("Year must be between {MIN_BUDGET_YEAR} and {max_year}"),
        )));
    };

    Ok(NewBudget {
        month,
        year,
        amount,
    })
}

#[cfg(test)]
mod validate_budget_tests {
    use serde_json::json;
    use time::macros::datetime;

    use crate::{
        Error,
        budget::{Budget, BudgetData, NewBudget, validate_budget},
        money::Money,
        user::UserID,
        validation::FieldErrors,
    };

    fn parse(body: serde_json::Value) -> BudgetData {
        serde_json::from_value(body).expect("Could not parse budget data")
    }

    fn non_field_error(message: &str) -> Result<NewBudget, Error> {
        Err(Error::Validation(FieldErrors::single(
            FieldErrors::NON_FIELD_ERRORS,
            message,
        )))
    }

    #[test]
    fn accepts_valid_budget() {
        let got = validate_budget(
            parse(json!({"month": 3, "year": "2025", "amount": "30000.00"})),
            None,
            2025,
        );

        assert_eq!(
            got,
            Ok(NewBudget {
                month: 3,
                year: 2025,
                amount: Money::from_cents(30_000_00),
            })
        );
    }

    #[test]
    fn rejects_month_out_of_range() {
        for month in [0, 13, -1] {
            let got = validate_budget(
                parse(json!({"month": month, "year": 2025, "amount": "1.00"})),
                None,
                2025,
            );

            assert_eq!(got, non_field_error("Month must be between 1 and 12"));
        }
    }

    #[test]
    fn rejects_year_out_of_range() {
        for year in [1999, 2036] {
            let got = validate_budget(
                parse(json!({"month": 1, "year": year, "amount": "1.00"})),
                None,
                2025,
            );

            assert_eq!(got, non_field_error("Year must be between 2000 and 2035"));
        }

        assert!(
            validate_budget(
                parse(json!({"month": 1, "year": 2035, "amount": "1.00"})),
                None,
                2025
            )
            .is_ok()
        );
    }

    #[test]
    fn requires_every_field_on_create() {
        let Err(Error::Validation(errors)) = validate_budget(BudgetData::default(), None, 2025)
        else {
            panic!("expected validation errors");
        };

        for field in ["month", "year", "amount"] {
            assert_eq!(
                errors.get(field),
                Some(&["This field is required.".to_owned()][..])
            );
        }
    }

    #[test]
    fn partial_update_keeps_missing_fields() {
        let existing = Budget {
            id: 1,
            user_id: UserID::new(1),
            month: 6,
            year: 2024,
            amount: Money::from_cents(100_00),
            created_at: datetime!(2024-06-01 00:00 UTC),
            updated_at: datetime!(2024-06-01 00:00 UTC),
        };

        let got = validate_budget(parse(json!({"amount": "250"})), Some(&existing), 2025);

        assert_eq!(
            got,
            Ok(NewBudget {
                month: 6,
                year: 2024,
                amount: Money::from_cents(250_00),
            })
        );
    }
}
