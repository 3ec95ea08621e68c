//! Transaction domain types and validation.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use time::{Date, OffsetDateTime, macros::format_description};

use crate::{
    Error,
    category::CategoryId,
    database_id::DatabaseId,
    kind::Kind,
    money::{AmountInput, Money},
    user::UserID,
    validation::{FieldErrors, parse_integer},
};

/// Database identifier for transactions.
pub type TransactionId = DatabaseId;

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

/// Parse a date in the `YYYY-MM-DD` format.
pub(crate) fn parse_date(raw_date: &str) -> Result<Date, String> {
    Date::parse(raw_date.trim(), format_description!("[year]-[month]-[day]"))
        .map_err(|_| "Date has wrong format. Use one of these formats instead: YYYY-MM-DD.".to_owned())
}

/// An amount of money received or spent on a given date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The user that owns the transaction.
    #[serde(skip)]
    pub user_id: UserID,
    /// The category of the transaction, if any.
    #[serde(rename = "category")]
    pub category_id: Option<CategoryId>,
    /// The name of the category, if any.
    pub category_name: Option<String>,
    /// Whether money was received or spent.
    #[serde(rename = "type")]
    pub kind: Kind,
    /// The amount of money, always positive.
    pub amount: Money,
    /// Free text, may be empty.
    pub description: String,
    /// The date the transaction happened.
    #[serde(with = "iso_date")]
    pub date: Date,
    /// When the transaction was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// When the transaction was last changed.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// The fields of a transaction sent by a client.
///
/// `category` distinguishes a missing field (`None`) from an explicit null
/// (`Some(None)`), which clears the category.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransactionData {
    /// The ID of a category owned by the same user, or null.
    #[serde(default, deserialize_with = "deserialize_present")]
    pub category: Option<Option<Value>>,
    /// Either "income" or "expense".
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// A positive amount with at most two decimal places.
    pub amount: Option<AmountInput>,
    /// Free text.
    pub description: Option<String>,
    /// A date in the `YYYY-MM-DD` format.
    pub date: Option<String>,
}

fn deserialize_present<'de, D>(deserializer: D) -> Result<Option<Option<Value>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Value>::deserialize(deserializer).map(Some)
}

/// A validated transaction that is ready to be stored.
///
/// The category has not yet been checked against the owner, that happens
/// when the transaction is written.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    /// The category of the transaction, if any.
    pub category_id: Option<CategoryId>,
    /// Whether money was received or spent.
    pub kind: Kind,
    /// The amount of money.
    pub amount: Money,
    /// Free text, may be empty.
    pub description: String,
    /// The date the transaction happened.
    pub date: Date,
}

fn parse_category_id(value: Option<Value>) -> Result<Option<CategoryId>, String> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) if text.is_empty() => Ok(None),
        Some(value) => parse_integer(&value)
            .map(Some)
            .map_err(|_| "Incorrect type. Expected pk value.".to_owned()),
    }
}

/// Validate the fields sent by a client.
///
/// `existing` is the stored transaction when updating. A missing category or
/// description keeps its stored value, or is empty when creating. A missing
/// `type`, `amount` or `date` keeps its stored value only for a `partial`
/// update and is otherwise required.
///
/// # Errors
///
/// Returns [Error::Validation] with a message for every invalid field.
pub fn validate_transaction(
    data: TransactionData,
    existing: Option<&Transaction>,
    partial: bool,
) -> Result<NewTransaction, Error> {
    let mut errors = FieldErrors::new();
    let required_fallback = existing.filter(|_| partial);

    let category_id = match (data.category, existing) {
        (Some(raw_category), _) => errors.check("category", parse_category_id(raw_category)),
        (None, Some(transaction)) => Some(transaction.category_id),
        (None, None) => Some(None),
    };

    let kind = match (data.kind, required_fallback) {
        (Some(raw_kind), _) => errors.check(
            "type",
            raw_kind.parse::<Kind>().map_err(|error| error.to_string()),
        ),
        (None, Some(transaction)) => Some(transaction.kind),
        (None, None) => errors.require("type", None),
    };

    let amount = match (data.amount, required_fallback) {
        (Some(raw_amount), _) => errors.check("amount", Money::parse_positive(&raw_amount)),
        (None, Some(transaction)) => Some(transaction.amount),
        (None, None) => errors.require("amount", None),
    };

    let description = match (data.description, existing) {
        (Some(description), _) => description,
        (None, Some(transaction)) => transaction.description.clone(),
        (None, None) => String::new(),
    };

    let date = match (data.date, required_fallback) {
        (Some(raw_date), _) => errors.check("date", parse_date(&raw_date)),
        (None, Some(transaction)) => Some(transaction.date),
        (None, None) => errors.require("date", None),
    };

    match (category_id, kind, amount, date) {
        (Some(category_id), Some(kind), Some(amount), Some(date)) if errors.is_empty() => {
            Ok(NewTransaction {
                category_id,
                kind,
                amount,
                description,
                date,
            })
        }
        _ => Err(Error::Validation(errors)),
    }
}
