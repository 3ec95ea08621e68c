//! Category domain types and validation.

use std::fmt::Display;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{Error, database_id::DatabaseId, kind::Kind, user::UserID, validation::FieldErrors};

/// The longest name a category may have, in characters.
pub const MAX_CATEGORY_NAME_LENGTH: usize = 100;

/// Database identifier for categories.
pub type CategoryId = DatabaseId;

/// A user-defined label for grouping transactions of one kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Category {
    /// The ID of the category.
    pub id: CategoryId,
    /// The user that owns the category.
    #[serde(skip)]
    pub user_id: UserID,
    /// The name of the category, unique per user and kind.
    pub name: CategoryName,
    /// Whether the category is for income or expenses.
    #[serde(rename = "type")]
    pub kind: Kind,
    /// When the category was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// When the category was last changed.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// The name of a category.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct CategoryName(String);

impl CategoryName {
    /// Create a category name, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns a field-level message if the name is blank or too long.
    pub fn new(raw_name: &str) -> Result<Self, String> {
        let name = raw_name.trim();

        if name.is_empty() {
            return Err("This field may not be blank.".to_owned());
        }

        if name.chars().count() > MAX_CATEGORY_NAME_LENGTH {
            return Err(format!(
                "Ensure this field has no more than {MAX_CATEGORY_NAME_LENGTH} characters."
            ));
        }

        Ok(Self(name.to_owned()))
    }

    /// Create a category name without validation.
    ///
    /// The caller should ensure that the string is not empty.
    ///
    /// This function has `_unchecked` in the name but is not `unsafe`, because if the non-empty
    /// invariant is violated it will cause incorrect behaviour but not affect memory safety.
    pub fn new_unchecked(raw_name: &str) -> Self {
        Self(raw_name.to_owned())
    }
}

impl AsRef<str> for CategoryName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for CategoryName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The fields of a category sent by a client.
///
/// Every field is optional so that one type serves create, full update and
/// partial update requests.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategoryData {
    /// The name of the category.
    pub name: Option<String>,
    /// Either "income" or "expense".
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// A validated category that is ready to be stored.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCategory {
    /// The name of the category.
    pub name: CategoryName,
    /// Whether the category is for income or expenses.
    pub kind: Kind,
}

/// Validate the fields sent by a client.
///
/// When `existing` is given, as for partial updates, missing fields keep
/// their current values. Otherwise every field is required.
///
/// # Errors
///
/// Returns [Error::Validation] with a message for every invalid field.
pub fn validate_category(
    data: CategoryData,
    existing: Option<&Category>,
) -> Result<NewCategory, Error> {
    let mut errors = FieldErrors::new();

    let name = match (data.name, existing) {
        (Some(raw_name), _) => errors.check("name", CategoryName::new(&raw_name)),
        (None, Some(category)) => Some(category.name.clone()),
        (None, None) => errors.require("name", None),
    };

    let kind = match (data.kind, existing) {
        (Some(raw_kind), _) => errors.check(
            "type",
            raw_kind.parse::<Kind>().map_err(|error| error.to_string()),
        ),
        (None, Some(category)) => Some(category.kind),
        (None, None) => errors.require("type", None),
    };

    match (name, kind) {
        (Some(name), Some(kind)) if errors.is_empty() => Ok(NewCategory { name, kind }),
        _ => Err(Error::Validation(errors)),
    }
}

#[cfg(test)]
mod category_name_tests {
    use crate::category::CategoryName;

    #[test]
    fn new_fails_on_empty_string() {
        assert!(CategoryName::new("").is_err());
    }

    #[test]
    fn new_fails_on_just_whitespace() {
        assert!(CategoryName::new("\n\t \r").is_err());
    }

    #[test]
    fn new_trims_whitespace() {
        assert_eq!(
            CategoryName::new("  Groceries "),
            Ok(CategoryName::new_unchecked("Groceries"))
        );
    }

    #[test]
    fn new_fails_on_long_name() {
        assert!(CategoryName::new(&"a".repeat(101)).is_err());
        assert!(CategoryName::new(&"a".repeat(100)).is_ok());
    }
}
