//! Whether a category or transaction records money coming in or going out.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

/// Income or expense, sent as `type` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    /// Money received.
    Income,
    /// Money spent.
    Expense,
}

impl Kind {
    /// The lowercase name used on the wire and in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Income => "income",
            Kind::Expense => "expense",
        }
    }
}

impl Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The error returned when a string is neither "income" nor "expense".
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("\"{0}\" is not a valid choice.")]
pub struct InvalidKind(pub String);

impl FromStr for Kind {
    type Err = InvalidKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "income" => Ok(Kind::Income),
            "expense" => Ok(Kind::Expense),
            other => Err(InvalidKind(other.to_owned())),
        }
    }
}

/// The `type` filter of a list request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KindFilter {
    /// Only records of this kind.
    Only(Kind),
    /// A value that is neither kind, which matches no records.
    NoMatch,
}

impl KindFilter {
    /// Parse the `type` query parameter. Missing and empty values mean no filter.
    pub fn from_param(param: Option<&str>) -> Option<Self> {
        let raw_kind = param.filter(|raw_kind| !raw_kind.is_empty())?;

        Some(match raw_kind.parse() {
            Ok(kind) => KindFilter::Only(kind),
            Err(_) => KindFilter::NoMatch,
        })
    }
}

/// Parse the kind stored in column `index` of `row`.
pub(crate) fn get_kind(row: &rusqlite::Row, index: usize) -> Result<Kind, rusqlite::Error> {
    let raw: String = row.get(index)?;

    raw.parse().map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(
            index,
            rusqlite::types::Type::Text,
            Box::new(error),
        )
    })
}
