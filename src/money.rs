//! Fixed-point currency amounts.
//!
//! Amounts are held as a whole number of cents so that sums are exact and SQL
//! range filters compare integers. On the wire they are decimal strings with
//! exactly two decimal places, e.g. `"500.00"`.

use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, AddAssign, Sub},
    str::FromStr,
};

use rust_decimal::{Decimal, prelude::ToPrimitive};
use serde::{Deserialize, Serialize, Serializer};

/// An amount of money with a precision of one cent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(i64);

impl Money {
    /// Zero dollars.
    pub const ZERO: Money = Money(0);

    /// The smallest amount a transaction or budget may have.
    pub const MIN_AMOUNT: Money = Money(1);

    /// The largest amount that fits in 12 digits with 2 decimal places.
    pub const MAX_AMOUNT: Money = Money(999_999_999_999);

    /// Create an amount from a whole number of cents.
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// The amount as a whole number of cents.
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// The amount as a decimal with a scale of two.
    pub fn to_decimal(self) -> Decimal {
        Decimal::new(self.0, 2)
    }

    /// The amount as a float, for chart-style outputs.
    pub fn to_f64(self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// `self / other * 100` as a float, or `None` if `other` is not positive.
    pub fn percentage_of(self, other: Money) -> Option<f64> {
        if other.0 <= 0 {
            return None;
        }

        (self.to_decimal() / other.to_decimal() * Decimal::ONE_HUNDRED).to_f64()
    }

    /// Validate a user supplied amount for a transaction or budget.
    ///
    /// The amount must be a number of at least 0.01 with at most 12 digits,
    /// two of which may be after the decimal point.
    ///
    /// # Errors
    ///
    /// Returns a message suitable for a field-level validation error.
    pub fn parse_positive(input: &AmountInput) -> Result<Money, String> {
        let amount = input.to_decimal()?.normalize();

        if amount.scale() > 2 {
            return Err("Ensure that there are no more than 2 decimal places.".to_owned());
        }

        if amount < Money::MIN_AMOUNT.to_decimal() {
            return Err("Ensure this value is greater than or equal to 0.01.".to_owned());
        }

        if amount > Money::MAX_AMOUNT.to_decimal() {
            return Err("Ensure that there are no more than 12 digits in total.".to_owned());
        }

        (amount * Decimal::ONE_HUNDRED)
            .to_i64()
            .map(Money)
            .ok_or_else(|| "A valid number is required.".to_owned())
    }

    /// Parse the inclusive lower bound of an amount filter, rounding up to a whole cent.
    pub fn parse_lower_bound(raw: &str) -> Result<Money, String> {
        parse_bound(raw, Decimal::ceil)
    }

    /// Parse the inclusive upper bound of an amount filter, rounding down to a whole cent.
    pub fn parse_upper_bound(raw: &str) -> Result<Money, String> {
        parse_bound(raw, Decimal::floor)
    }
}

fn parse_bound(raw: &str, round: fn(&Decimal) -> Decimal) -> Result<Money, String> {
    Decimal::from_str(raw.trim())
        .ok()
        .and_then(|amount| amount.checked_mul(Decimal::ONE_HUNDRED))
        .and_then(|cents| round(&cents).to_i64())
        .map(Money)
        .ok_or_else(|| "A valid number is required.".to_owned())
}

impl Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_decimal())
    }
}

impl Serialize for Money {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Self) -> Self::Output {
        Money(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Self) -> Self::Output {
        Money(self.0 - rhs.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Money::ZERO, Add::add)
    }
}

/// An amount as sent by a client, either a JSON string or a JSON number.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum AmountInput {
    /// E.g. `"500.00"`.
    Text(String),
    /// E.g. `500` or `500.5`.
    Number(serde_json::Number),
}

impl AmountInput {
    fn to_decimal(&self) -> Result<Decimal, String> {
        let text = match self {
            AmountInput::Text(text) => text.trim().to_owned(),
            AmountInput::Number(number) => number.to_string(),
        };

        Decimal::from_str(&text)
            .or_else(|_| Decimal::from_scientific(&text))
            .map_err(|_| "A valid number is required.".to_owned())
    }
}

impl From<&str> for AmountInput {
    fn from(value: &str) -> Self {
        AmountInput::Text(value.to_owned())
    }
}

#[cfg(test)]
mod money_tests {
    use rust_decimal_macros::dec;

    use crate::money::{AmountInput, Money};

    #[test]
    fn converts_cents_to_decimal() {
        assert_eq!(Money::from_cents(123_45).to_decimal(), dec!(123.45));
    }

    #[test]
    fn serializes_with_two_decimal_places() {
        let got = serde_json::to_string(&Money::from_cents(50_000_00)).unwrap();

        assert_eq!(got, "\"50000.00\"");
    }

    #[test]
    fn serializes_negative_amounts() {
        let got = serde_json::to_string(&Money::from_cents(-1_250)).unwrap();

        assert_eq!(got, "\"-12.50\"");
    }

    #[test]
    fn sums_exactly() {
        let total: Money = [10, 20, 30].into_iter().map(Money::from_cents).sum();

        assert_eq!(total, Money::from_cents(60));
    }

    #[test]
    fn percentage_of_budget() {
        let spent = Money::from_cents(5_000_00);
        let budget = Money::from_cents(30_000_00);

        let percentage = spent.percentage_of(budget).unwrap();

        assert!((percentage - 16.666_666).abs() < 0.001, "got {percentage}");
    }

    #[test]
    fn percentage_of_zero_is_none() {
        assert_eq!(Money::from_cents(100).percentage_of(Money::ZERO), None);
    }

    #[test]
    fn parse_accepts_strings_and_numbers() {
        assert_eq!(
            Money::parse_positive(&AmountInput::from("500.00")),
            Ok(Money::from_cents(50_000))
        );

        let number: AmountInput = serde_json::from_str("12.5").unwrap();
        assert_eq!(Money::parse_positive(&number), Ok(Money::from_cents(1_250)));
    }

    #[test]
    fn parse_rejects_zero() {
        assert_eq!(
            Money::parse_positive(&AmountInput::from("0")),
            Err("Ensure this value is greater than or equal to 0.01.".to_owned())
        );
    }

    #[test]
    fn parse_rejects_negative_amounts() {
        assert!(Money::parse_positive(&AmountInput::from("-5.00")).is_err());
    }

    #[test]
    fn parse_rejects_fractions_of_cents() {
        assert_eq!(
            Money::parse_positive(&AmountInput::from("1.005")),
            Err("Ensure that there are no more than 2 decimal places.".to_owned())
        );
    }

    #[test]
    fn parse_ignores_trailing_zeros() {
        assert_eq!(
            Money::parse_positive(&AmountInput::from("1.500")),
            Ok(Money::from_cents(150))
        );
    }

    #[test]
    fn parse_rejects_too_many_digits() {
        assert!(Money::parse_positive(&AmountInput::from("10000000000.00")).is_err());
        assert_eq!(
            Money::parse_positive(&AmountInput::from("9999999999.99")),
            Ok(Money::MAX_AMOUNT)
        );
    }

    #[test]
    fn bounds_round_towards_the_inside_of_the_range() {
        assert_eq!(Money::parse_lower_bound("10.005"), Ok(Money::from_cents(1_001)));
        assert_eq!(Money::parse_upper_bound("10.005"), Ok(Money::from_cents(1_000)));
        assert_eq!(Money::parse_lower_bound(" 25 "), Ok(Money::from_cents(2_500)));
        assert!(Money::parse_upper_bound("ten").is_err());
    }

    #[test]
    fn parse_rejects_text() {
        assert_eq!(
            Money::parse_positive(&AmountInput::from("lots")),
            Err("A valid number is required.".to_owned())
        );
    }
}
