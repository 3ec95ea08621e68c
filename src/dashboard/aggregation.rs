//! Transaction data aggregation for the dashboard summary.
//!
//! Everything here is pure: the handler loads the user's transactions and
//! budget, then [summarize] computes the totals, budget progress, category
//! breakdowns and six-month trend.

use std::collections::HashMap;

use serde::Serialize;
use time::{Date, Duration, Month};

use crate::{dashboard::transaction::Transaction, kind::Kind, money::Money};

/// The number of entries in the monthly trend.
pub const TREND_LENGTH: i64 = 6;

/// The number of days between trend entries.
const TREND_STEP_DAYS: i64 = 30;

/// The total amount of one kind of transaction in one category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    /// The name of the category.
    #[serde(rename = "category__name")]
    pub category_name: String,
    /// The sum of the transaction amounts.
    pub total: Money,
}

/// Income and expenses for one approximate month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendEntry {
    /// The month and year, e.g. "Jan 2024".
    pub month: String,
    /// The sum of income in the month.
    pub income: f64,
    /// The sum of expenses in the month.
    pub expenses: f64,
}

/// The dashboard summary for one user and target month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    /// The sum of all income, regardless of date.
    pub total_income: Money,
    /// The sum of all expenses, regardless of date.
    pub total_expenses: Money,
    /// `total_income - total_expenses`.
    pub balance: Money,
    /// The budget for the target month, if one is set.
    pub monthly_budget: Option<Money>,
    /// The budget minus the expenses in the target month.
    pub budget_remaining: Option<Money>,
    /// The expenses in the target month as a percentage of the budget.
    pub budget_percentage: Option<f64>,
    /// Income per category, largest first.
    pub income_by_category: Vec<CategoryTotal>,
    /// Expenses per category, largest first.
    pub expenses_by_category: Vec<CategoryTotal>,
    /// Income and expenses for the last six approximate months, oldest first.
    pub monthly_trend: Vec<TrendEntry>,
}

/// Compute the dashboard summary.
///
/// `month` and `year` select the month the budget is compared against.
/// The trend steps back from `today` in 30 day increments, so it may skip or
/// repeat a calendar month.
pub fn summarize(
    transactions: &[Transaction],
    budget: Option<Money>,
    month: Month,
    year: i32,
    today: Date,
) -> DashboardSummary {
    let total_income = sum_where(transactions, |transaction| transaction.kind == Kind::Income);
    let total_expenses = sum_where(transactions, |transaction| transaction.kind == Kind::Expense);

    let month_expenses = sum_where(transactions, |transaction| {
        transaction.kind == Kind::Expense && is_in_month(transaction.date, month, year)
    });

    DashboardSummary {
        total_income,
        total_expenses,
        balance: total_income - total_expenses,
        monthly_budget: budget,
        budget_remaining: budget.map(|budget| budget - month_expenses),
        budget_percentage: budget
            .map(|budget| month_expenses.percentage_of(budget).unwrap_or(0.0)),
        income_by_category: totals_by_category(transactions, Kind::Income),
        expenses_by_category: totals_by_category(transactions, Kind::Expense),
        monthly_trend: monthly_trend(transactions, today),
    }
}

fn sum_where(transactions: &[Transaction], predicate: impl Fn(&Transaction) -> bool) -> Money {
    transactions
        .iter()
        .filter(|transaction| predicate(*transaction))
        .map(|transaction| transaction.amount)
        .sum()
}

fn is_in_month(date: Date, month: Month, year: i32) -> bool {
    date.month() == month && date.year() == year
}

/// Group the categorised transactions of `kind` by category name.
///
/// Sorted by total descending, then name ascending.
fn totals_by_category(transactions: &[Transaction], kind: Kind) -> Vec<CategoryTotal> {
    let mut totals: HashMap<&str, Money> = HashMap::new();

    for transaction in transactions.iter().filter(|transaction| transaction.kind == kind) {
        if let Some(category_name) = &transaction.category_name {
            *totals.entry(category_name.as_str()).or_default() += transaction.amount;
        }
    }

    let mut totals: Vec<CategoryTotal> = totals
        .into_iter()
        .map(|(category_name, total)| CategoryTotal {
            category_name: category_name.to_owned(),
            total,
        })
        .collect();
    totals.sort_by(|a, b| {
        b.total
            .cmp(&a.total)
            .then_with(|| a.category_name.cmp(&b.category_name))
    });

    totals
}

fn monthly_trend(transactions: &[Transaction], today: Date) -> Vec<TrendEntry> {
    (0..TREND_LENGTH)
        .rev()
        .map(|steps_back| {
            let target = today
                .checked_sub(Duration::days(TREND_STEP_DAYS * steps_back))
                .unwrap_or(Date::MIN);
            let in_target_month = |transaction: &Transaction, kind: Kind| {
                transaction.kind == kind
                    && is_in_month(transaction.date, target.month(), target.year())
            };

            TrendEntry {
                month: format_month_label(target),
                income: sum_where(transactions, |transaction| {
                    in_target_month(transaction, Kind::Income)
                })
                .to_f64(),
                expenses: sum_where(transactions, |transaction| {
                    in_target_month(transaction, Kind::Expense)
                })
                .to_f64(),
            }
        })
        .collect()
}

/// Formats a date as a three-letter month abbreviation and year, e.g. "Jan 2024".
pub(super) fn format_month_label(date: Date) -> String {
    let month = match date.month() {
        Month::January => "Jan",
        Month::February => "Feb",
        Month::March => "Mar",
        Month::April => "Apr",
        Month::May => "May",
        Month::June => "Jun",
        Month::July => "Jul",
        Month::August => "Aug",
        Month::September => "Sep",
        Month::October => "Oct",
        Month::November => "Nov",
        Month::December => "Dec",
    };

    format!("{month} {}", date.year())
}
