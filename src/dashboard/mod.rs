//! Dashboard module
//!
//! Summarizes a user's finances: all-time totals, progress against the budget
//! for a target month, per-category breakdowns and a six-month trend.

mod aggregation;
mod handlers;
mod transaction;

pub use aggregation::{CategoryTotal, DashboardSummary, TREND_LENGTH, TrendEntry};
pub use handlers::{DashboardParams, DashboardState, get_dashboard};
