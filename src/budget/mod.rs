//! Monthly spending budgets.

mod db;
mod domain;
mod handlers;

pub use db::{
    count_budgets, create_budget, create_budget_table, delete_budget, get_budget,
    get_budget_for_month, list_budgets, update_budget,
};
pub use domain::{
    Budget, BudgetData, BudgetId, MAX_YEARS_AHEAD, MIN_BUDGET_YEAR, NewBudget, validate_budget,
};
pub use handlers::{
    BudgetListParams, BudgetState, create_budget_endpoint, delete_budget_endpoint,
    get_budget_endpoint, get_current_month_budget_endpoint, list_budgets_endpoint,
    partial_update_budget_endpoint, update_budget_endpoint,
};
