//! Dashboard HTTP handler.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
};
use rusqlite::Connection;
use serde::Deserialize;
use time::Month;

use crate::{
    AppState, Error,
    budget::get_budget_for_month,
    clock::Clock,
    dashboard::{
        aggregation::{DashboardSummary, summarize},
        transaction::get_user_transactions,
    },
    extract::ApiQuery,
    user::UserID,
    validation::FieldErrors,
};

/// The state needed for the dashboard summary.
#[derive(Debug, Clone)]
pub struct DashboardState {
    /// The database connection for reading transactions and budgets.
    pub db_connection: Arc<Mutex<Connection>>,
    /// Supplies the default month and the end of the trend.
    pub clock: Arc<dyn Clock>,
}

impl FromRef<AppState> for DashboardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            clock: state.clock.clone(),
        }
    }
}

/// Overrides for the month the budget is compared against.
#[derive(Debug, Default, Deserialize)]
pub struct DashboardParams {
    /// 1 to 12, defaults to the current month.
    pub month: Option<String>,
    /// 1 to 9999, defaults to the current year.
    pub year: Option<String>,
}

impl DashboardParams {
    fn target_month(
        &self,
        default_month: Month,
        default_year: i32,
    ) -> Result<(Month, i32), Error> {
        let mut errors = FieldErrors::new();

        let raw_month = self.month.as_deref().map(str::trim);
        let month = match raw_month.filter(|raw| !raw.is_empty()) {
            None => Some(default_month),
            Some(raw_month) => errors.check(
                "month",
                raw_month
                    .parse::<u8>()
                    .ok()
                    .and_then(|month| Month::try_from(month).ok())
                    .ok_or_else(|| "Month must be between 1 and 12".to_owned()),
            ),
        };

        let raw_year = self.year.as_deref().map(str::trim);
        let year = match raw_year.filter(|raw| !raw.is_empty()) {
            None => Some(default_year),
            Some(raw_year) => errors.check(
                "year",
                raw_year
                    .parse::<i32>()
                    .ok()
                    .filter(|year| (1..=9999).contains(year))
                    .ok_or_else(|| "Year must be between 1 and 9999".to_owned()),
            ),
        };

        match (month, year) {
            (Some(month), Some(year)) if errors.is_empty() => Ok((month, year)),
            _ => Err(Error::Validation(errors)),
        }
    }
}

/// Summarize the caller's transactions and budget.
pub async fn get_dashboard(
    State(state): State<DashboardState>,
    Extension(user_id): Extension<UserID>,
    ApiQuery(params): ApiQuery<DashboardParams>,
) -> Result<Json<DashboardSummary>, Error> {
    let today = state.clock.today();
    let (month, year) = params.target_month(today.month(), today.year())?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let transactions = get_user_transactions(user_id, &connection)?;
    let budget = get_budget_for_month(user_id, month.into(), year, &connection)?;

    Ok(Json(summarize(
        &transactions,
        budget.map(|budget| budget.amount),
        month,
        year,
        today,
    )))
}

#[cfg(test)]
mod dashboard_endpoint_tests {
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use serde_json::{Value, json};
    use time::macros::datetime;

    use crate::{
        clock::FixedClock,
        endpoints,
        test_utils::{create_test_token, create_test_user, get_test_server, get_test_state},
    };

    fn get_test_client() -> (TestServer, String, String) {
        let state = get_test_state(FixedClock(datetime!(2024-03-15 09:30 UTC)));
        let user = create_test_user(&state, "test");
        let other_user = create_test_user(&state, "other");
        let token = create_test_token(&state, user.id).as_str().to_owned();
        let other_token = create_test_token(&state, other_user.id).as_str().to_owned();

        (get_test_server(state), token, other_token)
    }

    async fn post(server: &TestServer, token: &str, path: &str, body: Value) -> Value {
        let response = server
            .post(path)
            .authorization_bearer(token)
            .json(&body)
            .await;
        response.assert_status(StatusCode::CREATED);
        response.json()
    }

    #[tokio::test]
    async fn summarizes_income_expenses_and_budget() {
        let (server, token, _) = get_test_client();
        let salary = post(
            &server,
            &token,
            endpoints::CATEGORIES,
            json!({"name": "Salary", "type": "income"}),
        )
        .await;
        let food = post(
            &server,
            &token,
            endpoints::CATEGORIES,
            json!({"name": "Food", "type": "expense"}),
        )
        .await;
        post(
            &server,
            &token,
            endpoints::TRANSACTIONS,
            json!({"category": salary["id"], "type": "income", "amount": "50000", "date": "2024-03-15"}),
        )
        .await;
        post(
            &server,
            &token,
            endpoints::TRANSACTIONS,
            json!({"category": food["id"], "type": "expense", "amount": "5000", "date": "2024-03-15"}),
        )
        .await;
        post(
            &server,
            &token,
            endpoints::BUDGETS,
            json!({"month": 3, "year": 2024, "amount": "30000"}),
        )
        .await;

        let response = server.get(endpoints::DASHBOARD).authorization_bearer(&token).await;

        response.assert_status_ok();
        let summary: Value = response.json();
        assert_eq!(summary["total_income"], "50000.00");
        assert_eq!(summary["total_expenses"], "5000.00");
        assert_eq!(summary["balance"], "45000.00");
        assert_eq!(summary["monthly_budget"], "30000.00");
        assert_eq!(summary["budget_remaining"], "25000.00");
        let percentage = summary["budget_percentage"].as_f64().unwrap();
        assert!((percentage - 16.67).abs() < 0.01, "got {percentage}");
        assert_eq!(
            summary["expenses_by_category"],
            json!([{"category__name": "Food", "total": "5000.00"}])
        );
        assert_eq!(summary["monthly_trend"].as_array().unwrap().len(), 6);
        assert_eq!(
            summary["monthly_trend"][5],
            json!({"month": "Mar 2024", "income": 50000.0, "expenses": 5000.0})
        );
    }

    #[tokio::test]
    async fn month_override_without_budget_gives_nulls() {
        let (server, token, _) = get_test_client();
        post(
            &server,
            &token,
            endpoints::BUDGETS,
            json!({"month": 3, "year": 2024, "amount": "100"}),
        )
        .await;

        let response = server
            .get(endpoints::DASHBOARD)
            .add_query_param("month", "2")
            .add_query_param("year", "2024")
            .authorization_bearer(&token)
            .await;

        response.assert_status_ok();
        let summary: Value = response.json();
        assert_eq!(summary["monthly_budget"], Value::Null);
        assert_eq!(summary["budget_remaining"], Value::Null);
        assert_eq!(summary["budget_percentage"], Value::Null);
        assert_eq!(summary["monthly_trend"][5]["month"], "Mar 2024");
    }

    #[tokio::test]
    async fn ignores_other_users_records() {
        let (server, token, other_token) = get_test_client();
        post(
            &server,
            &other_token,
            endpoints::TRANSACTIONS,
            json!({"type": "income", "amount": "10", "date": "2024-03-15"}),
        )
        .await;

        let response = server.get(endpoints::DASHBOARD).authorization_bearer(&token).await;

        let summary: Value = response.json();
        assert_eq!(summary["total_income"], "0.00");
        assert_eq!(summary["income_by_category"], json!([]));
    }

    #[tokio::test]
    async fn rejects_invalid_month() {
        let (server, token, _) = get_test_client();

        for month in ["13", "0", "march"] {
            let response = server
                .get(endpoints::DASHBOARD)
                .add_query_param("month", month)
                .authorization_bearer(&token)
                .await;

            response.assert_status(StatusCode::BAD_REQUEST);
            response.assert_json(&json!({"month": ["Month must be between 1 and 12"]}));
        }
    }
}
