//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Router,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};

use crate::{
    AppState,
    auth::{auth_guard, get_current_user, post_log_in, post_log_out},
    budget::{
        create_budget_endpoint, delete_budget_endpoint, get_budget_endpoint,
        get_current_month_budget_endpoint, list_budgets_endpoint, partial_update_budget_endpoint,
        update_budget_endpoint,
    },
    category::{
        create_category_endpoint, delete_category_endpoint, get_category_endpoint,
        list_categories_endpoint, partial_update_category_endpoint, update_category_endpoint,
    },
    dashboard::get_dashboard,
    endpoints,
    not_found::get_404_not_found,
    transaction::{
        create_transaction_endpoint, delete_transaction_endpoint, get_transaction_endpoint,
        list_transactions_endpoint, partial_update_transaction_endpoint,
        update_transaction_endpoint,
    },
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::COFFEE, get(get_coffee))
        .route(endpoints::LOG_IN, post(post_log_in));

    let protected_routes = Router::new()
        .route(endpoints::LOG_OUT, post(post_log_out))
        .route(endpoints::CURRENT_USER, get(get_current_user))
        .route(
            endpoints::CATEGORIES,
            get(list_categories_endpoint).post(create_category_endpoint),
        )
        .route(
            endpoints::CATEGORY,
            get(get_category_endpoint)
                .put(update_category_endpoint)
                .patch(partial_update_category_endpoint)
                .delete(delete_category_endpoint),
        )
        .route(
            endpoints::TRANSACTIONS,
            get(list_transactions_endpoint).post(create_transaction_endpoint),
        )
        .route(
            endpoints::TRANSACTION,
            get(get_transaction_endpoint)
                .put(update_transaction_endpoint)
                .patch(partial_update_transaction_endpoint)
                .delete(delete_transaction_endpoint),
        )
        .route(
            endpoints::BUDGETS,
            get(list_budgets_endpoint).post(create_budget_endpoint),
        )
        .route(
            endpoints::CURRENT_MONTH_BUDGET,
            get(get_current_month_budget_endpoint),
        )
        .route(
            endpoints::BUDGET,
            get(get_budget_endpoint)
                .put(update_budget_endpoint)
                .patch(partial_update_budget_endpoint)
                .delete(delete_budget_endpoint),
        )
        .route(endpoints::DASHBOARD, get(get_dashboard))
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    protected_routes
        .merge(unprotected_routes)
        .fallback(get_404_not_found)
        .with_state(state)
}

/// Attempt to get a cup of coffee from the server.
async fn get_coffee() -> Response {
    (StatusCode::IM_A_TEAPOT, "I'm a teapot").into_response()
}

#[cfg(test)]
mod routing_tests {
    use axum::http::StatusCode;
    use serde_json::json;
    use time::macros::datetime;

    use crate::{
        clock::FixedClock,
        endpoints,
        test_utils::{get_test_server, get_test_state},
    };

    #[tokio::test]
    async fn coffee_is_a_teapot() {
        let server = get_test_server(get_test_state(FixedClock(datetime!(2025-01-01 0:00 UTC))));

        let response = server.get(endpoints::COFFEE).await;

        response.assert_status(StatusCode::IM_A_TEAPOT);
        response.assert_text("I'm a teapot");
    }

    #[tokio::test]
    async fn unknown_route_is_json_not_found() {
        let server = get_test_server(get_test_state(FixedClock(datetime!(2025-01-01 0:00 UTC))));

        let response = server.get("/api/nope/").await;

        response.assert_status(StatusCode::NOT_FOUND);
        response.assert_json(&json!({"detail": "Not found."}));
    }

    #[tokio::test]
    async fn record_routes_require_a_token() {
        let server = get_test_server(get_test_state(FixedClock(datetime!(2025-01-01 0:00 UTC))));

        for path in [
            endpoints::CATEGORIES,
            endpoints::TRANSACTIONS,
            endpoints::BUDGETS,
            endpoints::CURRENT_MONTH_BUDGET,
            endpoints::DASHBOARD,
            endpoints::CURRENT_USER,
        ] {
            server
                .get(path)
                .await
                .assert_status(StatusCode::UNAUTHORIZED);
        }
    }
}
