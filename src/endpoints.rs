//! The paths of the app's routes.
//!
//! Paths with an `{id}` parameter can be filled in with [format_endpoint].

/// Log in with a username and password to get a token.
pub const LOG_IN: &str = "/api/auth/login/";
/// Revoke the token used for the request.
pub const LOG_OUT: &str = "/api/auth/logout/";
/// The profile of the authenticated user.
pub const CURRENT_USER: &str = "/api/auth/user/";

/// List and create categories.
pub const CATEGORIES: &str = "/api/categories/";
/// Retrieve, update and delete a category.
pub const CATEGORY: &str = "/api/categories/{id}/";

/// List and create transactions.
pub const TRANSACTIONS: &str = "/api/transactions/";
/// Retrieve, update and delete a transaction.
pub const TRANSACTION: &str = "/api/transactions/{id}/";

/// List and create budgets.
pub const BUDGETS: &str = "/api/budgets/";
/// Retrieve, update and delete a budget.
pub const BUDGET: &str = "/api/budgets/{id}/";
/// The budget for the current month.
pub const CURRENT_MONTH_BUDGET: &str = "/api/budgets/current-month/";

/// The dashboard summary.
pub const DASHBOARD: &str = "/api/dashboard/";

/// Is the server up?
pub const COFFEE: &str = "/api/coffee";

/// Replace the first `{...}` parameter in `endpoint_path` with `id`.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let Some(param_start) = endpoint_path.find('{') else {
        return endpoint_path.to_owned();
    };

    let param_end = endpoint_path[param_start..]
        .find('}')
        .map(|offset| param_start + offset + 1)
        .unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}

// These tests are here so that we know when we call `Uri::from_shared` it will not panic.
#[cfg(test)]
mod endpoints_tests {
    use axum::http::Uri;

    use crate::endpoints;

    use super::format_endpoint;

    #[track_caller]
    fn assert_endpoint_is_valid_uri(uri: &str) {
        assert!(uri.parse::<Uri>().is_ok(), "{uri} is not a valid URI");
    }

    #[test]
    fn endpoints_are_valid_uris() {
        assert_endpoint_is_valid_uri(endpoints::LOG_IN);
        assert_endpoint_is_valid_uri(endpoints::LOG_OUT);
        assert_endpoint_is_valid_uri(endpoints::CURRENT_USER);
        assert_endpoint_is_valid_uri(endpoints::CATEGORIES);
        assert_endpoint_is_valid_uri(endpoints::TRANSACTIONS);
        assert_endpoint_is_valid_uri(endpoints::BUDGETS);
        assert_endpoint_is_valid_uri(endpoints::CURRENT_MONTH_BUDGET);
        assert_endpoint_is_valid_uri(endpoints::DASHBOARD);
        assert_endpoint_is_valid_uri(endpoints::COFFEE);
    }

    #[test]
    fn formatted_endpoints_are_valid_uris() {
        assert_endpoint_is_valid_uri(&format_endpoint(endpoints::CATEGORY, 1));
        assert_endpoint_is_valid_uri(&format_endpoint(endpoints::TRANSACTION, 2));
        assert_endpoint_is_valid_uri(&format_endpoint(endpoints::BUDGET, 3));
    }

    #[test]
    fn format_endpoint_replaces_parameter() {
        assert_eq!(
            format_endpoint(endpoints::CATEGORY, 42),
            "/api/categories/42/"
        );
    }

    #[test]
    fn format_endpoint_without_parameter_is_unchanged() {
        assert_eq!(
            format_endpoint(endpoints::CATEGORIES, 42),
            endpoints::CATEGORIES
        );
    }
}
