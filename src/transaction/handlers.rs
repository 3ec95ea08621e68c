//! Transaction list, create, retrieve, update and delete endpoints.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
    http::{StatusCode, Uri},
};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    category::CategoryId,
    clock::Clock,
    extract::{ApiJson, ApiPath, ApiQuery},
    kind::KindFilter,
    money::Money,
    pagination::{Page, PageRequest, PaginationConfig},
    transaction::{
        Transaction, TransactionData, TransactionId, TransactionOrdering, TransactionQuery,
        count_transactions, create_transaction, delete_transaction, get_transaction,
        list_transactions, parse_date, update_transaction, validate_transaction,
    },
    user::UserID,
    validation::FieldErrors,
};

/// The state needed by the transaction endpoints.
#[derive(Debug, Clone)]
pub struct TransactionState {
    /// The database connection
    pub db_connection: Arc<Mutex<Connection>>,
    /// Used for the created and updated timestamps.
    pub clock: Arc<dyn Clock>,
    /// Controls the size of list pages.
    pub pagination_config: PaginationConfig,
}

impl FromRef<AppState> for TransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            clock: state.clock.clone(),
            pagination_config: state.pagination_config.clone(),
        }
    }
}

/// The query parameters accepted by the transaction list endpoint.
///
/// Empty values are ignored.
#[derive(Debug, Default, Deserialize)]
pub struct TransactionListParams {
    /// Either "income" or "expense".
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// A category ID.
    pub category: Option<String>,
    /// Inclusive, `YYYY-MM-DD`.
    pub start_date: Option<String>,
    /// Inclusive, `YYYY-MM-DD`.
    pub end_date: Option<String>,
    /// Inclusive.
    pub min_amount: Option<String>,
    /// Inclusive.
    pub max_amount: Option<String>,
    /// Text to look for in the description or category name.
    pub search: Option<String>,
    /// One of `date`, `amount` or `created_at`, optionally prefixed with `-`.
    pub ordering: Option<String>,
    /// The 1-based page number.
    pub page: Option<String>,
    /// The number of transactions per page.
    pub page_size: Option<String>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|value| !value.trim().is_empty())
}

impl TransactionListParams {
    fn to_query(&self) -> Result<TransactionQuery, Error> {
        let mut errors = FieldErrors::new();

        let category_id = non_empty(&self.category).and_then(|raw_category| {
            errors.check(
                "category",
                raw_category
                    .trim()
                    .parse::<CategoryId>()
                    .map_err(|_| "A valid integer is required.".to_owned()),
            )
        });
        let start_date = non_empty(&self.start_date)
            .and_then(|raw_date| errors.check("start_date", parse_date(raw_date)));
        let end_date = non_empty(&self.end_date)
            .and_then(|raw_date| errors.check("end_date", parse_date(raw_date)));
        let min_amount = non_empty(&self.min_amount).and_then(|raw_amount| {
            errors.check("min_amount", Money::parse_lower_bound(raw_amount))
        });
        let max_amount = non_empty(&self.max_amount).and_then(|raw_amount| {
            errors.check("max_amount", Money::parse_upper_bound(raw_amount))
        });

        errors.into_result()?;

        Ok(TransactionQuery {
            kind: KindFilter::from_param(self.kind.as_deref()),
            category_id,
            start_date,
            end_date,
            min_amount,
            max_amount,
            search: self.search.clone(),
            ordering: TransactionOrdering::from_param(self.ordering.as_deref()),
            limit: None,
            offset: 0,
        })
    }
}

/// List the caller's transactions.
pub async fn list_transactions_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    uri: Uri,
    ApiQuery(params): ApiQuery<TransactionListParams>,
) -> Result<Json<Page<Transaction>>, Error> {
    let page_request = PageRequest::new(
        params.page.as_deref(),
        params.page_size.as_deref(),
        &state.pagination_config,
    )?;
    let mut query = params.to_query()?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let count = count_transactions(user_id, &query, &connection)?;
    page_request.check(count)?;

    query.limit = Some(page_request.limit());
    query.offset = page_request.offset();
    let transactions = list_transactions(user_id, &query, &connection)?;

    Ok(Json(page_request.into_page(transactions, count, &uri)))
}

/// Create a transaction owned by the caller.
pub async fn create_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    ApiJson(data): ApiJson<TransactionData>,
) -> Result<(StatusCode, Json<Transaction>), Error> {
    let new_transaction = validate_transaction(data, None, false)?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let transaction =
        create_transaction(user_id, new_transaction, state.clock.now(), &connection)?;
    tracing::debug!("User {user_id} created transaction {}", transaction.id);

    Ok((StatusCode::CREATED, Json(transaction)))
}

/// Get one of the caller's transactions.
pub async fn get_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    ApiPath(transaction_id): ApiPath<TransactionId>,
) -> Result<Json<Transaction>, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    get_transaction(transaction_id, user_id, &connection).map(Json)
}

/// Replace one of the caller's transactions.
pub async fn update_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    ApiPath(transaction_id): ApiPath<TransactionId>,
    ApiJson(data): ApiJson<TransactionData>,
) -> Result<Json<Transaction>, Error> {
    save_transaction(state, user_id, transaction_id, data, false)
}

/// Change some fields of one of the caller's transactions.
pub async fn partial_update_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    ApiPath(transaction_id): ApiPath<TransactionId>,
    ApiJson(data): ApiJson<TransactionData>,
) -> Result<Json<Transaction>, Error> {
    save_transaction(state, user_id, transaction_id, data, true)
}

fn save_transaction(
    state: TransactionState,
    user_id: UserID,
    transaction_id: TransactionId,
    data: TransactionData,
    partial: bool,
) -> Result<Json<Transaction>, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let existing = get_transaction(transaction_id, user_id, &connection)?;
    let new_transaction = validate_transaction(data, Some(&existing), partial)?;

    update_transaction(
        transaction_id,
        user_id,
        new_transaction,
        state.clock.now(),
        &connection,
    )
    .map(Json)
}

/// Delete one of the caller's transactions.
pub async fn delete_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    ApiPath(transaction_id): ApiPath<TransactionId>,
) -> Result<StatusCode, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    delete_transaction(transaction_id, user_id, &connection)?;
    tracing::debug!("User {user_id} deleted transaction {transaction_id}");

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod transaction_endpoint_tests {
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use serde_json::{Value, json};
    use time::macros::datetime;

    use crate::{
        clock::FixedClock,
        endpoints::{self, format_endpoint},
        test_utils::{create_test_token, create_test_user, get_test_server, get_test_state},
    };

    struct TestClient {
        server: TestServer,
        token: String,
        other_token: String,
    }

    fn get_test_client() -> TestClient {
        let state = get_test_state(FixedClock(datetime!(2025-03-15 09:30 UTC)));
        let user = create_test_user(&state, "test");
        let other_user = create_test_user(&state, "other");
        let token = create_test_token(&state, user.id).as_str().to_owned();
        let other_token = create_test_token(&state, other_user.id).as_str().to_owned();

        TestClient {
            server: get_test_server(state),
            token,
            other_token,
        }
    }

    async fn post(client: &TestClient, token: &str, path: &str, body: Value) -> Value {
        let response = client
            .server
            .post(path)
            .authorization_bearer(token)
            .json(&body)
            .await;
        response.assert_status(StatusCode::CREATED);
        response.json()
    }

    #[tokio::test]
    async fn can_create_transaction_with_category() {
        let client = get_test_client();
        let category = post(
            &client,
            &client.token,
            endpoints::CATEGORIES,
            json!({"name": "Salary", "type": "income"}),
        )
        .await;

        let transaction = post(
            &client,
            &client.token,
            endpoints::TRANSACTIONS,
            json!({
                "category": category["id"],
                "type": "income",
                "amount": "50000.00",
                "description": "March pay",
                "date": "2025-03-15",
            }),
        )
        .await;

        assert_eq!(transaction["category"], category["id"]);
        assert_eq!(transaction["category_name"], "Salary");
        assert_eq!(transaction["amount"], "50000.00");
        assert_eq!(transaction["date"], "2025-03-15");
        assert_eq!(transaction["type"], "income");
    }

    #[tokio::test]
    async fn zero_amount_is_rejected() {
        let client = get_test_client();

        let response = client
            .server
            .post(endpoints::TRANSACTIONS)
            .authorization_bearer(&client.token)
            .json(&json!({"type": "expense", "amount": "0.00", "date": "2025-03-15"}))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        response.assert_json(&json!({
            "amount": ["Ensure this value is greater than or equal to 0.01."]
        }));
    }

    #[tokio::test]
    async fn other_users_category_is_rejected() {
        let client = get_test_client();
        let category = post(
            &client,
            &client.other_token,
            endpoints::CATEGORIES,
            json!({"name": "Food", "type": "expense"}),
        )
        .await;

        let response = client
            .server
            .post(endpoints::TRANSACTIONS)
            .authorization_bearer(&client.token)
            .json(&json!({
                "category": category["id"],
                "type": "expense",
                "amount": "10.00",
                "date": "2025-03-15",
            }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        response.assert_json(&json!({"category": ["Invalid category."]}));
    }

    #[tokio::test]
    async fn list_filters_and_paginates() {
        let client = get_test_client();
        for (amount, date) in [("10.00", "2025-01-10"), ("20.00", "2025-02-10"), ("30.00", "2025-03-10")] {
            post(
                &client,
                &client.token,
                endpoints::TRANSACTIONS,
                json!({"type": "expense", "amount": amount, "date": date}),
            )
            .await;
        }

        let response = client
            .server
            .get(endpoints::TRANSACTIONS)
            .add_query_param("start_date", "2025-02-01")
            .add_query_param("page_size", "1")
            .authorization_bearer(&client.token)
            .await;

        response.assert_status_ok();
        let page: Value = response.json();
        assert_eq!(page["count"], 2);
        assert_eq!(page["results"][0]["amount"], "30.00");
        assert_eq!(page["next"], "/api/transactions/?start_date=2025-02-01&page_size=1&page=2");
        assert_eq!(page["previous"], Value::Null);
    }

    #[tokio::test]
    async fn list_rejects_bad_date_filter() {
        let client = get_test_client();

        let response = client
            .server
            .get(endpoints::TRANSACTIONS)
            .add_query_param("end_date", "yesterday")
            .authorization_bearer(&client.token)
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn page_past_the_end_is_not_found() {
        let client = get_test_client();

        let response = client
            .server
            .get(endpoints::TRANSACTIONS)
            .add_query_param("page", "2")
            .authorization_bearer(&client.token)
            .await;

        response.assert_status(StatusCode::NOT_FOUND);
        response.assert_json(&json!({"detail": "Invalid page."}));
    }

    #[tokio::test]
    async fn huge_page_number_is_not_found() {
        let client = get_test_client();

        let response = client
            .server
            .get(endpoints::TRANSACTIONS)
            .add_query_param("page", "9223372036854775807")
            .authorization_bearer(&client.token)
            .await;

        response.assert_status(StatusCode::NOT_FOUND);
        response.assert_json(&json!({"detail": "Invalid page."}));
    }

    #[tokio::test]
    async fn list_with_unknown_type_is_empty() {
        let client = get_test_client();
        post(
            &client,
            &client.token,
            endpoints::TRANSACTIONS,
            json!({"type": "expense", "amount": "10.00", "date": "2025-03-15"}),
        )
        .await;

        let response = client
            .server
            .get(endpoints::TRANSACTIONS)
            .add_query_param("type", "transfer")
            .authorization_bearer(&client.token)
            .await;

        response.assert_status_ok();
        let page: Value = response.json();
        assert_eq!(page["count"], 0);
        assert_eq!(page["results"], json!([]));
    }

    #[tokio::test]
    async fn put_without_optional_fields_keeps_them() {
        let client = get_test_client();
        let category = post(
            &client,
            &client.token,
            endpoints::CATEGORIES,
            json!({"name": "Food", "type": "expense"}),
        )
        .await;
        let transaction = post(
            &client,
            &client.token,
            endpoints::TRANSACTIONS,
            json!({
                "category": category["id"],
                "type": "expense",
                "amount": "10.00",
                "description": "Lunch",
                "date": "2025-03-15",
            }),
        )
        .await;
        let path = format_endpoint(endpoints::TRANSACTION, transaction["id"].as_i64().unwrap());

        let response = client
            .server
            .put(&path)
            .authorization_bearer(&client.token)
            .json(&json!({"type": "expense", "amount": "12.00", "date": "2025-03-16"}))
            .await;

        response.assert_status_ok();
        let updated: Value = response.json();
        assert_eq!(updated["amount"], "12.00");
        assert_eq!(updated["date"], "2025-03-16");
        assert_eq!(updated["description"], "Lunch");
        assert_eq!(updated["category"], category["id"]);

        let response = client
            .server
            .put(&path)
            .authorization_bearer(&client.token)
            .json(&json!({"description": "Dinner"}))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        response.assert_json(&json!({
            "type": ["This field is required."],
            "amount": ["This field is required."],
            "date": ["This field is required."],
        }));
    }

    #[tokio::test]
    async fn patch_and_delete_transaction() {
        let client = get_test_client();
        let transaction = post(
            &client,
            &client.token,
            endpoints::TRANSACTIONS,
            json!({"type": "expense", "amount": "10.00", "date": "2025-03-15"}),
        )
        .await;
        let path = format_endpoint(endpoints::TRANSACTION, transaction["id"].as_i64().unwrap());

        let response = client
            .server
            .patch(&path)
            .authorization_bearer(&client.token)
            .json(&json!({"description": "Coffee"}))
            .await;
        response.assert_status_ok();
        let updated: Value = response.json();
        assert_eq!(updated["description"], "Coffee");
        assert_eq!(updated["amount"], "10.00");

        client
            .server
            .delete(&path)
            .authorization_bearer(&client.other_token)
            .await
            .assert_status(StatusCode::NOT_FOUND);
        client
            .server
            .delete(&path)
            .authorization_bearer(&client.token)
            .await
            .assert_status(StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn requires_authentication() {
        let client = get_test_client();

        let response = client.server.get(endpoints::TRANSACTIONS).await;

        response.assert_status(StatusCode::UNAUTHORIZED);
        response.assert_json(&json!({"detail": "Authentication credentials were not provided."}));
    }
}
