//! Budget endpoints, including the lookup for the current month.

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
    budget::{
        Budget, BudgetData, BudgetId, count_budgets, create_budget, delete_budget, get_budget,
        get_budget_for_month, list_budgets, update_budget, validate_budget,
    },
    clock::Clock,
    extract::{ApiJson, ApiPath, ApiQuery},
    pagination::{Page, PageRequest, PaginationConfig},
    user::UserID,
};

/// The state needed by the budget endpoints.
#[derive(Debug, Clone)]
pub struct BudgetState {
    /// The database connection
    pub db_connection: Arc<Mutex<Connection>>,
    /// Used for timestamps, the current month and the latest allowed year.
    pub clock: Arc<dyn Clock>,
    /// Controls the size of list pages.
    pub pagination_config: PaginationConfig,
}

impl FromRef<AppState> for BudgetState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            clock: state.clock.clone(),
            pagination_config: state.pagination_config.clone(),
        }
    }
}

/// The query parameters accepted by the budget list endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct BudgetListParams {
    /// The 1-based page number.
    pub page: Option<String>,
    /// The number of budgets per page.
    pub page_size: Option<String>,
}

/// List the caller's budgets, latest month first.
pub async fn list_budgets_endpoint(
    State(state): State<BudgetState>,
    Extension(user_id): Extension<UserID>,
    uri: Uri,
    ApiQuery(params): ApiQuery<BudgetListParams>,
) -> Result<Json<Page<Budget>>, Error> {
    let page_request = PageRequest::new(
        params.page.as_deref(),
        params.page_size.as_deref(),
        &state.pagination_config,
    )?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let count = count_budgets(user_id, &connection)?;
    page_request.check(count)?;

    let budgets = list_budgets(
        user_id,
        page_request.limit(),
        page_request.offset(),
        &connection,
    )?;

    Ok(Json(page_request.into_page(budgets, count, &uri)))
}

/// Create a budget owned by the caller.
pub async fn create_budget_endpoint(
    State(state): State<BudgetState>,
    Extension(user_id): Extension<UserID>,
    ApiJson(data): ApiJson<BudgetData>,
) -> Result<(StatusCode, Json<Budget>), Error> {
    let now = state.clock.now();
    let new_budget = validate_budget(data, None, now.year())?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let budget = create_budget(user_id, new_budget, now, &connection)?;
    tracing::debug!(
        "User {user_id} set a budget of {} for {}/{}",
        budget.amount,
        budget.month,
        budget.year
    );

    Ok((StatusCode::CREATED, Json(budget)))
}

/// Get the caller's budget for the current month.
pub async fn get_current_month_budget_endpoint(
    State(state): State<BudgetState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<Budget>, Error> {
    let today = state.clock.today();

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    get_budget_for_month(user_id, today.month().into(), today.year(), &connection)?
        .map(Json)
        .ok_or(Error::NoBudgetForCurrentMonth)
}

/// Get one of the caller's budgets.
pub async fn get_budget_endpoint(
    State(state): State<BudgetState>,
    Extension(user_id): Extension<UserID>,
    ApiPath(budget_id): ApiPath<BudgetId>,
) -> Result<Json<Budget>, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    get_budget(budget_id, user_id, &connection).map(Json)
}

/// Replace one of the caller's budgets.
pub async fn update_budget_endpoint(
    State(state): State<BudgetState>,
    Extension(user_id): Extension<UserID>,
    ApiPath(budget_id): ApiPath<BudgetId>,
    ApiJson(data): ApiJson<BudgetData>,
) -> Result<Json<Budget>, Error> {
    save_budget(state, user_id, budget_id, data, false)
}

/// Change some fields of one of the caller's budgets.
pub async fn partial_update_budget_endpoint(
    State(state): State<BudgetState>,
    Extension(user_id): Extension<UserID>,
    ApiPath(budget_id): ApiPath<BudgetId>,
    ApiJson(data): ApiJson<BudgetData>,
) -> Result<Json<Budget>, Error> {
    save_budget(state, user_id, budget_id, data, true)
}

fn save_budget(
    state: BudgetState,
    user_id: UserID,
    budget_id: BudgetId,
    data: BudgetData,
    partial: bool,
) -> Result<Json<Budget>, Error> {
    let now = state.clock.now();

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let existing = get_budget(budget_id, user_id, &connection)?;
    let new_budget = validate_budget(data, partial.then_some(&existing), now.year())?;

    update_budget(budget_id, user_id, new_budget, now, &connection).map(Json)
}

/// Delete one of the caller's budgets.
pub async fn delete_budget_endpoint(
    State(state): State<BudgetState>,
    Extension(user_id): Extension<UserID>,
    ApiPath(budget_id): ApiPath<BudgetId>,
) -> Result<StatusCode, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    delete_budget(budget_id, user_id, &connection)?;

    Ok(StatusCode::NO_CONTENT)
}
