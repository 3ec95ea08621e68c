//! Category list, create, retrieve, update and delete endpoints.

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
    category::{
        Category, CategoryData, CategoryId, CategoryOrdering, CategoryQuery, count_categories,
        create_category, delete_category, get_category, list_categories, update_category,
        validate_category,
    },
    clock::Clock,
    extract::{ApiJson, ApiPath, ApiQuery},
    kind::KindFilter,
    pagination::{Page, PageRequest, PaginationConfig},
    user::UserID,
};

/// The state needed by the category endpoints.
#[derive(Debug, Clone)]
pub struct CategoryState {
    /// The database connection
    pub db_connection: Arc<Mutex<Connection>>,
    /// Used for the created and updated timestamps.
    pub clock: Arc<dyn Clock>,
    /// Controls the size of list pages.
    pub pagination_config: PaginationConfig,
}

impl FromRef<AppState> for CategoryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            clock: state.clock.clone(),
            pagination_config: state.pagination_config.clone(),
        }
    }
}

/// The query parameters accepted by the category list endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct CategoryListParams {
    /// Only list categories of this kind.
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// Only list categories whose name contains this text.
    pub search: Option<String>,
    /// One of `name`, `-name`, `created_at` or `-created_at`.
    pub ordering: Option<String>,
    /// The 1-based page number.
    pub page: Option<String>,
    /// The number of categories per page.
    pub page_size: Option<String>,
}

/// List the caller's categories.
pub async fn list_categories_endpoint(
    State(state): State<CategoryState>,
    Extension(user_id): Extension<UserID>,
    uri: Uri,
    ApiQuery(params): ApiQuery<CategoryListParams>,
) -> Result<Json<Page<Category>>, Error> {
    let page_request = PageRequest::new(
        params.page.as_deref(),
        params.page_size.as_deref(),
        &state.pagination_config,
    )?;
    let mut query = CategoryQuery {
        kind: KindFilter::from_param(params.kind.as_deref()),
        search: params.search,
        ordering: CategoryOrdering::from_param(params.ordering.as_deref()),
        limit: None,
        offset: 0,
    };

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let count = count_categories(user_id, &query, &connection)?;
    page_request.check(count)?;

    query.limit = Some(page_request.limit());
    query.offset = page_request.offset();
    let categories = list_categories(user_id, &query, &connection)?;

    Ok(Json(page_request.into_page(categories, count, &uri)))
}

/// Create a category owned by the caller.
pub async fn create_category_endpoint(
    State(state): State<CategoryState>,
    Extension(user_id): Extension<UserID>,
    ApiJson(data): ApiJson<CategoryData>,
) -> Result<(StatusCode, Json<Category>), Error> {
    let new_category = validate_category(data, None)?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let category = create_category(user_id, new_category, state.clock.now(), &connection)?;
    tracing::debug!("User {user_id} created category {}", category.id);

    Ok((StatusCode::CREATED, Json(category)))
}

/// Get one of the caller's categories.
pub async fn get_category_endpoint(
    State(state): State<CategoryState>,
    Extension(user_id): Extension<UserID>,
    ApiPath(category_id): ApiPath<CategoryId>,
) -> Result<Json<Category>, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    get_category(category_id, user_id, &connection).map(Json)
}

/// Replace every field of one of the caller's categories.
pub async fn update_category_endpoint(
    State(state): State<CategoryState>,
    Extension(user_id): Extension<UserID>,
    ApiPath(category_id): ApiPath<CategoryId>,
    ApiJson(data): ApiJson<CategoryData>,
) -> Result<Json<Category>, Error> {
    save_category(state, user_id, category_id, data, false)
}

/// Change some fields of one of the caller's categories.
pub async fn partial_update_category_endpoint(
    State(state): State<CategoryState>,
    Extension(user_id): Extension<UserID>,
    ApiPath(category_id): ApiPath<CategoryId>,
    ApiJson(data): ApiJson<CategoryData>,
) -> Result<Json<Category>, Error> {
    save_category(state, user_id, category_id, data, true)
}

fn save_category(
    state: CategoryState,
    user_id: UserID,
    category_id: CategoryId,
    data: CategoryData,
    partial: bool,
) -> Result<Json<Category>, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let existing = get_category(category_id, user_id, &connection)?;
    let new_category = validate_category(data, partial.then_some(&existing))?;

    update_category(
        category_id,
        user_id,
        new_category,
        state.clock.now(),
        &connection,
    )
    .map(Json)
}

/// Delete one of the caller's categories.
///
/// Transactions in the category are kept without a category.
pub async fn delete_category_endpoint(
    State(state): State<CategoryState>,
    Extension(user_id): Extension<UserID>,
    ApiPath(category_id): ApiPath<CategoryId>,
) -> Result<StatusCode, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    delete_category(category_id, user_id, &connection)?;
    tracing::debug!("User {user_id} deleted category {category_id}");

    Ok(StatusCode::NO_CONTENT)
}
