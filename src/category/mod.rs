//! Categories for grouping income and expense transactions.

mod db;
mod domain;
mod handlers;

pub use db::{
    CategoryOrdering, CategoryQuery, count_categories, create_category, create_category_table,
    delete_category, get_category, list_categories, update_category,
};
pub(crate) use db::escape_like;
pub use domain::{
    Category, CategoryData, CategoryId, CategoryName, MAX_CATEGORY_NAME_LENGTH, NewCategory,
    validate_category,
};
pub use handlers::{
    CategoryListParams, CategoryState, create_category_endpoint, delete_category_endpoint,
    get_category_endpoint, list_categories_endpoint, partial_update_category_endpoint,
    update_category_endpoint,
};
