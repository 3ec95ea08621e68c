//! Income and expense transactions.

mod db;
mod domain;
mod handlers;

pub use db::{
    TransactionOrdering, TransactionQuery, count_transactions, create_transaction,
    create_transaction_table, delete_transaction, get_transaction, list_transactions,
    update_transaction,
};
pub(crate) use domain::parse_date;
pub use domain::{
    NewTransaction, Transaction, TransactionData, TransactionId, validate_transaction,
};
pub use handlers::{
    TransactionListParams, TransactionState, create_transaction_endpoint,
    delete_transaction_endpoint, get_transaction_endpoint, list_transactions_endpoint,
    partial_update_transaction_endpoint, update_transaction_endpoint,
};
