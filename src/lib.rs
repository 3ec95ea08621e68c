//! A personal finance tracker.
//!
//! Users record income and expense transactions grouped by category, set
//! monthly budgets and read a dashboard summary of their finances.
//!
//! This library provides a JSON REST API authenticated with bearer tokens.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum_server::Handle;
use tokio::signal;

mod app_state;
mod auth;
mod budget;
mod category;
mod clock;
mod dashboard;
mod database_id;
mod db;
mod endpoints;
mod error;
mod extract;
mod kind;
mod logging;
mod money;
mod not_found;
mod pagination;
mod password;
mod routing;
mod timezone;
mod transaction;
mod user;
mod validation;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use auth::DEFAULT_TOKEN_DURATION;
pub use budget::{Budget, NewBudget, create_budget, get_budget_for_month};
pub use category::{Category, CategoryName, NewCategory, create_category};
pub use clock::{Clock, FixedClock, SystemClock};
pub use db::initialize as initialize_db;
pub use error::Error;
pub use kind::Kind;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use money::Money;
pub use pagination::PaginationConfig;
pub use password::{PasswordHash, ValidatedPassword};
pub use routing::build_router;
pub use transaction::{NewTransaction, Transaction, create_transaction};
pub use user::{
    NewUser, User, UserID, create_user, delete_user, get_user_by_id, get_user_by_username,
};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {error}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(error) => {
                tracing::error!("failed to install signal handler: {error}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}
