//! HTTP API - a thin axum layer over the core operations.
//!
//! Handlers parse and validate request input, resolve the caller from the
//! `X-User-Id` header and delegate to `core`. No business rule lives here.
//!
//! ```text
//! /health                   GET
//! /worklogs                 GET (query), POST (create completed)
//! /worklogs/start           POST
//! /worklogs/:id             GET, PATCH, DELETE
//! /worklogs/:id/complete    POST
//! /balance                  GET
//! /balance/history          GET
//! /reports/summary          GET
//! ```

/// Balance and balance history endpoints
pub mod balance;
/// Reporting endpoints
pub mod reports;
/// Response envelope, error mapping and identity
pub mod response;
/// Worklog endpoints
pub mod worklogs;

use crate::core::worklog::{WorklogPolicy, WorklogService};
use axum::{
    Router,
    routing::{get, post},
};
use sea_orm::DatabaseConnection;
use serde_json::{Value, json};

pub use response::{ApiError, ApiResponse, ApiResult, USER_ID_HEADER};

/// Shared state handed to every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Database connection for read-only endpoints
    pub db: DatabaseConnection,
    /// Worklog operations bound to the configured policy
    pub worklogs: WorklogService,
}

impl AppState {
    /// Builds the state for `db` with the given worklog policy.
    #[must_use]
    pub fn new(db: DatabaseConnection, policy: WorklogPolicy) -> Self {
        Self {
            worklogs: WorklogService::new(db.clone(), policy),
            db,
        }
    }
}

async fn health() -> ApiResponse<Value> {
    ApiResponse::ok(json!({ "status": "ok" }))
}

/// Builds the complete router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/worklogs",
            get(worklogs::list_worklogs).post(worklogs::create_completed_work),
        )
        .route("/worklogs/start", post(worklogs::start_work))
        .route(
            "/worklogs/:id",
            get(worklogs::get_worklog)
                .patch(worklogs::modify_work)
                .delete(worklogs::delete_work),
        )
        .route("/worklogs/:id/complete", post(worklogs::complete_work))
        .route("/balance", get(balance::get_balance))
        .route("/balance/history", get(balance::get_history))
        .route("/reports/summary", get(reports::get_summary))
        .with_state(state)
}
