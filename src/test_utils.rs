//! Shared test utilities for the overtime tracker.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test users and worklogs with sensible defaults.

use crate::{
    api::{self, AppState, USER_ID_HEADER},
    core::{
        user,
        worklog::{DeletePolicy, WorklogPolicy, WorklogService},
    },
    entities::{self, WorkLocation, worklog},
    errors::Result,
};
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use chrono::{DateTime, TimeZone, Utc};
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use serde_json::Value;
use tower::ServiceExt;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Creates a test user with the given starting balance.
pub async fn create_test_user(
    db: &DatabaseConnection,
    name: &str,
    balance: i64,
) -> Result<entities::user::Model> {
    user::create_user(db, name, balance).await
}

/// Sets up a complete test environment with one user.
/// Returns (db, user) for common test scenarios.
pub async fn setup_with_user(balance: i64) -> Result<(DatabaseConnection, entities::user::Model)> {
    let db = setup_test_db().await?;
    let user = create_test_user(&db, "test_user", balance).await?;
    Ok((db, user))
}

/// Policy used by most tests: one balance minute per worked minute, completed
/// worklogs are refunded on delete.
#[must_use]
pub const fn test_policy() -> WorklogPolicy {
    WorklogPolicy {
        cost_per_minute: 1,
        delete_policy: DeletePolicy::RefundCompleted,
    }
}

/// Creates a worklog service over `db` with [`test_policy`].
#[must_use]
pub fn test_service(db: &DatabaseConnection) -> WorklogService {
    WorklogService::new(db.clone(), test_policy())
}

/// 2024-01-15 at the given time, UTC.
///
/// # Panics
/// Panics on an out-of-range hour or minute.
#[must_use]
pub fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    on(15, hour, minute)
}

/// The given day of January 2024 at the given time, UTC.
///
/// # Panics
/// Panics on an out-of-range day, hour or minute.
#[must_use]
#[allow(clippy::unwrap_used)]
pub fn on(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, day, hour, minute, 0).unwrap()
}

/// Inserts a completed office worklog directly, bypassing the ledger.
/// Use this when a test needs a worklog row but not its balance effect.
pub async fn insert_completed_worklog(
    db: &DatabaseConnection,
    user_id: i64,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    cost: i64,
) -> Result<worklog::Model> {
    let now = Utc::now();
    worklog::ActiveModel {
        user_id: Set(user_id),
        start_time: Set(start_time),
        end_time: Set(Some(end_time)),
        description: Set(None),
        location: Set(WorkLocation::Office),
        cost: Set(Some(cost)),
        is_deleted: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Builds the HTTP router over `db` with [`test_policy`].
#[must_use]
pub fn test_app(db: &DatabaseConnection) -> Router {
    api::build_router(AppState::new(db.clone(), test_policy()))
}

/// Sends one request through `app` and returns the status and JSON body.
///
/// `user_id` becomes the identity header; `body` is sent as JSON.
///
/// # Panics
/// Panics if the request cannot be built or the response is not JSON.
#[allow(clippy::unwrap_used)]
pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    user_id: Option<i64>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(id) = user_id {
        builder = builder.header(USER_ID_HEADER, id.to_string());
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}
