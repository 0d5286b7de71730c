//! Balance endpoints.

use super::{
    AppState,
    response::{ApiResponse, ApiResult, current_user},
};
use crate::core::{
    balance::{self as ledger, HistoryEntry},
    time::parse_timestamp,
};
use axum::{
    extract::{Query, State, rejection::QueryRejection},
    http::HeaderMap,
};
use serde::{Deserialize, Serialize};

/// Optional inclusive date range shared by history and report queries.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRangeParams {
    /// Lower bound, inclusive
    pub start_date: Option<String>,
    /// Upper bound, inclusive
    pub end_date: Option<String>,
}

/// Response of `GET /balance`.
#[derive(Debug, Serialize)]
pub struct BalanceView {
    balance: i64,
}

/// `GET /balance`
pub async fn get_balance(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<BalanceView> {
    let user_id = current_user(&headers)?;
    let balance = ledger::get_balance(&state.db, user_id).await?;
    Ok(ApiResponse::ok(BalanceView { balance }))
}

/// `GET /balance/history`
pub async fn get_history(
    State(state): State<AppState>,
    headers: HeaderMap,
    params: Result<Query<DateRangeParams>, QueryRejection>,
) -> ApiResult<Vec<HistoryEntry>> {
    let user_id = current_user(&headers)?;
    let Query(params) = params?;

    let start_date = params
        .start_date
        .as_deref()
        .map(|v| parse_timestamp(v, "startDate"))
        .transpose()?;
    let end_date = params
        .end_date
        .as_deref()
        .map(|v| parse_timestamp(v, "endDate"))
        .transpose()?;

    let entries = ledger::get_history_with_worklogs(&state.db, user_id, start_date, end_date).await?;
    Ok(ApiResponse::ok(entries))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use crate::errors::Result;
    use crate::test_utils::*;
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_get_balance() -> Result<()> {
        let (db, user) = setup_with_user(480).await?;
        let app = test_app(&db);

        let (status, body) = send(&app, "GET", "/balance", Some(user.id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "success": true, "data": { "balance": 480 } }));

        let (status, body) = send(&app, "GET", "/balance", Some(999), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "USER_NOT_FOUND");

        Ok(())
    }

    #[tokio::test]
    async fn test_history_includes_worklog() -> Result<()> {
        let (db, user) = setup_with_user(480).await?;
        let app = test_app(&db);
        let service = test_service(&db);

        let created = service
            .create_completed_work(
                user.id,
                crate::core::worklog::CompletedWork {
                    start_time: at(9, 0),
                    end_time: at(9, 45),
                    location: crate::entities::WorkLocation::Office,
                    description: Some("Deploy".to_string()),
                },
            )
            .await?;

        let (status, body) = send(&app, "GET", "/balance/history", Some(user.id), None).await;
        assert_eq!(status, StatusCode::OK);

        let entries = body["data"].as_array().unwrap();
        assert_eq!(entries.len(), 2);
        // Newest first
        assert_eq!(entries[0]["amount"], -45);
        assert_eq!(entries[0]["type"], "WORKLOG");
        assert_eq!(entries[0]["worklogId"], created.id);
        assert_eq!(entries[0]["worklog"]["description"], "Deploy");
        assert_eq!(entries[1]["type"], "MANUAL");
        assert_eq!(entries[1]["worklog"], serde_json::Value::Null);

        Ok(())
    }

    #[tokio::test]
    async fn test_history_range_validation() -> Result<()> {
        let (db, user) = setup_with_user(480).await?;
        let app = test_app(&db);

        let (status, body) = send(
            &app,
            "GET",
            "/balance/history?startDate=2024-03-01&endDate=2024-01-01",
            Some(user.id),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

        let (status, _) = send(
            &app,
            "GET",
            "/balance/history?startDate=soon",
            Some(user.id),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        // Everything so far happened after this date
        let (status, body) = send(
            &app,
            "GET",
            "/balance/history?endDate=2000-01-01",
            Some(user.id),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], json!([]));

        Ok(())
    }
}
