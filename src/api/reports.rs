//! Reporting endpoints.

use super::{
    AppState,
    balance::DateRangeParams,
    response::{ApiResponse, ApiResult, current_user},
};
use crate::core::{
    report::{self, WorkSummary},
    time::parse_timestamp,
};
use axum::{
    extract::{Query, State, rejection::QueryRejection},
    http::HeaderMap,
};

/// `GET /reports/summary`
pub async fn get_summary(
    State(state): State<AppState>,
    headers: HeaderMap,
    params: Result<Query<DateRangeParams>, QueryRejection>,
) -> ApiResult<WorkSummary> {
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

    let summary = report::summarize(&state.db, user_id, start_date, end_date).await?;
    Ok(ApiResponse::ok(summary))
}
