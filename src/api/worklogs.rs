//! Worklog endpoints.

use super::{
    AppState,
    response::{ApiResponse, ApiResult, current_user},
};
use crate::{
    core::{
        time::parse_timestamp,
        worklog::{
            CompletedWork, StartWork, WorklogChanges, WorklogFilter, WorklogQuery, WorklogStatus,
            query::DEFAULT_LIMIT,
        },
    },
    entities::{WorkLocation, worklog},
    errors::Result,
};
use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::HeaderMap,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Body of `POST /worklogs/start`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartWorkRequest {
    start_time: String,
    location: String,
    description: Option<String>,
}

/// Body of `POST /worklogs/:id/complete`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteWorkRequest {
    end_time: String,
}

/// Body of `PATCH /worklogs/:id`. Absent fields stay unchanged.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModifyWorkRequest {
    start_time: Option<String>,
    description: Option<String>,
    location: Option<String>,
}

/// Body of `POST /worklogs`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedWorkRequest {
    start_time: String,
    end_time: String,
    location: String,
    description: Option<String>,
}

/// Query string of `GET /worklogs`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListWorklogsParams {
    start_date: Option<String>,
    end_date: Option<String>,
    status: Option<String>,
    skip: Option<u64>,
    limit: Option<u64>,
}

/// One page of worklogs plus the total match count.
#[derive(Debug, Serialize)]
pub struct WorklogPage {
    worklogs: Vec<worklog::Model>,
    total: u64,
}

fn parse_optional(value: Option<&str>, field: &str) -> Result<Option<DateTime<Utc>>> {
    value.map(|v| parse_timestamp(v, field)).transpose()
}

impl ListWorklogsParams {
    fn into_query(self) -> Result<WorklogQuery> {
        Ok(WorklogQuery {
            filter: WorklogFilter {
                start_date: parse_optional(self.start_date.as_deref(), "startDate")?,
                end_date: parse_optional(self.end_date.as_deref(), "endDate")?,
                status: self
                    .status
                    .as_deref()
                    .map(str::parse::<WorklogStatus>)
                    .transpose()?,
            },
            skip: self.skip.unwrap_or(0),
            limit: self.limit.unwrap_or(DEFAULT_LIMIT),
        })
    }
}

/// `POST /worklogs/start`
pub async fn start_work(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: std::result::Result<Json<StartWorkRequest>, JsonRejection>,
) -> ApiResult<worklog::Model> {
    let user_id = current_user(&headers)?;
    let Json(request) = payload?;

    let input = StartWork {
        start_time: parse_timestamp(&request.start_time, "startTime")?,
        location: request.location.parse::<WorkLocation>()?,
        description: request.description,
    };
    let started = state.worklogs.start_work(user_id, input).await?;
    Ok(ApiResponse::created(started))
}

/// `POST /worklogs/:id/complete`
pub async fn complete_work(
    State(state): State<AppState>,
    headers: HeaderMap,
    path: std::result::Result<Path<i64>, PathRejection>,
    payload: std::result::Result<Json<CompleteWorkRequest>, JsonRejection>,
) -> ApiResult<worklog::Model> {
    let user_id = current_user(&headers)?;
    let Path(worklog_id) = path?;
    let Json(request) = payload?;

    let end_time = parse_timestamp(&request.end_time, "endTime")?;
    let completed = state
        .worklogs
        .complete_work(worklog_id, user_id, end_time)
        .await?;
    Ok(ApiResponse::ok(completed))
}

/// `PATCH /worklogs/:id`
pub async fn modify_work(
    State(state): State<AppState>,
    headers: HeaderMap,
    path: std::result::Result<Path<i64>, PathRejection>,
    payload: std::result::Result<Json<ModifyWorkRequest>, JsonRejection>,
) -> ApiResult<worklog::Model> {
    let user_id = current_user(&headers)?;
    let Path(worklog_id) = path?;
    let Json(request) = payload?;

    let changes = WorklogChanges {
        start_time: parse_optional(request.start_time.as_deref(), "startTime")?,
        description: request.description,
        location: request
            .location
            .as_deref()
            .map(str::parse::<WorkLocation>)
            .transpose()?,
    };
    let modified = state
        .worklogs
        .modify_work(worklog_id, user_id, changes)
        .await?;
    Ok(ApiResponse::ok(modified))
}

/// `POST /worklogs`
pub async fn create_completed_work(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: std::result::Result<Json<CompletedWorkRequest>, JsonRejection>,
) -> ApiResult<worklog::Model> {
    let user_id = current_user(&headers)?;
    let Json(request) = payload?;

    let input = CompletedWork {
        start_time: parse_timestamp(&request.start_time, "startTime")?,
        end_time: parse_timestamp(&request.end_time, "endTime")?,
        location: request.location.parse::<WorkLocation>()?,
        description: request.description,
    };
    let created = state.worklogs.create_completed_work(user_id, input).await?;
    Ok(ApiResponse::created(created))
}

/// `DELETE /worklogs/:id`
pub async fn delete_work(
    State(state): State<AppState>,
    headers: HeaderMap,
    path: std::result::Result<Path<i64>, PathRejection>,
) -> ApiResult<Value> {
    let user_id = current_user(&headers)?;
    let Path(worklog_id) = path?;

    state.worklogs.delete_work(worklog_id, user_id).await?;
    Ok(ApiResponse::ok(json!({ "deleted": true })))
}

/// `GET /worklogs/:id`
pub async fn get_worklog(
    State(state): State<AppState>,
    headers: HeaderMap,
    path: std::result::Result<Path<i64>, PathRejection>,
) -> ApiResult<worklog::Model> {
    let user_id = current_user(&headers)?;
    let Path(worklog_id) = path?;

    let found = state.worklogs.get_worklog(worklog_id, user_id).await?;
    Ok(ApiResponse::ok(found))
}

/// `GET /worklogs`
pub async fn list_worklogs(
    State(state): State<AppState>,
    headers: HeaderMap,
    params: std::result::Result<Query<ListWorklogsParams>, QueryRejection>,
) -> ApiResult<WorklogPage> {
    let user_id = current_user(&headers)?;
    let Query(params) = params?;

    let query = params.into_query()?;
    let worklogs = state.worklogs.query_worklogs(user_id, &query).await?;
    let total = state.worklogs.count_worklogs(user_id, &query.filter).await?;
    Ok(ApiResponse::ok(WorklogPage { worklogs, total }))
}
