//! Report generation business logic.
//!
//! Summaries are computed from completed worklogs over the same date filter
//! used by worklog queries, and returned as structured data for the API layer
//! to serialize.

use crate::{
    core::{
        balance,
        time::worked_minutes,
        worklog::{WorklogFilter, WorklogStatus, query},
    },
    entities::WorkLocation,
    errors::Result,
};
use chrono::{DateTime, Utc};
use sea_orm::DatabaseConnection;
use serde::Serialize;

/// Worked minutes at one location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationTotal {
    /// Where the work took place
    pub location: WorkLocation,
    /// Sum of worked minutes there
    pub worked_minutes: i64,
}

/// Totals over a user's completed worklogs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkSummary {
    /// Current balance, independent of the date filter
    pub balance: i64,
    /// Number of completed worklogs in range
    pub completed_worklogs: usize,
    /// Sum of worked minutes
    pub worked_minutes: i64,
    /// Sum of charged costs
    pub total_cost: i64,
    /// Worked minutes per location, in a fixed order; locations without work are omitted
    pub locations: Vec<LocationTotal>,
}

/// Summarizes the user's completed work between `start_date` and `end_date`.
///
/// # Errors
/// - [`crate::errors::Error::UserNotFound`] for an unknown user
/// - [`crate::errors::Error::WorklogInvalidTime`] for a reversed range
pub async fn summarize(
    db: &DatabaseConnection,
    user_id: i64,
    start_date: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
) -> Result<WorkSummary> {
    let balance = balance::get_balance(db, user_id).await?;

    let filter = WorklogFilter {
        start_date,
        end_date,
        status: Some(WorklogStatus::Completed),
    };
    let worklogs = query::find_all(db, user_id, &filter).await?;

    let mut locations: Vec<LocationTotal> = Vec::new();
    let mut total_minutes = 0;
    let mut total_cost = 0;

    for worklog in &worklogs {
        let Some(end_time) = worklog.end_time else {
            continue;
        };
        let minutes = worked_minutes(worklog.start_time, end_time);
        total_minutes += minutes;
        total_cost += worklog.cost.unwrap_or(0);

        match locations.iter_mut().find(|l| l.location == worklog.location) {
            Some(total) => total.worked_minutes += minutes,
            None => locations.push(LocationTotal {
                location: worklog.location,
                worked_minutes: minutes,
            }),
        }
    }
    locations.sort_by_key(|l| l.location.as_str());

    Ok(WorkSummary {
        balance,
        completed_worklogs: worklogs.len(),
        worked_minutes: total_minutes,
        total_cost,
        locations,
    })
}
