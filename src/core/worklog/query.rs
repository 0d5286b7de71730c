//! Filtered and paginated worklog reads.

use crate::{
    entities::{Worklog, worklog},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{Condition, QueryOrder, QuerySelect, prelude::*};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Page size used when the caller does not ask for one.
pub const DEFAULT_LIMIT: u64 = 10;
/// Largest page a caller may ask for.
pub const MAX_LIMIT: u64 = 100;

/// Lifecycle state a query can select on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorklogStatus {
    /// No end time yet
    InProgress,
    /// End time and cost are set
    Completed,
}

impl fmt::Display for WorklogStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::InProgress => "IN_PROGRESS",
            Self::Completed => "COMPLETED",
        })
    }
}

impl FromStr for WorklogStatus {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim() {
            "IN_PROGRESS" => Ok(Self::InProgress),
            "COMPLETED" => Ok(Self::Completed),
            other => Err(Error::validation(format!("Invalid status: {other}"))),
        }
    }
}

/// Which worklogs a query or count selects.
///
/// The date range keeps worklogs whose interval intersects
/// `[start_date, end_date]`; both ends are inclusive and either may be left
/// open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorklogFilter {
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub status: Option<WorklogStatus>,
}

/// A page of worklogs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorklogQuery {
    pub filter: WorklogFilter,
    pub skip: u64,
    pub limit: u64,
}

impl Default for WorklogQuery {
    fn default() -> Self {
        Self {
            filter: WorklogFilter::default(),
            skip: 0,
            limit: DEFAULT_LIMIT,
        }
    }
}

fn filter_condition(user_id: i64, filter: &WorklogFilter) -> Result<Condition> {
    if let (Some(start), Some(end)) = (filter.start_date, filter.end_date) {
        if start > end {
            return Err(Error::WorklogInvalidTime {
                message: "Start date must not be after end date".to_string(),
            });
        }
    }

    let mut condition = Condition::all()
        .add(worklog::Column::UserId.eq(user_id))
        .add(worklog::Column::IsDeleted.eq(false));

    match filter.status {
        Some(WorklogStatus::InProgress) => {
            condition = condition.add(worklog::Column::EndTime.is_null());
        }
        Some(WorklogStatus::Completed) => {
            condition = condition.add(worklog::Column::EndTime.is_not_null());
        }
        None => {}
    }

    if let Some(start) = filter.start_date {
        condition = condition.add(
            Condition::any()
                .add(worklog::Column::EndTime.is_null())
                .add(worklog::Column::EndTime.gte(start)),
        );
    }
    if let Some(end) = filter.end_date {
        condition = condition.add(worklog::Column::StartTime.lte(end));
    }

    Ok(condition)
}

/// Returns one page of the user's worklogs, newest start first.
///
/// # Errors
/// - [`Error::Validation`] if `limit` is outside `1..=100`
/// - [`Error::WorklogInvalidTime`] if the date range is reversed
pub async fn query_worklogs<C>(
    db: &C,
    user_id: i64,
    query: &WorklogQuery,
) -> Result<Vec<worklog::Model>>
where
    C: ConnectionTrait,
{
    if query.limit == 0 || query.limit > MAX_LIMIT {
        return Err(Error::validation(format!(
            "Limit must be between 1 and {MAX_LIMIT}, got {}",
            query.limit
        )));
    }

    Worklog::find()
        .filter(filter_condition(user_id, &query.filter)?)
        .order_by_desc(worklog::Column::StartTime)
        .order_by_desc(worklog::Column::Id)
        .offset(query.skip)
        .limit(query.limit)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Counts the user's worklogs matching `filter`, ignoring pagination.
pub async fn count_worklogs<C>(db: &C, user_id: i64, filter: &WorklogFilter) -> Result<u64>
where
    C: ConnectionTrait,
{
    Worklog::find()
        .filter(filter_condition(user_id, filter)?)
        .count(db)
        .await
        .map_err(Into::into)
}

/// Every worklog matching `filter`, oldest start first. Used for reports.
pub async fn find_all<C>(db: &C, user_id: i64, filter: &WorklogFilter) -> Result<Vec<worklog::Model>>
where
    C: ConnectionTrait,
{
    Worklog::find()
        .filter(filter_condition(user_id, filter)?)
        .order_by_asc(worklog::Column::StartTime)
        .all(db)
        .await
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::worklog::StartWork;
    use crate::entities::WorkLocation;
    use crate::test_utils::*;

    #[test]
    fn test_status_from_str() {
        assert_eq!(
            "IN_PROGRESS".parse::<WorklogStatus>().unwrap(),
            WorklogStatus::InProgress
        );
        assert_eq!(
            "COMPLETED".parse::<WorklogStatus>().unwrap(),
            WorklogStatus::Completed
        );
        assert!(matches!(
            "DONE".parse::<WorklogStatus>(),
            Err(Error::Validation { .. })
        ));
    }

    #[tokio::test]
    async fn test_query_orders_and_paginates() -> Result<()> {
        let (db, user) = setup_with_user(0).await?;
        for day in 1..=5 {
            insert_completed_worklog(&db, user.id, on(day, 9, 0), on(day, 10, 0), 60).await?;
        }

        let query = WorklogQuery {
            skip: 1,
            limit: 2,
            ..Default::default()
        };
        let page = query_worklogs(&db, user.id, &query).await?;
        let starts: Vec<_> = page.iter().map(|w| w.start_time).collect();
        assert_eq!(starts, vec![on(4, 9, 0), on(3, 9, 0)]);

        assert_eq!(count_worklogs(&db, user.id, &query.filter).await?, 5);

        Ok(())
    }

    #[tokio::test]
    async fn test_query_rejects_bad_limit() -> Result<()> {
        let (db, user) = setup_with_user(0).await?;

        for limit in [0, MAX_LIMIT + 1] {
            let query = WorklogQuery {
                limit,
                ..Default::default()
            };
            let result = query_worklogs(&db, user.id, &query).await;
            assert!(matches!(result, Err(Error::Validation { .. })));
        }

        let query = WorklogQuery {
            limit: MAX_LIMIT,
            ..Default::default()
        };
        assert!(query_worklogs(&db, user.id, &query).await?.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn test_reversed_range_is_invalid_time() -> Result<()> {
        let (db, user) = setup_with_user(0).await?;

        let filter = WorklogFilter {
            start_date: Some(on(5, 0, 0)),
            end_date: Some(on(4, 0, 0)),
            status: None,
        };
        let result = count_worklogs(&db, user.id, &filter).await;
        assert!(matches!(result, Err(Error::WorklogInvalidTime { .. })));

        Ok(())
    }

    #[tokio::test]
    async fn test_status_and_range_filters() -> Result<()> {
        let (db, user) = setup_with_user(100).await?;
        let other = create_test_user(&db, "other", 0).await?;
        insert_completed_worklog(&db, user.id, on(1, 9, 0), on(1, 10, 0), 60).await?;
        insert_completed_worklog(&db, user.id, on(3, 9, 0), on(3, 10, 0), 60).await?;
        insert_completed_worklog(&db, other.id, on(3, 9, 0), on(3, 10, 0), 60).await?;
        let service = test_service(&db);
        let open = service
            .start_work(
                user.id,
                StartWork {
                    start_time: on(5, 9, 0),
                    location: WorkLocation::Home,
                    description: None,
                },
            )
            .await?;

        let only = |status| WorklogFilter {
            status: Some(status),
            ..Default::default()
        };
        assert_eq!(count_worklogs(&db, user.id, &only(WorklogStatus::Completed)).await?, 2);
        let in_progress = find_all(&db, user.id, &only(WorklogStatus::InProgress)).await?;
        assert_eq!(in_progress.len(), 1);
        assert_eq!(in_progress[0].id, open.id);

        // Both bounds must hold
        let window = WorklogFilter {
            start_date: Some(on(2, 0, 0)),
            end_date: Some(on(4, 0, 0)),
            status: None,
        };
        let found = find_all(&db, user.id, &window).await?;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].start_time, on(3, 9, 0));

        // An open session intersects every later window
        let later = WorklogFilter {
            start_date: Some(on(20, 0, 0)),
            end_date: None,
            status: None,
        };
        let found = find_all(&db, user.id, &later).await?;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, open.id);

        // Bounds are inclusive
        let edge = WorklogFilter {
            start_date: Some(on(1, 10, 0)),
            end_date: Some(on(1, 10, 0)),
            status: None,
        };
        assert_eq!(count_worklogs(&db, user.id, &edge).await?, 1);

        Ok(())
    }
}
