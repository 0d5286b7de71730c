//! Worklog persistence.
//!
//! Plain reads and guarded writes against the `worklogs` table. Every write
//! that depends on the current state (completing, deleting, editing an open
//! session) is a single `UPDATE ... WHERE` on that state and reports whether a
//! row was touched, so callers can detect a lost race without re-reading.

use crate::{
    entities::{WorkLocation, Worklog, worklog},
    errors::{Error, Result},
};
use chrono::{DateTime, Duration, Utc};
use sea_orm::{ActiveEnum, Condition, QueryOrder, Set, prelude::*, sea_query::Expr};

/// Fields of a worklog about to be inserted.
#[derive(Debug, Clone)]
pub struct NewWorklog {
    pub user_id: i64,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub description: Option<String>,
    pub location: WorkLocation,
    pub cost: Option<i64>,
}

/// Edits allowed on an in-progress worklog. `None` leaves a field unchanged;
/// `description: Some(None)` clears the description.
#[derive(Debug, Clone, Default)]
pub struct InProgressUpdate {
    pub start_time: Option<DateTime<Utc>>,
    pub description: Option<Option<String>>,
    pub location: Option<WorkLocation>,
}

impl InProgressUpdate {
    pub const fn is_empty(&self) -> bool {
        self.start_time.is_none() && self.description.is_none() && self.location.is_none()
    }
}

fn active_for_user(user_id: i64) -> Condition {
    Condition::all()
        .add(worklog::Column::UserId.eq(user_id))
        .add(worklog::Column::IsDeleted.eq(false))
}

/// Loads a live worklog owned by `user_id`.
///
/// Foreign and deleted worklogs are reported as missing.
pub async fn find_owned<C>(db: &C, worklog_id: i64, user_id: i64) -> Result<worklog::Model>
where
    C: ConnectionTrait,
{
    Worklog::find_by_id(worklog_id)
        .filter(active_for_user(user_id))
        .one(db)
        .await?
        .ok_or(Error::WorklogNotFound { worklog_id })
}

/// The user's open session, if any.
pub async fn find_in_progress<C>(db: &C, user_id: i64) -> Result<Option<worklog::Model>>
where
    C: ConnectionTrait,
{
    Worklog::find()
        .filter(active_for_user(user_id))
        .filter(worklog::Column::EndTime.is_null())
        .one(db)
        .await
        .map_err(Into::into)
}

/// A live worklog whose interval intersects `[start, end)`.
pub async fn find_overlapping<C>(
    db: &C,
    user_id: i64,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    exclude: Option<i64>,
) -> Result<Option<worklog::Model>>
where
    C: ConnectionTrait,
{
    let mut condition = active_for_user(user_id)
        .add(worklog::Column::StartTime.lt(end))
        .add(
            Condition::any()
                .add(worklog::Column::EndTime.is_null())
                .add(worklog::Column::EndTime.gt(start)),
        );
    if let Some(id) = exclude {
        condition = condition.add(worklog::Column::Id.ne(id));
    }

    Worklog::find()
        .filter(condition)
        .order_by_asc(worklog::Column::StartTime)
        .one(db)
        .await
        .map_err(Into::into)
}

/// A live worklog that a session opened at `start` would already run into by
/// `now`. The session spans `[start, now)`, and at least its first minute when
/// `start` lies in the future.
pub async fn find_open_conflict<C>(
    db: &C,
    user_id: i64,
    start: DateTime<Utc>,
    now: DateTime<Utc>,
    exclude: Option<i64>,
) -> Result<Option<worklog::Model>>
where
    C: ConnectionTrait,
{
    let horizon = now.max(start + Duration::minutes(1));
    find_overlapping(db, user_id, start, horizon, exclude).await
}

pub async fn insert<C>(db: &C, new: NewWorklog, now: DateTime<Utc>) -> Result<worklog::Model>
where
    C: ConnectionTrait,
{
    worklog::ActiveModel {
        user_id: Set(new.user_id),
        start_time: Set(new.start_time),
        end_time: Set(new.end_time),
        description: Set(new.description),
        location: Set(new.location),
        cost: Set(new.cost),
        is_deleted: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Sets `end_time` and `cost` on a session that is still open.
///
/// Returns `false` when the session was already closed or deleted.
pub async fn mark_completed<C>(
    db: &C,
    worklog_id: i64,
    end_time: DateTime<Utc>,
    cost: i64,
    now: DateTime<Utc>,
) -> Result<bool>
where
    C: ConnectionTrait,
{
    let result = Worklog::update_many()
        .col_expr(worklog::Column::EndTime, Expr::value(Some(end_time)))
        .col_expr(worklog::Column::Cost, Expr::value(Some(cost)))
        .col_expr(worklog::Column::UpdatedAt, Expr::value(now))
        .filter(worklog::Column::Id.eq(worklog_id))
        .filter(worklog::Column::EndTime.is_null())
        .filter(worklog::Column::IsDeleted.eq(false))
        .exec(db)
        .await?;
    Ok(result.rows_affected == 1)
}

/// Soft-deletes a live worklog. Returns `false` if it was already deleted.
pub async fn mark_deleted<C>(db: &C, worklog_id: i64, now: DateTime<Utc>) -> Result<bool>
where
    C: ConnectionTrait,
{
    let result = Worklog::update_many()
        .col_expr(worklog::Column::IsDeleted, Expr::value(true))
        .col_expr(worklog::Column::UpdatedAt, Expr::value(now))
        .filter(worklog::Column::Id.eq(worklog_id))
        .filter(worklog::Column::IsDeleted.eq(false))
        .exec(db)
        .await?;
    Ok(result.rows_affected == 1)
}

/// Applies `update` to a session that is still open.
///
/// Returns `false` when the session was closed or deleted in the meantime.
pub async fn update_in_progress<C>(
    db: &C,
    worklog_id: i64,
    update: InProgressUpdate,
    now: DateTime<Utc>,
) -> Result<bool>
where
    C: ConnectionTrait,
{
    let mut query = Worklog::update_many().col_expr(worklog::Column::UpdatedAt, Expr::value(now));
    if let Some(start_time) = update.start_time {
        query = query.col_expr(worklog::Column::StartTime, Expr::value(start_time));
    }
    if let Some(description) = update.description {
        query = query.col_expr(worklog::Column::Description, Expr::value(description));
    }
    if let Some(location) = update.location {
        query = query.col_expr(worklog::Column::Location, Expr::value(location.to_value()));
    }

    let result = query
        .filter(worklog::Column::Id.eq(worklog_id))
        .filter(worklog::Column::EndTime.is_null())
        .filter(worklog::Column::IsDeleted.eq(false))
        .exec(db)
        .await?;
    Ok(result.rows_affected == 1)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    fn open_session(user_id: i64, start_time: DateTime<Utc>) -> NewWorklog {
        NewWorklog {
            user_id,
            start_time,
            end_time: None,
            description: None,
            location: WorkLocation::Home,
            cost: None,
        }
    }

    #[tokio::test]
    async fn test_find_owned_hides_foreign_and_deleted() -> Result<()> {
        let (db, user) = setup_with_user(0).await?;
        let other = create_test_user(&db, "other", 0).await?;
        let worklog = insert_completed_worklog(&db, user.id, at(9, 0), at(10, 0), 60).await?;

        assert_eq!(find_owned(&db, worklog.id, user.id).await?.id, worklog.id);

        let result = find_owned(&db, worklog.id, other.id).await;
        assert!(matches!(result, Err(Error::WorklogNotFound { .. })));

        assert!(mark_deleted(&db, worklog.id, Utc::now()).await?);
        let result = find_owned(&db, worklog.id, user.id).await;
        assert!(matches!(result, Err(Error::WorklogNotFound { .. })));

        // Second delete touches nothing
        assert!(!mark_deleted(&db, worklog.id, Utc::now()).await?);

        Ok(())
    }

    #[tokio::test]
    async fn test_open_conflict_spans_start_to_now() -> Result<()> {
        let (db, user) = setup_with_user(0).await?;
        let worklog = insert_completed_worklog(&db, user.id, at(10, 0), at(11, 0), 60).await?;
        let now = at(17, 0);

        // Inside the worklog, or before it while still running at its start
        for start in [at(10, 0), at(10, 59), at(7, 0)] {
            let hit = find_open_conflict(&db, user.id, start, now, None).await?;
            assert_eq!(hit.unwrap().id, worklog.id);
        }
        assert!(find_open_conflict(&db, user.id, at(11, 0), now, None).await?.is_none());
        assert!(
            find_open_conflict(&db, user.id, at(7, 0), now, Some(worklog.id))
                .await?
                .is_none()
        );

        // Nothing has happened yet that a session opened at 07:00 could hit
        assert!(find_open_conflict(&db, user.id, at(7, 0), at(9, 0), None).await?.is_none());

        // A future start is checked at its first minute
        assert!(find_open_conflict(&db, user.id, at(10, 30), at(9, 0), None).await?.is_some());
        assert!(find_open_conflict(&db, user.id, at(9, 59), at(9, 0), None).await?.is_none());

        Ok(())
    }

    #[tokio::test]
    async fn test_open_session_blocks_everything_after_start() -> Result<()> {
        let (db, user) = setup_with_user(0).await?;
        insert(&db, open_session(user.id, at(12, 0)), Utc::now()).await?;

        assert!(
            find_open_conflict(&db, user.id, on(20, 0, 0), on(21, 0, 0), None)
                .await?
                .is_some()
        );
        assert!(
            find_overlapping(&db, user.id, at(11, 0), at(12, 1), None)
                .await?
                .is_some()
        );
        assert!(
            find_overlapping(&db, user.id, at(11, 0), at(12, 0), None)
                .await?
                .is_none()
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_find_overlapping_respects_owner_and_bounds() -> Result<()> {
        let (db, user) = setup_with_user(0).await?;
        let other = create_test_user(&db, "other", 0).await?;
        insert_completed_worklog(&db, user.id, at(10, 0), at(11, 0), 60).await?;

        let hit = find_overlapping(&db, user.id, at(10, 30), at(11, 30), None).await?;
        assert!(hit.is_some());

        // Touching intervals do not overlap
        assert!(
            find_overlapping(&db, user.id, at(11, 0), at(12, 0), None)
                .await?
                .is_none()
        );
        assert!(
            find_overlapping(&db, user.id, at(9, 0), at(10, 0), None)
                .await?
                .is_none()
        );

        // Someone else's worklog never conflicts
        assert!(
            find_overlapping(&db, other.id, at(10, 30), at(11, 30), None)
                .await?
                .is_none()
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_mark_completed_only_once() -> Result<()> {
        let (db, user) = setup_with_user(0).await?;
        let worklog = insert(&db, open_session(user.id, at(9, 0)), Utc::now()).await?;

        assert!(mark_completed(&db, worklog.id, at(10, 0), 60, Utc::now()).await?);
        assert!(!mark_completed(&db, worklog.id, at(11, 0), 120, Utc::now()).await?);

        let stored = find_owned(&db, worklog.id, user.id).await?;
        assert_eq!(stored.end_time, Some(at(10, 0)));
        assert_eq!(stored.cost, Some(60));

        Ok(())
    }

    #[tokio::test]
    async fn test_update_in_progress() -> Result<()> {
        let (db, user) = setup_with_user(0).await?;
        let mut new = open_session(user.id, at(9, 0));
        new.description = Some("planning".to_string());
        let worklog = insert(&db, new, Utc::now()).await?;

        let update = InProgressUpdate {
            start_time: Some(at(8, 30)),
            description: Some(None),
            location: Some(WorkLocation::BusinessTrip),
        };
        assert!(update_in_progress(&db, worklog.id, update, Utc::now()).await?);

        let stored = find_owned(&db, worklog.id, user.id).await?;
        assert_eq!(stored.start_time, at(8, 30));
        assert_eq!(stored.description, None);
        assert_eq!(stored.location, WorkLocation::BusinessTrip);

        mark_completed(&db, worklog.id, at(10, 0), 90, Utc::now()).await?;
        let update = InProgressUpdate {
            location: Some(WorkLocation::Office),
            ..Default::default()
        };
        assert!(!update_in_progress(&db, worklog.id, update, Utc::now()).await?);

        Ok(())
    }
}
