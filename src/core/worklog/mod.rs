//! Worklog lifecycle - starting, completing, editing and deleting work sessions.
//!
//! A worklog moves `IN_PROGRESS -> COMPLETED`, and either state may end in a
//! soft delete. Completing a session charges its cost to the user's balance;
//! the state change and the ledger entry always commit in the same
//! transaction, so a failed debit leaves the session open and a failed refund
//! leaves it visible.

pub mod query;
pub(crate) mod store;

use crate::{
    core::{
        balance,
        time::{calculate_cost, truncate_to_minute, validate_time_order},
    },
    entities::{WorkLocation, worklog},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{DatabaseConnection, TransactionTrait};
use serde::Deserialize;
use tracing::info;

pub use query::{WorklogFilter, WorklogQuery, WorklogStatus};
use store::{InProgressUpdate, NewWorklog};

/// What happens when a completed worklog is deleted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeletePolicy {
    /// Only in-progress worklogs may be deleted
    InProgressOnly,
    /// Completed worklogs may be deleted and their cost is refunded
    #[default]
    RefundCompleted,
}

/// Business parameters of the worklog rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorklogPolicy {
    /// Balance minutes charged per worked minute
    pub cost_per_minute: i64,
    /// Handling of deletes for completed worklogs
    pub delete_policy: DeletePolicy,
}

/// Input for [`WorklogService::start_work`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartWork {
    pub start_time: DateTime<Utc>,
    pub location: WorkLocation,
    pub description: Option<String>,
}

/// Input for [`WorklogService::create_completed_work`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedWork {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub location: WorkLocation,
    pub description: Option<String>,
}

/// Edits for [`WorklogService::modify_work`]. Unset fields stay as they are;
/// an empty description clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorklogChanges {
    pub start_time: Option<DateTime<Utc>>,
    pub description: Option<String>,
    pub location: Option<WorkLocation>,
}

fn normalize_description(description: Option<String>) -> Option<String> {
    description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
}

/// Worklog operations for a single database and policy.
#[derive(Debug, Clone)]
pub struct WorklogService {
    db: DatabaseConnection,
    policy: WorklogPolicy,
}

impl WorklogService {
    /// Creates a service over `db` applying `policy`.
    #[must_use]
    pub const fn new(db: DatabaseConnection, policy: WorklogPolicy) -> Self {
        Self { db, policy }
    }

    /// The policy this service applies.
    #[must_use]
    pub const fn policy(&self) -> WorklogPolicy {
        self.policy
    }

    /// Opens a new work session.
    ///
    /// # Errors
    /// - [`Error::UserNotFound`] / [`Error::InsufficientBalance`] from the balance gate
    /// - [`Error::WorklogInProgressExists`] if the user already has an open session
    /// - [`Error::WorklogOverlap`] if an existing worklog lies between the start time and now
    pub async fn start_work(&self, user_id: i64, input: StartWork) -> Result<worklog::Model> {
        balance::validate_sufficient_balance(&self.db, user_id).await?;

        if store::find_in_progress(&self.db, user_id).await?.is_some() {
            return Err(Error::WorklogInProgressExists);
        }

        let start_time = truncate_to_minute(input.start_time);
        if let Some(conflict) =
            store::find_open_conflict(&self.db, user_id, start_time, Utc::now(), None).await?
        {
            return Err(Error::WorklogOverlap {
                conflicting_id: conflict.id,
            });
        }

        let created = store::insert(
            &self.db,
            NewWorklog {
                user_id,
                start_time,
                end_time: None,
                description: normalize_description(input.description),
                location: input.location,
                cost: None,
            },
            Utc::now(),
        )
        .await?;

        info!(user_id, worklog_id = created.id, location = %created.location, "Work started");
        Ok(created)
    }

    /// Closes an open session and charges its cost.
    ///
    /// Runs in one transaction; on any error the session stays open and the
    /// balance is unchanged.
    pub async fn complete_work(
        &self,
        worklog_id: i64,
        user_id: i64,
        end_time: DateTime<Utc>,
    ) -> Result<worklog::Model> {
        let txn = self.db.begin().await?;

        let mut current = store::find_owned(&txn, worklog_id, user_id).await?;
        if !current.is_in_progress() {
            return Err(Error::WorklogAlreadyCompleted { worklog_id });
        }

        let end_time = truncate_to_minute(end_time);
        validate_time_order(current.start_time, end_time)?;

        if let Some(conflict) =
            store::find_overlapping(&txn, user_id, current.start_time, end_time, Some(worklog_id))
                .await?
        {
            return Err(Error::WorklogOverlap {
                conflicting_id: conflict.id,
            });
        }

        let cost = calculate_cost(current.start_time, end_time, self.policy.cost_per_minute)?;
        let now = Utc::now();
        if !store::mark_completed(&txn, worklog_id, end_time, cost, now).await? {
            return Err(Error::WorklogAlreadyCompleted { worklog_id });
        }
        balance::deduct_for_worklog(&txn, user_id, cost, worklog_id).await?;

        txn.commit().await?;

        current.end_time = Some(end_time);
        current.cost = Some(cost);
        current.updated_at = now;
        info!(user_id, worklog_id, cost, "Work completed");
        Ok(current)
    }

    /// Edits an open session.
    ///
    /// # Errors
    /// - [`Error::WorklogNotFound`] if the worklog is missing, deleted or foreign
    /// - [`Error::WorklogAlreadyCompleted`] once the session is closed
    /// - [`Error::WorklogOverlap`] if another worklog lies between the new start time and now
    pub async fn modify_work(
        &self,
        worklog_id: i64,
        user_id: i64,
        changes: WorklogChanges,
    ) -> Result<worklog::Model> {
        let txn = self.db.begin().await?;

        let current = store::find_owned(&txn, worklog_id, user_id).await?;
        if !current.is_in_progress() {
            return Err(Error::WorklogAlreadyCompleted { worklog_id });
        }

        let update = InProgressUpdate {
            start_time: changes.start_time.map(truncate_to_minute),
            description: changes.description.map(|d| normalize_description(Some(d))),
            location: changes.location,
        };
        if update.is_empty() {
            return Ok(current);
        }

        if let Some(start_time) = update.start_time {
            if let Some(conflict) =
                store::find_open_conflict(&txn, user_id, start_time, Utc::now(), Some(worklog_id))
                    .await?
            {
                return Err(Error::WorklogOverlap {
                    conflicting_id: conflict.id,
                });
            }
        }

        if !store::update_in_progress(&txn, worklog_id, update, Utc::now()).await? {
            return Err(Error::WorklogAlreadyCompleted { worklog_id });
        }
        let updated = store::find_owned(&txn, worklog_id, user_id).await?;
        txn.commit().await?;

        info!(user_id, worklog_id, "Work modified");
        Ok(updated)
    }

    /// Records a session that already finished and charges its cost.
    pub async fn create_completed_work(
        &self,
        user_id: i64,
        input: CompletedWork,
    ) -> Result<worklog::Model> {
        let start_time = truncate_to_minute(input.start_time);
        let end_time = truncate_to_minute(input.end_time);
        validate_time_order(start_time, end_time)?;
        let cost = calculate_cost(start_time, end_time, self.policy.cost_per_minute)?;

        let txn = self.db.begin().await?;

        balance::validate_sufficient_balance(&txn, user_id).await?;
        if let Some(conflict) =
            store::find_overlapping(&txn, user_id, start_time, end_time, None).await?
        {
            return Err(Error::WorklogOverlap {
                conflicting_id: conflict.id,
            });
        }

        let created = store::insert(
            &txn,
            NewWorklog {
                user_id,
                start_time,
                end_time: Some(end_time),
                description: normalize_description(input.description),
                location: input.location,
                cost: Some(cost),
            },
            Utc::now(),
        )
        .await?;
        balance::deduct_for_worklog(&txn, user_id, cost, created.id).await?;

        txn.commit().await?;

        info!(user_id, worklog_id = created.id, cost, "Completed work recorded");
        Ok(created)
    }

    /// Soft-deletes a worklog, refunding a completed one when the policy allows it.
    ///
    /// # Errors
    /// - [`Error::WorklogNotFound`] if the worklog is missing, deleted or foreign
    /// - [`Error::WorklogAlreadyCompleted`] for a completed worklog under
    ///   [`DeletePolicy::InProgressOnly`]
    pub async fn delete_work(&self, worklog_id: i64, user_id: i64) -> Result<worklog::Model> {
        let txn = self.db.begin().await?;

        let mut current = store::find_owned(&txn, worklog_id, user_id).await?;
        let refund = match (current.end_time, self.policy.delete_policy) {
            (None, _) => None,
            (Some(_), DeletePolicy::InProgressOnly) => {
                return Err(Error::WorklogAlreadyCompleted { worklog_id });
            }
            (Some(end_time), DeletePolicy::RefundCompleted) => Some(match current.cost {
                Some(cost) => cost,
                None => calculate_cost(current.start_time, end_time, self.policy.cost_per_minute)?,
            }),
        };

        let now = Utc::now();
        if !store::mark_deleted(&txn, worklog_id, now).await? {
            return Err(Error::WorklogNotFound { worklog_id });
        }
        if let Some(cost) = refund.filter(|cost| *cost > 0) {
            balance::revert_for_worklog(&txn, user_id, cost, worklog_id).await?;
        }

        txn.commit().await?;

        current.is_deleted = true;
        current.updated_at = now;
        info!(user_id, worklog_id, refund = refund.unwrap_or(0), "Work deleted");
        Ok(current)
    }

    /// Loads one of the user's worklogs.
    pub async fn get_worklog(&self, worklog_id: i64, user_id: i64) -> Result<worklog::Model> {
        store::find_owned(&self.db, worklog_id, user_id).await
    }

    /// One page of the user's worklogs, newest first.
    pub async fn query_worklogs(
        &self,
        user_id: i64,
        query: &WorklogQuery,
    ) -> Result<Vec<worklog::Model>> {
        query::query_worklogs(&self.db, user_id, query).await
    }

    /// Number of the user's worklogs matching `filter`.
    pub async fn count_worklogs(&self, user_id: i64, filter: &WorklogFilter) -> Result<u64> {
        query::count_worklogs(&self.db, user_id, filter).await
    }
}
