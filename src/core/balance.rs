//! Balance ledger - the only code that changes a user's balance.
//!
//! Every change is a single conditional `UPDATE users SET balance = balance + ?`
//! that refuses to drive the balance below zero, followed by an insert into the
//! balance history. Both run on the caller's connection, which is normally an
//! open transaction, so the change commits or rolls back together with whatever
//! worklog mutation caused it.

use crate::{
    core::user as users,
    entities::{BalanceChangeType, BalanceHistory, User, Worklog, balance_history, user, worklog},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*, sea_query::Expr};
use serde::Serialize;
use tracing::{debug, info};

const WORKLOG_DEDUCTION_DESCRIPTION: &str = "Balance deducted for worklog entry";
const WORKLOG_REVERT_DESCRIPTION: &str = "Revert balance deduction for worklog entry";

/// A single balance mutation as recorded in the history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceChange {
    /// Signed amount in minutes
    pub amount: i64,
    /// What caused the change
    pub change_type: BalanceChangeType,
    /// Human-readable reason
    pub description: String,
    /// Worklog that caused the change, if any
    pub worklog_id: Option<i64>,
}

/// A history entry together with the worklog that caused it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    /// The history row
    #[serde(flatten)]
    pub entry: balance_history::Model,
    /// The worklog referenced by `worklog_id`, if it still exists
    pub worklog: Option<worklog::Model>,
}

/// Returns the user's current balance in minutes.
pub async fn get_balance<C>(db: &C, user_id: i64) -> Result<i64>
where
    C: ConnectionTrait,
{
    Ok(users::require_user(db, user_id).await?.balance)
}

/// Fails with [`Error::InsufficientBalance`] unless the balance is positive.
///
/// Used as the gate before new work may be logged.
pub async fn validate_sufficient_balance<C>(db: &C, user_id: i64) -> Result<()>
where
    C: ConnectionTrait,
{
    let balance = get_balance(db, user_id).await?;
    if balance <= 0 {
        return Err(Error::InsufficientBalance {
            balance,
            required: 1,
        });
    }
    Ok(())
}

/// Applies a balance change and records it in the history.
///
/// Must be called on the connection of an open transaction when the change is
/// coupled to another mutation. The increment is one conditional update, so
/// concurrent changes for the same user cannot lose updates and the balance
/// never goes below zero.
///
/// # Errors
/// - [`Error::UserNotFound`] if the user does not exist or is deleted
/// - [`Error::InsufficientBalance`] if the change would make the balance negative
pub async fn apply_change<C>(
    db: &C,
    user_id: i64,
    change: BalanceChange,
) -> Result<balance_history::Model>
where
    C: ConnectionTrait,
{
    let updated = User::update_many()
        .col_expr(
            user::Column::Balance,
            Expr::col(user::Column::Balance).add(change.amount),
        )
        .filter(user::Column::Id.eq(user_id))
        .filter(user::Column::IsDeleted.eq(false))
        .filter(user::Column::Balance.gte(change.amount.saturating_neg()))
        .exec(db)
        .await?;

    if updated.rows_affected == 0 {
        // Either the row is gone or the guard rejected the change
        return Err(match users::get_user_by_id(db, user_id).await? {
            None => Error::UserNotFound { user_id },
            Some(current) => Error::InsufficientBalance {
                balance: current.balance,
                required: change.amount.saturating_neg(),
            },
        });
    }

    let entry = balance_history::ActiveModel {
        user_id: Set(user_id),
        amount: Set(change.amount),
        change_type: Set(change.change_type),
        description: Set(change.description),
        worklog_id: Set(change.worklog_id),
        timestamp: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    debug!(
        user_id,
        amount = entry.amount,
        change_type = ?entry.change_type,
        "Balance changed"
    );
    Ok(entry)
}

/// Deducts a worklog's cost.
pub async fn deduct_for_worklog<C>(
    db: &C,
    user_id: i64,
    cost: i64,
    worklog_id: i64,
) -> Result<balance_history::Model>
where
    C: ConnectionTrait,
{
    apply_change(
        db,
        user_id,
        BalanceChange {
            amount: -cost,
            change_type: BalanceChangeType::Worklog,
            description: WORKLOG_DEDUCTION_DESCRIPTION.to_string(),
            worklog_id: Some(worklog_id),
        },
    )
    .await
}

/// Gives back a worklog's cost.
pub async fn revert_for_worklog<C>(
    db: &C,
    user_id: i64,
    cost: i64,
    worklog_id: i64,
) -> Result<balance_history::Model>
where
    C: ConnectionTrait,
{
    apply_change(
        db,
        user_id,
        BalanceChange {
            amount: cost,
            change_type: BalanceChangeType::Worklog,
            description: WORKLOG_REVERT_DESCRIPTION.to_string(),
            worklog_id: Some(worklog_id),
        },
    )
    .await
}

/// Applies a manual adjustment in its own transaction.
///
/// # Errors
/// Returns [`Error::Validation`] for a zero amount or an empty description,
/// and the errors of [`apply_change`].
pub async fn adjust_balance(
    db: &DatabaseConnection,
    user_id: i64,
    amount: i64,
    description: &str,
) -> Result<balance_history::Model> {
    if amount == 0 {
        return Err(Error::validation("Adjustment amount cannot be zero"));
    }
    if description.trim().is_empty() {
        return Err(Error::validation("Adjustment description cannot be empty"));
    }

    let txn = db.begin().await?;
    let entry = apply_change(
        &txn,
        user_id,
        BalanceChange {
            amount,
            change_type: BalanceChangeType::Manual,
            description: description.trim().to_string(),
            worklog_id: None,
        },
    )
    .await?;
    txn.commit().await?;

    info!(user_id, amount, "Manual balance adjustment");
    Ok(entry)
}

fn history_condition(
    user_id: i64,
    start_date: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
) -> Result<sea_orm::Condition> {
    if let (Some(start), Some(end)) = (start_date, end_date) {
        if start > end {
            return Err(Error::validation("Start date must be before end date"));
        }
    }

    let mut condition = sea_orm::Condition::all().add(balance_history::Column::UserId.eq(user_id));
    if let Some(start) = start_date {
        condition = condition.add(balance_history::Column::Timestamp.gte(start));
    }
    if let Some(end) = end_date {
        condition = condition.add(balance_history::Column::Timestamp.lte(end));
    }
    Ok(condition)
}

/// Returns the user's balance history, newest first.
///
/// Both bounds are inclusive; either may be omitted.
pub async fn get_history(
    db: &DatabaseConnection,
    user_id: i64,
    start_date: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
) -> Result<Vec<balance_history::Model>> {
    BalanceHistory::find()
        .filter(history_condition(user_id, start_date, end_date)?)
        .order_by_desc(balance_history::Column::Timestamp)
        .order_by_desc(balance_history::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Same as [`get_history`], with each entry paired with its worklog.
pub async fn get_history_with_worklogs(
    db: &DatabaseConnection,
    user_id: i64,
    start_date: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
) -> Result<Vec<HistoryEntry>> {
    let rows = BalanceHistory::find()
        .find_also_related(Worklog)
        .filter(history_condition(user_id, start_date, end_date)?)
        .order_by_desc(balance_history::Column::Timestamp)
        .order_by_desc(balance_history::Column::Id)
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .map(|(entry, worklog)| HistoryEntry { entry, worklog })
        .collect())
}
