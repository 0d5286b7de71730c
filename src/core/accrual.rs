//! Periodic balance accrual.
//!
//! Credits every active user with a fixed number of balance minutes. Each user
//! is credited in a separate transaction, so one failing user does not hold
//! back or roll back the others.

use crate::{
    core::{
        balance::{self, BalanceChange},
        user,
    },
    entities::BalanceChangeType,
    errors::Result,
};
use chrono::{DateTime, Utc};
use sea_orm::{DatabaseConnection, TransactionTrait};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info};

const ACCRUAL_DESCRIPTION: &str = "Scheduled balance increment";

/// A user the accrual could not credit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccrualFailure {
    /// The user that was skipped
    pub user_id: i64,
    /// Why crediting failed
    pub message: String,
}

/// Outcome of one accrual run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccrualResult {
    /// When the run started
    pub run_at: DateTime<Utc>,
    /// Amount credited to each user
    pub increment: i64,
    /// Number of users credited
    pub processed: usize,
    /// Users that could not be credited
    pub failed: Vec<AccrualFailure>,
}

async fn credit_user(db: &DatabaseConnection, user_id: i64, increment: i64) -> Result<()> {
    let txn = db.begin().await?;
    balance::apply_change(
        &txn,
        user_id,
        BalanceChange {
            amount: increment,
            change_type: BalanceChangeType::Cron,
            description: ACCRUAL_DESCRIPTION.to_string(),
            worklog_id: None,
        },
    )
    .await?;
    txn.commit().await?;
    Ok(())
}

/// Credits `increment` to every active user.
///
/// Failing to list the users is an error; failing for a single user is only
/// logged and recorded in the result.
pub async fn run_accrual(
    db: &DatabaseConnection,
    increment: i64,
    now: DateTime<Utc>,
) -> Result<AccrualResult> {
    let users = user::get_all_active_users(db).await?;

    let mut processed = 0;
    let mut failed = Vec::new();
    for user in users {
        match credit_user(db, user.id, increment).await {
            Ok(()) => processed += 1,
            Err(e) => {
                error!(user_id = user.id, error = %e, "Balance accrual failed");
                failed.push(AccrualFailure {
                    user_id: user.id,
                    message: e.to_string(),
                });
            }
        }
    }

    Ok(AccrualResult {
        run_at: now,
        increment,
        processed,
        failed,
    })
}

/// Formats an accrual result into a one-line summary for logs.
#[must_use]
pub fn format_accrual_summary(result: &AccrualResult) -> String {
    let mut summary = format!(
        "Balance accrual at {} - credited {} minutes to {} users",
        result.run_at.format("%Y-%m-%d %H:%M"),
        result.increment,
        result.processed
    );
    if !result.failed.is_empty() {
        let ids: Vec<String> = result.failed.iter().map(|f| f.user_id.to_string()).collect();
        summary.push_str(&format!(", failed for users {}", ids.join(", ")));
    }
    summary
}

/// Runs [`run_accrual`] every `interval_hours` in the background.
///
/// The first run happens one full interval after startup. Returns `None`
/// when accrual is disabled (`increment <= 0` or a zero interval).
#[must_use]
pub fn spawn_accrual_task(
    db: DatabaseConnection,
    increment: i64,
    interval_hours: u64,
) -> Option<JoinHandle<()>> {
    if increment <= 0 || interval_hours == 0 {
        info!("Balance accrual disabled");
        return None;
    }

    let period = Duration::from_secs(interval_hours.saturating_mul(3600));
    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        // The first tick completes immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            match run_accrual(&db, increment, Utc::now()).await {
                Ok(result) => info!("{}", format_accrual_summary(&result)),
                Err(e) => error!(error = %e, "Balance accrual run failed"),
            }
        }
    }))
}
