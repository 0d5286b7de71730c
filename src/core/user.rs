//! User business logic - creating, finding and seeding users.
//!
//! Users are created with a zero balance; an initial allowance is applied
//! through the ledger so it shows up in the balance history like every other
//! change.

use crate::{
    config::settings::UserSeed,
    core::balance::{self, BalanceChange},
    entities::{BalanceChangeType, User, user},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use tracing::info;

/// Finds an active (non-deleted) user by ID.
pub async fn get_user_by_id<C>(db: &C, user_id: i64) -> Result<Option<user::Model>>
where
    C: ConnectionTrait,
{
    User::find_by_id(user_id)
        .filter(user::Column::IsDeleted.eq(false))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Like [`get_user_by_id`] but fails with [`Error::UserNotFound`] instead of
/// returning `None`.
pub async fn require_user<C>(db: &C, user_id: i64) -> Result<user::Model>
where
    C: ConnectionTrait,
{
    get_user_by_id(db, user_id)
        .await?
        .ok_or(Error::UserNotFound { user_id })
}

/// Finds an active user by name.
pub async fn get_user_by_name(db: &DatabaseConnection, name: &str) -> Result<Option<user::Model>> {
    User::find()
        .filter(user::Column::Name.eq(name))
        .filter(user::Column::IsDeleted.eq(false))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Retrieves all active users ordered by ID.
pub async fn get_all_active_users(db: &DatabaseConnection) -> Result<Vec<user::Model>> {
    User::find()
        .filter(user::Column::IsDeleted.eq(false))
        .order_by_asc(user::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Creates a new user, crediting `initial_balance` through the ledger.
///
/// The insert and the initial credit share one transaction.
///
/// # Errors
/// Returns an error if:
/// - The name is empty or whitespace-only
/// - The initial balance is negative
/// - The name is already taken (database unique constraint)
pub async fn create_user(
    db: &DatabaseConnection,
    name: &str,
    initial_balance: i64,
) -> Result<user::Model> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::validation("User name cannot be empty"));
    }
    if initial_balance < 0 {
        return Err(Error::validation(format!(
            "Initial balance cannot be negative: {initial_balance}"
        )));
    }

    let txn = db.begin().await?;

    let mut created = user::ActiveModel {
        name: Set(name.to_string()),
        balance: Set(0),
        is_deleted: Set(false),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    if initial_balance > 0 {
        balance::apply_change(
            &txn,
            created.id,
            BalanceChange {
                amount: initial_balance,
                change_type: BalanceChangeType::Manual,
                description: "Initial balance".to_string(),
                worklog_id: None,
            },
        )
        .await?;
        created.balance = initial_balance;
    }

    txn.commit().await?;

    info!(user_id = created.id, name = %created.name, initial_balance, "User created");
    Ok(created)
}

/// Creates every configured user that does not exist yet. Existing users are
/// left untouched, including their balance.
///
/// Returns the number of users created.
pub async fn seed_users(db: &DatabaseConnection, seeds: &[UserSeed]) -> Result<usize> {
    let mut created = 0;
    for seed in seeds {
        if get_user_by_name(db, seed.name.trim()).await?.is_some() {
            continue;
        }
        create_user(db, &seed.name, seed.initial_balance).await?;
        created += 1;
    }
    Ok(created)
}
