//! Database configuration module.
//!
//! This module handles the database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with
//! `Schema::create_table_from_entity`, so the schema always matches the Rust
//! structs. The composite indexes used by the worklog and history queries are
//! created alongside. Everything is idempotent and safe to run on every start.

use crate::entities::{BalanceHistory, User, Worklog, balance_history, worklog};
use crate::errors::Result;
use sea_orm::sea_query::{Index, IndexCreateStatement, IndexOrder};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Schema};

/// Default connection URL used when `DATABASE_URL` is not set.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://overtime.sqlite?mode=rwc";

/// Gets the database URL from environment variable or returns default `SQLite` path.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Establishes a connection to the database named by `DATABASE_URL`.
///
/// Falls back to a local `SQLite` file if no environment variable is set.
pub async fn create_connection() -> Result<DatabaseConnection> {
    let database_url = get_database_url();
    tracing::debug!("Connecting to database at {}", database_url);
    Database::connect(&database_url).await.map_err(Into::into)
}

/// Creates all tables and indexes if they do not exist yet.
///
/// Tables are created parents first (users, worklogs, balance history) so the
/// foreign keys generated from the entity relations resolve.
pub async fn create_tables<C>(db: &C) -> Result<()>
where
    C: ConnectionTrait,
{
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let mut user_table = schema.create_table_from_entity(User);
    let mut worklog_table = schema.create_table_from_entity(Worklog);
    let mut history_table = schema.create_table_from_entity(BalanceHistory);

    db.execute(builder.build(user_table.if_not_exists())).await?;
    db.execute(builder.build(worklog_table.if_not_exists())).await?;
    db.execute(builder.build(history_table.if_not_exists())).await?;

    for index in indexes() {
        db.execute(builder.build(&index)).await?;
    }

    Ok(())
}

fn indexes() -> Vec<IndexCreateStatement> {
    vec![
        // In-progress lookup
        Index::create()
            .name("idx_worklogs_user_end")
            .table(Worklog)
            .col(worklog::Column::UserId)
            .col(worklog::Column::EndTime)
            .if_not_exists()
            .to_owned(),
        // Overlap and range checks
        Index::create()
            .name("idx_worklogs_user_start_end")
            .table(Worklog)
            .col(worklog::Column::UserId)
            .col(worklog::Column::StartTime)
            .col(worklog::Column::EndTime)
            .if_not_exists()
            .to_owned(),
        // Newest-first listing
        Index::create()
            .name("idx_worklogs_user_start_desc")
            .table(Worklog)
            .col(worklog::Column::UserId)
            .col((worklog::Column::StartTime, IndexOrder::Desc))
            .if_not_exists()
            .to_owned(),
        Index::create()
            .name("idx_balance_history_user_timestamp")
            .table(BalanceHistory)
            .col(balance_history::Column::UserId)
            .col((balance_history::Column::Timestamp, IndexOrder::Desc))
            .if_not_exists()
            .to_owned(),
    ]
}
