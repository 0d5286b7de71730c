//! Balance history entity - Append-only audit trail of balance changes.
//!
//! Every change to a user's balance writes exactly one row here, in the same
//! database transaction as the change itself. Rows are never updated.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// What caused a balance change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BalanceChangeType {
    /// Deduction or refund for a worklog
    #[sea_orm(string_value = "WORKLOG")]
    Worklog,
    /// Manual adjustment
    #[sea_orm(string_value = "MANUAL")]
    Manual,
    /// Periodic accrual
    #[sea_orm(string_value = "CRON")]
    Cron,
}

/// Balance history database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[sea_orm(table_name = "balance_history")]
pub struct Model {
    /// Unique identifier for the entry
    #[sea_orm(primary_key)]
    pub id: i64,
    /// User whose balance changed
    pub user_id: i64,
    /// Signed change in minutes (negative for deductions)
    pub amount: i64,
    /// What caused the change
    #[serde(rename = "type")]
    pub change_type: BalanceChangeType,
    /// Human-readable description of the change
    pub description: String,
    /// Worklog that caused the change, if any
    pub worklog_id: Option<i64>,
    /// When the change was applied
    pub timestamp: DateTimeUtc,
}

/// Defines relationships between `BalanceHistory` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each entry belongs to one user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
    /// Entries of type `WORKLOG` point at their worklog
    #[sea_orm(
        belongs_to = "super::worklog::Entity",
        from = "Column::WorklogId",
        to = "super::worklog::Column::Id"
    )]
    Worklog,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::worklog::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Worklog.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
