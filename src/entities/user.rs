//! User entity - The owner of a balance and of worklogs.
//!
//! The balance is an integer number of minutes. It is only ever changed through
//! the balance ledger so that every change leaves a history entry behind.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// User database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// Unique identifier for the user
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name, unique across users
    #[sea_orm(unique)]
    pub name: String,
    /// Remaining allowance in minutes
    pub balance: i64,
    /// Soft delete flag - deleted users keep their history but can no longer log work
    pub is_deleted: bool,
    /// When the user was created
    pub created_at: DateTimeUtc,
}

/// Defines relationships between User and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One user has many worklogs
    #[sea_orm(has_many = "super::worklog::Entity")]
    Worklogs,
    /// One user has many balance history entries
    #[sea_orm(has_many = "super::balance_history::Entity")]
    BalanceHistory,
}

impl Related<super::worklog::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Worklogs.def()
    }
}

impl Related<super::balance_history::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BalanceHistory.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
