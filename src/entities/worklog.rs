//! Worklog entity - A recorded work session.
//!
//! A worklog without `end_time` is in progress. Once completed, `end_time` and
//! `cost` are set together and never change again. Deleting a worklog only
//! flips `is_deleted` so the record stays available for auditing.

use crate::errors::Error;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Where the work took place.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkLocation {
    #[sea_orm(string_value = "HOME")]
    Home,
    #[sea_orm(string_value = "OFFICE")]
    Office,
    #[sea_orm(string_value = "BUSINESS_TRIP")]
    BusinessTrip,
}

impl WorkLocation {
    /// The wire and storage representation of this location.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Home => "HOME",
            Self::Office => "OFFICE",
            Self::BusinessTrip => "BUSINESS_TRIP",
        }
    }
}

impl fmt::Display for WorkLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkLocation {
    type Err = Error;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value.trim() {
            "HOME" => Ok(Self::Home),
            "OFFICE" => Ok(Self::Office),
            "BUSINESS_TRIP" => Ok(Self::BusinessTrip),
            other => Err(Error::validation(format!("Invalid location: {other}"))),
        }
    }
}

/// Worklog database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[sea_orm(table_name = "worklogs")]
pub struct Model {
    /// Unique identifier for the worklog
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owner of the worklog
    pub user_id: i64,
    /// Start of the session, truncated to the minute
    pub start_time: DateTimeUtc,
    /// End of the session, truncated to the minute; `None` while in progress
    pub end_time: Option<DateTimeUtc>,
    /// Optional free-form description
    pub description: Option<String>,
    /// Where the work took place
    pub location: WorkLocation,
    /// Balance minutes charged on completion
    pub cost: Option<i64>,
    /// Soft delete flag - if true, worklog is hidden but data is preserved
    pub is_deleted: bool,
    /// When the worklog was created
    pub created_at: DateTimeUtc,
    /// When the worklog was last modified
    pub updated_at: DateTimeUtc,
}

impl Model {
    /// A worklog is in progress until it has an end time.
    #[must_use]
    pub const fn is_in_progress(&self) -> bool {
        self.end_time.is_none()
    }
}

/// Defines relationships between Worklog and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each worklog belongs to one user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
    /// Balance changes caused by this worklog
    #[sea_orm(has_many = "super::balance_history::Entity")]
    BalanceHistory,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::balance_history::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BalanceHistory.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
