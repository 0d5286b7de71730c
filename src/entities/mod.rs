//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod balance_history;
pub mod user;
pub mod worklog;

// Re-export specific types to avoid conflicts
pub use balance_history::{
    BalanceChangeType, Column as BalanceHistoryColumn, Entity as BalanceHistory,
    Model as BalanceHistoryModel,
};
pub use user::{Column as UserColumn, Entity as User, Model as UserModel};
pub use worklog::{Column as WorklogColumn, Entity as Worklog, Model as WorklogModel, WorkLocation};
