/// Scheduled balance increments for all users
pub mod accrual;
/// Balance ledger - every balance change goes through here
pub mod balance;
/// Summaries over completed work
pub mod report;
/// Minute truncation, timestamp parsing and cost calculation
pub mod time;
/// User lookup, creation and seeding
pub mod user;
/// Worklog lifecycle and queries
pub mod worklog;
