//! Application settings loaded from `config.toml`.
//!
//! The file is optional: every field has a default, so a fresh checkout runs
//! without one. A few values can be overridden from the environment (see
//! [`apply_env_overrides`]) which is how deployments usually set the cost rate
//! and the accrual amount.

use crate::core::worklog::{DeletePolicy, WorklogPolicy};
use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Environment variable naming the settings file.
pub const CONFIG_PATH_VAR: &str = "OVERTIME_CONFIG";
/// Settings file used when [`CONFIG_PATH_VAR`] is not set.
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Worklog cost and deletion rules
    pub worklog: WorklogSettings,
    /// Periodic balance accrual
    pub accrual: AccrualSettings,
    /// HTTP server
    pub server: ServerSettings,
    /// Users created on startup if missing
    pub users: Vec<UserSeed>,
}

/// `[worklog]` section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WorklogSettings {
    /// Balance minutes charged per worked minute
    pub cost_per_minute: i64,
    /// Whether completed worklogs may be deleted (with refund)
    pub delete_policy: DeletePolicy,
}

impl Default for WorklogSettings {
    fn default() -> Self {
        Self {
            cost_per_minute: 1,
            delete_policy: DeletePolicy::default(),
        }
    }
}

/// `[accrual]` section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AccrualSettings {
    /// Minutes credited to every user per run; zero or less disables the job
    pub balance_increment: i64,
    /// Hours between runs
    pub interval_hours: u64,
}

impl Default for AccrualSettings {
    fn default() -> Self {
        Self {
            balance_increment: 0,
            interval_hours: 24,
        }
    }
}

/// `[server]` section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Address the HTTP API listens on
    pub bind_address: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:3000".to_string(),
        }
    }
}

/// A `[[users]]` entry
#[derive(Debug, Clone, Deserialize)]
pub struct UserSeed {
    /// Unique user name
    pub name: String,
    /// Balance granted on creation
    #[serde(default)]
    pub initial_balance: i64,
}

impl Settings {
    /// The cost and deletion rules handed to the worklog service.
    #[must_use]
    pub const fn worklog_policy(&self) -> WorklogPolicy {
        WorklogPolicy {
            cost_per_minute: self.worklog.cost_per_minute,
            delete_policy: self.worklog.delete_policy,
        }
    }

    /// Rejects settings the rest of the system cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.worklog.cost_per_minute < 0 {
            return Err(Error::Config {
                message: format!(
                    "cost_per_minute must not be negative, got {}",
                    self.worklog.cost_per_minute
                ),
            });
        }
        if self.accrual.interval_hours == 0 {
            return Err(Error::Config {
                message: "accrual interval_hours must be at least 1".to_string(),
            });
        }
        if let Some(seed) = self.users.iter().find(|seed| seed.name.trim().is_empty()) {
            return Err(Error::Config {
                message: format!("user seed with empty name (initial_balance {})", seed.initial_balance),
            });
        }
        if let Some(seed) = self.users.iter().find(|seed| seed.initial_balance < 0) {
            return Err(Error::Config {
                message: format!("user '{}' has a negative initial_balance", seed.name),
            });
        }
        Ok(())
    }
}

/// Parses settings from TOML text.
pub fn parse_settings(contents: &str) -> Result<Settings> {
    toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })
}

/// Loads settings from a TOML file
///
/// # Errors
/// Returns an error if the file cannot be read or its TOML is invalid.
pub fn load_settings_from<P: AsRef<Path>>(path: P) -> Result<Settings> {
    let path_ref = path.as_ref();
    tracing::debug!("Attempting to load configuration from: {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path_ref.display()),
    })?;
    parse_settings(&contents)
}

/// Loads the application settings.
///
/// Reads the file named by `OVERTIME_CONFIG` (default `./config.toml`), falling
/// back to defaults when the file does not exist, then applies environment
/// overrides and validates the result.
pub fn load_settings() -> Result<Settings> {
    let path = std::env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let mut settings = if Path::new(&path).exists() {
        load_settings_from(&path)?
    } else {
        tracing::info!("No config file at {}, using defaults", path);
        Settings::default()
    };
    apply_env_overrides(&mut settings, |key| std::env::var(key).ok())?;
    settings.validate()?;
    Ok(settings)
}

/// Overrides settings from `WORK_COST_PER_MINUTE`, `CRON_BALANCE_INCREMENT`
/// and `BIND_ADDRESS`, looked up through `lookup`.
pub fn apply_env_overrides<F>(settings: &mut Settings, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = lookup("WORK_COST_PER_MINUTE") {
        settings.worklog.cost_per_minute = parse_env_number("WORK_COST_PER_MINUTE", &value)?;
    }
    if let Some(value) = lookup("CRON_BALANCE_INCREMENT") {
        settings.accrual.balance_increment = parse_env_number("CRON_BALANCE_INCREMENT", &value)?;
    }
    if let Some(value) = lookup("BIND_ADDRESS") {
        settings.server.bind_address = value;
    }
    Ok(())
}

fn parse_env_number(key: &str, value: &str) -> Result<i64> {
    value.trim().parse().map_err(|e| Error::Config {
        message: format!("{key} must be an integer, got '{value}': {e}"),
    })
}
