use anyhow::{Context, ensure};
use chrono::Duration;
use serde::Deserialize;

/// Deployment environment, read from `APP_ENV`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    pub const fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }
}

/// Service configuration, deserialized from environment variables
/// (`DATABASE_URL`, `APP_ENV`, `PORT`, ...).
#[derive(Clone, Debug, Deserialize)]
pub struct ApiConfig {
    pub database_url: String,
    #[serde(default)]
    pub app_env: Environment,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,
    /// Optimistic-concurrency attempts per review before giving up
    #[serde(default = "default_review_max_attempts")]
    pub review_max_attempts: u32,
    /// Trailing window for the average retention figure
    #[serde(default = "default_retention_window_days")]
    pub retention_window_days: i64,
    /// Upper bound on the due-list page size
    #[serde(default = "default_due_list_max_limit")]
    pub due_list_max_limit: u32,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3000
}

const fn default_db_max_connections() -> u32 {
    10
}

const fn default_review_max_attempts() -> u32 {
    SchedulerConfig::DEFAULT.max_attempts
}

const fn default_retention_window_days() -> i64 {
    SchedulerConfig::DEFAULT.retention_window_days
}

const fn default_due_list_max_limit() -> u32 {
    SchedulerConfig::DEFAULT.due_list_max_limit
}

impl ApiConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let config: Self =
            envy::from_env().context("failed to read configuration from environment")?;
        config.validate()?;
        Ok(config)
    }

    /// Build from explicit key/value pairs, using the same names as the environment.
    pub fn from_vars<I>(vars: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let config: Self = envy::from_iter(vars).context("invalid configuration")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        ensure!(self.db_max_connections >= 1, "DB_MAX_CONNECTIONS must be at least 1");
        self.scheduler_config().validate()
    }

    pub const fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            max_attempts: self.review_max_attempts,
            retention_window_days: self.retention_window_days,
            due_list_max_limit: self.due_list_max_limit,
        }
    }
}

/// Tunables of the review scheduler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SchedulerConfig {
    pub max_attempts: u32,
    pub retention_window_days: i64,
    pub due_list_max_limit: u32,
}

impl SchedulerConfig {
    pub const DEFAULT: Self = Self {
        max_attempts: 5,
        retention_window_days: 30,
        due_list_max_limit: 100,
    };

    /// Page size used when a due-list request names none.
    pub const DEFAULT_DUE_LIMIT: u32 = 20;

    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(self.max_attempts >= 1, "REVIEW_MAX_ATTEMPTS must be at least 1");
        ensure!(
            self.retention_window_days >= 1,
            "RETENTION_WINDOW_DAYS must be at least 1"
        );
        ensure!(
            self.due_list_max_limit >= 1,
            "DUE_LIST_MAX_LIMIT must be at least 1"
        );
        Ok(())
    }

    pub fn retention_window(&self) -> Duration {
        Duration::days(self.retention_window_days)
    }

    /// Clamp a requested due-list size to `1..=due_list_max_limit`.
    pub fn due_limit(&self, requested: Option<u32>) -> i64 {
        let requested = requested.unwrap_or(Self::DEFAULT_DUE_LIMIT);
        i64::from(requested.clamp(1, self.due_list_max_limit.max(1)))
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}
