use std::time::Duration;

use serde::Deserialize;

use crate::domain::{RetrainCadence, ScheduleTable};
use crate::infrastructure::mindsdb::MindsDbConnection;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub mindsdb: MindsDbConfig,
    /// MindsDB project the models live in
    #[serde(default = "default_project")]
    pub project: String,
    /// Prefix integrations with `<project>_`
    #[serde(default)]
    pub project_as_integration_prefix: bool,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    /// TOML file holding the model definitions
    #[serde(default = "default_models_path")]
    pub models_path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_metrics_listen")]
    pub listen: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MindsDbConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub managed: bool,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// Cron expressions replacing the defaults per cadence
    #[serde(default)]
    pub schedule: ScheduleOverrides,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ScheduleOverrides {
    pub monthly: Option<String>,
    pub weekly: Option<String>,
    pub daily: Option<String>,
    pub hourly: Option<String>,
}

fn default_project() -> String {
    "mindsdb".to_string()
}

fn default_models_path() -> String {
    "config/models.toml".to_string()
}

fn default_level() -> String {
    "info".to_string()
}

fn default_metrics_listen() -> String {
    "0.0.0.0:9090".to_string()
}

fn default_host() -> String {
    "http://127.0.0.1:47334".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_true() -> bool {
    true
}

fn default_timezone() -> String {
    "UTC".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            logging: LoggingConfig::default(),
            metrics: MetricsConfig::default(),
            mindsdb: MindsDbConfig::default(),
            project: default_project(),
            project_as_integration_prefix: false,
            scheduler: SchedulerConfig::default(),
            models_path: default_models_path(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: LogFormat::default(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listen: default_metrics_listen(),
        }
    }
}

impl Default for MindsDbConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            user: None,
            password: None,
            managed: false,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timezone: default_timezone(),
            schedule: ScheduleOverrides::default(),
        }
    }
}

impl MindsDbConfig {
    pub fn connection(&self) -> MindsDbConnection {
        MindsDbConnection {
            host: self.host.clone(),
            user: self.user.clone(),
            password: self.password.clone(),
            managed: self.managed,
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

impl ScheduleOverrides {
    fn entries(&self) -> Vec<(RetrainCadence, String)> {
        [
            (RetrainCadence::Monthly, &self.monthly),
            (RetrainCadence::Weekly, &self.weekly),
            (RetrainCadence::Daily, &self.daily),
            (RetrainCadence::Hourly, &self.hourly),
        ]
        .into_iter()
        .filter_map(|(cadence, expression)| expression.clone().map(|e| (cadence, e)))
        .collect()
    }
}

impl SchedulerConfig {
    /// Default schedule table with the configured overrides applied
    pub fn schedule_table(&self) -> ScheduleTable {
        ScheduleTable::default().merged_with(self.schedule.entries())
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Prefix prepended to every integration name
    pub fn integration_prefix(&self) -> String {
        if self.project_as_integration_prefix {
            format!("{}_", self.project)
        } else {
            String::new()
        }
    }
}
