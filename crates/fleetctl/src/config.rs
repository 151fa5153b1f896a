//! fleet.toml configuration parser.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use fleet_requeue::DriverConfig;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FleetConfig {
    pub log: Option<LogConfig>,
    pub requeue: Option<RequeueConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogConfig {
    pub level: Option<String>,
    pub format: Option<LogFormat>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequeueConfig {
    pub resync_interval_secs: Option<u64>,
}

impl FleetConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: FleetConfig = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn log_level(&self) -> &str {
        self.log
            .as_ref()
            .and_then(|l| l.level.as_deref())
            .unwrap_or("info")
    }

    pub fn log_format(&self) -> LogFormat {
        self.log.as_ref().and_then(|l| l.format).unwrap_or_default()
    }

    pub fn driver_config(&self) -> DriverConfig {
        let mut config = DriverConfig::default();
        if let Some(secs) = self.requeue.as_ref().and_then(|r| r.resync_interval_secs) {
            config.resync_interval = Duration::from_secs(secs.max(1));
        }
        config
    }

    /// Apply command-line overrides on top of file values.
    pub fn with_overrides(
        mut self,
        level: Option<String>,
        format: Option<LogFormat>,
        resync_secs: Option<u64>,
    ) -> Self {
        if level.is_some() || format.is_some() {
            let log = self.log.get_or_insert_with(LogConfig::default);
            if level.is_some() {
                log.level = level;
            }
            if format.is_some() {
                log.format = format;
            }
        }
        if resync_secs.is_some() {
            self.requeue = Some(RequeueConfig {
                resync_interval_secs: resync_secs,
            });
        }
        self
    }
}
