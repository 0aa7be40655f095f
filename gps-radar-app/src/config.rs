use std::{path::Path, path::PathBuf, str::FromStr, time::Duration};

use anyhow::Context;
use clap::{Args, ValueEnum};
use gps_radar_logic::{LocationRequest, Priority};
use gps_radar_provider::DEFAULT_GPSD_ADDR;
use log::LevelFilter;
use serde::{Deserialize, Serialize};

use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub enum PriorityValue {
    HighAccuracy,
    Balanced,
}

impl From<PriorityValue> for Priority {
    fn from(value: PriorityValue) -> Self {
        match value {
            PriorityValue::HighAccuracy => Priority::HighAccuracy,
            PriorityValue::Balanced => Priority::Balanced,
        }
    }
}

/// Settings given on the command line, these win over the config file
#[derive(Debug, Clone, Default, Args)]
pub struct Overrides {
    /// Address of the gpsd daemon
    #[arg(long = "gpsd")]
    pub gpsd_addr: Option<String>,
    /// Replay a recorded track (JSON lines) instead of talking to gpsd
    #[arg(long = "replay")]
    pub replay_file: Option<PathBuf>,
    /// Seconds between location updates
    #[arg(long = "interval")]
    pub update_interval_secs: Option<u64>,
    /// Accuracy to ask the location provider for
    #[arg(long, value_enum)]
    pub priority: Option<PriorityValue>,
    /// Log level (error, warn, info, debug, trace)
    #[arg(long)]
    pub log_level: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
/// Persisted app settings, read from a JSON file
pub struct RadarConfig {
    /// Address of the gpsd daemon
    pub gpsd_addr: String,
    /// Seconds between location updates
    pub update_interval_secs: u64,
    pub priority: Priority,
    /// When set, replay this track instead of connecting to gpsd
    pub replay_file: Option<PathBuf>,
    pub log_level: String,
}

impl Default for RadarConfig {
    fn default() -> Self {
        Self {
            gpsd_addr: DEFAULT_GPSD_ADDR.to_string(),
            update_interval_secs: LocationRequest::DEFAULT_INTERVAL.as_secs(),
            priority: Priority::HighAccuracy,
            replay_file: None,
            log_level: "info".to_string(),
        }
    }
}

impl RadarConfig {
    pub fn parse(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).context("Invalid config file")
    }

    pub async fn load(path: &Path) -> Result<Self> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::parse(&raw)
    }

    pub fn apply(&mut self, overrides: Overrides) {
        if let Some(addr) = overrides.gpsd_addr {
            self.gpsd_addr = addr;
        }
        if let Some(path) = overrides.replay_file {
            self.replay_file = Some(path);
        }
        if let Some(secs) = overrides.update_interval_secs {
            self.update_interval_secs = secs;
        }
        if let Some(priority) = overrides.priority {
            self.priority = priority.into();
        }
        if let Some(level) = overrides.log_level {
            self.log_level = level;
        }
    }

    pub fn level_filter(&self) -> Result<LevelFilter> {
        LevelFilter::from_str(&self.log_level)
            .with_context(|| format!("Unknown log level \"{}\"", self.log_level))
    }

    /// The interval is clamped to at least one second
    pub fn location_request(&self) -> LocationRequest {
        let interval = Duration::from_secs(self.update_interval_secs.max(1));
        LocationRequest::new(interval, self.priority)
    }
}
