use std::{
    path::Path,
    sync::atomic::{AtomicUsize, Ordering},
};

use anyhow::{Context, bail};
use gps_radar_logic::{LocationProvider, LocationSample, Priority, prelude::Result};
use log::info;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
struct ReplayRecord {
    latitude: f64,
    longitude: f64,
    #[serde(default)]
    accuracy: f32,
    speed: Option<f32>,
}

/// Plays back a recorded track, one JSON object per line. Every poll hands out the next record,
/// wrapping around at the end of the track.
pub struct ReplayProvider {
    records: Vec<ReplayRecord>,
    cursor: AtomicUsize,
}

impl ReplayProvider {
    pub fn parse(contents: &str) -> Result<Self> {
        let records = contents
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(i, line)| {
                serde_json::from_str::<ReplayRecord>(line)
                    .with_context(|| format!("Invalid replay record on line {}", i + 1))
            })
            .collect::<Result<Vec<_>>>()?;

        if records.is_empty() {
            bail!("Replay track has no fixes");
        }

        Ok(Self {
            records,
            cursor: AtomicUsize::new(0),
        })
    }

    pub async fn load(path: &Path) -> Result<Self> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read replay track {}", path.display()))?;
        let provider = Self::parse(&contents)?;
        info!(
            "Loaded {} fixes from {}",
            provider.fix_count(),
            path.display()
        );
        Ok(provider)
    }

    pub fn fix_count(&self) -> usize {
        self.records.len()
    }
}

impl LocationProvider for ReplayProvider {
    /// Recorded fixes are played back regardless of `priority`
    fn last_fix(&self, _priority: Priority) -> Option<LocationSample> {
        let i = self.cursor.fetch_add(1, Ordering::Relaxed) % self.records.len();
        let record = &self.records[i];
        Some(LocationSample::new(
            record.latitude,
            record.longitude,
            record.accuracy,
            record.speed,
        ))
    }
}
