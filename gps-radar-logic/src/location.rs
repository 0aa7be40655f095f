use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::prelude::*;

/// Convenience alias for UTC DT
pub type UtcDT = DateTime<Utc>;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
/// A single fix as delivered by a [LocationProvider]
pub struct LocationSample {
    /// Latitude in degrees
    pub latitude: f64,
    /// Longitude in degrees
    pub longitude: f64,
    /// Estimated horizontal accuracy in meters
    pub accuracy: f32,
    /// Ground speed in meters per second, optional as not every fix carries one
    pub speed: Option<f32>,
    /// When the provider received this fix
    pub received_at: UtcDT,
}

impl LocationSample {
    pub fn new(latitude: f64, longitude: f64, accuracy: f32, speed: Option<f32>) -> Self {
        Self {
            latitude,
            longitude,
            accuracy,
            speed,
            received_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
/// How hard the provider should work for a fix
pub enum Priority {
    /// Best fix the hardware can give, costs the most power
    #[default]
    HighAccuracy,
    /// Accept coarser fixes
    Balanced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Parameters for a location subscription
pub struct LocationRequest {
    /// Time between delivered fixes
    pub interval: Duration,
    pub priority: Priority,
}

impl LocationRequest {
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(10);

    pub fn new(interval: Duration, priority: Priority) -> Self {
        Self { interval, priority }
    }
}

impl Default for LocationRequest {
    fn default() -> Self {
        Self::new(Self::DEFAULT_INTERVAL, Priority::HighAccuracy)
    }
}

/// Source of location fixes, e.g. a GNSS daemon or a recorded track.
pub trait LocationProvider: Send + Sync + 'static {
    /// Called when a subscription begins, providers should power up / start streaming here
    fn activate(
        &self,
        _request: &LocationRequest,
    ) -> impl std::future::Future<Output = Result> + Send {
        async { Ok(()) }
    }
    /// Get the most recent fix satisfying `priority`, `None` if there isn't one yet
    fn last_fix(&self, priority: Priority) -> Option<LocationSample>;
    /// Called once the subscription has ended
    fn deactivate(&self) -> impl std::future::Future<Output = ()> + Send {
        async {}
    }
}
