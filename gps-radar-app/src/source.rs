use gps_radar_logic::{LocationProvider, LocationRequest, LocationSample, Priority};
use gps_radar_provider::{GpsdProvider, ReplayProvider};
use log::info;

use crate::{Result, config::RadarConfig};

/// The provider picked by the user's config
pub enum LocationSource {
    Gpsd(GpsdProvider),
    Replay(ReplayProvider),
}

impl LocationSource {
    pub async fn from_config(config: &RadarConfig) -> Result<Self> {
        if let Some(path) = &config.replay_file {
            info!("Replaying track from {}", path.display());
            let provider = ReplayProvider::load(path).await?;
            Ok(Self::Replay(provider))
        } else {
            info!("Using gpsd at {}", config.gpsd_addr);
            Ok(Self::Gpsd(GpsdProvider::new(config.gpsd_addr.as_str())))
        }
    }
}

impl LocationProvider for LocationSource {
    async fn activate(&self, request: &LocationRequest) -> Result {
        match self {
            Self::Gpsd(gpsd) => gpsd.activate(request).await,
            Self::Replay(replay) => replay.activate(request).await,
        }
    }

    fn last_fix(&self, priority: Priority) -> Option<LocationSample> {
        match self {
            Self::Gpsd(gpsd) => gpsd.last_fix(priority),
            Self::Replay(replay) => replay.last_fix(priority),
        }
    }

    async fn deactivate(&self) {
        match self {
            Self::Gpsd(gpsd) => gpsd.deactivate().await,
            Self::Replay(replay) => replay.deactivate().await,
        }
    }
}
