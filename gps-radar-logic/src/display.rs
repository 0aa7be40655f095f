use std::time::Duration;

use crate::location::LocationSample;

/// How long the advisory notice stays on screen
pub const ADVISORY_DURATION: Duration = Duration::from_millis(3500);

/// Number of range rings drawn inside the radar's outer edge
const RADAR_RINGS: u8 = 3;

const MPS_TO_KMH: f64 = 3.6;

#[derive(Debug, Clone, PartialEq)]
pub struct StatusCard {
    pub title: &'static str,
    pub badge: &'static str,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RadarDisplay {
    pub rings: u8,
    /// Angle of the sweep in degrees, only present while tracking
    pub sweep_angle: Option<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DetailRow {
    pub label: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocationDetails {
    pub title: &'static str,
    pub rows: Vec<DetailRow>,
}

impl LocationDetails {
    pub fn row(&self, label: &str) -> Option<&str> {
        self.rows
            .iter()
            .find(|row| row.label == label)
            .map(|row| row.value.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// What pressing the toggle button does
pub enum ToggleAction {
    StartTracking,
    StopTracking,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ToggleButton {
    pub label: &'static str,
    pub action: ToggleAction,
}

#[derive(Debug, Clone, PartialEq)]
/// Everything a front end needs to draw the screen
pub struct RadarView {
    pub status: StatusCard,
    pub radar: RadarDisplay,
    /// Only present once we've received a fix
    pub details: Option<LocationDetails>,
    pub button: ToggleButton,
    /// Transient notice to show the user
    pub advisory: Option<&'static str>,
}

pub fn format_degrees(value: f64) -> String {
    format!("{value:.6}°")
}

pub fn format_accuracy(meters: f32) -> String {
    format!("{meters:.1} meters")
}

/// Format a speed given in m/s as km/h
pub fn format_speed(mps: f32) -> String {
    let kmh = f64::from(mps) * MPS_TO_KMH;
    format!("{kmh:.1} km/h")
}

fn location_details(sample: &LocationSample) -> LocationDetails {
    let mut rows = vec![
        DetailRow {
            label: "Latitude",
            value: format_degrees(sample.latitude),
        },
        DetailRow {
            label: "Longitude",
            value: format_degrees(sample.longitude),
        },
        DetailRow {
            label: "Accuracy",
            value: format_accuracy(sample.accuracy),
        },
    ];

    if let Some(speed) = sample.speed {
        rows.push(DetailRow {
            label: "Speed",
            value: format_speed(speed),
        });
    }

    LocationDetails {
        title: "Location Details",
        rows,
    }
}

/// Build the view for the latest sample and tracking flag. Values are displayed as given, no
/// range checks are done on coordinates.
pub fn render(
    sample: Option<&LocationSample>,
    tracking: bool,
    sweep_angle: f32,
    advisory: Option<&'static str>,
) -> RadarView {
    let status = StatusCard {
        title: if tracking { "GPS Active" } else { "GPS Inactive" },
        badge: if tracking { "TRACKING" } else { "STOPPED" },
        active: tracking,
    };

    let radar = RadarDisplay {
        rings: RADAR_RINGS,
        sweep_angle: tracking.then_some(sweep_angle),
    };

    let button = if tracking {
        ToggleButton {
            label: "Stop Tracking",
            action: ToggleAction::StopTracking,
        }
    } else {
        ToggleButton {
            label: "Start Tracking",
            action: ToggleAction::StartTracking,
        }
    };

    RadarView {
        status,
        radar,
        details: sample.map(location_details),
        button,
        advisory,
    }
}
