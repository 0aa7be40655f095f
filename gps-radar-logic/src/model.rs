use log::debug;
use tokio::time::Instant;

use crate::{
    display::{ADVISORY_DURATION, RadarView, render},
    location::LocationSample,
    permission::{PERMISSION_ADVISORY, PermissionState},
    sweep::SweepAnimation,
};

#[derive(Debug, Clone, PartialEq)]
/// Something that happened, fed into [RadarModel::update]
pub enum Msg {
    /// The one-time permission request has been answered
    PermissionResolved(PermissionState),
    StartTracking,
    StopTracking,
    /// The toggle button was pressed
    ToggleTracking,
    /// A new fix arrived from the subscription
    Sample(LocationSample),
    /// The sweep animation's step timer fired
    SweepStep,
    /// The screen is going away
    Teardown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Side effects the runtime must carry out after an update
pub enum Effect {
    Subscribe,
    Unsubscribe,
    ShowAdvisory(&'static str),
}

/// State of the radar screen. Only [RadarModel::update] mutates it, front ends read it through
/// [RadarModel::view].
#[derive(Debug, Default)]
pub struct RadarModel {
    latest: Option<LocationSample>,
    tracking: bool,
    permission: PermissionState,
    advisory: Option<(&'static str, Instant)>,
    advisories_shown: u32,
    sweep: SweepAnimation,
}

impl RadarModel {
    pub fn update(&mut self, msg: Msg, now: Instant) -> Vec<Effect> {
        match msg {
            Msg::PermissionResolved(permission) => self.resolve_permission(permission, now),
            Msg::StartTracking => self.start_tracking(now),
            Msg::StopTracking | Msg::Teardown => self.stop_tracking(now),
            Msg::ToggleTracking => {
                if self.tracking {
                    self.stop_tracking(now)
                } else {
                    self.start_tracking(now)
                }
            }
            Msg::Sample(sample) => {
                if self.tracking {
                    self.latest = Some(sample);
                } else {
                    debug!("Dropping sample received while idle");
                }
                vec![]
            }
            Msg::SweepStep => {
                self.sweep.step(now);
                vec![]
            }
        }
    }

    fn resolve_permission(&mut self, permission: PermissionState, now: Instant) -> Vec<Effect> {
        if self.permission != PermissionState::NotRequested {
            debug!("Permission already resolved as {:?}", self.permission);
            return vec![];
        }

        self.permission = permission;

        if permission == PermissionState::Denied {
            self.advisory = Some((PERMISSION_ADVISORY, now));
            self.advisories_shown += 1;
            vec![Effect::ShowAdvisory(PERMISSION_ADVISORY)]
        } else {
            vec![]
        }
    }

    fn start_tracking(&mut self, now: Instant) -> Vec<Effect> {
        if self.tracking {
            return vec![];
        }

        if !self.permission.is_granted() {
            debug!(
                "Can't start tracking, location permission is {:?}",
                self.permission
            );
            return vec![];
        }

        self.tracking = true;
        self.sweep.start(now);
        vec![Effect::Subscribe]
    }

    fn stop_tracking(&mut self, now: Instant) -> Vec<Effect> {
        if !self.tracking {
            return vec![];
        }

        self.tracking = false;
        self.sweep.stop(now);
        vec![Effect::Unsubscribe]
    }

    pub fn view(&self, now: Instant) -> RadarView {
        let advisory = self
            .advisory
            .filter(|(_, shown_at)| now.saturating_duration_since(*shown_at) < ADVISORY_DURATION)
            .map(|(msg, _)| msg);

        render(
            self.latest.as_ref(),
            self.tracking,
            self.sweep.angle(now),
            advisory,
        )
    }

    pub fn is_tracking(&self) -> bool {
        self.tracking
    }

    pub fn latest(&self) -> Option<&LocationSample> {
        self.latest.as_ref()
    }

    pub fn permission(&self) -> PermissionState {
        self.permission
    }

    /// How many times the user has been shown an advisory notice
    pub fn advisories_shown(&self) -> u32 {
        self.advisories_shown
    }

    /// When the sweep animation should next be stepped, if it's running
    pub fn next_sweep_step(&self) -> Option<Instant> {
        self.sweep.next_step()
    }
}
