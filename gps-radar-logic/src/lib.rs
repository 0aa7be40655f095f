mod display;
mod location;
mod model;
mod permission;
mod radar;
mod session;
mod subscription;
mod sweep;
#[cfg(test)]
mod tests;

pub use display::{
    ADVISORY_DURATION, DetailRow, LocationDetails, RadarDisplay, RadarView, StatusCard,
    ToggleAction, ToggleButton, format_accuracy, format_degrees, format_speed, render,
};
pub use location::{LocationProvider, LocationRequest, LocationSample, Priority, UtcDT};
pub use model::{Effect, Msg, RadarModel};
pub use permission::{
    LocationPermission, PERMISSION_ADVISORY, PermissionGrants, PermissionPrompt, PermissionState,
    REQUIRED_PERMISSIONS,
};
pub use radar::{Radar, StateUpdateSender};
pub use session::{LocationSession, SessionState};
pub use subscription::{SubscriptionHandle, subscribe};
pub use sweep::{SWEEP_PERIOD, SweepAnimation};

pub mod prelude {
    use anyhow::Error as AnyhowError;
    use std::result::Result as StdResult;
    pub type Result<T = (), E = AnyhowError> = StdResult<T, E>;
    pub use anyhow::Context;
}
