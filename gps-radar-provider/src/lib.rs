mod gpsd;
mod replay;

pub use gpsd::{DEFAULT_GPSD_ADDR, GpsdProvider};
pub use replay::ReplayProvider;
