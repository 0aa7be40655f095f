use std::time::Duration;

use tokio::time::Instant;

/// Time for the sweep to make one full turn, also the time between steps
pub const SWEEP_PERIOD: Duration = Duration::from_secs(2);

const FULL_TURN: f32 = 360.0;

/// Rotating radar sweep. While running the sweep is stepped every [SWEEP_PERIOD], each step
/// queues one more full turn that is eased in linearly. Stopping freezes the angle where it is.
#[derive(Debug, Clone, Default)]
pub struct SweepAnimation {
    /// Angle at the last step (or where we froze)
    base: f32,
    last_step: Option<Instant>,
    running: bool,
}

impl SweepAnimation {
    pub fn start(&mut self, now: Instant) {
        if self.running {
            return;
        }
        self.running = true;
        self.last_step = None;
        self.step(now);
    }

    pub fn stop(&mut self, now: Instant) {
        if !self.running {
            return;
        }
        self.base = self.angle(now);
        self.last_step = None;
        self.running = false;
    }

    /// Queue the next full turn, does nothing while stopped
    pub fn step(&mut self, now: Instant) {
        if !self.running {
            return;
        }
        self.base = self.angle(now);
        self.last_step = Some(now);
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// When the next step is due, `None` while stopped
    pub fn next_step(&self) -> Option<Instant> {
        if self.running {
            self.last_step.map(|at| at + SWEEP_PERIOD)
        } else {
            None
        }
    }

    /// Current angle in degrees, within `0..360`
    pub fn angle(&self, now: Instant) -> f32 {
        let progress = match self.last_step {
            Some(at) if self.running => {
                let elapsed = now.saturating_duration_since(at).as_secs_f32();
                (elapsed / SWEEP_PERIOD.as_secs_f32()).min(1.0)
            }
            _ => 0.0,
        };
        (self.base + FULL_TURN * progress).rem_euclid(FULL_TURN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 0.01
    }

    #[test]
    fn test_idle_sweep_does_not_move() {
        let start = Instant::now();
        let mut sweep = SweepAnimation::default();
        sweep.step(start);

        assert!(!sweep.is_running());
        assert!(sweep.next_step().is_none());
        assert!(approx(sweep.angle(start + Duration::from_secs(7)), 0.0));
    }

    #[test]
    fn test_sweep_turns_linearly() {
        let start = Instant::now();
        let mut sweep = SweepAnimation::default();
        sweep.start(start);

        assert_eq!(sweep.next_step(), Some(start + SWEEP_PERIOD));
        assert!(approx(sweep.angle(start + Duration::from_millis(500)), 90.0));
        assert!(approx(sweep.angle(start + Duration::from_secs(1)), 180.0));

        // Waiting past the period without a step holds at a full turn
        assert!(approx(sweep.angle(start + Duration::from_secs(5)), 0.0));

        let next = start + SWEEP_PERIOD;
        sweep.step(next);
        assert!(approx(sweep.angle(next + Duration::from_millis(1500)), 270.0));
    }

    #[test]
    fn test_stop_freezes_without_reset() {
        let start = Instant::now();
        let mut sweep = SweepAnimation::default();
        sweep.start(start);

        let stopped_at = start + Duration::from_millis(500);
        sweep.stop(stopped_at);

        assert!(sweep.next_step().is_none());
        assert!(approx(sweep.angle(stopped_at + Duration::from_secs(10)), 90.0));

        let restart = stopped_at + Duration::from_secs(20);
        sweep.start(restart);
        assert!(approx(sweep.angle(restart), 90.0));
        assert!(approx(sweep.angle(restart + Duration::from_secs(1)), 270.0));
    }
}
