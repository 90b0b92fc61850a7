//! Start-of-playback gain ramp
//!
//! Walks a normalized position from 0.0 to 1.0 in fixed increments, one per
//! timer tick, and maps it through a [`GainCurve`]. The ramp itself holds no
//! timer: the engine ticks it at [`GainRamp::interval`] while
//! [`GainRamp::is_active`] is true.
//!
//! Each start bumps a generation counter so the engine can tell a restarted
//! ramp from a continuing one and reset its ticker.

use std::time::Duration;
use tilawa_common::config::TransportConfig;
use tilawa_common::GainCurve;

#[derive(Debug, Clone)]
pub struct GainRamp {
    curve: GainCurve,
    step: f32,
    interval: Duration,
    ticks: usize,
    active: bool,
    generation: u64,
}

impl GainRamp {
    pub fn new(curve: GainCurve, step: f32, interval: Duration) -> Self {
        Self {
            curve,
            step: step.clamp(f32::EPSILON, 1.0),
            interval,
            ticks: 0,
            active: false,
            generation: 0,
        }
    }

    pub fn from_config(config: &TransportConfig) -> Self {
        Self::new(config.ramp_curve, config.ramp_step, config.ramp_interval())
    }

    /// Begin a new ramp from silence, replacing any ramp in flight
    ///
    /// Returns the starting volume (always the curve value at 0.0).
    pub fn start(&mut self) -> f32 {
        self.ticks = 0;
        self.active = true;
        self.generation = self.generation.wrapping_add(1);
        self.curve.gain_at(0.0)
    }

    /// Advance one step; returns the volume to apply, or `None` when idle
    ///
    /// The ramp deactivates itself on the tick that reaches full volume.
    pub fn tick(&mut self) -> Option<f32> {
        if !self.active {
            return None;
        }
        self.ticks += 1;
        let position = if self.ticks >= self.steps() {
            self.active = false;
            1.0
        } else {
            self.ticks as f32 * self.step
        };
        Some(self.curve.gain_at(position))
    }

    /// Stop the ramp where it is (no-op when idle)
    pub fn cancel(&mut self) {
        self.active = false;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Number of ticks from silence to full volume
    pub fn steps(&self) -> usize {
        ((1.0 / self.step) - 1e-4).ceil().max(1.0) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp() -> GainRamp {
        GainRamp::from_config(&TransportConfig::default())
    }

    #[test]
    fn test_default_ramp_timing() {
        let ramp = ramp();
        assert_eq!(ramp.interval(), Duration::from_millis(20));
        assert_eq!(ramp.steps(), 20);
    }

    #[test]
    fn test_ramp_reaches_full_volume_and_stops() {
        let mut ramp = ramp();
        assert_eq!(ramp.start(), 0.0);

        let mut volumes = Vec::new();
        while let Some(v) = ramp.tick() {
            volumes.push(v);
        }

        assert_eq!(volumes.len(), 20);
        assert!((volumes[0] - 0.05).abs() < 1e-6);
        assert_eq!(*volumes.last().unwrap(), 1.0);
        assert!(!ramp.is_active());
        assert_eq!(ramp.tick(), None);
    }

    #[test]
    fn test_restart_resets_position_and_bumps_generation() {
        let mut ramp = ramp();
        ramp.start();
        ramp.tick();
        ramp.tick();
        let first = ramp.generation();

        ramp.start();
        assert_eq!(ramp.generation(), first + 1);
        assert!((ramp.tick().unwrap() - 0.05).abs() < 1e-6);
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let mut ramp = ramp();
        ramp.cancel();
        ramp.start();
        ramp.cancel();
        ramp.cancel();
        assert!(!ramp.is_active());
        assert_eq!(ramp.tick(), None);
    }
}
