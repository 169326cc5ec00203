//! Accumulator-driven fixed timestep with render interpolation.
//!
//! Frame time is clamped, added to an accumulator and consumed in whole ticks.
//! At most `max_ticks_per_frame` run per frame; when the cap is reached the
//! leftover time is dropped instead of carried over, which keeps a slow frame
//! from snowballing into ever longer catch-up frames.

use bevy::log::debug;
use bevy::math::Vec3;

use crate::config::FixedStepConfig;

/// Outcome of one [`FixedStepScheduler::advance`] call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameStep {
    /// Ticks run this frame
    pub ticks: u32,
    /// Fraction of a tick left in the accumulator, in `[0, 1]`
    pub alpha: f32,
    /// Position between the previous and current snapshots at `alpha`
    pub interpolated: Vec3,
    /// Simulated time discarded because the tick cap was hit (seconds)
    pub dropped: f32,
}

#[derive(Debug, Clone)]
pub struct FixedStepScheduler {
    config: FixedStepConfig,
    accumulator: f32,
    previous: Vec3,
    current: Vec3,
    total_ticks: u64,
}

impl FixedStepScheduler {
    pub fn new(config: FixedStepConfig, position: Vec3) -> Self {
        Self {
            config,
            accumulator: 0.0,
            previous: position,
            current: position,
            total_ticks: 0,
        }
    }

    pub fn tick_duration(&self) -> f32 {
        self.config.tick
    }

    pub fn accumulator(&self) -> f32 {
        self.accumulator
    }

    /// Ticks run since construction.
    pub fn total_ticks(&self) -> u64 {
        self.total_ticks
    }

    /// Simulated time consumed since construction.
    pub fn simulated_time(&self) -> f64 {
        self.total_ticks as f64 * self.config.tick as f64
    }

    /// Snap both snapshots to `position`, e.g. after a respawn.
    pub fn reset(&mut self, position: Vec3) {
        self.previous = position;
        self.current = position;
    }

    /// Feed one render frame of `frame_delta` seconds.
    ///
    /// `tick` runs the simulation for one fixed step of the given duration and
    /// returns the position to interpolate.
    pub fn advance<F>(&mut self, frame_delta: f32, mut tick: F) -> FrameStep
    where
        F: FnMut(f32) -> Vec3,
    {
        let frame_delta = if frame_delta.is_finite() {
            frame_delta.clamp(0.0, self.config.max_frame_delta)
        } else {
            0.0
        };
        self.accumulator += frame_delta;
        self.previous = self.current;

        let step = self.config.tick;
        let mut ticks = 0;
        while self.accumulator >= step && ticks < self.config.max_ticks_per_frame {
            self.current = tick(step);
            self.accumulator -= step;
            ticks += 1;
        }
        self.total_ticks += ticks as u64;

        let mut dropped = 0.0;
        if ticks >= self.config.max_ticks_per_frame && self.accumulator > 0.0 {
            dropped = self.accumulator;
            self.accumulator = 0.0;
            debug!(
                "Fixed-step cap of {} ticks reached, dropping {:.4}s",
                ticks, dropped
            );
        }

        let alpha = if step > 0.0 {
            (self.accumulator / step).clamp(0.0, 1.0)
        } else {
            0.0
        };
        FrameStep {
            ticks,
            alpha,
            interpolated: self.previous.lerp(self.current, alpha),
            dropped,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Binary fractions keep the accumulator arithmetic exact.
    fn scheduler(max_ticks: u32, max_frame_delta: f32) -> FixedStepScheduler {
        FixedStepScheduler::new(
            FixedStepConfig {
                tick: 0.125,
                max_ticks_per_frame: max_ticks,
                max_frame_delta,
            },
            Vec3::ZERO,
        )
    }

    #[test]
    fn test_whole_ticks_are_consumed() {
        let mut s = scheduler(10, 0.5);
        let mut x = 0.0;
        let step = s.advance(0.4375, |dt| {
            x += dt;
            Vec3::new(x, 0.0, 0.0)
        });
        assert_eq!(step.ticks, 3);
        assert_eq!(s.accumulator(), 0.0625);
        assert_eq!(step.alpha, 0.5);
        // previous is the frame-start position, current is after three ticks
        assert_eq!(step.interpolated.x, 0.1875);
        assert_eq!(step.dropped, 0.0);
    }

    #[test]
    fn test_frame_delta_is_clamped() {
        let mut s = scheduler(100, 0.5);
        let step = s.advance(2.0, |_| Vec3::ZERO);
        assert_eq!(step.ticks, 4);
        assert_eq!(s.advance(-1.0, |_| Vec3::ZERO).ticks, 0);
        assert_eq!(s.advance(f32::NAN, |_| Vec3::ZERO).ticks, 0);
        assert_eq!(s.total_ticks(), 4);
    }

    #[test]
    fn test_tick_cap_drops_leftover_time() {
        let mut s = scheduler(2, 0.5);
        let step = s.advance(0.5, |_| Vec3::ZERO);
        assert_eq!(step.ticks, 2);
        assert_eq!(step.dropped, 0.25);
        assert_eq!(s.accumulator(), 0.0);
        assert_eq!(step.alpha, 0.0);
    }

    #[test]
    fn test_accumulator_conservation() {
        let mut s = FixedStepScheduler::new(FixedStepConfig::default(), Vec3::ZERO);
        let deltas = [0.016, 0.017, 0.003, 0.049, 0.0, 0.021, 0.033, 0.008];
        let mut frame_time = 0.0f64;
        for d in deltas {
            s.advance(d, |_| Vec3::ZERO);
            frame_time += d as f64;
        }
        let simulated = s.simulated_time();
        assert!(simulated <= frame_time + 1e-5);
        assert!(
            (frame_time - simulated - s.accumulator() as f64).abs() < 1e-4,
            "Without hitting the cap, no time is lost"
        );
    }

    #[test]
    fn test_reset_snaps_interpolation() {
        let mut s = scheduler(10, 0.5);
        s.advance(0.125, |_| Vec3::new(1.0, 0.0, 0.0));
        s.reset(Vec3::new(0.0, 7.0, 6.0));
        let step = s.advance(0.0, |_| Vec3::ZERO);
        assert_eq!(step.interpolated, Vec3::new(0.0, 7.0, 6.0));
    }
}
