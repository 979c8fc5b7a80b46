//! Fixed-step timing.
//!
//! The arena is always advanced in whole fixed steps. Wall-clock or scripted
//! frame deltas are fed into an accumulator that hands out those steps.

/// Default simulation rate.
pub const DEFAULT_TICK_RATE: u32 = 60;

/// Largest frame delta accepted before clamping.
pub const MAX_FRAME_DT: f32 = 0.25;

/// Most steps handed out for one frame.
pub const MAX_STEPS_PER_FRAME: u32 = 10;

/// Accumulator for fixed timestep updates.
#[derive(Debug, Clone)]
pub struct FixedStep {
    fixed_dt: f32,
    accumulator: f32,
    total_steps: u64,
}

impl Default for FixedStep {
    fn default() -> Self {
        Self::new(DEFAULT_TICK_RATE)
    }
}

impl FixedStep {
    /// Creates a stepper running at `tick_rate` steps per second.
    #[must_use]
    pub fn new(tick_rate: u32) -> Self {
        let tick_rate = tick_rate.max(1);
        Self {
            fixed_dt: 1.0 / tick_rate as f32,
            accumulator: 0.0,
            total_steps: 0,
        }
    }

    /// Seconds per step.
    #[must_use]
    pub fn fixed_dt(&self) -> f32 {
        self.fixed_dt
    }

    /// Steps handed out so far.
    #[must_use]
    pub fn total_steps(&self) -> u64 {
        self.total_steps
    }

    /// Simulated seconds covered by the steps handed out so far.
    #[must_use]
    pub fn elapsed(&self) -> f64 {
        self.total_steps as f64 * f64::from(self.fixed_dt)
    }

    /// Time carried over to the next frame.
    #[must_use]
    pub fn leftover(&self) -> f32 {
        self.accumulator
    }

    /// Adds a frame delta and returns how many fixed steps to run.
    ///
    /// Deltas are clamped to [`MAX_FRAME_DT`]. If the caller is still behind
    /// after [`MAX_STEPS_PER_FRAME`] steps, the backlog is dropped.
    pub fn accumulate(&mut self, dt: f32) -> u32 {
        if !dt.is_finite() || dt <= 0.0 {
            return 0;
        }
        self.accumulator += dt.min(MAX_FRAME_DT);

        let mut count = 0;
        while self.accumulator >= self.fixed_dt && count < MAX_STEPS_PER_FRAME {
            self.accumulator -= self.fixed_dt;
            count += 1;
        }

        if self.accumulator > self.fixed_dt * 2.0 {
            self.accumulator = 0.0;
        }

        self.total_steps += u64::from(count);
        count
    }

    /// Reset timing (call after pause or loading).
    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rate() {
        let step = FixedStep::default();
        assert!((step.fixed_dt() - 1.0 / 60.0).abs() < 1e-6);
    }

    #[test]
    fn test_zero_rate_clamped() {
        let step = FixedStep::new(0);
        assert!((step.fixed_dt() - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_accumulate_whole_steps() {
        let mut step = FixedStep::new(8);
        assert_eq!(step.accumulate(0.1875), 1);
        assert!((step.leftover() - 0.0625).abs() < 1e-6);
        assert_eq!(step.accumulate(0.0625), 1);
        assert_eq!(step.total_steps(), 2);
        assert!((step.elapsed() - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_accumulate_clamps_large_delta() {
        let mut step = FixedStep::new(60);
        assert_eq!(step.accumulate(5.0), 10);
        // 0.25s is 15 steps; the five left over are dropped
        assert!(step.leftover() < step.fixed_dt());
    }

    #[test]
    fn test_accumulate_ignores_bad_delta() {
        let mut step = FixedStep::new(60);
        assert_eq!(step.accumulate(-1.0), 0);
        assert_eq!(step.accumulate(f32::NAN), 0);
        assert_eq!(step.total_steps(), 0);
    }

    #[test]
    fn test_reset() {
        let mut step = FixedStep::new(8);
        step.accumulate(0.0625);
        step.reset();
        assert_eq!(step.leftover(), 0.0);
    }
}
