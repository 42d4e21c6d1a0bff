//! Frame clock shared by every component of a scene.
//!
//! The clock never reads wall time itself; drivers feed it the raw delta they
//! measured (or a fixed step for deterministic runs). Whatever arrives is
//! clamped to [`MAX_FRAME_DT`] before any integration sees it, so a
//! backgrounded tab or a debugger break does not blow up the springs.

use crate::constants::MAX_FRAME_DT;

#[derive(Clone, Debug)]
pub struct FrameClock {
    elapsed: f32,
    delta: f32,
    frame: u64,
    fixed_delta: Option<f32>,
    max_delta: f32,
}

impl FrameClock {
    pub fn new() -> Self {
        Self {
            elapsed: 0.0,
            delta: 0.0,
            frame: 0,
            fixed_delta: None,
            max_delta: MAX_FRAME_DT,
        }
    }

    /// A clock that ignores the measured delta and always steps by `dt`.
    pub fn fixed(dt: f32) -> Self {
        Self {
            fixed_delta: Some(dt),
            ..Self::new()
        }
    }

    /// Advance by one frame. Returns the clamped delta actually applied.
    pub fn advance(&mut self, raw_dt: f32) -> f32 {
        let dt = self.fixed_delta.unwrap_or(raw_dt);
        self.delta = if dt.is_finite() {
            dt.clamp(0.0, self.max_delta)
        } else {
            0.0
        };
        self.elapsed += self.delta;
        self.frame += 1;
        self.delta
    }

    #[inline]
    pub fn delta(&self) -> f32 {
        self.delta
    }

    /// Seconds of simulated time since the scene started.
    #[inline]
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Switch between a fixed step (`Some`) and measured deltas (`None`).
    pub fn set_fixed_delta(&mut self, dt: Option<f32>) {
        self.fixed_delta = dt;
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_pause_is_clamped() {
        let mut clock = FrameClock::new();
        let dt = clock.advance(2.5);
        assert_eq!(dt, MAX_FRAME_DT);
        assert_eq!(clock.elapsed(), MAX_FRAME_DT);
        assert_eq!(clock.frame(), 1);
    }

    #[test]
    fn garbage_deltas_do_not_advance_time() {
        let mut clock = FrameClock::new();
        assert_eq!(clock.advance(f32::NAN), 0.0);
        assert_eq!(clock.advance(-1.0), 0.0);
        assert_eq!(clock.elapsed(), 0.0);
        assert_eq!(clock.frame(), 2);
    }

    #[test]
    fn fixed_clock_ignores_measured_delta() {
        let mut clock = FrameClock::fixed(1.0 / 60.0);
        clock.advance(0.2);
        assert!((clock.delta() - 1.0 / 60.0).abs() < 1e-7);
    }

    #[test]
    fn fixed_step_can_be_switched_off() {
        let mut clock = FrameClock::new();
        clock.set_fixed_delta(Some(0.01));
        assert_eq!(clock.advance(0.04), 0.01);
        clock.set_fixed_delta(None);
        assert_eq!(clock.advance(0.04), 0.04);
    }
}
