use crate::error::{check_upper_closed, ConstructionError};

/// Smooths the raw scroll fraction reported by the page into the progress
/// value every scene blends on.
///
/// `smoothed` approaches `raw` by a fixed fraction `k` each tick. For any
/// `k` in (0, 1] that is a first-order low-pass filter: it converges
/// monotonically and never crosses the target.
#[derive(Clone, Debug)]
pub struct ScrollState {
    raw: f32,
    smoothed: f32,
    k: f32,
}

impl ScrollState {
    pub fn new(k: f32) -> Result<Self, ConstructionError> {
        check_upper_closed("scroll.k", k, 0.0, 1.0, "(0, 1]")?;
        Ok(Self {
            raw: 0.0,
            smoothed: 0.0,
            k,
        })
    }

    /// Store the raw target. Callers are expected to clamp; non-finite input
    /// is ignored and out-of-range input is clamped again here.
    pub fn set_target(&mut self, raw: f32) {
        if raw.is_finite() {
            self.raw = raw.clamp(0.0, 1.0);
        }
    }

    pub fn tick(&mut self) -> f32 {
        self.smoothed += (self.raw - self.smoothed) * self.k;
        self.smoothed
    }

    /// Jump straight to the target (used when a page is restored mid-scroll).
    pub fn snap(&mut self) {
        self.smoothed = self.raw;
    }

    #[inline]
    pub fn target(&self) -> f32 {
        self.raw
    }

    #[inline]
    pub fn progress(&self) -> f32 {
        self.smoothed
    }

    #[inline]
    pub fn k(&self) -> f32 {
        self.k
    }

    /// Smoothstep of the current progress between `lo` and `hi`.
    pub fn band(&self, lo: f32, hi: f32) -> f32 {
        smoothstep(self.smoothed, lo, hi)
    }
}

/// Hermite smoothstep, 0 below `lo`, 1 above `hi`.
#[inline]
pub fn smoothstep(x: f32, lo: f32, hi: f32) -> f32 {
    if hi <= lo {
        return if x < lo { 0.0 } else { 1.0 };
    }
    let t = ((x - lo) / (hi - lo)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_range_k() {
        assert!(ScrollState::new(0.0).is_err());
        assert!(ScrollState::new(1.5).is_err());
        assert!(ScrollState::new(f32::NAN).is_err());
        assert!(ScrollState::new(1.0).is_ok());
    }

    #[test]
    fn k_of_one_reaches_target_in_one_tick() {
        let mut s = ScrollState::new(1.0).unwrap();
        s.set_target(0.7);
        assert_eq!(s.tick(), 0.7);
    }

    #[test]
    fn target_is_clamped() {
        let mut s = ScrollState::new(0.05).unwrap();
        s.set_target(3.0);
        assert_eq!(s.target(), 1.0);
        s.set_target(f32::NAN);
        assert_eq!(s.target(), 1.0);
    }

    #[test]
    fn smoothstep_edges() {
        assert_eq!(smoothstep(-1.0, 0.2, 0.5), 0.0);
        assert_eq!(smoothstep(2.0, 0.2, 0.5), 1.0);
        assert!((smoothstep(0.35, 0.2, 0.5) - 0.5).abs() < 1e-6);
    }
}
