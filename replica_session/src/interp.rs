//! Interpolation.
//!
//! Network updates arrive far slower than the presentation refresh rate.
//! Each replicated field keeps its two newest timestamped samples and
//! answers reads at arbitrary query times with a clamped blend, which
//! decouples update cadence from render cadence and turns jitter or loss
//! into blend-rate-limited motion instead of visible snapping.

use replica_shared::math::lerp_angle_deg;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Sample {
    value: f32,
    time: f32,
}

/// Two-sample window shared by both interpolator flavors.
///
/// `feed` installs whatever arrives as the newest sample without reordering
/// or rejecting stale input; callers stamp samples with local receipt time,
/// which is monotonic by construction.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Window {
    prev: Option<Sample>,
    cur: Option<Sample>,
}

impl Window {
    fn feed(&mut self, value: f32, time: f32) {
        self.prev = self.cur;
        self.cur = Some(Sample { value, time });
    }

    /// Resolves the query into either a direct value or a blend factor.
    fn resolve(&self, at: f32) -> Resolved {
        match (self.prev, self.cur) {
            (_, None) => Resolved::Value(0.0),
            (None, Some(cur)) => Resolved::Value(cur.value),
            (Some(prev), Some(cur)) => {
                if at <= prev.time {
                    Resolved::Value(prev.value)
                } else if cur.time <= prev.time {
                    // Degenerate window (identical stamps); newest wins.
                    Resolved::Value(cur.value)
                } else {
                    let alpha = ((at - prev.time) / (cur.time - prev.time)).clamp(0.0, 1.0);
                    Resolved::Blend(prev.value, cur.value, alpha)
                }
            }
        }
    }
}

enum Resolved {
    Value(f32),
    Blend(f32, f32, f32),
}

/// Linear scalar interpolator.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FloatLerp {
    window: Window,
}

impl FloatLerp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, value: f32, time: f32) {
        self.window.feed(value, time);
    }

    pub fn get(&self, at: f32) -> f32 {
        match self.window.resolve(at) {
            Resolved::Value(v) => v,
            Resolved::Blend(from, to, alpha) => from + (to - from) * alpha,
        }
    }
}

/// Angular interpolator blending along the shortest arc, in degrees.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AngleLerp {
    window: Window,
}

impl AngleLerp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, value: f32, time: f32) {
        self.window.feed(value, time);
    }

    pub fn get(&self, at: f32) -> f32 {
        match self.window.resolve(at) {
            Resolved::Value(v) => v,
            Resolved::Blend(from, to, alpha) => lerp_angle_deg(from, to, alpha),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_samples_returns_default() {
        let lerp = FloatLerp::new();
        assert_eq!(lerp.get(0.0), 0.0);
        assert_eq!(lerp.get(100.0), 0.0);
    }

    #[test]
    fn one_sample_returns_it_everywhere() {
        let mut lerp = FloatLerp::new();
        lerp.feed(5.0, 10.0);
        assert_eq!(lerp.get(0.0), 5.0);
        assert_eq!(lerp.get(10.0), 5.0);
        assert_eq!(lerp.get(1000.0), 5.0);
    }

    #[test]
    fn two_samples_blend_linearly() {
        let mut lerp = FloatLerp::new();
        lerp.feed(1.0, 10.0);
        lerp.feed(3.0, 12.0);

        assert_eq!(lerp.get(10.0), 1.0);
        assert_eq!(lerp.get(11.0), 2.0);
        assert_eq!(lerp.get(12.0), 3.0);
    }

    #[test]
    fn query_before_window_returns_previous() {
        let mut lerp = FloatLerp::new();
        lerp.feed(1.0, 10.0);
        lerp.feed(3.0, 12.0);
        assert_eq!(lerp.get(5.0), 1.0);
    }

    #[test]
    fn query_after_window_clamps_to_current() {
        let mut lerp = FloatLerp::new();
        lerp.feed(1.0, 10.0);
        lerp.feed(3.0, 12.0);
        // No extrapolation overshoot past the newest sample.
        assert_eq!(lerp.get(50.0), 3.0);
    }

    #[test]
    fn identical_timestamps_prefer_newest() {
        let mut lerp = FloatLerp::new();
        lerp.feed(1.0, 10.0);
        lerp.feed(3.0, 10.0);
        assert_eq!(lerp.get(10.5), 3.0);
    }

    #[test]
    fn feed_shifts_the_window() {
        let mut lerp = FloatLerp::new();
        lerp.feed(1.0, 1.0);
        lerp.feed(2.0, 2.0);
        lerp.feed(3.0, 3.0);
        // Oldest sample is gone; window is now [2, 3].
        assert_eq!(lerp.get(2.0), 2.0);
        assert_eq!(lerp.get(2.5), 2.5);
        assert_eq!(lerp.get(3.0), 3.0);
    }

    #[test]
    fn angle_lerp_crosses_zero() {
        let mut lerp = AngleLerp::new();
        lerp.feed(350.0, 0.0);
        lerp.feed(10.0, 1.0);

        let mid = lerp.get(0.5);
        assert!((mid - 360.0).abs() < 1e-4, "got {mid}");
    }

    #[test]
    fn angle_lerp_single_sample() {
        let mut lerp = AngleLerp::new();
        lerp.feed(90.0, 0.0);
        assert_eq!(lerp.get(5.0), 90.0);
    }
}
