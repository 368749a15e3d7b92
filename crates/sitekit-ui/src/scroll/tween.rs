//! A scroll animation from one offset to another, sampled per frame

use super::easing::{Ease, EasingType};
use super::timing::{is_complete, lerp, progress};

/// Active scroll animation state
#[derive(Debug, Clone, PartialEq)]
pub struct ScrollTween {
    /// Animation start time
    start_ms: f64,
    /// Starting scroll position
    from: f64,
    /// Target scroll position
    to: f64,
    /// Animation duration
    duration_ms: f64,
    /// Easing function
    easing: EasingType,
}

impl ScrollTween {
    pub fn new(start_ms: f64, from: f64, to: f64, duration_ms: f64, easing: EasingType) -> Self {
        Self {
            start_ms,
            from,
            to,
            duration_ms: duration_ms.max(0.0),
            easing,
        }
    }

    pub fn from(&self) -> f64 {
        self.from
    }

    /// Final position after the animation
    pub fn target(&self) -> f64 {
        self.to
    }

    pub fn distance(&self) -> f64 {
        self.to - self.from
    }

    /// Interpolated scroll position at `now_ms`
    pub fn sample(&self, now_ms: f64) -> f64 {
        if self.is_complete(now_ms) {
            return self.to;
        }
        let t = progress(self.start_ms, now_ms, self.duration_ms);
        lerp(self.from, self.to, self.easing.ease(t))
    }

    #[inline]
    pub fn is_complete(&self, now_ms: f64) -> bool {
        is_complete(self.start_ms, now_ms, self.duration_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scroll::ease_in_out_quad;

    #[test]
    fn test_tween_follows_ease_in_out_quad() {
        let tween = ScrollTween::new(1000.0, 0.0, 1200.0, 800.0, EasingType::EaseInOutQuad);
        for elapsed in [0.0, 100.0, 250.0, 400.0, 555.0, 799.0] {
            let expected = ease_in_out_quad(elapsed, 0.0, 1200.0, 800.0);
            assert!((tween.sample(1000.0 + elapsed) - expected).abs() < 1e-9);
        }
        assert_eq!(tween.sample(1800.0), 1200.0);
        assert!(tween.is_complete(1800.0));
        assert!(!tween.is_complete(1799.0));
    }

    #[test]
    fn test_upward_tween() {
        let tween = ScrollTween::new(0.0, 900.0, 100.0, 800.0, EasingType::EaseInOutQuad);
        assert_eq!(tween.distance(), -800.0);
        assert!((tween.sample(400.0) - 500.0).abs() < 1e-9);
        assert_eq!(tween.sample(10_000.0), 100.0);
    }

    #[test]
    fn test_zero_duration_jumps() {
        let tween = ScrollTween::new(0.0, 0.0, 300.0, 0.0, EasingType::Linear);
        assert_eq!(tween.sample(0.0), 300.0);
    }
}
