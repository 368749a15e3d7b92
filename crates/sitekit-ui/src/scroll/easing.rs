//! Easing curves over normalised progress

pub use sitekit_core::EasingType;

/// Maps progress in `[0, 1]` onto eased progress in `[0, 1]`
pub trait Ease {
    fn ease(&self, t: f64) -> f64;
}

impl Ease for EasingType {
    fn ease(&self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            EasingType::None if t < 1.0 => 0.0,
            EasingType::None => 1.0,
            EasingType::Linear => t,
            EasingType::Cubic => 1.0 - (1.0 - t).powi(3),
            EasingType::Quintic => 1.0 - (1.0 - t).powi(5),
            EasingType::EaseOut if t >= 1.0 => 1.0,
            EasingType::EaseOut => 1.0 - 2f64.powf(-10.0 * t),
            EasingType::EaseInOutQuad => ease_in_out_quad(t, 0.0, 1.0, 1.0),
        }
    }
}

/// Quadratic ease-in/ease-out: `t` elapsed, `b` start, `c` change, `d` duration
///
/// Time is measured in half-durations. Below one half it accelerates as
/// `c/2·t² + b`; past it, it decelerates as `-c/2·(t·(t-2) - 1) + b`.
pub fn ease_in_out_quad(t: f64, b: f64, c: f64, d: f64) -> f64 {
    if d <= 0.0 {
        return b + c;
    }
    let halves = t / (d / 2.0);
    if halves < 1.0 {
        c / 2.0 * halves * halves + b
    } else {
        let t = halves - 1.0;
        -c / 2.0 * (t * (t - 2.0) - 1.0) + b
    }
}
