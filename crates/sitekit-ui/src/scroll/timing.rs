//! Clock arithmetic for tweens, in virtual milliseconds

/// Elapsed fraction of a `duration_ms` window opened at `start_ms`, within `[0, 1]`
///
/// A zero-length window is already over.
pub fn progress(start_ms: f64, now_ms: f64, duration_ms: f64) -> f64 {
    match duration_ms {
        d if d <= 0.0 => 1.0,
        d => ((now_ms - start_ms) / d).clamp(0.0, 1.0),
    }
}

pub fn is_complete(start_ms: f64, now_ms: f64, duration_ms: f64) -> bool {
    now_ms >= start_ms + duration_ms
}

pub fn lerp(from: f64, to: f64, t: f64) -> f64 {
    from + (to - from) * t
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_inside_and_outside_window() {
        assert!((progress(100.0, 500.0, 800.0) - 0.5).abs() < 1e-9);
        assert_eq!(progress(100.0, 50.0, 800.0), 0.0);
        assert_eq!(progress(100.0, 5000.0, 800.0), 1.0);
        assert!(!is_complete(100.0, 899.0, 800.0));
        assert!(is_complete(100.0, 900.0, 800.0));
    }

    #[test]
    fn test_zero_length_window() {
        assert_eq!(progress(42.0, 42.0, 0.0), 1.0);
        assert!(is_complete(42.0, 42.0, 0.0));
    }

    #[test]
    fn test_lerp_runs_both_directions() {
        assert_eq!(lerp(0.0, 100.0, 0.5), 50.0);
        assert_eq!(lerp(500.0, 100.0, 0.25), 400.0);
    }
}
