//! Adaptive exponential smoothing for the band's interior anchors.

use nalgebra::Vector3;

/// Distance range the adaptive speed responds to.
pub const MIN_DISTANCE: f64 = 0.1;
pub const MAX_DISTANCE: f64 = 1.0;
/// Endpoints of the mapping `MIN_SPEED + d * (MAX_SPEED - MIN_SPEED)`.
pub const MIN_SPEED: f64 = 10.0;
pub const MAX_SPEED: f64 = 50.0;

/// Map a distance (clamped to [0.1, 1.0]) linearly onto a catch-up speed.
/// Small offsets settle slowly, large offsets catch up fast.
pub fn adaptive_speed(distance: f64) -> f64 {
    let clamped = if distance.is_nan() {
        MIN_DISTANCE
    } else {
        distance.clamp(MIN_DISTANCE, MAX_DISTANCE)
    };
    MIN_SPEED + clamped * (MAX_SPEED - MIN_SPEED)
}

/// Fraction of the remaining gap closed this frame. Never overshoots.
pub fn blend_factor(delta: f64, speed: f64) -> f64 {
    let f = delta * speed;
    if f.is_nan() {
        0.0
    } else {
        f.clamp(0.0, 1.0)
    }
}

/// Smoothed position of one anchor, carried across frames.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LerpState {
    pub position: Vector3<f64>,
}

impl LerpState {
    /// Start exactly on the anchor so the first frame does not snap.
    pub fn new(position: Vector3<f64>) -> Self {
        Self { position }
    }

    /// Move toward `target` by `blend_factor(delta, adaptive_speed(gap))`.
    pub fn advance(&mut self, target: &Vector3<f64>, delta: f64) -> f64 {
        let speed = adaptive_speed((self.position - target).norm());
        let f = blend_factor(delta, speed);
        if f >= 1.0 {
            self.position = *target;
        } else if f > 0.0 {
            self.position += (target - self.position) * f;
        }
        f
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adaptive_speed_range() {
        assert!((adaptive_speed(0.0) - 14.0).abs() < 1e-12);
        assert!((adaptive_speed(0.1) - 14.0).abs() < 1e-12);
        assert!((adaptive_speed(1.0) - 50.0).abs() < 1e-12);
        assert!((adaptive_speed(25.0) - 50.0).abs() < 1e-12);
        assert!((adaptive_speed(0.55) - 32.0).abs() < 1e-12);
        assert!((adaptive_speed(f64::NAN) - 14.0).abs() < 1e-12);
    }

    #[test]
    fn test_adaptive_speed_monotonic() {
        let mut prev = adaptive_speed(0.0);
        for i in 1..=300 {
            let s = adaptive_speed(i as f64 * 0.005);
            assert!(s >= prev);
            assert!((14.0..=50.0).contains(&s));
            prev = s;
        }
    }

    #[test]
    fn test_blend_factor_clamps() {
        assert_eq!(blend_factor(0.0, 50.0), 0.0);
        assert!((blend_factor(0.01, 14.0) - 0.14).abs() < 1e-12);
        assert_eq!(blend_factor(0.1, 50.0), 1.0);
        assert_eq!(blend_factor(-1.0, 14.0), 0.0);
    }

    #[test]
    fn test_advance_never_overshoots() {
        let target = Vector3::new(1.0, -2.0, 0.5);
        let mut s = LerpState::new(Vector3::zeros());
        let start_gap = (target - s.position).norm();
        s.advance(&target, 1.0 / 60.0);
        let gap = (target - s.position).norm();
        assert!(gap < start_gap);
        // Still on the segment between start and target
        let dir = (target - Vector3::zeros()).normalize();
        assert!((s.position.normalize() - dir).norm() < 1e-9);
    }

    #[test]
    fn test_advance_lands_on_target_for_large_steps() {
        let target = Vector3::new(0.3, 0.0, 0.0);
        let mut s = LerpState::new(Vector3::zeros());
        let f = s.advance(&target, 1.0);
        assert_eq!(f, 1.0);
        assert_eq!(s.position, target);
    }

    #[test]
    fn test_zero_delta_is_noop() {
        let mut s = LerpState::new(Vector3::new(1.0, 2.0, 3.0));
        let before = s;
        s.advance(&Vector3::new(5.0, 5.0, 5.0), 0.0);
        assert_eq!(s, before);
    }
}
