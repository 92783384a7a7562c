//! Small math helpers used by the simulation.

use glam::Vec2;

/// Sign of a value, treating zero as positive.
///
/// Facing directions are always ±1, so a stationary actor counts as facing
/// right.
#[must_use]
pub fn sign(value: f32) -> f32 {
    if value >= 0.0 {
        1.0
    } else {
        -1.0
    }
}

/// Sign of a value with zero mapped to zero.
#[must_use]
pub fn sign_or_zero(value: f32) -> f32 {
    if value > 0.0 {
        1.0
    } else if value < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Vector rotated 90 degrees counter-clockwise.
#[must_use]
pub fn perpendicular(v: Vec2) -> Vec2 {
    Vec2::new(-v.y, v.x)
}

/// Rotates `v` by `angle` radians, clockwise for positive angles.
#[must_use]
pub fn rotate_clockwise(v: Vec2, angle: f32) -> Vec2 {
    let (sin, cos) = angle.sin_cos();
    Vec2::new(v.x * cos + v.y * sin, -v.x * sin + v.y * cos)
}

/// Critically damped smoothing of `current` toward `target`.
///
/// `velocity` is the smoothing accumulator carried between calls and is
/// updated in place. `smooth_time` is roughly the time to reach the target;
/// it is floored at a small epsilon so a zero configuration cannot divide by
/// zero. The result never overshoots the target.
#[must_use]
pub fn smooth_damp(
    current: f32,
    target: f32,
    velocity: &mut f32,
    smooth_time: f32,
    dt: f32,
) -> f32 {
    let smooth_time = smooth_time.max(0.0001);
    let omega = 2.0 / smooth_time;

    let x = omega * dt;
    let exp = 1.0 / (1.0 + x + 0.48 * x * x + 0.235 * x * x * x);
    let change = current - target;

    let temp = (*velocity + omega * change) * dt;
    *velocity = (*velocity - omega * temp) * exp;
    let mut output = target + (change + temp) * exp;

    // Clamp overshoot
    if (target - current > 0.0) == (output > target) {
        output = target;
        *velocity = (output - target) / dt.max(f32::EPSILON);
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_sign() {
        assert_eq!(sign(3.0), 1.0);
        assert_eq!(sign(0.0), 1.0);
        assert_eq!(sign(-0.5), -1.0);
        assert_eq!(sign_or_zero(0.0), 0.0);
        assert_eq!(sign_or_zero(-2.0), -1.0);
    }

    #[test]
    fn test_perpendicular() {
        assert_eq!(perpendicular(Vec2::X), Vec2::Y);
        assert_eq!(perpendicular(Vec2::Y), Vec2::NEG_X);
    }

    #[test]
    fn test_rotate_clockwise() {
        let rotated = rotate_clockwise(Vec2::X, std::f32::consts::FRAC_PI_2);
        assert!((rotated - Vec2::NEG_Y).length() < 1e-5);
    }

    #[test]
    fn test_smooth_damp_approaches_target() {
        let mut vel = 0.0;
        let mut value = 0.0;
        for _ in 0..200 {
            value = smooth_damp(value, 10.0, &mut vel, 0.1, 1.0 / 60.0);
        }
        assert!((value - 10.0).abs() < 0.01);
    }

    #[test]
    fn test_smooth_damp_first_step_moves_toward_target() {
        let mut vel = 0.0;
        let value = smooth_damp(0.0, 6.0, &mut vel, 0.1, 0.02);
        assert!(value > 0.0 && value < 6.0);
        assert!(vel > 0.0);
    }

    proptest! {
        #[test]
        fn prop_smooth_damp_never_overshoots(
            current in -50.0f32..50.0,
            target in -50.0f32..50.0,
            smooth_time in 0.0f32..1.0,
            dt in 0.001f32..0.1,
        ) {
            let mut vel = 0.0;
            let out = smooth_damp(current, target, &mut vel, smooth_time, dt);
            let lo = current.min(target) - 1e-3;
            let hi = current.max(target) + 1e-3;
            prop_assert!(out >= lo && out <= hi);
        }
    }
}
