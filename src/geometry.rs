//! Planar geometry helpers shared by calibration and the transform engine.
//!
//! Every helper here returns `None` instead of a non-finite value so that
//! nothing downstream has to guard against NaN or infinity.

use crate::constants::EPSILON;
use nalgebra::Point2;

/// Euclidean distance between two points
pub fn distance(a: &Point2<f64>, b: &Point2<f64>) -> f64 {
    nalgebra::distance(a, b)
}

/// Arithmetic midpoint of two points
pub fn midpoint(a: &Point2<f64>, b: &Point2<f64>) -> Point2<f64> {
    nalgebra::center(a, b)
}

/// Linearly remap `value` from `[in_min, in_max]` to `[out_min, out_max]`.
///
/// Returns `None` for an empty input interval or a non-finite result.
pub fn map_range(value: f64, in_min: f64, in_max: f64, out_min: f64, out_max: f64) -> Option<f64> {
    let span = in_max - in_min;
    if span.abs() < EPSILON {
        return None;
    }
    let mapped = (value - in_min) * (out_max - out_min) / span + out_min;
    mapped.is_finite().then_some(mapped)
}

/// Unsigned angle at vertex `b` of triangle `a`-`b`-`c`, in `[0, π]`.
///
/// Uses the law of cosines on the three side lengths. The cosine is clamped to
/// `[-1, 1]` so collinear points give `0` or `π`. A zero-length side around `b`
/// leaves the angle undefined and yields `None`.
pub fn angle_at(a: &Point2<f64>, b: &Point2<f64>, c: &Point2<f64>) -> Option<f64> {
    let ba = distance(b, a);
    let bc = distance(b, c);
    let ac = distance(a, c);
    if ba < EPSILON || bc < EPSILON {
        return None;
    }
    let cosine = (ba.powi(2) + bc.powi(2) - ac.powi(2)) / (2.0 * ba * bc);
    if !cosine.is_finite() {
        return None;
    }
    Some(cosine.clamp(-1.0, 1.0).acos())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

    #[test]
    fn test_distance_and_midpoint() {
        let a = Point2::new(280.0, 260.0);
        let b = Point2::new(360.0, 260.0);
        assert!((distance(&a, &b) - 80.0).abs() < 1e-12);
        assert_eq!(midpoint(&a, &b), Point2::new(320.0, 260.0));
    }

    #[test]
    fn test_map_range_midpoint() {
        assert_eq!(map_range(5.0, 0.0, 10.0, -2.0, 2.0), Some(0.0));
        assert_eq!(map_range(0.0, 0.0, 10.0, -2.0, 2.0), Some(-2.0));
        assert_eq!(map_range(10.0, 0.0, 10.0, -2.0, 2.0), Some(2.0));
    }

    #[test]
    fn test_map_range_extrapolates() {
        let mapped = map_range(20.0, 0.0, 10.0, -2.0, 2.0).unwrap();
        assert!((mapped - 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_map_range_empty_interval() {
        assert_eq!(map_range(5.0, 3.0, 3.0, -2.0, 2.0), None);
        assert_eq!(map_range(5.0, 0.0, 0.0, -2.0, 2.0), None);
    }

    #[test]
    fn test_map_range_non_finite_input() {
        assert_eq!(map_range(f64::NAN, 0.0, 10.0, -2.0, 2.0), None);
        assert_eq!(map_range(f64::INFINITY, 0.0, 10.0, -2.0, 2.0), None);
    }

    #[test]
    fn test_angle_right() {
        let angle = angle_at(&Point2::new(0.0, 0.0), &Point2::new(1.0, 0.0), &Point2::new(1.0, 1.0)).unwrap();
        assert!((angle - FRAC_PI_2).abs() < 1e-12);
    }

    #[test]
    fn test_angle_collinear() {
        let straight = angle_at(&Point2::new(0.0, 0.0), &Point2::new(1.0, 0.0), &Point2::new(2.0, 0.0)).unwrap();
        assert!((straight - PI).abs() < 1e-6);

        let folded = angle_at(&Point2::new(2.0, 0.0), &Point2::new(0.0, 0.0), &Point2::new(1.0, 0.0)).unwrap();
        assert!(folded.abs() < 1e-6);
    }

    #[test]
    fn test_angle_forty_five() {
        let angle = angle_at(&Point2::new(1.0, 0.0), &Point2::new(0.0, 0.0), &Point2::new(1.0, 1.0)).unwrap();
        assert!((angle - FRAC_PI_4).abs() < 1e-12);
    }

    #[test]
    fn test_angle_degenerate_side() {
        let p = Point2::new(3.0, 4.0);
        assert_eq!(angle_at(&p, &p, &Point2::new(5.0, 5.0)), None);
        assert_eq!(angle_at(&Point2::new(5.0, 5.0), &p, &p), None);
    }
}
