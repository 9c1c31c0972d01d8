//! Helper functions

use crate::kinematic_traits::{Joints, Pose, Position, Solutions};
use nalgebra::{Isometry2, Vector2};
use std::f64::consts::PI;

/// Checks if all elements in the array are finite
pub fn is_valid(qs: &[f64]) -> bool {
    qs.iter().all(|&q| q.is_finite())
}

/// Wraps the angle into (-pi, pi] using atan2(sin, cos).
pub fn normalize_angle(angle: f64) -> f64 {
    let wrapped = angle.sin().atan2(angle.cos());
    // atan2 returns -pi for a negative zero sine
    if wrapped <= -PI { wrapped + 2.0 * PI } else { wrapped }
}

/// Wraps every joint into (-pi, pi].
pub fn wrap_joints(qs: &[f64]) -> Joints {
    qs.iter().map(|&q| normalize_angle(q)).collect()
}

/// Signed shortest rotation from `from` to `to`, in (-pi, pi].
pub fn angle_difference(from: f64, to: f64) -> f64 {
    normalize_angle(to - from)
}

/// Euclidean distance between two joint configurations, each joint difference taken
/// the short way around the circle. Configurations of different length are infinitely
/// far apart.
pub fn joint_distance(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() {
        return f64::INFINITY;
    }
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| angle_difference(x, y).powi(2))
        .sum::<f64>()
        .sqrt()
}

/// `n` evenly spaced values from `start` to `end`, both ends included.
/// A single value is just `start`.
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            (0..n)
                .map(|i| if i == n - 1 { end } else { start + step * i as f64 })
                .collect()
        }
    }
}

/// Transform of a single revolute link: rotate by theta, then move along the rotated
/// x axis by the link length.
pub fn link_transform(length: f64, theta: f64) -> Isometry2<f64> {
    Isometry2::rotation(theta) * Isometry2::translation(length, 0.0)
}

/// Position part of the pose.
pub fn pose_position(pose: &Pose) -> Position {
    Position::from(pose.translation.vector)
}

/// Point on the segment from `start` to `end`, `ratio` 0 giving `start` and 1 `end`.
pub fn lerp(start: &Position, end: &Position, ratio: f64) -> Position {
    let delta: Vector2<f64> = end - start;
    start + delta * ratio
}

/// Calculates the transition cost between two sets of joint positions,
/// weighted by given coefficients (rotating heavy base joints is
/// more expensive). This function returns maximum weighted rotation.
pub fn transition_costs(from: &[f64], to: &[f64], coefficients: &[f64]) -> f64 {
    from.iter()
        .zip(to.iter())
        .zip(coefficients.iter())
        .map(|((&a, &b), &c)| angle_difference(a, b).abs() * c)
        .fold(0.0, f64::max)
}

/// Allows to specify joint values in degrees (converts to radians)
pub fn as_radians(degrees: &[i32]) -> Joints {
    degrees.iter().map(|&d| (d as f64).to_radians()).collect()
}

/// Print joint values for all solutions, converting radians to degrees.
pub fn dump_solutions(solutions: &Solutions) {
    if solutions.is_empty() {
        println!("No solutions");
    }
    for solution in solutions {
        dump_joints(solution);
    }
}

/// Print joint values, converting radians to degrees.
pub fn dump_joints(joints: &[f64]) {
    println!("[{}]", format_joints(joints));
}

/// Joint values in degrees, space separated.
pub fn format_joints(joints: &[f64]) -> String {
    joints
        .iter()
        .map(|q| format!("{:7.2}", q.to_degrees()))
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn dump_position(position: &Position) {
    println!("x: {:.5}, y: {:.5}", position.x, position.y);
}

pub fn dump_pose(pose: &Pose) {
    let translation = pose.translation.vector;
    println!(
        "x: {:.5}, y: {:.5}, angle: {:.2} deg",
        translation.x,
        translation.y,
        pose.rotation.angle().to_degrees()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_is_valid() {
        assert!(is_valid(&[0.0, 1.0, -1.0, PI]));
        assert!(!is_valid(&[0.0, f64::NAN, 1.0]));
        assert!(!is_valid(&[f64::INFINITY]));
    }

    #[test]
    fn test_normalize_angle() {
        assert!((normalize_angle(3.0 * PI) - PI).abs() < 1e-12);
        assert!((normalize_angle(-PI) - PI).abs() < 1e-12);
        assert!((normalize_angle(2.5 * PI) - FRAC_PI_2).abs() < 1e-12);
        assert!((normalize_angle(-0.25) + 0.25).abs() < 1e-15);
        for i in -100..100 {
            let wrapped = normalize_angle(i as f64 * 0.37);
            assert!(wrapped > -PI && wrapped <= PI);
        }
    }

    #[test]
    fn test_joint_distance() {
        assert!(joint_distance(&[PI - 0.1], &[-PI + 0.1]) < 0.2 + 1e-12);
        assert!((joint_distance(&[0.0, 0.0], &[0.3, 0.4]) - 0.5).abs() < 1e-12);
        assert_eq!(joint_distance(&[0.0], &[0.0, 0.0]), f64::INFINITY);
    }

    #[test]
    fn test_linspace() {
        assert!(linspace(0.0, 1.0, 0).is_empty());
        assert_eq!(linspace(2.0, 5.0, 1), vec![2.0]);
        let values = linspace(-PI, PI, 5);
        assert_eq!(values.len(), 5);
        assert_eq!(values[0], -PI);
        assert_eq!(values[4], PI);
        assert!(values[2].abs() < 1e-12);
    }

    #[test]
    fn test_link_transform() {
        let pose = link_transform(2.0, FRAC_PI_2);
        let p = pose_position(&pose);
        assert!(p.x.abs() < 1e-12 && (p.y - 2.0).abs() < 1e-12);
        assert!((pose.rotation.angle() - FRAC_PI_2).abs() < 1e-12);
    }

    #[test]
    fn test_lerp() {
        let p = lerp(&Position::new(1.0, 1.0), &Position::new(3.0, -1.0), 0.25);
        assert!((p.x - 1.5).abs() < 1e-12 && (p.y - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_transition_costs() {
        let cost = transition_costs(&[0.0, 0.0, 0.0], &[0.1, -0.5, 0.2], &[2.0, 1.0, 1.0]);
        assert!((cost - 0.5).abs() < 1e-12);
        assert_eq!(as_radians(&[180, -90]), vec![PI, -FRAC_PI_2]);
    }
}
