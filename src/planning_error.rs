//! Error handling for trajectory planning

use crate::kinematic_traits::Position;

/// Failures of the trapezoidal profile and the path planner. Unreachable targets in
/// the kinematics solvers are not errors (they return `None`); they only become
/// errors here when a whole trajectory depends on them.
#[derive(Debug, Clone, PartialEq)]
pub enum PlanningError {
    /// Empty waypoint list.
    NoWaypoints,
    /// Velocity, acceleration, distance or sample count out of range.
    InvalidParameter(String),
    /// Waypoint `index` has a different number of joints than the first one.
    DimensionMismatch { index: usize, expected: usize, found: usize },
    /// Operational space interpolation requires a robot model.
    MissingRobot,
    /// Inverse kinematics has no solution for the interpolated point. Callers may fall
    /// back to the raw waypoints.
    IkFailure { segment: usize, sample: usize, target: Position },
}

impl PlanningError {
    /// True for errors the caller can work around (by using the raw waypoints);
    /// false for configuration errors that will fail again on retry.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, PlanningError::IkFailure { .. })
    }
}

impl std::fmt::Display for PlanningError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match *self {
            PlanningError::NoWaypoints =>
                write!(f, "No waypoints to interpolate"),
            PlanningError::InvalidParameter(ref msg) =>
                write!(f, "Invalid Parameter: {}", msg),
            PlanningError::DimensionMismatch { index, expected, found } =>
                write!(f, "Waypoint {} has {} joints, expected {}", index, found, expected),
            PlanningError::MissingRobot =>
                write!(f, "Operational space interpolation requires a robot model"),
            PlanningError::IkFailure { segment, sample, ref target } =>
                write!(f, "No IK solution for ({:.4}, {:.4}) at segment {}, sample {}",
                       target.x, target.y, segment, sample),
        }
    }
}

impl std::error::Error for PlanningError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = PlanningError::IkFailure { segment: 1, sample: 4, target: Position::new(3.0, 0.5) };
        assert_eq!(
            err.to_string(),
            "No IK solution for (3.0000, 0.5000) at segment 1, sample 4"
        );
        assert!(err.is_recoverable());
        assert!(!PlanningError::MissingRobot.is_recoverable());
    }
}
