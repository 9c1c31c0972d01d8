//! State machine of an interactive inverse kinematics session: the user picks targets,
//! switches solvers, and replays the collected targets as a trajectory. Drawing and
//! input handling belong to the front end; every transition here calls the kinematics
//! as a pure function and only updates the session state.

use crate::kinematic_traits::{ElbowBranch, IkMethod, Joints, Position};
use crate::kinematics_impl::PlanarKinematics;
use crate::path_planner::{PathPlanner, Playback};
use crate::planning_error::PlanningError;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    TargetSelected,
    Animating,
}

pub struct Session {
    robot: PlanarKinematics,
    state: SessionState,
    ik_method: IkMethod,
    joints: Joints,
    target: Option<Position>,
    /// Targets selected so far, replayed by `play`.
    trajectory_points: Vec<Position>,
    /// Position error of every accepted IK solution.
    error_history: Vec<f64>,
    playback: Option<Playback>,
    frame: usize,
}

impl Session {
    pub fn new(robot: PlanarKinematics) -> Self {
        let joints = vec![0.0; robot.parameters().dof()];
        Session {
            robot,
            state: SessionState::Idle,
            ik_method: IkMethod::Analytical,
            joints,
            target: None,
            trajectory_points: Vec::new(),
            error_history: Vec::new(),
            playback: None,
            frame: 0,
        }
    }

    pub fn robot(&self) -> &PlanarKinematics {
        &self.robot
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn ik_method(&self) -> IkMethod {
        self.ik_method
    }

    pub fn joints(&self) -> &Joints {
        &self.joints
    }

    pub fn target(&self) -> Option<Position> {
        self.target
    }

    pub fn trajectory_points(&self) -> &[Position] {
        &self.trajectory_points
    }

    pub fn error_history(&self) -> &[f64] {
        &self.error_history
    }

    /// Base, joints and end effector of the current configuration, for drawing.
    pub fn arm(&self) -> Vec<Position> {
        self.robot.forward_with_joint_positions(&self.joints)
    }

    /// Select a new target and solve for it. The target is recorded even if it cannot be
    /// reached; the joints then stay where they were. Ignored while animating.
    /// Returns true if a solution was found.
    pub fn select_target(&mut self, target: Position) -> bool {
        if self.state == SessionState::Animating {
            debug!("Target ({:.3}, {:.3}) ignored during animation", target.x, target.y);
            return false;
        }
        self.target = Some(target);
        self.trajectory_points.push(target);
        self.state = SessionState::TargetSelected;
        self.solve_current()
    }

    /// Cycle to the next IK method and re-solve the current target, if any.
    pub fn switch_ik_method(&mut self) -> IkMethod {
        self.ik_method = self.ik_method.next();
        info!("IK method: {:?}", self.ik_method);
        if self.state == SessionState::TargetSelected {
            self.solve_current();
        }
        self.ik_method
    }

    /// Back to the initial state: joints at zero, no target, nothing recorded.
    pub fn reset(&mut self) {
        self.joints = vec![0.0; self.robot.parameters().dof()];
        self.target = None;
        self.trajectory_points.clear();
        self.error_history.clear();
        self.playback = None;
        self.frame = 0;
        self.state = SessionState::Idle;
    }

    /// Forget recorded targets and errors, keeping the current pose.
    pub fn clear_trajectory(&mut self) {
        self.trajectory_points.clear();
        self.error_history.clear();
        if self.state == SessionState::Animating {
            self.stop();
        }
    }

    /// Start replaying the recorded targets. The planner's limits, synchronization and IK
    /// method are used with this session's robot. If inverse kinematics fails along the
    /// interpolated path, the raw targets are replayed instead. Returns false (and stays
    /// in the current state) if fewer than two targets are recorded.
    pub fn play(&mut self, planner: &PathPlanner, samples: usize) -> Result<bool, PlanningError> {
        if self.trajectory_points.len() < 2 {
            info!("Insufficient trajectory points, cannot play animation");
            return Ok(false);
        }
        let planner = PathPlanner { robot: Some(&self.robot), ..*planner };
        let playback = planner.interpolate_operational_space_or_waypoints(
            &self.trajectory_points,
            samples,
            Some(self.joints.as_slice()),
        )?;
        self.playback = Some(playback);
        self.frame = 0;
        self.state = SessionState::Animating;
        Ok(true)
    }

    /// Number of frames of the running animation, 0 if not animating.
    pub fn frame_count(&self) -> usize {
        match &self.playback {
            Some(Playback::Joints(trajectory)) => trajectory.len(),
            Some(Playback::Waypoints(points)) => points.len(),
            None => 0,
        }
    }

    /// Advance the animation by one frame, wrapping around at the end. Returns the joints
    /// to show, or `None` if not animating.
    pub fn next_frame(&mut self) -> Option<&Joints> {
        if self.state != SessionState::Animating {
            return None;
        }
        let count = self.frame_count();
        if count == 0 {
            return None;
        }
        let frame = self.frame % count;
        self.frame = (frame + 1) % count;

        let waypoint = match &self.playback {
            Some(Playback::Joints(trajectory)) => {
                self.joints = trajectory.steps()[frame].joints.clone();
                None
            }
            Some(Playback::Waypoints(points)) => Some(points[frame]),
            None => None,
        };
        if let Some(target) = waypoint {
            // Raw targets are solved one by one, like a click on each
            self.target = Some(target);
            self.solve_current();
        }
        Some(&self.joints)
    }

    /// Stop the animation, keeping the last shown pose.
    pub fn stop(&mut self) {
        if self.state != SessionState::Animating {
            return;
        }
        self.playback = None;
        self.frame = 0;
        self.state = if self.target.is_some() {
            SessionState::TargetSelected
        } else {
            SessionState::Idle
        };
    }

    fn solve_current(&mut self) -> bool {
        let Some(target) = self.target else {
            return false;
        };
        let solution = match self.ik_method {
            IkMethod::Analytical => self
                .robot
                .inverse_analytical(&target, ElbowBranch::Up)
                .or_else(|| self.robot.inverse_analytical(&target, ElbowBranch::Down)),
            method => self.robot.solve(&target, method, Some(&self.joints)),
        };
        match solution {
            Some(qs) => {
                let error = (self.robot.end_effector_position(&qs) - target).norm();
                self.error_history.push(error);
                self.joints = qs;
                true
            }
            None => {
                debug!("No {:?} IK solution for ({:.3}, {:.3})", self.ik_method, target.x, target.y);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameters::planar_kinematics::Parameters;

    fn session() -> Session {
        Session::new(PlanarKinematics::new(Parameters::default()))
    }

    #[test]
    fn test_select_target() {
        let mut session = session();
        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.select_target(Position::new(1.0, 1.0)));
        assert_eq!(session.state(), SessionState::TargetSelected);
        assert!(session.joints()[1] > 0.0); // elbow up
        assert_eq!(session.error_history().len(), 1);
        assert!(session.error_history()[0] < 1e-9);
        assert_eq!(session.arm().len(), 4);
    }

    #[test]
    fn test_unreachable_target_keeps_pose() {
        let mut session = session();
        session.select_target(Position::new(1.0, 1.0));
        let before = session.joints().clone();
        assert!(!session.select_target(Position::new(5.0, 0.0)));
        assert_eq!(session.joints(), &before);
        assert_eq!(session.trajectory_points().len(), 2);
        assert_eq!(session.error_history().len(), 1);
    }

    #[test]
    fn test_switch_method_resolves() {
        let mut session = session();
        session.select_target(Position::new(0.5, 1.5));
        assert_eq!(session.switch_ik_method(), IkMethod::Numerical);
        assert_eq!(session.error_history().len(), 2);
        assert!(session.error_history()[1] < 0.1);
        assert_eq!(session.switch_ik_method(), IkMethod::Jacobian);
        assert_eq!(session.switch_ik_method(), IkMethod::Analytical);
    }

    #[test]
    fn test_play_and_stop() {
        let mut session = session();
        let planner = PathPlanner::default();
        session.select_target(Position::new(1.5, 0.5));
        assert!(!session.play(&planner, 10).unwrap());
        assert_eq!(session.state(), SessionState::TargetSelected);

        session.select_target(Position::new(1.0, 1.0));
        assert!(session.play(&planner, 10).unwrap());
        assert_eq!(session.state(), SessionState::Animating);
        assert_eq!(session.frame_count(), 10);

        // Targets are ignored while animating
        assert!(!session.select_target(Position::new(0.5, 0.5)));

        let first = session.next_frame().unwrap().clone();
        for _ in 1..session.frame_count() {
            session.next_frame();
        }
        // Wrapped around to the first frame
        assert_eq!(session.next_frame().unwrap(), &first);

        session.stop();
        assert_eq!(session.state(), SessionState::TargetSelected);
        assert!(session.next_frame().is_none());
    }

    #[test]
    fn test_reset() {
        let mut session = session();
        session.select_target(Position::new(1.0, 1.0));
        session.reset();
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(session.joints(), &vec![0.0, 0.0, 0.0]);
        assert!(session.target().is_none());
        assert!(session.trajectory_points().is_empty());
    }
}
