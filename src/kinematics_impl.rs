//! Forward and inverse kinematics of a planar serial arm.

use crate::jacobian::{damped_pseudo_inverse, Jacobian};
use crate::kinematic_traits::{ElbowBranch, IkMethod, Joints, Kinematics, Pose, Position, Solutions};
use crate::optimizer::BoundedBfgs;
use crate::parameters::planar_kinematics::Parameters;
use crate::utils::{is_valid, joint_distance, link_transform, linspace, normalize_angle, pose_position, wrap_joints};
use nalgebra::{DVector, Isometry2, Vector2};
use std::f64::consts::PI;
use tracing::{debug, trace, warn};

/// Two analytical solutions closer than this are the same solution.
const SAME_SOLUTION: f64 = 1e-9;

/// Settings of the optimisation based inverse kinematics.
#[derive(Debug, Clone, Copy)]
pub struct NumericalIkSettings {
    pub optimizer: BoundedBfgs,
    /// The solution is only accepted if the end effector is closer than this
    /// to the target.
    pub residual_threshold: f64,
}

impl Default for NumericalIkSettings {
    fn default() -> Self {
        NumericalIkSettings {
            optimizer: BoundedBfgs::default(),
            residual_threshold: 0.1,
        }
    }
}

/// Settings of the iterative damped Jacobian inverse kinematics.
#[derive(Debug, Clone, Copy)]
pub struct JacobianIkSettings {
    pub max_iterations: usize,
    /// Converged when the position error is below this value.
    pub tolerance: f64,
    /// Fraction of the pseudo-inverse step applied per iteration.
    pub step_size: f64,
    /// Levenberg damping added to JᵀJ. Must be positive.
    pub damping: f64,
}

impl Default for JacobianIkSettings {
    fn default() -> Self {
        JacobianIkSettings {
            max_iterations: 1000,
            tolerance: 1e-4,
            step_size: 0.1,
            damping: 0.01,
        }
    }
}

/// Kinematic model of a planar arm. Immutable after construction and can be shared
/// between any number of callers.
#[derive(Debug, Clone)]
pub struct PlanarKinematics {
    parameters: Parameters,
    numerical: NumericalIkSettings,
    iterative: JacobianIkSettings,
}

impl PlanarKinematics {
    /// Creates a new `PlanarKinematics` instance with the given parameters and default
    /// solver settings.
    pub fn new(parameters: Parameters) -> Self {
        PlanarKinematics {
            parameters,
            numerical: NumericalIkSettings::default(),
            iterative: JacobianIkSettings::default(),
        }
    }

    pub fn with_numerical_settings(self, numerical: NumericalIkSettings) -> Self {
        PlanarKinematics { numerical, ..self }
    }

    pub fn with_jacobian_settings(self, iterative: JacobianIkSettings) -> Self {
        PlanarKinematics { iterative, ..self }
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    pub fn numerical_settings(&self) -> &NumericalIkSettings {
        &self.numerical
    }

    pub fn jacobian_settings(&self) -> &JacobianIkSettings {
        &self.iterative
    }

    /// End effector position for the given joint angles.
    pub fn end_effector_position(&self, qs: &[f64]) -> Position {
        pose_position(&self.forward(qs))
    }

    /// Positions of the base, every joint and the end effector, in this order
    /// (link count + 1 points). Used to draw the arm.
    pub fn forward_with_joint_positions(&self, qs: &[f64]) -> Vec<Position> {
        debug_assert_eq!(qs.len(), self.dof(), "expected one joint value per link");
        let mut pose = Isometry2::identity();
        let mut positions = Vec::with_capacity(self.dof() + 1);
        positions.push(Position::origin());
        for (&length, &theta) in self.parameters.link_lengths().iter().zip(qs.iter()) {
            pose *= link_transform(length, theta);
            positions.push(pose_position(&pose));
        }
        positions
    }

    /// Closed form inverse kinematics for two and three link arms. The last link of the
    /// three link arm is pointed straight at the target, reducing the problem to a two
    /// link arm reaching `r - L3`. Returns `None` if the target cannot be reached on this
    /// branch or the arm has a different number of links. Both branches must be queried
    /// to get the complete solution set, see [Kinematics::inverse].
    pub fn inverse_analytical(&self, target: &Position, branch: ElbowBranch) -> Option<Joints> {
        let links = self.parameters.link_lengths();
        let (l1, l2, l3) = match *links {
            [l1, l2] => (l1, l2, 0.0),
            [l1, l2, l3] => (l1, l2, l3),
            _ => {
                trace!("Analytical IK is not available for {} links", links.len());
                return None;
            }
        };
        if !(target.x.is_finite() && target.y.is_finite()) {
            return None;
        }

        let r = target.coords.norm();
        if r > l1 + l2 + l3 || r < ((l1 - l2).abs() - l3).max(0.0) {
            return None;
        }

        let reach = r - l3;
        if reach < 0.0 || reach > l1 + l2 {
            return None;
        }

        let bearing = target.y.atan2(target.x);
        let cos_elbow = (reach * reach - l1 * l1 - l2 * l2) / (2.0 * l1 * l2);
        if cos_elbow.abs() > 1.0 {
            return None;
        }

        let theta2 = branch.sign() * cos_elbow.acos();
        // The wrist must lie on the ray to the target, so the shoulder is turned back by
        // the angle the elbow adds to the direction from the shoulder to the wrist.
        let theta1 = bearing - (l2 * theta2.sin()).atan2(l1 + l2 * theta2.cos());
        if links.len() == 2 {
            return Some(vec![normalize_angle(theta1), theta2]);
        }

        let wrist = Vector2::new(
            l1 * theta1.cos() + l2 * (theta1 + theta2).cos(),
            l1 * theta1.sin() + l2 * (theta1 + theta2).sin(),
        );
        let to_target = target.coords - wrist;
        let theta3 = normalize_angle(to_target.y.atan2(to_target.x) - (theta1 + theta2));
        Some(vec![normalize_angle(theta1), theta2, theta3])
    }

    /// Inverse kinematics by minimising ½‖FK(θ) − target‖² over θ ∈ [−π, π]ⁿ.
    /// The result is only accepted if the minimiser converged and the remaining position
    /// error is below the residual threshold (0.1 by default). The seed defaults to all
    /// zeros. From the zero seed a small share of reachable targets ends in a local
    /// minimum with a joint stuck on the ±π bound and is rejected; pass a seed close to
    /// the expected solution or use [PlanarKinematics::inverse_jacobian] for those.
    pub fn inverse_numerical(&self, target: &Position, seed: Option<&[f64]>) -> Option<Joints> {
        if !(target.x.is_finite() && target.y.is_finite()) {
            return None;
        }
        let n = self.dof();
        let start = self.seed_or_zeros(seed);
        let objective = |qs: &[f64]| 0.5 * (self.end_effector_position(qs) - target).norm_squared();

        let result = self.numerical.optimizer.minimize(
            objective,
            &start,
            &vec![-PI; n],
            &vec![PI; n],
        );

        let residual = (self.end_effector_position(&result.x) - target).norm();
        if result.success && residual < self.numerical.residual_threshold {
            trace!(
                "Numerical IK converged in {} iterations, residual {:e}",
                result.iterations, residual
            );
            Some(wrap_joints(&result.x))
        } else {
            debug!(
                "Numerical IK rejected for ({:.4}, {:.4}): {:?} after {} iterations, residual {:.4}",
                target.x, target.y, result.termination, result.iterations, residual
            );
            None
        }
    }

    /// Iterative inverse kinematics: θ += step · J⁺ · (target − FK(θ)) where J⁺ is the
    /// damped pseudo-inverse of the position Jacobian, wrapping every angle after each
    /// update. Returns `None` if the error does not drop below the tolerance within the
    /// iteration budget.
    pub fn inverse_jacobian(&self, target: &Position, seed: Option<&[f64]>) -> Option<Joints> {
        if !(target.x.is_finite() && target.y.is_finite()) {
            return None;
        }
        let settings = &self.iterative;
        let mut qs = self.seed_or_zeros(seed);

        for iteration in 0..settings.max_iterations {
            let error = target - self.end_effector_position(&qs);
            if error.norm() < settings.tolerance {
                trace!("Jacobian IK converged in {} iterations", iteration);
                return Some(qs);
            }

            let jacobian = self.jacobian(&qs).position_jacobian();
            let pseudo_inverse = damped_pseudo_inverse(&jacobian, settings.damping)?;
            let delta = pseudo_inverse * DVector::from_column_slice(error.as_slice()) * settings.step_size;
            qs = qs
                .iter()
                .zip(delta.iter())
                .map(|(&q, &dq)| normalize_angle(q + dq))
                .collect();
            if !is_valid(&qs) {
                return None;
            }
        }

        // The last update is not checked inside the loop
        if (target - self.end_effector_position(&qs)).norm() < settings.tolerance {
            return Some(qs);
        }
        debug!(
            "Jacobian IK did not converge for ({:.4}, {:.4}) in {} iterations",
            target.x, target.y, settings.max_iterations
        );
        None
    }

    /// Solve the inverse kinematics with the chosen method. The seed is the initial guess
    /// of the iterative methods; the analytical method returns the branch closest to it
    /// (or the elbow up branch if there is no seed).
    pub fn solve(&self, target: &Position, method: IkMethod, seed: Option<&[f64]>) -> Option<Joints> {
        match method {
            IkMethod::Analytical => match seed {
                Some(previous) => self.inverse_continuing(target, previous).into_iter().next(),
                None => self.inverse(target).into_iter().next(),
            },
            IkMethod::Numerical => self.inverse_numerical(target, seed),
            IkMethod::Jacobian => self.inverse_jacobian(target, seed),
        }
    }

    /// 6xN Jacobian at the given configuration, using the finite difference step
    /// from the parameters. `qs` must hold one value per link.
    pub fn jacobian(&self, qs: &[f64]) -> Jacobian {
        debug_assert_eq!(qs.len(), self.dof(), "expected one joint value per link");
        Jacobian::new(self, qs, self.parameters.jacobian_epsilon())
    }

    /// True if the configuration is singular by the 2x2 determinant heuristic,
    /// see [Jacobian::is_singular]. `qs` must hold one value per link.
    pub fn check_singularity(&self, qs: &[f64]) -> bool {
        self.jacobian(qs).is_singular()
    }

    /// Sample the reachable area: θ1 and θ2 each take `samples` values spanning [−π, π],
    /// later joints are held at zero. Returns x and y coordinates, `samples²` of each.
    /// This is a dense sample of the interior, not the boundary curve.
    pub fn workspace_boundary(&self, samples: usize) -> (Vec<f64>, Vec<f64>) {
        let grid = linspace(-PI, PI, samples);
        let mut xs = Vec::with_capacity(samples * samples);
        let mut ys = Vec::with_capacity(samples * samples);
        let mut qs = vec![0.0; self.dof()];
        for &theta1 in &grid {
            for &theta2 in &grid {
                qs[0] = theta1;
                if qs.len() > 1 {
                    qs[1] = theta2;
                }
                let p = self.end_effector_position(&qs);
                xs.push(p.x);
                ys.push(p.y);
            }
        }
        (xs, ys)
    }

    /// Wrapped and clamped seed of the right length, or zeros.
    fn seed_or_zeros(&self, seed: Option<&[f64]>) -> Joints {
        let n = self.dof();
        match seed {
            Some(qs) if qs.len() == n && is_valid(qs) => wrap_joints(qs),
            Some(qs) => {
                warn!("Ignoring IK seed {:?}, expected {} finite joint values", qs, n);
                vec![0.0; n]
            }
            None => vec![0.0; n],
        }
    }
}

impl Kinematics for PlanarKinematics {
    fn dof(&self) -> usize {
        self.parameters.dof()
    }

    /// All analytical solutions, elbow up first. At the reach boundary both branches
    /// coincide and only one is returned.
    fn inverse(&self, target: &Position) -> Solutions {
        let mut solutions: Solutions = Vec::with_capacity(2);
        for branch in ElbowBranch::ALL {
            if let Some(qs) = self.inverse_analytical(target, branch) {
                if solutions.iter().all(|s| joint_distance(s, &qs) > SAME_SOLUTION) {
                    solutions.push(qs);
                }
            }
        }
        solutions
    }

    fn inverse_continuing(&self, target: &Position, previous: &[f64]) -> Solutions {
        let mut solutions = self.inverse(target);
        solutions.sort_by(|a, b| {
            joint_distance(a, previous).total_cmp(&joint_distance(b, previous))
        });
        solutions
    }

    /// Cumulative angle summation, one joint value per link.
    fn forward(&self, qs: &[f64]) -> Pose {
        debug_assert_eq!(qs.len(), self.dof(), "expected one joint value per link");
        self.parameters
            .link_lengths()
            .iter()
            .zip(qs.iter())
            .fold(Isometry2::identity(), |pose, (&length, &theta)| {
                pose * link_transform(length, theta)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn robot() -> PlanarKinematics {
        PlanarKinematics::new(Parameters::default())
    }

    fn assert_reaches(robot: &PlanarKinematics, qs: &[f64], target: &Position, tolerance: f64) {
        let reached = robot.end_effector_position(qs);
        let error = (reached - target).norm();
        assert!(
            error < tolerance,
            "Target ({}, {}), reached ({}, {}), error {}",
            target.x, target.y, reached.x, reached.y, error
        );
    }

    #[test]
    fn test_forward_stretched() {
        let p = robot().end_effector_position(&[0.0, 0.0, 0.0]);
        assert_eq!(p, Position::new(2.5, 0.0));
    }

    #[test]
    fn test_forward_rotation() {
        // Up, right, up again
        let pose = robot().forward(&[PI / 2.0, -PI / 2.0, PI / 2.0]);
        assert!((pose.translation.vector.x - 1.0).abs() < 1e-12);
        assert!((pose.translation.vector.y - 1.5).abs() < 1e-12);
        assert!((pose.rotation.angle() - PI / 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_joint_positions() {
        let positions = robot().forward_with_joint_positions(&[PI / 2.0, 0.0, 0.0]);
        assert_eq!(positions.len(), 4);
        assert_eq!(positions[0], Position::origin());
        assert!((positions[1] - Position::new(0.0, 1.0)).norm() < 1e-12);
        assert!((positions[3] - Position::new(0.0, 2.5)).norm() < 1e-12);
    }

    #[test]
    fn test_analytical_on_axis() {
        let robot = robot();
        let target = Position::new(1.5, 0.0);
        let qs = robot.inverse_analytical(&target, ElbowBranch::Up).unwrap();
        assert_reaches(&robot, &qs, &target, 1e-6);
        assert!((qs[0] + PI / 3.0).abs() < 1e-9);
        assert!((qs[1] - 2.0 * PI / 3.0).abs() < 1e-9);
        assert!((qs[2] + PI / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_analytical_both_branches() {
        let robot = robot();
        for (x, y) in [(0.5, 0.5), (1.0, 1.0), (0.0, 1.5), (1.8, 0.8), (-1.2, -0.7)] {
            let target = Position::new(x, y);
            let up = robot.inverse_analytical(&target, ElbowBranch::Up).unwrap();
            let down = robot.inverse_analytical(&target, ElbowBranch::Down).unwrap();
            assert!(up[1] > 0.0 && down[1] < 0.0);
            assert_reaches(&robot, &up, &target, 1e-9);
            assert_reaches(&robot, &down, &target, 1e-9);
            assert_eq!(robot.inverse(&target).len(), 2);
        }
    }

    #[test]
    fn test_analytical_reach_limits() {
        let robot = robot();
        let stretched = robot.inverse_analytical(&Position::new(2.5, 0.0), ElbowBranch::Up).unwrap();
        assert!(stretched.iter().all(|q| q.abs() < 1e-6));
        // Both branches are the same stretched arm
        assert_eq!(robot.inverse(&Position::new(2.5, 0.0)).len(), 1);

        assert!(robot.inverse_analytical(&Position::new(2.6, 0.0), ElbowBranch::Up).is_none());
        assert!(robot.inverse_analytical(&Position::new(0.0, 0.0), ElbowBranch::Up).is_none());
        assert!(robot.inverse_analytical(&Position::new(f64::NAN, 1.0), ElbowBranch::Up).is_none());
    }

    #[test]
    fn test_analytical_too_close() {
        // |2.0 - 1.0| - 0.5 = 0.5 is the closest the wrist ray construction can reach
        let robot = PlanarKinematics::new(Parameters::long_shoulder());
        let target = Position::new(0.3, 0.0);
        for branch in ElbowBranch::ALL {
            assert!(robot.inverse_analytical(&target, branch).is_none());
        }
        assert!(robot.inverse(&target).is_empty());
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "one joint value per link")]
    fn test_forward_short_joints() {
        robot().end_effector_position(&[0.0]);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "one joint value per link")]
    fn test_singularity_short_joints() {
        robot().check_singularity(&[0.3]);
    }

    #[test]
    fn test_analytical_two_links() {
        let robot = PlanarKinematics::new(Parameters::two_link());
        let target = Position::new(1.2, 0.4);
        let solutions = robot.inverse(&target);
        assert_eq!(solutions.len(), 2);
        for qs in &solutions {
            assert_eq!(qs.len(), 2);
            assert_reaches(&robot, qs, &target, 1e-9);
        }
    }

    #[test]
    fn test_analytical_other_link_counts() {
        let robot = PlanarKinematics::new(Parameters::new(vec![1.0, 1.0, 1.0, 1.0]).unwrap());
        assert!(robot.inverse(&Position::new(1.0, 1.0)).is_empty());
    }

    #[test]
    fn test_inverse_continuing_prefers_previous_branch() {
        let robot = robot();
        let target = Position::new(1.0, 1.0);
        let down = robot.inverse_analytical(&target, ElbowBranch::Down).unwrap();
        let solutions = robot.inverse_continuing(&target, &down);
        assert_eq!(solutions.len(), 2);
        assert!(joint_distance(&solutions[0], &down) < 1e-12);
    }

    #[test]
    fn test_numerical() {
        let robot = robot();
        for (x, y) in [(0.0, 1.5), (1.0, 1.0), (0.5, 0.5), (1.8, 0.8), (-1.2, -0.7)] {
            let target = Position::new(x, y);
            let qs = robot.inverse_numerical(&target, None).unwrap();
            assert_reaches(&robot, &qs, &target, 0.1);
            assert!(qs.iter().all(|q| q.abs() <= PI));
        }
    }

    #[test]
    fn test_numerical_unreachable() {
        assert!(robot().inverse_numerical(&Position::new(3.0, 0.0), None).is_none());
        assert!(robot().inverse_numerical(&Position::new(f64::INFINITY, 0.0), None).is_none());
    }

    #[test]
    fn test_numerical_seed() {
        let robot = robot();
        let target = Position::new(1.5, 0.0);
        let qs = robot.inverse_numerical(&target, Some(&[0.3, 0.6, 0.3])).unwrap();
        assert_reaches(&robot, &qs, &target, 0.1);
        // Wrong seed length falls back to zeros rather than failing
        let qs = robot.inverse_numerical(&Position::new(1.0, 1.0), Some(&[0.3])).unwrap();
        assert_eq!(qs.len(), 3);
    }

    #[test]
    fn test_jacobian_ik() {
        let robot = robot();
        let seeds: [&[f64]; 3] = [&[0.0, 0.0, 0.0], &[0.3, 0.6, 0.3], &[PI / 2.0, 0.0, 0.0]];
        for (x, y) in [(1.5, 0.0), (1.0, 1.0), (0.0, 1.5), (1.8, 0.8)] {
            let target = Position::new(x, y);
            for seed in seeds {
                let qs = robot.inverse_jacobian(&target, Some(seed)).unwrap();
                assert_reaches(&robot, &qs, &target, 1e-4);
            }
        }
    }

    #[test]
    fn test_jacobian_ik_converges_on_last_update() {
        // A single undamped step from a nearby seed
        let robot = robot().with_jacobian_settings(JacobianIkSettings {
            max_iterations: 1,
            tolerance: 1e-3,
            step_size: 1.0,
            damping: 1e-6,
        });
        let seed = [0.3, 0.6, 0.3];
        let target = robot.end_effector_position(&[0.31, 0.6, 0.3]);
        assert!((robot.end_effector_position(&seed) - target).norm() > 1e-3);
        let qs = robot.inverse_jacobian(&target, Some(&seed)).unwrap();
        assert_reaches(&robot, &qs, &target, 1e-3);
    }

    #[test]
    fn test_numerical_zero_seed_local_minimum() {
        let robot = robot();
        let target = Position::new(0.75, -0.19);
        assert!(robot.inverse_numerical(&target, None).is_none());
        let seed = robot.inverse_analytical(&target, ElbowBranch::Up).unwrap();
        let qs = robot.inverse_numerical(&target, Some(&seed)).unwrap();
        assert_reaches(&robot, &qs, &target, 0.1);
        let qs = robot.inverse_jacobian(&target, None).unwrap();
        assert_reaches(&robot, &qs, &target, 1e-4);
    }

    #[test]
    fn test_jacobian_ik_unreachable() {
        assert!(robot().inverse_jacobian(&Position::new(3.0, 0.0), None).is_none());
    }

    #[test]
    fn test_solve_dispatch() {
        let robot = robot();
        let target = Position::new(1.0, 1.0);
        let down = robot.inverse_analytical(&target, ElbowBranch::Down).unwrap();
        let picked = robot.solve(&target, IkMethod::Analytical, Some(&down)).unwrap();
        assert!(joint_distance(&picked, &down) < 1e-12);
        let up = robot.solve(&target, IkMethod::Analytical, None).unwrap();
        assert!(up[1] > 0.0);

        for method in [IkMethod::Numerical, IkMethod::Jacobian] {
            let qs = robot.solve(&target, method, Some(&[0.3, 0.6, 0.3])).unwrap();
            assert_reaches(&robot, &qs, &target, 0.1);
        }
    }

    #[test]
    fn test_singularity() {
        let robot = robot();
        assert!(robot.check_singularity(&[0.0, 0.0, 0.0]));
        assert!(robot.check_singularity(&[0.4, PI, 0.0]));
        assert!(!robot.check_singularity(&[0.0, PI / 2.0, 0.0]));

        let single = PlanarKinematics::new(Parameters::new(vec![1.0]).unwrap());
        assert!(single.check_singularity(&[0.7]));
    }

    #[test]
    fn test_jacobian_columns() {
        // Analytical values: dx/dθ1 = -y, dy/dθ1 = x for the first joint
        let robot = robot();
        let qs = [0.3, 0.5, -0.2];
        let p = robot.end_effector_position(&qs);
        let jacobian = robot.jacobian(&qs);
        let m = jacobian.matrix();
        assert_eq!(m.shape(), (6, 3));
        assert!((m[(0, 0)] + p.y).abs() < 1e-5);
        assert!((m[(1, 0)] - p.x).abs() < 1e-5);
        for j in 0..3 {
            assert!((m[(5, j)] - 1.0).abs() < 1e-5);
            for row in 2..5 {
                assert_eq!(m[(row, j)], 0.0);
            }
        }
    }

    #[test]
    fn test_workspace() {
        let robot = robot();
        let (xs, ys) = robot.workspace_boundary(20);
        assert_eq!(xs.len(), 400);
        assert_eq!(ys.len(), 400);
        for (x, y) in xs.iter().zip(ys.iter()) {
            let r = (x * x + y * y).sqrt();
            assert!(r <= 2.5 + 1e-9 && r >= 0.5 - 1e-9);
        }
        assert!(robot.workspace_boundary(0).0.is_empty());
    }
}
