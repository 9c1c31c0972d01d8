//! Multi-waypoint trajectory interpolation with trapezoidal velocity profiles, either
//! per joint (joint space) or along straight Cartesian lines (operational space).

use crate::annotations::{AnnotatedJoints, PathFlags};
use crate::kinematic_traits::{IkMethod, Joints, Kinematics, Position};
use crate::kinematics_impl::PlanarKinematics;
use crate::planning_error::PlanningError;
use crate::trapezoid::{check_limits, TrapezoidalProfile};
use crate::utils::{lerp, linspace, transition_costs};
use std::f64::consts::FRAC_PI_4;
use tracing::{debug, warn};

/// Joint or Cartesian displacements below this are treated as no motion.
pub const STILL: f64 = 1e-6;

/// How the joints of a joint space segment are timed against each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Synchronization {
    /// Every joint runs its own trapezoidal profile over the same number of samples.
    /// Joints with short moves finish early in real time, so the end effector does not
    /// follow a controlled path between waypoints.
    #[default]
    Independent,
    /// All joints share the profile of the joint with the largest move, scaled by their
    /// own displacement, so they start and stop together.
    Synchronized,
}

/// Time stamped joint positions, owned by the caller that requested them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Trajectory {
    steps: Vec<AnnotatedJoints>,
}

impl Trajectory {
    pub fn steps(&self) -> &[AnnotatedJoints] {
        &self.steps
    }

    pub fn into_steps(self) -> Vec<AnnotatedJoints> {
        self.steps
    }

    pub fn iter(&self) -> impl Iterator<Item = &AnnotatedJoints> {
        self.steps.iter()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn first(&self) -> Option<&AnnotatedJoints> {
        self.steps.first()
    }

    pub fn last(&self) -> Option<&AnnotatedJoints> {
        self.steps.last()
    }

    /// Joint positions without annotations.
    pub fn joints(&self) -> Vec<Joints> {
        self.steps.iter().map(|s| s.joints.clone()).collect()
    }

    pub fn times(&self) -> Vec<f64> {
        self.steps.iter().map(|s| s.time).collect()
    }

    /// Time stamp of the last sample.
    pub fn duration(&self) -> f64 {
        self.steps.last().map_or(0.0, |s| s.time)
    }
}

/// What to play back after operational space planning.
#[derive(Debug, Clone)]
pub enum Playback {
    /// Dense joint trajectory, IK succeeded everywhere.
    Joints(Trajectory),
    /// IK failed somewhere, only the Cartesian waypoints are available.
    Waypoints(Vec<Position>),
}

/// Trajectory interpolation.
#[derive(Debug, Clone, Copy)]
pub struct PathPlanner<'a> {
    /// Robot used for inverse kinematics in operational space. Joint space interpolation
    /// does not need it.
    pub robot: Option<&'a PlanarKinematics>,

    /// Maximal velocity, per joint (rad/s) or along the Cartesian line (units/s).
    pub max_velocity: f64,

    /// Maximal acceleration, same units as velocity per second.
    pub max_acceleration: f64,

    pub synchronization: Synchronization,

    /// Inverse kinematics method used in operational space. Each sample is seeded with
    /// the joints of the previous one.
    pub ik_method: IkMethod,

    /// Largest joint jump (radians, any joint) between consecutive operational space
    /// samples before a warning about a possible branch switch is logged.
    pub max_transition_cost: f64,
}

impl Default for PathPlanner<'_> {
    fn default() -> Self {
        PathPlanner {
            robot: None,
            max_velocity: 1.0,
            max_acceleration: 1.0,
            synchronization: Synchronization::default(),
            ik_method: IkMethod::default(),
            max_transition_cost: FRAC_PI_4,
        }
    }
}

impl<'a> PathPlanner<'a> {
    /// Planner for the given robot with unit velocity and acceleration limits.
    pub fn new(robot: &'a PlanarKinematics) -> Self {
        PathPlanner {
            robot: Some(robot),
            ..Default::default()
        }
    }

    pub fn with_limits(self, max_velocity: f64, max_acceleration: f64) -> Self {
        PathPlanner { max_velocity, max_acceleration, ..self }
    }

    pub fn with_synchronization(self, synchronization: Synchronization) -> Self {
        PathPlanner { synchronization, ..self }
    }

    pub fn with_ik_method(self, ik_method: IkMethod) -> Self {
        PathPlanner { ik_method, ..self }
    }

    /// Interpolates joint waypoints. The sample budget is split evenly across segments
    /// (remainder to the last one); the sample shared by two adjacent segments is only
    /// emitted once, so `num_points` samples over `w` waypoints give `num_points - (w - 2)`
    /// trajectory steps. First and last steps are exactly the first and last waypoints.
    pub fn interpolate_joint_space(&self, waypoints: &[Joints], num_points: usize) -> Result<Trajectory, PlanningError> {
        check_limits(self.max_velocity, self.max_acceleration)?;
        let first = waypoints.first().ok_or(PlanningError::NoWaypoints)?;
        for (index, waypoint) in waypoints.iter().enumerate() {
            if waypoint.len() != first.len() {
                return Err(PlanningError::DimensionMismatch {
                    index,
                    expected: first.len(),
                    found: waypoint.len(),
                });
            }
        }
        if waypoints.len() == 1 {
            return Ok(single_step(first.clone()));
        }

        let counts = allocate_samples(num_points, waypoints.len() - 1)?;
        let mut steps = Vec::with_capacity(num_points);
        let mut clock = 0.0;
        for (segment, pair) in waypoints.windows(2).enumerate() {
            let n = counts[segment];
            let (times, samples) = self.joint_segment(&pair[0], &pair[1], n)?;
            let moving = samples.first() != samples.last();
            for k in 0..emitted(segment, &counts) {
                let flags = if k == 0 || k == n - 1 {
                    PathFlags::WAYPOINT
                } else if moving {
                    PathFlags::JOINT_INTERP
                } else {
                    PathFlags::HOLD
                };
                steps.push(AnnotatedJoints::new(samples[k].clone(), clock + times[k], flags));
            }
            clock += times[n - 1];
        }

        debug!("Joint space trajectory: {} steps, {:.3} s", steps.len(), clock);
        Ok(Trajectory { steps })
    }

    /// Interpolates Cartesian waypoints along straight lines, the distance travelled on
    /// each line following a trapezoidal profile, and solves inverse kinematics for every
    /// sample seeded with the previous solution (the first one with `initial_joints`, or
    /// zeros). Sample allocation is the same as in joint space. Fails with
    /// [PlanningError::IkFailure] at the first sample without a solution.
    pub fn interpolate_operational_space(
        &self,
        waypoints: &[Position],
        num_points: usize,
        initial_joints: Option<&[f64]>,
    ) -> Result<Trajectory, PlanningError> {
        let robot = self.robot.ok_or(PlanningError::MissingRobot)?;
        check_limits(self.max_velocity, self.max_acceleration)?;
        let first = waypoints.first().ok_or(PlanningError::NoWaypoints)?;

        let mut current: Joints = match initial_joints {
            Some(qs) => qs.to_vec(),
            None => vec![0.0; robot.dof()],
        };
        if waypoints.len() == 1 {
            return Ok(single_step(self.solve(robot, first, &current, 0, 0)?));
        }

        let counts = allocate_samples(num_points, waypoints.len() - 1)?;
        let unit_costs = vec![1.0; robot.dof()];
        let mut steps: Vec<AnnotatedJoints> = Vec::with_capacity(num_points);
        let mut clock = 0.0;
        for (segment, pair) in waypoints.windows(2).enumerate() {
            let (start, end) = (&pair[0], &pair[1]);
            let n = counts[segment];
            let distance = (end - start).norm();

            if distance < STILL {
                let qs = self.solve(robot, start, &current, segment, 0)?;
                for k in 0..emitted(segment, &counts) {
                    let flags = if k == 0 || k == n - 1 { PathFlags::WAYPOINT } else { PathFlags::HOLD };
                    steps.push(AnnotatedJoints::new(qs.clone(), clock, flags));
                }
                current = qs;
                continue;
            }

            let profile = TrapezoidalProfile::new(distance, self.max_velocity, self.max_acceleration)?;
            let (times, displacements) = profile.sample(n);
            for k in 0..emitted(segment, &counts) {
                let (target, flags) = if k == 0 {
                    (*start, PathFlags::WAYPOINT)
                } else if k == n - 1 {
                    (*end, PathFlags::WAYPOINT)
                } else {
                    (lerp(start, end, displacements[k] / distance), PathFlags::LIN_INTERP)
                };
                let qs = self.solve(robot, &target, &current, segment, k)?;
                if !steps.is_empty() {
                    let cost = transition_costs(&current, &qs, &unit_costs);
                    if cost > self.max_transition_cost {
                        warn!(
                            "Joint jump of {:.3} rad at segment {}, sample {}: possible branch switch",
                            cost, segment, k
                        );
                    }
                }
                steps.push(AnnotatedJoints::new(qs.clone(), clock + times[k], flags));
                current = qs;
            }
            clock += profile.total_time();
        }

        debug!("Operational space trajectory: {} steps, {:.3} s", steps.len(), clock);
        Ok(Trajectory { steps })
    }

    /// Same as [PathPlanner::interpolate_operational_space] but if inverse kinematics fails
    /// somewhere, logs a warning and returns the raw waypoints instead. Configuration errors
    /// (missing robot, invalid limits) are still returned as errors.
    pub fn interpolate_operational_space_or_waypoints(
        &self,
        waypoints: &[Position],
        num_points: usize,
        initial_joints: Option<&[f64]>,
    ) -> Result<Playback, PlanningError> {
        match self.interpolate_operational_space(waypoints, num_points, initial_joints) {
            Ok(trajectory) => Ok(Playback::Joints(trajectory)),
            Err(err) if err.is_recoverable() => {
                warn!("{}, falling back to the raw waypoints", err);
                Ok(Playback::Waypoints(waypoints.to_vec()))
            }
            Err(err) => Err(err),
        }
    }

    /// Time stamps and joint samples of one joint space segment.
    fn joint_segment(&self, start: &[f64], end: &[f64], n: usize) -> Result<(Vec<f64>, Vec<Joints>), PlanningError> {
        let deltas: Vec<f64> = start.iter().zip(end.iter()).map(|(a, b)| b - a).collect();

        let (times, offsets): (Vec<f64>, Vec<Vec<f64>>) = match self.synchronization {
            Synchronization::Independent => {
                let mut duration: f64 = 0.0;
                let mut offsets = Vec::with_capacity(deltas.len());
                for &delta in &deltas {
                    if delta.abs() < STILL {
                        offsets.push(vec![0.0; n]);
                    } else {
                        let profile = TrapezoidalProfile::new(delta, self.max_velocity, self.max_acceleration)?;
                        duration = duration.max(profile.total_time());
                        offsets.push(profile.sample(n).1);
                    }
                }
                (linspace(0.0, duration, n), offsets)
            }
            Synchronization::Synchronized => {
                let leading = deltas.iter().fold(0.0, |m: f64, d| m.max(d.abs()));
                if leading < STILL {
                    (vec![0.0; n], vec![vec![0.0; n]; deltas.len()])
                } else {
                    let profile = TrapezoidalProfile::new(leading, self.max_velocity, self.max_acceleration)?;
                    let (times, s) = profile.sample(n);
                    let offsets = deltas
                        .iter()
                        .map(|&delta| {
                            if delta.abs() < STILL {
                                vec![0.0; n]
                            } else {
                                s.iter().map(|&sk| delta * sk / leading).collect()
                            }
                        })
                        .collect();
                    (times, offsets)
                }
            }
        };

        let samples = (0..n)
            .map(|k| {
                if k == n - 1 {
                    end.to_vec()
                } else {
                    start.iter().enumerate().map(|(j, &q)| q + offsets[j][k]).collect()
                }
            })
            .collect();
        Ok((times, samples))
    }

    fn solve(
        &self,
        robot: &PlanarKinematics,
        target: &Position,
        seed: &[f64],
        segment: usize,
        sample: usize,
    ) -> Result<Joints, PlanningError> {
        robot
            .solve(target, self.ik_method, Some(seed))
            .ok_or(PlanningError::IkFailure { segment, sample, target: *target })
    }
}

/// Samples per segment: the budget is split evenly, the remainder goes to the last
/// segment. Every segment needs at least its two end points.
fn allocate_samples(num_points: usize, segments: usize) -> Result<Vec<usize>, PlanningError> {
    let per_segment = num_points / segments;
    if per_segment < 2 {
        return Err(PlanningError::InvalidParameter(format!(
            "{} samples cannot cover {} segments, at least 2 per segment are required",
            num_points, segments
        )));
    }
    let mut counts = vec![per_segment; segments];
    counts[segments - 1] += num_points % segments;
    Ok(counts)
}

/// Samples of the segment that go to the output: the last one is dropped except on the
/// final segment, as it is the first sample of the next segment.
fn emitted(segment: usize, counts: &[usize]) -> usize {
    if segment + 1 == counts.len() {
        counts[segment]
    } else {
        counts[segment] - 1
    }
}

fn single_step(joints: Joints) -> Trajectory {
    Trajectory {
        steps: vec![AnnotatedJoints::new(joints, 0.0, PathFlags::WAYPOINT)],
    }
}
