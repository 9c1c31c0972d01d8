//! Forward and inverse kinematics and trajectory planning for planar serial arms
//! (two, three or more revolute joints rotating in the same plane).
//!
//! # Features
//!
//! - Exact forward kinematics by cumulative angle summation, with the positions of every
//!   joint available for drawing.
//! - Three interchangeable inverse kinematics solvers, selected by [kinematic_traits::IkMethod]:
//!   - closed form (geometric) solution for two and three link arms, with both elbow branches;
//!   - bounded quasi-Newton minimisation of the position error, for any number of links;
//!   - iterative damped Jacobian pseudo-inverse, stable at singular configurations.
//! - If the previous joint positions are provided, solutions are sorted by proximity to them
//!   (closest first), so the arm does not jump between elbow branches along a path.
//! - Finite difference Jacobian, joint velocities and torques, singularity check.
//! - Workspace sampling over a joint angle grid.
//! - Trapezoidal velocity profiles with the triangular fallback for short moves, and
//!   multi-waypoint interpolation in joint space and in operational (Cartesian) space.
//! - Finite state machine for interactive front ends that pick targets and replay them.
//!
//! All solvers report an unreachable target as `None` rather than an error or a wrong
//! answer. Robot models are immutable after construction and can be shared freely.
//!
//! # Parameters
//!
//! A robot is described by its link lengths only, the joint at the start of each link.
//! At zero joint angles the arm is stretched along the x axis. Fill out a
//! `planar_kinematics::Parameters` structure, use one of the presets, or read it from YAML.
//!
//! ## Examples
//!
//! - **basic.rs**: Forward and inverse kinematics with all three solvers.
//! - **jacobian.rs**: Jacobian, singularities, joint velocities and the workspace.
//! - **path_planning.rs**: Joint space and operational space trajectories.

pub mod parameters;
pub mod parameters_robots;
pub mod parameter_error;

#[cfg(feature = "allow_filesystem")]
pub mod parameters_from_file;

#[path = "utils/utils.rs"]
pub mod utils;
pub mod kinematic_traits;
pub mod kinematics_impl;

pub mod jacobian;
pub mod optimizer;

pub mod annotations;
pub mod planning_error;

#[path = "path_plan/trapezoid.rs"]
pub mod trapezoid;

#[path = "path_plan/path_planner.rs"]
pub mod path_planner;

pub mod session;

#[cfg(test)]
mod tests;
