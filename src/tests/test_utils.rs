use std::f64::consts::PI;

use anyhow::{ensure, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::kinematic_traits::Position;
use crate::kinematics_impl::PlanarKinematics;

/// Fixed seed so that failures can be reproduced.
pub(crate) fn rng() -> StdRng {
    StdRng::seed_from_u64(20240917)
}

/// Random target with its distance from the base within [inner, outer].
pub(crate) fn random_target(rng: &mut StdRng, inner: f64, outer: f64) -> Position {
    let radius = rng.gen_range(inner..outer);
    let angle = rng.gen_range(-PI..PI);
    Position::new(radius * angle.cos(), radius * angle.sin())
}

/// Random joint angles in [-PI, PI).
pub(crate) fn random_joints(rng: &mut StdRng, dof: usize) -> Vec<f64> {
    (0..dof).map(|_| rng.gen_range(-PI..PI)).collect()
}

/// Checks that the joints put the end effector within `tolerance` of the target.
pub(crate) fn ensure_reaches(
    robot: &PlanarKinematics,
    qs: &[f64],
    target: &Position,
    tolerance: f64,
) -> Result<()> {
    let reached = robot.end_effector_position(qs);
    let error = (reached - target).norm();
    ensure!(
        error < tolerance,
        "Joints {:?} reach ({:.6}, {:.6}) instead of ({:.6}, {:.6}), error {:e}",
        qs, reached.x, reached.y, target.x, target.y, error
    );
    Ok(())
}

pub(crate) fn ensure_angles_in_range(qs: &[f64]) -> Result<()> {
    ensure!(
        qs.iter().all(|q| (-PI..=PI).contains(q)),
        "Joint angles {:?} not within [-PI, PI]",
        qs
    );
    Ok(())
}
