use nalgebra::{Vector2, Vector3};
use planar_arm_kinematics::jacobian::Jacobian;
use planar_arm_kinematics::kinematic_traits::Joints;
use planar_arm_kinematics::kinematics_impl::PlanarKinematics;
use planar_arm_kinematics::parameters::planar_kinematics::Parameters;
use std::f64::consts::FRAC_PI_2;

/// Jacobian matrices, singularities and the workspace of a planar arm.
fn main() {
    let robot = PlanarKinematics::new(Parameters::three_link());

    let joints: Joints = vec![0.3, FRAC_PI_2, -0.4];
    let jacobian = Jacobian::new(&robot, &joints, 1E-6);
    println!("Jacobian at {:?}:{}", joints, jacobian.matrix());
    println!("Position determinant: {:?}", jacobian.position_determinant());

    // Move the tip along +y at 0.1 units per second
    let joint_velocities = jacobian.velocities(&Vector2::new(0.0, 0.1), 1E-4);
    println!("Computed joint velocities: {:?}", joint_velocities);

    // Same, keeping the orientation of the last link
    let joint_velocities = jacobian.velocities_with_rotation(&Vector3::new(0.0, 0.1, 0.0), 1E-4);
    println!("Computed joint velocities, orientation kept: {:?}", joint_velocities);

    // Push the tip along x with 2 N and twist it with 0.5 Nm
    let joint_torques = jacobian.torques(&Vector3::new(2.0, 0.0, 0.5));
    println!("Computed joint torques: {:?}", joint_torques);

    for qs in [vec![0.0, 0.0, 0.0], vec![0.4, std::f64::consts::PI, 0.0], vec![0.0, FRAC_PI_2, 0.0]] {
        println!("Singular at {:?}: {}", qs, robot.check_singularity(&qs));
    }

    let (xs, ys) = robot.workspace_boundary(40);
    let farthest = xs.iter().zip(ys.iter()).map(|(x, y)| x.hypot(*y)).fold(0.0, f64::max);
    println!(
        "Workspace: {} samples, farthest {:.3} (maximal reach {:.3})",
        xs.len(),
        farthest,
        robot.parameters().max_reach()
    );
}
