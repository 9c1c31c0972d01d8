use planar_arm_kinematics::kinematic_traits::{ElbowBranch, IkMethod, Joints, Kinematics, Pose, Position};
use planar_arm_kinematics::kinematics_impl::PlanarKinematics;
use planar_arm_kinematics::parameters::planar_kinematics::Parameters;
use planar_arm_kinematics::utils::{as_radians, dump_joints, dump_pose, dump_solutions};

fn main() {
    let robot = PlanarKinematics::new(Parameters::three_link());
    let joints: Joints = as_radians(&[30, 45, -20]); // Joints are alias of Vec<f64>
    println!("\nInitial joints: ");
    dump_joints(&joints);

    let pose: Pose = robot.forward(&joints); // Pose is alias of nalgebra::Isometry2<f64>
    println!("\nEnd effector: ");
    dump_pose(&pose);

    let target = Position::new(pose.translation.x, pose.translation.y);
    println!("\nAll closed form solutions, elbow up first. The last link points at the target,");
    println!("so the original wrist angle is generally not among them: ");
    dump_solutions(&robot.inverse(&target)); // Solutions is alias of Vec<Joints>

    println!("\nSolutions sorted by proximity to the initial joints: ");
    dump_solutions(&robot.inverse_continuing(&target, &joints));

    println!("\nElbow down only: ");
    if let Some(down) = robot.inverse_analytical(&target, ElbowBranch::Down) {
        dump_joints(&down);
    }

    println!("\nIterative solvers, starting from the initial joints: ");
    for method in [IkMethod::Numerical, IkMethod::Jacobian] {
        match robot.solve(&target, method, Some(&joints)) {
            Some(qs) => {
                let error = (robot.end_effector_position(&qs) - target).norm();
                println!("{:?}, position error {:.2e}:", method, error);
                dump_joints(&qs);
            }
            None => println!("{:?}: no solution", method),
        }
    }

    println!("\nOut of reach, no solutions: ");
    dump_solutions(&robot.inverse(&Position::new(3.0, 0.0)));

    #[cfg(feature = "allow_filesystem")]
    {
        // This requires YAML library
        let parameters = Parameters::long_shoulder();
        println!("\nParameters as YAML:\n{}", parameters.to_yaml());
    }
}
