use planar_arm_kinematics::kinematic_traits::{IkMethod, Kinematics, Position};
use planar_arm_kinematics::kinematics_impl::PlanarKinematics;
use planar_arm_kinematics::parameters::planar_kinematics::Parameters;
use planar_arm_kinematics::path_planner::{PathPlanner, Playback, Synchronization};
use planar_arm_kinematics::session::Session;
use planar_arm_kinematics::trapezoid::TrapezoidalProfile;
use planar_arm_kinematics::utils::as_radians;
use std::time::Instant;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Set RUST_LOG=debug to see the planner at work
    tracing_subscriber::fmt::init();

    let robot = PlanarKinematics::new(Parameters::three_link());

    let profile = TrapezoidalProfile::new(2.0, 1.0, 2.0)?;
    println!(
        "Trapezoid over 2.0: accelerate {:.2} s, cruise {:.2} s, total {:.2} s",
        profile.t_accel(),
        profile.t_cruise(),
        profile.total_time()
    );

    let waypoints = vec![as_radians(&[0, 0, 0]), as_radians(&[90, -45, 30]), as_radians(&[45, 60, -90])];
    let planner = PathPlanner::new(&robot)
        .with_limits(1.5, 3.0)
        .with_synchronization(Synchronization::Synchronized);
    let started = Instant::now();
    let trajectory = planner.interpolate_joint_space(&waypoints, 30)?;
    println!(
        "\nJoint space: {} steps, {:.2} s, planned in {:?}",
        trajectory.len(),
        trajectory.duration(),
        started.elapsed()
    );
    for step in trajectory.iter() {
        println!("{:?}", step);
    }

    let square = vec![
        Position::new(1.0, 0.5),
        Position::new(1.5, 0.5),
        Position::new(1.5, 1.0),
        Position::new(1.0, 1.0),
    ];
    let initial = robot.inverse(&square[0]).into_iter().next();
    let planner = PathPlanner::new(&robot).with_ik_method(IkMethod::Analytical);
    let started = Instant::now();
    match planner.interpolate_operational_space_or_waypoints(&square, 40, initial.as_deref())? {
        Playback::Joints(trajectory) => {
            println!("\nOperational space: {} steps, planned in {:?}", trajectory.len(), started.elapsed());
            for step in trajectory.iter() {
                let p = robot.end_effector_position(&step.joints);
                println!("{:?} at ({:.3}, {:.3})", step, p.x, p.y);
            }
        }
        Playback::Waypoints(points) => println!("IK failed, only the {} waypoints remain", points.len()),
    }

    // The same as an interactive front end would do it
    let mut session = Session::new(robot.clone());
    for target in &square {
        session.select_target(*target);
    }
    if session.play(&PathPlanner::default(), 20)? {
        println!("\nSession replay, {} frames:", session.frame_count());
        for _ in 0..session.frame_count() {
            if let Some(joints) = session.next_frame() {
                println!("{:?}", joints);
            }
        }
        session.stop();
    }
    Ok(())
}
