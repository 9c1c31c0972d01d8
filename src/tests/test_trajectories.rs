use anyhow::Result;

use crate::annotations::PathFlags;
use crate::kinematic_traits::{IkMethod, Kinematics, Position};
use crate::kinematics_impl::PlanarKinematics;
use crate::parameters::planar_kinematics::Parameters;
use crate::path_planner::{PathPlanner, Playback, Synchronization};
use crate::session::{Session, SessionState};
use crate::tests::test_utils::ensure_reaches;
use crate::utils::joint_distance;

#[test]
fn test_square_in_operational_space() -> Result<()> {
    let robot = PlanarKinematics::new(Parameters::three_link());
    let square = vec![
        Position::new(1.0, 0.5),
        Position::new(1.5, 0.5),
        Position::new(1.5, 1.0),
        Position::new(1.0, 1.0),
    ];
    let initial = robot.inverse(&square[0]).into_iter().next();
    let trajectory = PathPlanner::new(&robot)
        .with_ik_method(IkMethod::Analytical)
        .interpolate_operational_space(&square, 31, initial.as_deref())?;

    // 31 samples, two shared between segments
    assert_eq!(trajectory.len(), 29);

    let waypoint_steps: Vec<_> = trajectory
        .iter()
        .filter(|step| step.flags.contains(PathFlags::WAYPOINT))
        .collect();
    assert_eq!(waypoint_steps.len(), 4);
    for (step, corner) in waypoint_steps.iter().zip(square.iter()) {
        ensure_reaches(&robot, &step.joints, corner, 1e-6)?;
    }

    // Seeded with the previous sample, the arm never jumps between branches
    for pair in trajectory.steps().windows(2) {
        assert!(joint_distance(&pair[0].joints, &pair[1].joints) < 0.5);
        assert!(pair[1].time >= pair[0].time);
    }
    Ok(())
}

#[test]
fn test_joint_space_then_forward() -> Result<()> {
    let robot = PlanarKinematics::new(Parameters::three_link());
    let a = robot.inverse(&Position::new(2.0, 0.5)).remove(0);
    let b = robot.inverse(&Position::new(0.5, 1.5)).remove(0);
    let trajectory = PathPlanner::new(&robot)
        .with_limits(2.0, 4.0)
        .with_synchronization(Synchronization::Synchronized)
        .interpolate_joint_space(&[a, b], 25)?;

    assert_eq!(trajectory.len(), 25);
    let end = trajectory.last().map(|step| step.joints.clone()).unwrap_or_default();
    ensure_reaches(&robot, &end, &Position::new(0.5, 1.5), 1e-9)?;
    assert!(trajectory.iter().skip(1).take(23).all(|step| step.flags == PathFlags::JOINT_INTERP));
    Ok(())
}

#[test]
fn test_faster_limits_take_less_time() -> Result<()> {
    let waypoints = vec![vec![0.0, 0.0, 0.0], vec![1.5, -1.0, 0.5]];
    let slow = PathPlanner::default().interpolate_joint_space(&waypoints, 10)?;
    let fast = PathPlanner::default()
        .with_limits(3.0, 3.0)
        .interpolate_joint_space(&waypoints, 10)?;
    assert!(fast.duration() < slow.duration());
    assert_eq!(fast.last().map(|s| &s.joints), Some(&waypoints[1]));
    Ok(())
}

#[test]
fn test_session_replays_targets() -> Result<()> {
    let mut session = Session::new(PlanarKinematics::new(Parameters::three_link()));
    for (x, y) in [(1.5, 0.5), (1.0, 1.0), (0.5, 1.5)] {
        assert!(session.select_target(Position::new(x, y)));
    }
    let planner = PathPlanner::default().with_ik_method(IkMethod::Analytical);
    assert!(session.play(&planner, 20)?);
    assert_eq!(session.state(), SessionState::Animating);
    assert_eq!(session.frame_count(), 19);

    let robot = PlanarKinematics::new(Parameters::three_link());
    let mut last = Vec::new();
    for _ in 0..session.frame_count() {
        last = session.next_frame().cloned().unwrap_or_default();
    }
    ensure_reaches(&robot, &last, &Position::new(0.5, 1.5), 1e-6)?;
    Ok(())
}

#[test]
fn test_session_falls_back_to_waypoints() -> Result<()> {
    let mut session = Session::new(PlanarKinematics::new(Parameters::three_link()));
    assert!(session.select_target(Position::new(1.0, 0.0)));
    assert!(!session.select_target(Position::new(3.0, 0.0)));
    assert!(session.play(&PathPlanner::default(), 10)?);

    // Only the two raw targets are replayed
    assert_eq!(session.frame_count(), 2);
    let first = session.next_frame().cloned().unwrap_or_default();
    ensure_reaches(session.robot(), &first, &Position::new(1.0, 0.0), 1e-6)?;
    // The unreachable one leaves the arm where it was
    assert_eq!(session.next_frame().cloned(), Some(first));
    Ok(())
}

#[test]
fn test_playback_variants() -> Result<()> {
    let robot = PlanarKinematics::new(Parameters::three_link());
    let planner = PathPlanner::new(&robot).with_ik_method(IkMethod::Jacobian);
    let reachable = [Position::new(1.5, 0.0), Position::new(1.0, 1.0)];
    let seed = robot.inverse(&reachable[0]).into_iter().next();
    assert!(matches!(
        planner.interpolate_operational_space_or_waypoints(&reachable, 8, seed.as_deref())?,
        Playback::Joints(_)
    ));
    let unreachable = [Position::new(1.5, 0.0), Position::new(5.0, 0.0)];
    assert!(matches!(
        planner.interpolate_operational_space_or_waypoints(&unreachable, 8, seed.as_deref())?,
        Playback::Waypoints(points) if points.len() == 2
    ));
    Ok(())
}
