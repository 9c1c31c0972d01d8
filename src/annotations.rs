use crate::kinematic_traits::Joints;
use crate::utils::format_joints;
use bitflags::bitflags;
use std::fmt;

bitflags! {
    /// Flags that can be set on AnnotatedJoints in the output
    #[derive(Clone, Copy, PartialEq, Eq)]
    pub struct PathFlags: u32 {
        const NONE = 0b0000_0000;

        /// Position directly matches one of the waypoints given in the input.
        const WAYPOINT =            0b0000_0001;

        /// Position is reached by moving every joint on its own velocity profile. The
        /// end effector does not follow any controlled Cartesian path.
        const JOINT_INTERP =        0b0000_0010;

        /// Position is an inverse kinematics solution for a point on the straight line
        /// between two Cartesian waypoints.
        const LIN_INTERP =          0b0000_0100;

        /// Joints held still because the segment has no length.
        const HOLD =                0b0000_1000;

        /// Special flag used in debugging to mark out anything of interest
        const DEBUG = 0b1000_0000_0000_0000;
    }
}

/// Annotated joints with the time the robot should reach them, seconds from the
/// start of the trajectory.
#[derive(Clone, PartialEq)]
pub struct AnnotatedJoints {
    pub joints: Joints,
    pub time: f64,
    pub flags: PathFlags,
}

impl AnnotatedJoints {
    pub fn new(joints: Joints, time: f64, flags: PathFlags) -> Self {
        AnnotatedJoints { joints, time, flags }
    }
}

fn flag_representation(flags: &PathFlags) -> String {
    const FLAG_MAP: &[(PathFlags, &str)] = &[
        (PathFlags::WAYPOINT, "WAYPOINT"),
        (PathFlags::JOINT_INTERP, "JOINT_INTERP"),
        (PathFlags::LIN_INTERP, "LIN_INTERP"),
        (PathFlags::HOLD, "HOLD"),
        (PathFlags::DEBUG, "DEBUG"),
    ];

    if flags.is_empty() {
        return "NONE".to_string();
    }
    FLAG_MAP
        .iter()
        .filter(|(flag, _)| flags.contains(*flag))
        .map(|(_, name)| *name)
        .collect::<Vec<_>>()
        .join(" | ")
}

impl fmt::Debug for PathFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", flag_representation(self))
    }
}

impl fmt::Debug for AnnotatedJoints {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            formatter,
            "{} @ {:.3}s: [{}]",
            flag_representation(&self.flags),
            self.time,
            format_joints(&self.joints).trim_start()
        )
    }
}
