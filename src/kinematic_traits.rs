extern crate nalgebra as na;

use na::{Isometry2, Point2};

/// Joint angles in radians, one per link, ordered from the base. Planar arms may have
/// any number of links, so this is a vector rather than a fixed array.
pub type Joints = Vec<f64>;

/// Cartesian position of the end effector (or of any joint) in the plane of the arm.
/// The z coordinate of this planar model is always zero and is not stored.
pub type Position = Point2<f64>;

/// Pose of the end effector: translation is the Cartesian position, rotation is the
/// cumulative joint angle (the direction the last link points to).
/// ```
/// extern crate nalgebra as na;
/// use na::{Isometry2, Vector2};
///
/// type Pose = Isometry2<f64>;
///
/// // Tip at (1, 2), last link pointing along +y
/// let pose = Pose::new(Vector2::new(1.0, 2.0), std::f64::consts::FRAC_PI_2);
/// ```
pub type Pose = Isometry2<f64>;

/// Inverse kinematics may return several solutions (elbow branches).
/// An empty vector means the target has no solution.
pub type Solutions = Vec<Joints>;

/// Branch of the closed form inverse kinematics. Most reachable targets have two
/// solutions that mirror the elbow over the line from the shoulder to the wrist.
/// A complete solution set requires querying both branches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ElbowBranch {
    /// Positive elbow angle (`theta2 = +acos(...)`)
    #[default]
    Up,
    /// Negative elbow angle (`theta2 = -acos(...)`)
    Down,
}

impl ElbowBranch {
    /// Both branches, elbow up first.
    pub const ALL: [ElbowBranch; 2] = [ElbowBranch::Up, ElbowBranch::Down];

    pub fn opposite(self) -> Self {
        match self {
            ElbowBranch::Up => ElbowBranch::Down,
            ElbowBranch::Down => ElbowBranch::Up,
        }
    }

    /// Sign applied to the elbow angle.
    pub(crate) fn sign(self) -> f64 {
        match self {
            ElbowBranch::Up => 1.0,
            ElbowBranch::Down => -1.0,
        }
    }
}

/// Selects one of the interchangeable inverse kinematics strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IkMethod {
    /// Closed form (geometric) solution, the branch closest to the seed is taken.
    Analytical,
    /// Bounded quasi-Newton minimisation of the position error.
    #[default]
    Numerical,
    /// Iterative damped Jacobian pseudo-inverse.
    Jacobian,
}

impl IkMethod {
    /// The method an interactive user gets after pressing "switch"
    pub fn next(self) -> Self {
        match self {
            IkMethod::Analytical => IkMethod::Numerical,
            IkMethod::Numerical => IkMethod::Jacobian,
            IkMethod::Jacobian => IkMethod::Analytical,
        }
    }
}

pub trait Kinematics {
    /// Number of joints (equal to the number of links).
    fn dof(&self) -> usize;

    /// Find all closed form solutions that put the end effector at the given position.
    /// If the target is not reachable, the returned vector is empty.
    fn inverse(&self, target: &Position) -> Solutions;

    /// Find solutions for the given target, sorted by proximity to the previous joint
    /// positions (closest first). Use this when following a trajectory to avoid the robot
    /// jumping between elbow branches.
    fn inverse_continuing(&self, target: &Position, previous: &[f64]) -> Solutions;

    /// Find the end effector pose for the given joint angles. `qs` must hold exactly
    /// `dof()` values; other lengths are a caller error and panic in debug builds.
    fn forward(&self, qs: &[f64]) -> Pose;
}
