extern crate nalgebra as na;
use na::{Cholesky, DMatrix, DVector, Matrix2, Vector2, Vector3};
use crate::kinematic_traits::{Joints, Kinematics};

/// Row of the planar rotation (about z) in the 6 x N Jacobian.
pub const ROTATION_ROW: usize = 5;

/// Threshold on the determinant of the leading 2x2 position block below which
/// the configuration is reported singular.
pub const SINGULARITY_THRESHOLD: f64 = 1e-6;

/// Finite difference Jacobian of a planar arm at one configuration.
pub struct Jacobian {
    /// A 6xN matrix representing the Jacobian, N being the number of joints.
    ///
    /// The Jacobian matrix maps the joint velocities to the end-effector velocities.
    /// Each column corresponds to a joint, and each row corresponds to a degree of freedom
    /// of the end-effector (linear and angular velocities). For a planar arm only the
    /// x and y rows (0, 1) and the rotation about z (row 5) can be non zero.
    matrix: DMatrix<f64>,

    /// The disturbance value used for computing the Jacobian
    epsilon: f64,
}

impl Jacobian {
    /// Differentiates the forward kinematics of `robot` at `qs`, perturbing one joint
    /// at a time by `epsilon` radians.
    pub fn new(robot: &impl Kinematics, qs: &[f64], epsilon: f64) -> Self {
        let matrix = compute_jacobian(robot, qs, epsilon);
        Self { matrix, epsilon }
    }

    /// The full 6xN matrix.
    pub fn matrix(&self) -> &DMatrix<f64> {
        &self.matrix
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// The 2xN block mapping joint rates to the planar end effector velocity.
    pub fn position_jacobian(&self) -> DMatrix<f64> {
        self.matrix.rows(0, 2).into_owned()
    }

    /// Determinant of the leading 2x2 block (position versus the first two joints).
    /// `None` if the robot has fewer than two joints.
    pub fn position_determinant(&self) -> Option<f64> {
        if self.matrix.ncols() < 2 {
            return None;
        }
        let block: Matrix2<f64> = self.matrix.fixed_view::<2, 2>(0, 0).into_owned();
        Some(block.determinant())
    }

    /// Heuristic singularity test: the determinant of the leading 2x2 position block is
    /// below [SINGULARITY_THRESHOLD] in magnitude. This is not a rank test of the whole
    /// matrix: it flags the stretched and folded elbow, and can miss configurations where
    /// only later joints lose their lever arm. A single joint robot is always singular.
    pub fn is_singular(&self) -> bool {
        match self.position_determinant() {
            Some(det) => det.abs() < SINGULARITY_THRESHOLD,
            None => true,
        }
    }

    /// Computes the joint velocities required to achieve a desired planar end-effector
    /// velocity (x, y). Uses the damped pseudo-inverse so the result stays bounded near
    /// singular configurations. Returns `None` only if the matrix contains non finite values.
    pub fn velocities(&self, desired_velocity: &Vector2<f64>, damping: f64) -> Option<Joints> {
        let pseudo_inverse = damped_pseudo_inverse(&self.position_jacobian(), damping)?;
        let rates = pseudo_inverse * DVector::from_column_slice(desired_velocity.as_slice());
        Some(rates.as_slice().to_vec())
    }

    /// Same as [Jacobian::velocities] but also asks for the angular velocity of the last
    /// link, given as (vx, vy, omega).
    pub fn velocities_with_rotation(&self, desired_velocity: &Vector3<f64>, damping: f64) -> Option<Joints> {
        let planar = self.planar_rows();
        let pseudo_inverse = damped_pseudo_inverse(&planar, damping)?;
        let rates = pseudo_inverse * DVector::from_column_slice(desired_velocity.as_slice());
        Some(rates.as_slice().to_vec())
    }

    /// Computes the joint torques required to achieve a desired end-effector force/torque
    ///
    /// # Arguments
    ///
    /// * `force_torque` - planar force (fx, fy) and the torque about z at the end effector.
    ///
    /// # Returns
    ///
    /// Joint values representing joint torques.
    pub fn torques(&self, force_torque: &Vector3<f64>) -> Joints {
        let joint_torques = self.planar_rows().transpose()
            * DVector::from_column_slice(force_torque.as_slice());
        joint_torques.as_slice().to_vec()
    }

    /// Rows x, y, rotation about z.
    fn planar_rows(&self) -> DMatrix<f64> {
        DMatrix::from_fn(3, self.matrix.ncols(), |r, c| {
            let row = if r < 2 { r } else { ROTATION_ROW };
            self.matrix[(row, c)]
        })
    }
}

/// 6xN Jacobian by forward differences: column i is (FK(q + ε·eᵢ) − FK(q)) / ε.
/// Rows 2 to 4 (z, rotations about x and y) stay zero for a planar arm.
pub fn compute_jacobian(robot: &impl Kinematics, joints: &[f64], epsilon: f64) -> DMatrix<f64> {
    let mut jacobian = DMatrix::zeros(6, joints.len());
    let current_pose = robot.forward(joints);
    let current_position = current_pose.translation.vector;
    let current_orientation = current_pose.rotation;

    for i in 0..joints.len() {
        let mut perturbed_qs = joints.to_vec();
        perturbed_qs[i] += epsilon;
        let perturbed_pose = robot.forward(&perturbed_qs);

        let delta_position = (perturbed_pose.translation.vector - current_position) / epsilon;
        let delta_orientation = (perturbed_pose.rotation * current_orientation.inverse()).angle() / epsilon;

        jacobian[(0, i)] = delta_position.x;
        jacobian[(1, i)] = delta_position.y;
        jacobian[(ROTATION_ROW, i)] = delta_orientation;
    }

    jacobian
}

/// Damped least squares pseudo-inverse `(JᵀJ + λI)⁻¹ Jᵀ`. For any positive damping the
/// matrix being inverted is positive definite, so this stays defined at singularities.
/// Returns `None` if the decomposition fails (non finite input or non positive damping
/// on a rank deficient matrix).
pub fn damped_pseudo_inverse(j: &DMatrix<f64>, damping: f64) -> Option<DMatrix<f64>> {
    let jt = j.transpose();
    let n = j.ncols();
    let normal = &jt * j + DMatrix::<f64>::identity(n, n) * damping;
    let cholesky = Cholesky::new(normal)?;
    Some(cholesky.solve(&jt))
}
