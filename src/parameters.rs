//! Defines the planar arm parameter data structure

pub mod planar_kinematics {
    use crate::parameter_error::ParameterError;

    /// Default disturbance used for the finite difference Jacobian.
    pub const DEFAULT_JACOBIAN_EPSILON: f64 = 1e-6;

    /// Parameters for the kinematic model of a planar serial arm. All joints are revolute,
    /// rotate about the axis normal to the plane and sit at the start of their link.
    /// See [parameters_robots.rs](parameters_robots.rs) for ready made models.
    ///
    /// The structure is immutable after construction: link lengths are validated once
    /// and cannot be changed later, so a model can be shared freely between callers.
    #[derive(Debug, Clone, PartialEq)]
    pub struct Parameters {
        /// Link lengths, from the base to the end effector. Each link is driven by the
        /// joint at its start, so the joint count equals the link count.
        link_lengths: Vec<f64>,

        /// Disturbance used when computing the Jacobian by finite differences. Smaller
        /// values reduce truncation error but increase round-off error.
        jacobian_epsilon: f64,
    }

    impl Parameters {
        /// Creates parameters for the given link lengths. At least one link is required
        /// and all lengths must be finite and positive.
        pub fn new(link_lengths: Vec<f64>) -> Result<Self, ParameterError> {
            if link_lengths.is_empty() {
                return Err(ParameterError::NoLinks);
            }
            for (index, &value) in link_lengths.iter().enumerate() {
                if !value.is_finite() || value <= 0.0 {
                    return Err(ParameterError::InvalidLinkLength { index, value });
                }
            }
            Ok(Parameters {
                link_lengths,
                jacobian_epsilon: DEFAULT_JACOBIAN_EPSILON,
            })
        }

        /// Returns a copy with a different finite difference step for the Jacobian.
        pub fn with_jacobian_epsilon(self, epsilon: f64) -> Result<Self, ParameterError> {
            if !epsilon.is_finite() || epsilon <= 0.0 {
                return Err(ParameterError::InvalidEpsilon(epsilon));
            }
            Ok(Parameters {
                jacobian_epsilon: epsilon,
                ..self
            })
        }

        pub fn link_lengths(&self) -> &[f64] {
            &self.link_lengths
        }

        pub fn jacobian_epsilon(&self) -> f64 {
            self.jacobian_epsilon
        }

        /// Degrees of freedom (number of joints).
        pub fn dof(&self) -> usize {
            self.link_lengths.len()
        }

        /// Radius of the outer workspace boundary (arm fully stretched).
        pub fn max_reach(&self) -> f64 {
            self.link_lengths.iter().sum()
        }

        /// Radius of the inner workspace boundary. It is only positive if one link is
        /// longer than all others together.
        pub fn min_reach(&self) -> f64 {
            let longest = self.link_lengths.iter().cloned().fold(0.0, f64::max);
            (2.0 * longest - self.max_reach()).max(0.0)
        }

        /// Convert to string yaml representation (quick viewing, etc).
        pub fn to_yaml(&self) -> String {
            format!(
                "planar_kinematics:\n  \
              link_lengths: [{}]\n  \
              jacobian_epsilon: {:e}\n",
                self.link_lengths.iter().map(|x| x.to_string())
                    .collect::<Vec<_>>().join(", "),
                self.jacobian_epsilon
            )
        }
    }

}
