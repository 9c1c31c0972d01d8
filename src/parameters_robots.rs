//! Hardcoded link lengths for a few planar arms

pub mod planar_kinematics {
    use crate::parameter_error::ParameterError;
    use crate::parameters::planar_kinematics::Parameters;

    impl Parameters {
        /// The reference three link arm, links 1.0, 1.0 and 0.5.
        pub fn three_link() -> Self {
            Self::trusted(vec![1.0, 1.0, 0.5])
        }

        /// Two link arm, both links 1.0. Analytical IK treats it as a three link
        /// arm with a zero length wrist.
        pub fn two_link() -> Self {
            Self::trusted(vec![1.0, 1.0])
        }

        /// Three link arm with a long upper arm. It has a hole in the workspace: targets
        /// closer than 0.5 to the base cannot be reached.
        pub fn long_shoulder() -> Self {
            Self::trusted(vec![2.0, 1.0, 0.5])
        }

        /// Build parameters from a list of lengths in millimeters, as they are often
        /// given in datasheets.
        pub fn from_millimeters(lengths_mm: &[f64]) -> Result<Self, ParameterError> {
            Parameters::new(lengths_mm.iter().map(|l| l / 1000.0).collect())
        }

        // Presets are known to be valid, construction cannot fail.
        fn trusted(link_lengths: Vec<f64>) -> Self {
            Parameters::new(link_lengths)
                .unwrap_or_else(|_| unreachable!("hardcoded link lengths are positive"))
        }
    }

    impl Default for Parameters {
        /// Link lengths [1.0, 1.0, 0.5], Jacobian epsilon 1e-6.
        fn default() -> Self {
            Self::three_link()
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::parameters::planar_kinematics::DEFAULT_JACOBIAN_EPSILON;

        #[test]
        fn test_presets() {
            let parameters = Parameters::default();
            assert_eq!(parameters.link_lengths(), &[1.0, 1.0, 0.5]);
            assert_eq!(parameters.jacobian_epsilon(), DEFAULT_JACOBIAN_EPSILON);
            assert_eq!(Parameters::two_link().dof(), 2);
            assert!((Parameters::long_shoulder().min_reach() - 0.5).abs() < 1e-12);
        }

        #[test]
        fn test_from_millimeters() {
            let parameters = Parameters::from_millimeters(&[350.0, 300.0, 80.0]).unwrap();
            assert!((parameters.max_reach() - 0.73).abs() < 1e-12);
            assert!(Parameters::from_millimeters(&[350.0, 0.0]).is_err());
        }
    }
}
