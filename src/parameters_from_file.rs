//! Supports extracting planar arm parameters from YAML file (optional)

use std::path::Path;
use yaml_rust2::{Yaml, YamlLoader};

use crate::parameter_error::ParameterError;
use crate::parameters::planar_kinematics::Parameters;

const ROOT_KEY: &str = "planar_kinematics";

impl Parameters {
    /// Read the robot configuration from YAML file. YAML file like this is supported:
    /// ```yaml
    /// # Reference three link arm
    /// planar_kinematics:
    ///   link_lengths: [1.0, 1.0, 0.5]
    ///   jacobian_epsilon: 1.0e-6
    /// ```
    /// `jacobian_epsilon` is optional. Integer link lengths (`[1, 1, 2]`) are accepted.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, ParameterError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    /// Same as [Parameters::from_yaml_file] but parses the YAML text directly.
    pub fn from_yaml_str(contents: &str) -> Result<Self, ParameterError> {
        let docs = YamlLoader::load_from_str(contents)
            .map_err(|e| ParameterError::ParseError(e.to_string()))?;
        let doc = docs
            .first()
            .ok_or_else(|| ParameterError::ParseError("empty YAML document".to_string()))?;

        let section = &doc[ROOT_KEY];
        if section.is_badvalue() {
            return Err(ParameterError::MissingField(ROOT_KEY.to_string()));
        }

        let lengths = section["link_lengths"]
            .as_vec()
            .ok_or_else(|| ParameterError::MissingField("link_lengths".to_string()))?;
        let link_lengths = lengths
            .iter()
            .enumerate()
            .map(|(i, value)| {
                as_number(value).ok_or_else(|| {
                    ParameterError::ParseError(format!("link_lengths[{}] is not a number", i))
                })
            })
            .collect::<Result<Vec<f64>, ParameterError>>()?;

        let parameters = Parameters::new(link_lengths)?;
        match &section["jacobian_epsilon"] {
            Yaml::BadValue => Ok(parameters),
            value => {
                let epsilon = as_number(value).ok_or_else(|| {
                    ParameterError::ParseError("jacobian_epsilon is not a number".to_string())
                })?;
                parameters.with_jacobian_epsilon(epsilon)
            }
        }
    }
}

/// YAML makes a difference between 1 and 1.0, we do not.
fn as_number(value: &Yaml) -> Option<f64> {
    match value {
        Yaml::Integer(i) => Some(*i as f64),
        _ => value.as_f64(),
    }
}
