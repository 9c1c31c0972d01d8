//! Error handling for robot parameters and their YAML loader

use std::io;

/// Unified error to report invalid robot geometry, both when constructed in code and
/// when read from a YAML file.
#[derive(Debug)]
pub enum ParameterError {
    IoError(io::Error),
    ParseError(String),
    MissingField(String),
    NoLinks,
    InvalidLinkLength { index: usize, value: f64 },
    InvalidEpsilon(f64),
}

impl std::fmt::Display for ParameterError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match *self {
            ParameterError::IoError(ref err) =>
                write!(f, "IO Error: {}", err),
            ParameterError::ParseError(ref msg) =>
                write!(f, "Parse Error: {}", msg),
            ParameterError::MissingField(ref field) =>
                write!(f, "Missing Field: {}", field),
            ParameterError::NoLinks =>
                write!(f, "Robot must have at least one link"),
            ParameterError::InvalidLinkLength { index, value } =>
                write!(f, "Invalid Link Length: link {} has length {}, must be finite and positive", index, value),
            ParameterError::InvalidEpsilon(value) =>
                write!(f, "Invalid Jacobian epsilon: {}, must be finite and positive", value),
        }
    }
}

impl std::error::Error for ParameterError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ParameterError::IoError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for ParameterError {
    fn from(err: io::Error) -> Self {
        ParameterError::IoError(err)
    }
}
