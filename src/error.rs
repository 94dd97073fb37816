use std::{error, fmt};

// -------------------------------------------------------------------------------------------------

/// Provides an enumeration of all possible errors reported by paramkit.
///
/// Most parameter operations never fail: invalid input is clamped or ignored. Errors are only
/// reported by persistence helpers, which need to tell callers why a stored value got rejected.
#[derive(Debug, Clone, PartialEq)]
#[allow(clippy::enum_variant_names)]
pub enum Error {
    ParameterNotFound(String),
    InvalidValue(String),
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
    ParseError(String),
    JsonError(String),
}

impl error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ParameterNotFound(name) => write!(f, "Parameter '{name}' not found"),
            Self::InvalidValue(str) => write!(f, "Invalid parameter value: {str}"),
            Self::TypeMismatch { expected, found } => {
                write!(f, "Invalid value type: expected {expected}, got {found}")
            }
            Self::ParseError(str) => write!(f, "Failed to parse '{str}'"),
            Self::JsonError(str) => write!(f, "Invalid JSON: {str}"),
        }
    }
}

#[cfg(feature = "json")]
impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::JsonError(err.to_string())
    }
}

impl From<std::num::ParseIntError> for Error {
    fn from(err: std::num::ParseIntError) -> Self {
        Error::ParseError(err.to_string())
    }
}

impl From<std::num::ParseFloatError> for Error {
    fn from(err: std::num::ParseFloatError) -> Self {
        Error::ParseError(err.to_string())
    }
}
