use std::fmt;

/// Errors that can occur while constructing or dispatching a middleware chain
#[derive(Debug, Clone, PartialEq)]
pub enum ChainError {
    /// The chain was assembled in a way that can never dispatch successfully
    InvalidConstruction {
        message: String,
    },

    /// A named component has no entry in the backing registry
    ResolutionFailure {
        name: String,
    },

    /// A resolved unit does not fit any calling convention the chain accepts
    UnsupportedUnitShape {
        unit: String,
        convention: String,
    },

    /// A unit returned a value that is not a well-formed response
    UnexpectedResult {
        value: String,
        unit: String,
    },

    /// The chain ran past its last unit without any unit producing a response
    UnresolvedChain,

    /// Generic error for custom error messages
    Custom {
        message: String,
    },
}

impl ChainError {
    /// Create an InvalidConstruction error
    pub fn invalid_construction(message: impl Into<String>) -> Self {
        Self::InvalidConstruction {
            message: message.into(),
        }
    }

    /// Create a ResolutionFailure error
    pub fn resolution_failure(name: impl Into<String>) -> Self {
        Self::ResolutionFailure { name: name.into() }
    }

    /// Create an UnsupportedUnitShape error
    pub fn unsupported_unit(unit: impl Into<String>, convention: impl Into<String>) -> Self {
        Self::UnsupportedUnitShape {
            unit: unit.into(),
            convention: convention.into(),
        }
    }

    /// Create an UnexpectedResult error
    pub fn unexpected_result(value: impl Into<String>, unit: impl Into<String>) -> Self {
        Self::UnexpectedResult {
            value: value.into(),
            unit: unit.into(),
        }
    }

    /// Create a Custom error
    pub fn custom(message: impl Into<String>) -> Self {
        Self::Custom {
            message: message.into(),
        }
    }
}

impl fmt::Display for ChainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainError::InvalidConstruction { message } => {
                write!(f, "Invalid chain construction: {}", message)
            }
            ChainError::ResolutionFailure { name } => {
                write!(f, "Unable to resolve middleware component name: {}", name)
            }
            ChainError::UnsupportedUnitShape { unit, convention } => {
                write!(
                    f,
                    "Unsupported middleware type: {} (in {} chain)",
                    unit, convention
                )
            }
            ChainError::UnexpectedResult { value, unit } => {
                write!(
                    f,
                    "Unexpected middleware result: {} returned by: {}",
                    value, unit
                )
            }
            ChainError::UnresolvedChain => {
                write!(
                    f,
                    "Unresolved request: middleware stack exhausted with no result"
                )
            }
            ChainError::Custom { message } => {
                write!(f, "{}", message)
            }
        }
    }
}

impl std::error::Error for ChainError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_construction() {
        let err = ChainError::invalid_construction("an empty middleware stack was given");
        assert_eq!(
            err.to_string(),
            "Invalid chain construction: an empty middleware stack was given"
        );
    }

    #[test]
    fn test_resolution_failure() {
        let err = ChainError::resolution_failure("auth");
        assert_eq!(
            err.to_string(),
            "Unable to resolve middleware component name: auth"
        );
    }

    #[test]
    fn test_unsupported_unit_shape() {
        let err = ChainError::unsupported_unit("accumulator function", "request-response");
        assert_eq!(
            err.to_string(),
            "Unsupported middleware type: accumulator function (in request-response chain)"
        );
    }

    #[test]
    fn test_unexpected_result() {
        let err = ChainError::unexpected_result("number (123)", "handler function");
        assert_eq!(
            err.to_string(),
            "Unexpected middleware result: number (123) returned by: handler function"
        );
    }

    #[test]
    fn test_unresolved_chain() {
        let err = ChainError::UnresolvedChain;
        assert_eq!(
            err.to_string(),
            "Unresolved request: middleware stack exhausted with no result"
        );
    }
}
