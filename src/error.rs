//! Error handling for critbit-map
//!
//! Lookups and mutations report absence through `Option`/`bool`; the error
//! type here covers configuration, arena capacity and structural validation.

use thiserror::Error;

/// Main error type for the crate
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CritBitError {
    /// Invalid configuration parameter
    #[error("Invalid configuration: {message}")]
    Configuration {
        /// Configuration error message
        message: String,
    },

    /// The node arena cannot address any more slots
    #[error("Capacity exceeded: requested {requested} node slots")]
    CapacityExceeded {
        /// Number of slots the operation needed
        requested: usize,
    },

    /// A structural invariant of the trie does not hold
    #[error("Invariant violation: {message}")]
    InvariantViolation {
        /// Description of the broken invariant
        message: String,
    },
}

impl CritBitError {
    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a capacity error
    pub fn capacity_exceeded(requested: usize) -> Self {
        Self::CapacityExceeded { requested }
    }

    /// Create an invariant violation error
    pub fn invariant<S: Into<String>>(message: S) -> Self {
        Self::InvariantViolation {
            message: message.into(),
        }
    }

    /// Get the error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            Self::Configuration { .. } => "config",
            Self::CapacityExceeded { .. } => "capacity",
            Self::InvariantViolation { .. } => "invariant",
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, CritBitError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categories() {
        assert_eq!(CritBitError::configuration("x").category(), "config");
        assert_eq!(CritBitError::capacity_exceeded(3).category(), "capacity");
        assert_eq!(CritBitError::invariant("x").category(), "invariant");
    }

    #[test]
    fn test_error_display() {
        let err = CritBitError::configuration("threshold out of range");
        let display = format!("{}", err);
        assert!(display.contains("Invalid configuration"));
        assert!(display.contains("threshold out of range"));

        let err = CritBitError::capacity_exceeded(42);
        assert!(format!("{}", err).contains("42"));

        let err = CritBitError::invariant("crit bits out of order");
        assert!(format!("{}", err).starts_with("Invariant violation"));
    }
}
