//! Error types shared across Lumen crates.

use thiserror::Error;

/// Configuration errors.
///
/// These are raised when tunables are loaded or validated at startup. The
/// simulation itself never fails per tick; rejected requests are no-ops.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read a configuration file
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse a configuration document
    #[error("failed to parse config: {0}")]
    Parse(String),

    /// A configuration value is out of range
    #[error("invalid config value `{field}`: {reason}")]
    Invalid {
        /// Dotted path of the offending field
        field: String,
        /// Why the value was rejected
        reason: String,
    },
}

impl ConfigError {
    /// Builds an [`ConfigError::Invalid`] error.
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_message() {
        let err = ConfigError::invalid("light.timing.active", "must be positive, got 0");
        assert_eq!(
            err.to_string(),
            "invalid config value `light.timing.active`: must be positive, got 0"
        );
    }
}
