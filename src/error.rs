//! Error types for lazy-settings.

use std::fmt;

/// Result type alias for lazy-settings operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur when loading, writing or deleting settings.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A source was used without being enabled. The message carries the fix.
    #[error("{0}")]
    NotConfigured(String),

    /// A required argument was missing or empty.
    #[error("{0}")]
    MissingArgument(&'static str),

    /// The source does not implement the requested operation.
    #[error("Source '{source_name}' does not support {operation}")]
    Unsupported {
        /// Name of the source
        source_name: String,
        /// The rejected operation (`write`, `delete`, ...)
        operation: &'static str,
    },

    /// Failed to load configuration from a source.
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    /// Failed to deserialize configuration.
    #[error("Failed to deserialize configuration: {0}")]
    DeserializationError(String),

    /// Failed to serialize a value for storage.
    #[error("Failed to serialize configuration: {0}")]
    SerializationError(String),

    /// Configuration validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),

    /// IO error occurred.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// A key/value store backend failed.
    #[error("Store error: {0}")]
    Store(String),

    #[cfg(feature = "redis")]
    /// The Redis client failed (connection, protocol or command error).
    #[error(transparent)]
    Redis(#[from] redis::RedisError),

    /// Generic error for other cases.
    #[error("Configuration error: {0}")]
    Other(String),
}

impl ConfigError {
    /// Create an [`ConfigError::Unsupported`] error for a source.
    pub fn unsupported(source_name: impl Into<String>, operation: &'static str) -> Self {
        Self::Unsupported {
            source_name: source_name.into(),
            operation,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_data() || err.is_syntax() || err.is_eof() {
            ConfigError::DeserializationError(err.to_string())
        } else {
            ConfigError::SerializationError(err.to_string())
        }
    }
}

/// Validation error for configuration validation.
#[derive(Debug)]
pub enum ValidationError {
    /// Custom validation error with a message.
    Custom(String),

    /// A required setting is absent.
    Missing(String),

    /// A specific field has an invalid value.
    InvalidField {
        /// The field name/path
        field: String,
        /// The reason why it's invalid
        reason: String,
    },

    /// Several validators failed during one load.
    Multiple(Vec<ValidationError>),
}

impl ValidationError {
    /// Create a custom validation error.
    pub fn custom(msg: impl Into<String>) -> Self {
        Self::Custom(msg.into())
    }

    /// Create a missing-setting error.
    pub fn missing(key: impl Into<String>) -> Self {
        Self::Missing(key.into())
    }

    /// Create an invalid field error.
    pub fn invalid_field(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Custom(msg) => write!(f, "{}", msg),
            Self::Missing(key) => write!(f, "Setting '{}' is required", key),
            Self::InvalidField { field, reason } => {
                write!(f, "Field '{}' is invalid: {}", field, reason)
            }
            Self::Multiple(errors) => {
                writeln!(f, "Multiple validation errors:")?;
                for (i, err) in errors.iter().enumerate() {
                    writeln!(f, "  {}. {}", i + 1, err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ValidationError {}

impl From<ValidationError> for ConfigError {
    fn from(err: ValidationError) -> Self {
        ConfigError::ValidationError(err.to_string())
    }
}
