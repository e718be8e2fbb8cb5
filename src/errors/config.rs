// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt;
use std::path::PathBuf;

/// Problems found while validating a loaded configuration
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// A required text value is empty
    EmptyValue {
        /// Dotted path of the field, e.g. `server.model_path`
        field: &'static str,
    },
    /// A version string is not `digits(.digits)*`
    MalformedVersion {
        field: &'static str,
        value: String,
    },
    /// A numeric value falls outside its accepted range
    OutOfRange {
        field: &'static str,
        value: String,
        expected: &'static str,
    },
    /// The wheel index template has no `{toolkit}` placeholder
    MissingToolkitPlaceholder {
        template: String,
    },
    /// The server log level is not one the server understands
    UnknownLogLevel {
        level: String,
    },
    /// An extra server flag is unusable or shadows a dedicated field
    InvalidExtraFlag {
        flag: String,
        reason: &'static str,
    },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyValue { field } => {
                write!(f, "Field '{}' must not be empty", field)
            }
            ValidationError::MalformedVersion { field, value } => {
                write!(
                    f,
                    "Field '{}' has malformed version '{}' (expected e.g. 3.10)",
                    field, value
                )
            }
            ValidationError::OutOfRange {
                field,
                value,
                expected,
            } => {
                write!(
                    f,
                    "Field '{}' has value {} which is out of range (expected {})",
                    field, value, expected
                )
            }
            ValidationError::MissingToolkitPlaceholder { template } => {
                write!(
                    f,
                    "Index URL template '{}' does not contain '{{toolkit}}'",
                    template
                )
            }
            ValidationError::UnknownLogLevel { level } => {
                write!(f, "Unknown server log level '{}'", level)
            }
            ValidationError::InvalidExtraFlag { flag, reason } => {
                write!(f, "Extra server flag '{}' is invalid: {}", flag, reason)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Errors raised while loading a configuration file
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read configuration file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("configuration validation failed:\n{}", join_lines(.0))]
    Invalid(Vec<ValidationError>),
}

fn join_lines(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| format!("  - {}", e))
        .collect::<Vec<_>>()
        .join("\n")
}
