// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Configuration validation.
//!
//! Validation runs after CLI overrides are applied and before any stage
//! executes, so a bad value never leaves the machine half-provisioned.
//! Every rule is checked and all problems are returned together.
//!
//! # Rules
//!
//! * Names and paths the workflow substitutes into commands are non-empty
//! * Interpreter and toolkit versions look like `3.10` / `12.1`
//! * Server tunables are in range (`tensor_parallel >= 1`, `0 < mem_fraction <= 1`, ...)
//! * The wheel index template carries the `{toolkit}` placeholder
//! * Extra flags do not shadow the flags the launcher always emits
//!
//! # Example
//! ```rust
//! use llm_launchpad::config::{parse_config, validate_config};
//!
//! let cfg = parse_config("server:\n  model_path: M\n  tensor_parallel: 0\n").unwrap();
//! let errors = validate_config(&cfg).unwrap_err();
//! assert_eq!(errors.len(), 1);
//! ```

use crate::config::consts::{SERVER_LOG_LEVELS, TOOLKIT_PLACEHOLDER};
use crate::config::Config;
use crate::errors::ValidationError;
use crate::observability::messages::validation::ConfigValidationFailed;
use crate::observability::messages::StructuredLog;
use crate::stages::launcher::RESERVED_FLAGS;

/// Validate a configuration, collecting every problem found.
pub fn validate_config(cfg: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_not_empty(&mut errors, "environment.name", &cfg.environment.name);
    check_not_empty(&mut errors, "server.model_path", &cfg.server.model_path);
    check_not_empty(&mut errors, "server.module", &cfg.server.module);
    check_not_empty(&mut errors, "server.host", &cfg.server.host);
    check_not_empty(&mut errors, "server.dtype", &cfg.server.dtype);
    check_not_empty(&mut errors, "packages.numerical.name", &cfg.packages.numerical.name);
    check_not_empty(&mut errors, "packages.serving.name", &cfg.packages.serving.name);
    if cfg.packages.auxiliary.iter().any(|p| p.name.trim().is_empty()) {
        errors.push(ValidationError::EmptyValue {
            field: "packages.auxiliary.name",
        });
    }
    if cfg.system.packages.iter().any(|p| p.trim().is_empty()) {
        errors.push(ValidationError::EmptyValue {
            field: "system.packages",
        });
    }
    if let Some(tokenizer) = &cfg.server.tokenizer_path {
        check_not_empty(&mut errors, "server.tokenizer_path", tokenizer);
    }

    check_version(
        &mut errors,
        "environment.python_version",
        &cfg.environment.python_version,
    );
    check_version(
        &mut errors,
        "packages.accelerator_toolkit",
        &cfg.packages.accelerator_toolkit,
    );

    if !cfg.packages.index_url_template.contains(TOOLKIT_PLACEHOLDER) {
        errors.push(ValidationError::MissingToolkitPlaceholder {
            template: cfg.packages.index_url_template.clone(),
        });
    }

    let server = &cfg.server;
    if server.tensor_parallel < 1 {
        errors.push(ValidationError::OutOfRange {
            field: "server.tensor_parallel",
            value: server.tensor_parallel.to_string(),
            expected: ">= 1",
        });
    }
    if server.port == 0 {
        errors.push(ValidationError::OutOfRange {
            field: "server.port",
            value: server.port.to_string(),
            expected: "1..=65535",
        });
    }
    if !(server.mem_fraction > 0.0 && server.mem_fraction <= 1.0) {
        errors.push(ValidationError::OutOfRange {
            field: "server.mem_fraction",
            value: server.mem_fraction.to_string(),
            expected: "0 < value <= 1",
        });
    }
    if server.max_running_requests < 1 {
        errors.push(ValidationError::OutOfRange {
            field: "server.max_running_requests",
            value: server.max_running_requests.to_string(),
            expected: ">= 1",
        });
    }
    if !SERVER_LOG_LEVELS.contains(&server.log_level.as_str()) {
        errors.push(ValidationError::UnknownLogLevel {
            level: server.log_level.clone(),
        });
    }

    for flag in server.extra_flags.keys() {
        if flag.trim().is_empty() {
            errors.push(ValidationError::InvalidExtraFlag {
                flag: flag.clone(),
                reason: "flag name is empty",
            });
        } else if flag.starts_with('-') {
            errors.push(ValidationError::InvalidExtraFlag {
                flag: flag.clone(),
                reason: "write the flag name without leading dashes",
            });
        } else if RESERVED_FLAGS.contains(&flag.as_str()) {
            errors.push(ValidationError::InvalidExtraFlag {
                flag: flag.clone(),
                reason: "flag is set from a dedicated server field",
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        for error in &errors {
            ConfigValidationFailed { error }.log();
        }
        Err(errors)
    }
}

fn check_not_empty(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.trim().is_empty() {
        errors.push(ValidationError::EmptyValue { field });
    }
}

fn check_version(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    let well_formed = !value.is_empty()
        && value
            .split('.')
            .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()));
    if !well_formed {
        errors.push(ValidationError::MalformedVersion {
            field,
            value: value.to_string(),
        });
    }
}
