// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for provisioning decisions.
//!
//! This module contains message types for logging events related to:
//! * Idempotency checks (already installed, already downloaded, already created)
//! * Downloads and installs that actually happen
//! * Environment activation, verification retries and deactivation

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use std::path::Path;
use tracing::Span;

/// Some system packages are missing and will be installed.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use llm_launchpad::observability::messages::provisioning::SystemPackagesMissing;
///
/// let missing = vec!["git".to_string(), "wget".to_string()];
/// let msg = SystemPackagesMissing { missing: &missing };
///
/// assert_eq!(msg.to_string(), "Installing missing system packages: git wget");
/// ```
pub struct SystemPackagesMissing<'a> {
    pub missing: &'a [String],
}

impl Display for SystemPackagesMissing<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Installing missing system packages: {}",
            self.missing.join(" ")
        )
    }
}

impl StructuredLog for SystemPackagesMissing<'_> {
    fn log(&self) {
        tracing::info!(
            missing = self.missing.join(" "),
            missing_count = self.missing.len(),
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "system_packages",
            span_name = name,
            missing_count = self.missing.len(),
        )
    }
}

/// An idempotency check found the work already done.
///
/// # Log Level
/// `info!` - Important operational event
pub struct AlreadySatisfied<'a> {
    pub stage: &'a str,
    pub detail: &'a str,
}

impl Display for AlreadySatisfied<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Skipping '{}': {}", self.stage, self.detail)
    }
}

impl StructuredLog for AlreadySatisfied<'_> {
    fn log(&self) {
        tracing::info!(stage = self.stage, detail = self.detail, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "already_satisfied",
            span_name = name,
            stage = self.stage,
        )
    }
}

/// The installer artifact is already on disk; no network fetch.
///
/// # Log Level
/// `info!` - Important operational event
pub struct ArtifactAlreadyPresent<'a> {
    pub path: &'a Path,
}

impl Display for ArtifactAlreadyPresent<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Installer {} already downloaded, skipping fetch",
            self.path.display()
        )
    }
}

impl StructuredLog for ArtifactAlreadyPresent<'_> {
    fn log(&self) {
        tracing::info!(path = %self.path.display(), "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "artifact_present",
            span_name = name,
            path = %self.path.display(),
        )
    }
}

/// Installer artifact downloaded.
///
/// # Log Level
/// `info!` - Important operational event
pub struct ArtifactDownloaded<'a> {
    pub url: &'a str,
    pub path: &'a Path,
    pub bytes: u64,
}

impl Display for ArtifactDownloaded<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Downloaded {} to {} ({} bytes)",
            self.url,
            self.path.display(),
            self.bytes
        )
    }
}

impl StructuredLog for ArtifactDownloaded<'_> {
    fn log(&self) {
        tracing::info!(
            url = self.url,
            path = %self.path.display(),
            bytes = self.bytes,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "artifact_downloaded",
            span_name = name,
            url = self.url,
            bytes = self.bytes,
        )
    }
}

/// Existing environment reused, or a new one created.
///
/// # Log Level
/// `info!` - Important operational event
pub struct EnvironmentReady<'a> {
    pub name: &'a str,
    pub python_version: &'a str,
    pub created: bool,
}

impl Display for EnvironmentReady<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        if self.created {
            write!(
                f,
                "Created environment '{}' with python {}",
                self.name, self.python_version
            )
        } else {
            write!(f, "Environment '{}' already exists, reusing it", self.name)
        }
    }
}

impl StructuredLog for EnvironmentReady<'_> {
    fn log(&self) {
        tracing::info!(
            environment = self.name,
            python_version = self.python_version,
            created = self.created,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "environment_ready",
            span_name = name,
            environment = self.name,
            created = self.created,
        )
    }
}

/// Activation verified: the environment's tools are now effective.
///
/// # Log Level
/// `info!` - Important operational event
pub struct EnvironmentActivated<'a> {
    pub name: &'a str,
    pub prefix: &'a Path,
    pub attempt: u32,
}

impl Display for EnvironmentActivated<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Environment '{}' active at {} (attempt {})",
            self.name,
            self.prefix.display(),
            self.attempt
        )
    }
}

impl StructuredLog for EnvironmentActivated<'_> {
    fn log(&self) {
        tracing::info!(
            environment = self.name,
            prefix = %self.prefix.display(),
            attempt = self.attempt,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "environment_activated",
            span_name = name,
            environment = self.name,
        )
    }
}

/// Activation verification did not match the target environment.
///
/// # Log Level
/// `warn!` - Retried once before becoming fatal
pub struct ActivationMismatch<'a> {
    pub expected_name: &'a str,
    pub observed_name: &'a str,
    pub expected_prefix: &'a Path,
    pub observed_prefix: &'a str,
    pub attempt: u32,
}

impl Display for ActivationMismatch<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Activation check {} failed: expected '{}' at {}, found '{}' at {}",
            self.attempt,
            self.expected_name,
            self.expected_prefix.display(),
            self.observed_name,
            self.observed_prefix
        )
    }
}

impl StructuredLog for ActivationMismatch<'_> {
    fn log(&self) {
        tracing::warn!(
            expected_name = self.expected_name,
            observed_name = self.observed_name,
            expected_prefix = %self.expected_prefix.display(),
            observed_prefix = self.observed_prefix,
            attempt = self.attempt,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "activation_mismatch",
            span_name = name,
            expected_name = self.expected_name,
            attempt = self.attempt,
        )
    }
}

/// Environment deactivated during teardown.
///
/// # Log Level
/// `info!` - Important operational event
pub struct EnvironmentDeactivated<'a> {
    pub name: &'a str,
}

impl Display for EnvironmentDeactivated<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Environment '{}' deactivated", self.name)
    }
}

impl StructuredLog for EnvironmentDeactivated<'_> {
    fn log(&self) {
        tracing::info!(environment = self.name, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "environment_deactivated",
            span_name = name,
            environment = self.name,
        )
    }
}
