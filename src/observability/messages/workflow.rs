// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for workflow executor lifecycle events.
//!
//! This module contains message types for logging events related to:
//! * Workflow start and completion
//! * Per-stage start, outcome and failure
//! * Interruption between stages
//! * Teardown problems that are deliberately swallowed

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use std::time::Duration;
use tracing::Span;

/// Workflow started.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use llm_launchpad::observability::messages::workflow::WorkflowStarted;
///
/// let msg = WorkflowStarted {
///     environment: "sglang",
///     stage_count: 5,
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct WorkflowStarted<'a> {
    pub environment: &'a str,
    pub stage_count: usize,
}

impl Display for WorkflowStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Starting provisioning workflow for environment '{}': {} stages",
            self.environment, self.stage_count
        )
    }
}

impl StructuredLog for WorkflowStarted<'_> {
    fn log(&self) {
        tracing::info!(
            environment = self.environment,
            stage_count = self.stage_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "workflow",
            span_name = name,
            environment = self.environment,
            stage_count = self.stage_count,
        )
    }
}

/// A stage is about to run.
///
/// # Log Level
/// `info!` - Important operational event
pub struct StageStarted<'a> {
    pub stage: &'a str,
    pub position: usize,
    pub total: usize,
}

impl Display for StageStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "[{}/{}] Running stage '{}'",
            self.position, self.total, self.stage
        )
    }
}

impl StructuredLog for StageStarted<'_> {
    fn log(&self) {
        tracing::info!(
            stage = self.stage,
            position = self.position,
            total = self.total,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "stage",
            span_name = name,
            stage = self.stage,
            position = self.position,
            total = self.total,
        )
    }
}

/// A stage finished without error.
///
/// # Log Level
/// `info!` - Important operational event
pub struct StageCompleted<'a> {
    pub stage: &'a str,
    pub outcome: &'a str,
    pub duration: Duration,
}

impl Display for StageCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Stage '{}' finished in {:?}: {}",
            self.stage, self.duration, self.outcome
        )
    }
}

impl StructuredLog for StageCompleted<'_> {
    fn log(&self) {
        tracing::info!(
            stage = self.stage,
            outcome = self.outcome,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "stage_completed",
            span_name = name,
            stage = self.stage,
            outcome = self.outcome,
            duration = ?self.duration,
        )
    }
}

/// A stage failed and the workflow is aborting.
///
/// # Log Level
/// `error!` - Failure requiring attention
///
/// # Example
/// ```
/// use llm_launchpad::observability::messages::workflow::StageFailed;
///
/// let error = std::io::Error::new(std::io::ErrorKind::Other, "apt-get exited with status 100");
/// let msg = StageFailed {
///     stage: "dependencies",
///     error: &error,
/// };
///
/// tracing::error!("{}", msg);
/// ```
pub struct StageFailed<'a> {
    pub stage: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for StageFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Stage '{}' failed: {}", self.stage, self.error)
    }
}

impl StructuredLog for StageFailed<'_> {
    fn log(&self) {
        tracing::error!(
            stage = self.stage,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "stage_failed",
            span_name = name,
            stage = self.stage,
            error = %self.error,
        )
    }
}

/// Cancellation observed between stages.
///
/// # Log Level
/// `warn!` - The operator stopped the run
pub struct WorkflowInterrupted<'a> {
    pub next_stage: &'a str,
}

impl Display for WorkflowInterrupted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Interrupted; not starting stage '{}'",
            self.next_stage
        )
    }
}

impl StructuredLog for WorkflowInterrupted<'_> {
    fn log(&self) {
        tracing::warn!(next_stage = self.next_stage, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "workflow_interrupted",
            span_name = name,
            next_stage = self.next_stage,
        )
    }
}

/// Workflow finished, successfully or not.
///
/// # Log Level
/// `info!` - Important operational event
pub struct WorkflowFinished {
    pub stages_run: usize,
    pub exit_code: i32,
    pub duration: Duration,
}

impl Display for WorkflowFinished {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Workflow finished after {} stages in {:?} with exit status {}",
            self.stages_run, self.duration, self.exit_code
        )
    }
}

impl StructuredLog for WorkflowFinished {
    fn log(&self) {
        tracing::info!(
            stages_run = self.stages_run,
            exit_code = self.exit_code,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "workflow_finished",
            span_name = name,
            stages_run = self.stages_run,
            exit_code = self.exit_code,
        )
    }
}

/// Teardown failed; logged and otherwise ignored.
///
/// # Log Level
/// `warn!` - Never escalated
pub struct TeardownFailed<'a> {
    pub error: &'a dyn std::error::Error,
}

impl Display for TeardownFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Note: teardown did not complete cleanly: {}", self.error)
    }
}

impl StructuredLog for TeardownFailed<'_> {
    fn log(&self) {
        tracing::warn!(error = %self.error, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!("teardown_failed", span_name = name, error = %self.error)
    }
}
