// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Stage and workflow level errors, plus the exit status each maps to.

use crate::errors::command::display_code;
use crate::errors::{CommandError, FetchError};
use std::path::PathBuf;

/// Exit status for failures that carry no status of their own
pub const EXIT_FAILURE: i32 = 1;
/// Exit status when the workflow is interrupted before the server starts
pub const EXIT_INTERRUPTED: i32 = 130;

/// Failure of a single stage
#[derive(Debug, thiserror::Error)]
pub enum StageError {
    #[error(transparent)]
    Command(#[from] CommandError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("filesystem operation on {path} failed: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Output of an external tool could not be understood
    #[error("unexpected output from `{command}`: {reason}")]
    UnexpectedOutput { command: String, reason: String },

    /// The environment never became the effective one, even after a retry
    #[error("environment '{name}' could not be activated after {attempts} attempts")]
    ActivationFailed {
        name: String,
        attempts: u32,
        diagnostics: String,
    },

    /// A stage needed an active environment but none was set up
    #[error("no environment is active")]
    NotActivated,

    /// The server process exited on its own with a failure status
    #[error("server exited with status {}", display_code(.code))]
    ServerExited { code: Option<i32> },
}

impl StageError {
    /// Exit status the workflow reports when this error aborts it.
    pub fn exit_code(&self) -> i32 {
        match self {
            StageError::ActivationFailed { .. } => EXIT_FAILURE,
            StageError::ServerExited { code } => code.unwrap_or(EXIT_FAILURE),
            StageError::Command(err) => err.code().filter(|c| *c != 0).unwrap_or(EXIT_FAILURE),
            _ => EXIT_FAILURE,
        }
    }
}

/// Why a workflow run stopped early
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("stage '{stage}' failed: {source}")]
    StageFailed {
        stage: &'static str,
        #[source]
        source: StageError,
    },

    /// Cancelled before the server was launched
    #[error("interrupted at stage '{stage}'")]
    Interrupted { stage: &'static str },
}

impl WorkflowError {
    pub fn exit_code(&self) -> i32 {
        match self {
            WorkflowError::StageFailed { source, .. } => source.exit_code(),
            WorkflowError::Interrupted { .. } => EXIT_INTERRUPTED,
        }
    }
}
