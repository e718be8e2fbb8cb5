// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::errors::StageError;
use crate::stages::environment::Activation;
use crate::traits::{ArtifactFetcher, ChildOutcome, CommandRunner};

/// Lifecycle of the launched server process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ServerState {
    #[default]
    NotStarted,
    Running,
    Terminated(ChildOutcome),
}

/// State threaded through every stage of one workflow run.
///
/// The configuration is shared and read-only. The only values stages write
/// are the environment activation and the server state.
pub struct WorkflowContext {
    pub config: Arc<Config>,
    pub runner: Arc<dyn CommandRunner>,
    pub fetcher: Arc<dyn ArtifactFetcher>,
    pub cancel: CancellationToken,
    pub activation: Option<Activation>,
    pub server: ServerState,
}

impl WorkflowContext {
    pub fn new(
        config: Arc<Config>,
        runner: Arc<dyn CommandRunner>,
        fetcher: Arc<dyn ArtifactFetcher>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            config,
            runner,
            fetcher,
            cancel,
            activation: None,
            server: ServerState::NotStarted,
        }
    }

    /// The verified activation, or `NotActivated` if the environment stage has not run.
    pub fn activation(&self) -> Result<&Activation, StageError> {
        self.activation.as_ref().ok_or(StageError::NotActivated)
    }
}

impl std::fmt::Debug for WorkflowContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowContext")
            .field("environment", &self.config.environment.name)
            .field("activation", &self.activation)
            .field("server", &self.server)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}
