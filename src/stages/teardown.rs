// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;

use crate::engine::WorkflowContext;
use crate::errors::StageError;
use crate::observability::messages::provisioning::EnvironmentDeactivated;
use crate::observability::messages::StructuredLog;
use crate::traits::{Stage, StageOutcome};

/// Drops the activation overlay. Runs after the main sequence however it ended.
pub struct Teardown;

#[async_trait]
impl Stage for Teardown {
    async fn run(&self, ctx: &mut WorkflowContext) -> Result<StageOutcome, StageError> {
        let activation = ctx.activation.take().ok_or(StageError::NotActivated)?;
        EnvironmentDeactivated {
            name: &activation.name,
        }
        .log();
        Ok(StageOutcome::Applied)
    }

    fn name(&self) -> &'static str {
        "teardown"
    }
}
