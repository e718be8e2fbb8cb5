use async_trait::async_trait;

use crate::engine::WorkflowContext;
use crate::errors::StageError;

/// Result of a stage that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    /// The stage changed the machine
    Applied,
    /// The idempotency check found nothing to do
    AlreadySatisfied(String),
    /// The server ran and exited cleanly
    Completed,
    /// The server was stopped by an external signal
    Interrupted,
}

#[async_trait]
pub trait Stage: Send + Sync {
    async fn run(&self, ctx: &mut WorkflowContext) -> Result<StageOutcome, StageError>;

    fn name(&self) -> &'static str;
}
