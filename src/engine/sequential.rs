// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::time::{Duration, Instant};
use tracing::Instrument;

use crate::engine::WorkflowContext;
use crate::errors::{StageError, WorkflowError};
use crate::observability::messages::workflow::*;
use crate::observability::messages::StructuredLog;
use crate::traits::{Stage, StageOutcome};

/// What one stage did during a run.
#[derive(Debug, Clone, PartialEq)]
pub struct StageReport {
    pub stage: &'static str,
    pub outcome: StageOutcome,
    pub duration: Duration,
}

/// Everything the caller needs after a run: per-stage outcomes, the error
/// that stopped the run (if any), and a teardown problem that was swallowed.
#[derive(Debug, Default)]
pub struct WorkflowRun {
    pub stages: Vec<StageReport>,
    pub error: Option<WorkflowError>,
    pub teardown_error: Option<StageError>,
}

impl WorkflowRun {
    /// Process exit status. Teardown never influences it.
    pub fn exit_code(&self) -> i32 {
        self.error.as_ref().map_or(0, WorkflowError::exit_code)
    }

    pub fn outcome_of(&self, stage: &str) -> Option<&StageOutcome> {
        self.stages
            .iter()
            .find(|report| report.stage == stage)
            .map(|report| &report.outcome)
    }
}

/// Runs stages strictly in order, stopping at the first failure.
///
/// ## Execution Strategy
///
/// 1. Before each stage the cancellation token is checked; a cancelled run
///    does not start further stages.
/// 2. Each stage runs inside its own tracing span and its outcome is recorded.
/// 3. The first error aborts the remaining stages (fail-fast). An error seen
///    after cancellation is reported as an interruption, since child
///    processes receive the same signal.
/// 4. Teardown runs no matter how the sequence ended. Its errors are logged
///    and kept in [`WorkflowRun::teardown_error`] only.
pub struct SequentialExecutor {
    stages: Vec<Box<dyn Stage>>,
    teardown: Box<dyn Stage>,
}

impl SequentialExecutor {
    pub fn new(stages: Vec<Box<dyn Stage>>, teardown: Box<dyn Stage>) -> Self {
        Self { stages, teardown }
    }

    /// Names of the stages in execution order, teardown last.
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages
            .iter()
            .map(|stage| stage.name())
            .chain(std::iter::once(self.teardown.name()))
            .collect()
    }

    pub async fn execute(&self, ctx: &mut WorkflowContext) -> WorkflowRun {
        let started = Instant::now();
        let total = self.stages.len();
        let mut run = WorkflowRun::default();

        WorkflowStarted {
            environment: &ctx.config.environment.name,
            stage_count: total,
        }
        .log();

        for (index, stage) in self.stages.iter().enumerate() {
            if ctx.cancel.is_cancelled() {
                WorkflowInterrupted {
                    next_stage: stage.name(),
                }
                .log();
                run.error = Some(WorkflowError::Interrupted {
                    stage: stage.name(),
                });
                break;
            }

            let start_msg = StageStarted {
                stage: stage.name(),
                position: index + 1,
                total,
            };
            let span = start_msg.span("stage");
            span.in_scope(|| start_msg.log());

            let stage_started = Instant::now();
            match stage.run(ctx).instrument(span).await {
                Ok(outcome) => {
                    let duration = stage_started.elapsed();
                    StageCompleted {
                        stage: stage.name(),
                        outcome: &describe(&outcome),
                        duration,
                    }
                    .log();
                    run.stages.push(StageReport {
                        stage: stage.name(),
                        outcome,
                        duration,
                    });
                }
                Err(error) => {
                    StageFailed {
                        stage: stage.name(),
                        error: &error,
                    }
                    .log();
                    run.error = Some(if ctx.cancel.is_cancelled() {
                        WorkflowError::Interrupted {
                            stage: stage.name(),
                        }
                    } else {
                        WorkflowError::StageFailed {
                            stage: stage.name(),
                            source: error,
                        }
                    });
                    break;
                }
            }
        }

        if let Err(error) = self.teardown.run(ctx).await {
            TeardownFailed { error: &error }.log();
            run.teardown_error = Some(error);
        }

        WorkflowFinished {
            stages_run: run.stages.len(),
            exit_code: run.exit_code(),
            duration: started.elapsed(),
        }
        .log();

        run
    }
}

/// Short human-readable outcome for logs and the final report.
pub fn describe(outcome: &StageOutcome) -> String {
    match outcome {
        StageOutcome::Applied => "applied".to_string(),
        StageOutcome::AlreadySatisfied(detail) => format!("already satisfied ({})", detail),
        StageOutcome::Completed => "server exited cleanly".to_string(),
        StageOutcome::Interrupted => "server interrupted".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::stub::{FailingStage, NoopStage, RecordingFetcher, ScriptedRunner};
    use crate::config::parse_config;
    use std::sync::Arc;
    use tokio_util::sync::CancellationToken;

    fn context() -> WorkflowContext {
        let config = parse_config("server:\n  model_path: M\n").unwrap();
        WorkflowContext::new(
            Arc::new(config),
            Arc::new(ScriptedRunner::new()),
            Arc::new(RecordingFetcher::new()),
            CancellationToken::new(),
        )
    }

    #[tokio::test]
    async fn runs_all_stages_in_order() {
        let executor = SequentialExecutor::new(
            vec![
                Box::new(NoopStage { name: "first" }),
                Box::new(NoopStage { name: "second" }),
            ],
            Box::new(NoopStage { name: "teardown" }),
        );
        let mut ctx = context();

        let run = executor.execute(&mut ctx).await;

        assert_eq!(run.exit_code(), 0);
        let names: Vec<_> = run.stages.iter().map(|r| r.stage).collect();
        assert_eq!(names, vec!["first", "second"]);
        assert!(run.teardown_error.is_none());
        assert_eq!(executor.stage_names(), vec!["first", "second", "teardown"]);
    }

    #[tokio::test]
    async fn failure_stops_later_stages() {
        let executor = SequentialExecutor::new(
            vec![
                Box::new(NoopStage { name: "first" }),
                Box::new(FailingStage { name: "broken" }),
                Box::new(NoopStage { name: "never" }),
            ],
            Box::new(NoopStage { name: "teardown" }),
        );
        let mut ctx = context();

        let run = executor.execute(&mut ctx).await;

        assert_eq!(run.stages.len(), 1);
        assert!(run.outcome_of("never").is_none());
        assert!(matches!(
            run.error,
            Some(WorkflowError::StageFailed {
                stage: "broken",
                ..
            })
        ));
        assert_eq!(run.exit_code(), 1);
    }

    #[tokio::test]
    async fn teardown_failure_does_not_change_exit_code() {
        let executor = SequentialExecutor::new(
            vec![Box::new(NoopStage { name: "only" })],
            Box::new(FailingStage { name: "teardown" }),
        );
        let mut ctx = context();

        let run = executor.execute(&mut ctx).await;

        assert_eq!(run.exit_code(), 0);
        assert!(run.error.is_none());
        assert!(run.teardown_error.is_some());
    }

    #[tokio::test]
    async fn cancelled_run_starts_no_stages() {
        let executor = SequentialExecutor::new(
            vec![Box::new(NoopStage { name: "first" })],
            Box::new(NoopStage { name: "teardown" }),
        );
        let mut ctx = context();
        ctx.cancel.cancel();

        let run = executor.execute(&mut ctx).await;

        assert!(run.stages.is_empty());
        assert!(matches!(
            run.error,
            Some(WorkflowError::Interrupted { stage: "first" })
        ));
        assert_eq!(run.exit_code(), 130);
    }
}
