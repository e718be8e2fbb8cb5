use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::backends::stub::{NoopStage, RecordingFetcher, Reply, ScriptedRunner};
use crate::config::parse_config;
use crate::engine::{SequentialExecutor, WorkflowBuilder, WorkflowContext};
use crate::errors::{CommandError, StageError, WorkflowError};
use crate::stages::Teardown;
use crate::traits::{ChildOutcome, CommandOutput, CommandRunner, CommandSpec, StageOutcome};

/// End-to-end runs of the standard workflow against scripted commands
#[cfg(test)]
mod tests {
    use super::*;

    struct Machine {
        dir: tempfile::TempDir,
        install_dir: PathBuf,
        artifact: PathBuf,
    }

    impl Machine {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let install_dir = dir.path().join("miniconda3");
            let artifact = dir.path().join("downloads").join("Miniconda3.sh");
            Self {
                dir,
                install_dir,
                artifact,
            }
        }

        fn provisioned() -> Self {
            let machine = Self::new();
            std::fs::create_dir_all(&machine.install_dir).unwrap();
            machine
        }

        fn prefix(&self) -> PathBuf {
            self.install_dir.join("envs").join("sglang")
        }

        fn config(&self) -> String {
            format!(
                r#"
system:
  packages: [git]
runtime:
  install_dir: {install}
  installer_url: https://repo.example.com/Miniconda3.sh
  download_dir: {downloads}
environment:
  name: sglang
  python_version: "3.10"
packages:
  accelerator_toolkit: "12.1"
  numerical: {{ name: torch, version: "2.4.0" }}
  serving: {{ name: "sglang[all]", version: "0.3.0" }}
server:
  model_path: M
  tensor_parallel: 2
  port: 30000
"#,
                install = self.install_dir.display(),
                downloads = self.dir.path().join("downloads").display(),
            )
        }

        fn listing(&self, with_env: bool) -> String {
            let mut envs = vec![format!("\"{}\"", self.install_dir.display())];
            if with_env {
                envs.push(format!("\"{}\"", self.prefix().display()));
            }
            format!("{{\"envs\": [{}]}}", envs.join(", "))
        }

        fn check_match(&self) -> Reply {
            Reply::stdout(&format!("sglang\n{}\n", self.prefix().display()))
        }

        /// Every check reports the work as already done.
        fn satisfied_runner(&self) -> ScriptedRunner {
            ScriptedRunner::new()
                .on("dpkg-query", Reply::stdout("install ok installed"))
                .on("env list --json", Reply::stdout(&self.listing(true)))
                .on("CONDA_DEFAULT_ENV", self.check_match())
        }

        fn context(
            &self,
            runner: Arc<dyn CommandRunner>,
            fetcher: Arc<RecordingFetcher>,
            cancel: CancellationToken,
        ) -> WorkflowContext {
            WorkflowContext::new(
                Arc::new(parse_config(&self.config()).unwrap()),
                runner,
                fetcher,
                cancel,
            )
        }
    }

    /// Cancels the workflow the moment the server is started, like Ctrl-C
    /// arriving while the server is running.
    struct InterruptOnLaunch {
        inner: Arc<ScriptedRunner>,
        cancel: CancellationToken,
    }

    #[async_trait]
    impl CommandRunner for InterruptOnLaunch {
        async fn output(&self, cmd: &CommandSpec) -> Result<CommandOutput, CommandError> {
            self.inner.output(cmd).await
        }

        async fn run(&self, cmd: &CommandSpec) -> Result<(), CommandError> {
            self.inner.run(cmd).await
        }

        async fn supervise(
            &self,
            cmd: &CommandSpec,
            cancel: &CancellationToken,
        ) -> Result<ChildOutcome, CommandError> {
            self.cancel.cancel();
            self.inner.supervise(cmd, cancel).await
        }
    }

    /// The server dies of the shared Ctrl-C before the token is observed.
    struct ServerDiesOnInterrupt {
        inner: Arc<ScriptedRunner>,
        cancel: CancellationToken,
    }

    #[async_trait]
    impl CommandRunner for ServerDiesOnInterrupt {
        async fn output(&self, cmd: &CommandSpec) -> Result<CommandOutput, CommandError> {
            self.inner.output(cmd).await
        }

        async fn run(&self, cmd: &CommandSpec) -> Result<(), CommandError> {
            self.inner.run(cmd).await
        }

        async fn supervise(
            &self,
            _cmd: &CommandSpec,
            _cancel: &CancellationToken,
        ) -> Result<ChildOutcome, CommandError> {
            self.cancel.cancel();
            Ok(ChildOutcome::Exited(None))
        }
    }

    fn is_satisfied(outcome: Option<&StageOutcome>) -> bool {
        matches!(outcome, Some(StageOutcome::AlreadySatisfied(_)))
    }

    #[tokio::test]
    async fn test_fresh_machine_provisions_and_launches() {
        let machine = Machine::new();
        let runner = Arc::new(
            ScriptedRunner::new()
                .on("env list --json", Reply::stdout(&machine.listing(false)))
                .on("CONDA_DEFAULT_ENV", machine.check_match()),
        );
        let fetcher = Arc::new(RecordingFetcher::new());
        let mut ctx = machine.context(runner.clone(), fetcher.clone(), CancellationToken::new());

        let run = WorkflowBuilder::standard().execute(&mut ctx).await;

        assert_eq!(run.exit_code(), 0);
        for stage in ["dependencies", "runtime", "environment", "packages"] {
            assert_eq!(run.outcome_of(stage), Some(&StageOutcome::Applied), "{stage}");
        }
        assert_eq!(run.outcome_of("launcher"), Some(&StageOutcome::Completed));
        assert_eq!(fetcher.fetched().len(), 1);
        assert!(!machine.artifact.exists());

        let lines = runner.command_lines();
        let position = |needle: &str| lines.iter().position(|l| l.contains(needle)).unwrap();
        assert!(position("apt-get install") < position("-b -p"));
        assert!(position("-b -p") < position("conda create"));
        assert!(position("conda create") < position("pip install --upgrade pip"));
        assert!(position("torch==2.4.0") < position("launch_server"));
        assert!(run.teardown_error.is_none());
        assert!(ctx.activation.is_none());
    }

    #[tokio::test]
    async fn test_rerun_on_provisioned_machine_changes_nothing() {
        let machine = Machine::provisioned();
        let runner = Arc::new(machine.satisfied_runner());
        let fetcher = Arc::new(RecordingFetcher::new());
        let mut ctx = machine.context(runner.clone(), fetcher.clone(), CancellationToken::new());

        let run = WorkflowBuilder::standard().execute(&mut ctx).await;

        assert_eq!(run.exit_code(), 0);
        assert!(is_satisfied(run.outcome_of("dependencies")));
        assert!(is_satisfied(run.outcome_of("runtime")));
        assert!(is_satisfied(run.outcome_of("environment")));
        assert!(fetcher.fetched().is_empty());
        assert!(!runner.saw("apt-get"));
        assert!(!runner.saw("-b -p"));
        assert!(!runner.saw("conda create"));
    }

    #[tokio::test]
    async fn test_present_artifact_is_not_downloaded() {
        let machine = Machine::new();
        std::fs::create_dir_all(machine.artifact.parent().unwrap()).unwrap();
        std::fs::write(&machine.artifact, "#!/bin/sh\n").unwrap();
        let runner = Arc::new(machine.satisfied_runner());
        let fetcher = Arc::new(RecordingFetcher::new());
        let mut ctx = machine.context(runner.clone(), fetcher.clone(), CancellationToken::new());

        let run = WorkflowBuilder::standard().execute(&mut ctx).await;

        assert_eq!(run.exit_code(), 0);
        assert_eq!(run.outcome_of("runtime"), Some(&StageOutcome::Applied));
        assert!(fetcher.fetched().is_empty());
        assert!(runner.saw(&format!("bash {}", machine.artifact.display())));
    }

    #[tokio::test]
    async fn test_activation_never_matching_exits_one_with_listing() {
        let machine = Machine::provisioned();
        let runner = Arc::new(
            ScriptedRunner::new()
                .on("dpkg-query", Reply::stdout("install ok installed"))
                .on("env list --json", Reply::stdout(&machine.listing(true)))
                .on("env list", Reply::stdout("# conda environments:\nbase  *  /opt/other\n"))
                .on("CONDA_DEFAULT_ENV", Reply::stdout("base\n/opt/other\n")),
        );
        let mut ctx = machine.context(
            runner.clone(),
            Arc::new(RecordingFetcher::new()),
            CancellationToken::new(),
        );

        let run = WorkflowBuilder::standard().execute(&mut ctx).await;

        assert_eq!(run.exit_code(), 1);
        match &run.error {
            Some(WorkflowError::StageFailed {
                stage: "environment",
                source: StageError::ActivationFailed { diagnostics, .. },
            }) => assert!(diagnostics.contains("# conda environments:")),
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(!runner.saw("pip"));
        assert!(!runner.saw("launch_server"));
        assert!(matches!(run.teardown_error, Some(StageError::NotActivated)));
    }

    #[tokio::test]
    async fn test_teardown_failure_keeps_success_status() {
        let machine = Machine::new();
        let executor = SequentialExecutor::new(
            vec![Box::new(NoopStage { name: "launcher" })],
            Box::new(Teardown),
        );
        let mut ctx = machine.context(
            Arc::new(ScriptedRunner::new()),
            Arc::new(RecordingFetcher::new()),
            CancellationToken::new(),
        );

        let run = executor.execute(&mut ctx).await;

        assert!(run.teardown_error.is_some());
        assert_eq!(run.exit_code(), 0);
    }

    #[tokio::test]
    async fn test_server_failure_status_becomes_exit_status() {
        let machine = Machine::provisioned();
        let runner = Arc::new(machine.satisfied_runner().on("launch_server", Reply::fail(7)));
        let mut ctx = machine.context(
            runner,
            Arc::new(RecordingFetcher::new()),
            CancellationToken::new(),
        );

        let run = WorkflowBuilder::standard().execute(&mut ctx).await;

        assert_eq!(run.exit_code(), 7);
        assert!(run.teardown_error.is_none());
    }

    #[tokio::test]
    async fn test_interrupted_launch_exits_zero_and_rerun_is_satisfied() {
        let machine = Machine::provisioned();
        let scripted = Arc::new(machine.satisfied_runner());
        let cancel = CancellationToken::new();
        let runner = Arc::new(InterruptOnLaunch {
            inner: scripted.clone(),
            cancel: cancel.clone(),
        });
        let mut ctx = machine.context(runner, Arc::new(RecordingFetcher::new()), cancel);

        let first = WorkflowBuilder::standard().execute(&mut ctx).await;

        assert_eq!(first.exit_code(), 0);
        assert_eq!(first.outcome_of("launcher"), Some(&StageOutcome::Interrupted));
        assert!(first.teardown_error.is_none());

        let mut again =
            machine.context(scripted, Arc::new(RecordingFetcher::new()), CancellationToken::new());
        let second = WorkflowBuilder::standard().execute(&mut again).await;

        assert_eq!(second.exit_code(), 0);
        assert!(is_satisfied(second.outcome_of("dependencies")));
        assert!(is_satisfied(second.outcome_of("runtime")));
        assert!(is_satisfied(second.outcome_of("environment")));
    }

    #[tokio::test]
    async fn test_server_killed_by_interrupt_exits_zero() {
        let machine = Machine::provisioned();
        let cancel = CancellationToken::new();
        let runner = Arc::new(ServerDiesOnInterrupt {
            inner: Arc::new(machine.satisfied_runner()),
            cancel: cancel.clone(),
        });
        let mut ctx = machine.context(runner, Arc::new(RecordingFetcher::new()), cancel);

        let run = WorkflowBuilder::standard().execute(&mut ctx).await;

        assert!(run.error.is_none(), "{:?}", run.error);
        assert_eq!(run.exit_code(), 0);
        assert_eq!(run.outcome_of("launcher"), Some(&StageOutcome::Interrupted));
    }

    #[tokio::test]
    async fn test_interrupt_before_launch_exits_130() {
        let machine = Machine::provisioned();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let mut ctx = machine.context(
            Arc::new(machine.satisfied_runner()),
            Arc::new(RecordingFetcher::new()),
            cancel,
        );

        let run = WorkflowBuilder::standard().execute(&mut ctx).await;

        assert_eq!(run.exit_code(), 130);
        assert!(run.stages.is_empty());
    }
}
