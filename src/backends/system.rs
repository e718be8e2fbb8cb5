// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::{Child, Command};
use tokio_util::sync::CancellationToken;

use crate::errors::CommandError;
use crate::traits::{ChildOutcome, CommandOutput, CommandRunner, CommandSpec};

/// How long a supervised process group gets to exit after SIGINT.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// Runs commands as real OS processes through `tokio::process`.
///
/// Supervised children lead their own process group, so an interrupt can
/// reach every worker they spawn and not only the direct child.
#[derive(Debug, Default, Clone)]
pub struct SystemRunner;

impl SystemRunner {
    pub fn new() -> Self {
        Self
    }

    fn command(spec: &CommandSpec) -> Command {
        let mut command = Command::new(&spec.program);
        command.args(&spec.args).envs(&spec.env);
        command
    }

    /// SIGINT to the whole group, a bounded wait for the leader, then SIGKILL
    /// for whatever is left in the group. The leader is always reaped.
    async fn stop(child: &mut Child, spec: &CommandSpec) -> Result<(), CommandError> {
        let wait_err = |source| CommandError::Wait {
            command: spec.to_string(),
            source,
        };

        #[cfg(unix)]
        if let Some(pgid) = child.id() {
            signal_group(pgid, libc::SIGINT);
            let exited = tokio::time::timeout(SHUTDOWN_GRACE, child.wait()).await;
            signal_group(pgid, libc::SIGKILL);
            match exited {
                Ok(status) => {
                    let status = status.map_err(wait_err)?;
                    tracing::debug!(pgid, code = status.code(), "process group leader stopped");
                    return Ok(());
                }
                Err(_) => tracing::warn!(pgid, "process group ignored SIGINT, killed"),
            }
        }

        // kill() also reaps the child
        child.kill().await.map_err(wait_err)
    }
}

#[cfg(unix)]
fn signal_group(pgid: u32, signal: libc::c_int) {
    let Ok(pgid) = libc::pid_t::try_from(pgid) else {
        return;
    };
    // ESRCH once the group is empty is expected
    let rc = unsafe { libc::killpg(pgid, signal) };
    if rc != 0 {
        tracing::debug!(pgid, signal, error = %std::io::Error::last_os_error(), "killpg");
    }
}

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn output(&self, spec: &CommandSpec) -> Result<CommandOutput, CommandError> {
        tracing::debug!(command = %spec, "capturing command output");
        let output = Self::command(spec)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| CommandError::Spawn {
                command: spec.to_string(),
                source,
            })?;

        Ok(CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    async fn run(&self, spec: &CommandSpec) -> Result<(), CommandError> {
        tracing::debug!(command = %spec, "running command");
        let status = Self::command(spec)
            .stdin(Stdio::null())
            .status()
            .await
            .map_err(|source| CommandError::Spawn {
                command: spec.to_string(),
                source,
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(CommandError::NonZeroExit {
                command: spec.to_string(),
                code: status.code(),
            })
        }
    }

    async fn supervise(
        &self,
        spec: &CommandSpec,
        cancel: &CancellationToken,
    ) -> Result<ChildOutcome, CommandError> {
        let mut command = Self::command(spec);
        command.kill_on_drop(true);
        #[cfg(unix)]
        command.process_group(0);
        let mut child = command
            .spawn()
            .map_err(|source| CommandError::Spawn {
                command: spec.to_string(),
                source,
            })?;
        tracing::debug!(command = %spec, pid = child.id(), "child process running");

        tokio::select! {
            status = child.wait() => {
                let status = status.map_err(|source| CommandError::Wait {
                    command: spec.to_string(),
                    source,
                })?;
                Ok(ChildOutcome::Exited(status.code()))
            }
            _ = cancel.cancelled() => {
                Self::stop(&mut child, spec).await?;
                Ok(ChildOutcome::Interrupted)
            }
        }
    }
}
