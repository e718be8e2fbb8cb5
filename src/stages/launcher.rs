// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::time::Instant;

use crate::config::{FlagValue, ServerConfig};
use crate::engine::{ServerState, WorkflowContext};
use crate::errors::StageError;
use crate::observability::messages::launch::{ServerExited, ServerInterrupted, ServerLaunching};
use crate::observability::messages::StructuredLog;
use crate::stages::environment::Activation;
use crate::traits::{ChildOutcome, CommandSpec, Stage, StageOutcome};

/// Flags the launcher always emits, in emission order. Extra flags may not reuse them.
pub const RESERVED_FLAGS: [&str; 9] = [
    "model-path",
    "tokenizer-path",
    "tp",
    "host",
    "port",
    "dtype",
    "mem-fraction-static",
    "max-running-requests",
    "log-level",
];

/// The server command line, built from configuration.
///
/// Text values are substituted verbatim and numbers in canonical form.
#[derive(Debug, Clone, PartialEq)]
pub struct LaunchCommand {
    args: Vec<String>,
}

impl LaunchCommand {
    pub fn from_config(server: &ServerConfig) -> Self {
        let fixed = [
            server.model_path.clone(),
            server.tokenizer_path().to_string(),
            server.tensor_parallel.to_string(),
            server.host.clone(),
            server.port.to_string(),
            server.dtype.clone(),
            server.mem_fraction.to_string(),
            server.max_running_requests.to_string(),
            server.log_level.clone(),
        ];

        let mut args = vec!["-m".to_string(), server.module.clone()];
        for (flag, value) in RESERVED_FLAGS.iter().zip(fixed) {
            args.push(format!("--{}", flag));
            args.push(value);
        }

        // BTreeMap iteration keeps extra flags sorted by name
        for (flag, value) in &server.extra_flags {
            match value {
                FlagValue::Switch(true) => args.push(format!("--{}", flag)),
                FlagValue::Switch(false) => {}
                FlagValue::Integer(n) => args.extend([format!("--{}", flag), n.to_string()]),
                FlagValue::Float(x) => args.extend([format!("--{}", flag), x.to_string()]),
                FlagValue::Text(s) => args.extend([format!("--{}", flag), s.clone()]),
            }
        }

        Self { args }
    }

    /// Interpreter arguments, starting with `-m <module>`.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Value following `--<flag>`, if present.
    pub fn flag(&self, flag: &str) -> Option<&str> {
        let name = format!("--{}", flag);
        self.args
            .iter()
            .position(|a| *a == name)
            .and_then(|i| self.args.get(i + 1))
            .map(String::as_str)
    }

    /// Runnable command under the activation overlay plus the server's own variables.
    pub fn to_spec(&self, activation: &Activation, env: &BTreeMap<String, String>) -> CommandSpec {
        activation.python().args(self.args.iter().cloned()).envs(env)
    }
}

/// Starts the inference server and blocks until it exits or is interrupted.
pub struct ServerLauncher;

#[async_trait]
impl Stage for ServerLauncher {
    async fn run(&self, ctx: &mut WorkflowContext) -> Result<StageOutcome, StageError> {
        let config = ctx.config.clone();
        let server = &config.server;
        let spec = LaunchCommand::from_config(server).to_spec(ctx.activation()?, &server.env);

        ServerLaunching {
            command: &spec.to_string(),
            host: &server.host,
            port: server.port,
        }
        .log();

        ctx.server = ServerState::Running;
        let started = Instant::now();
        let supervised = ctx.runner.supervise(&spec, &ctx.cancel).await;
        let outcome = match supervised {
            // The server may die of the same Ctrl-C before supervision notices the token
            Ok(ChildOutcome::Exited(code)) if ctx.cancel.is_cancelled() => {
                tracing::debug!(code, "server exited after interrupt");
                ChildOutcome::Interrupted
            }
            Ok(outcome) => outcome,
            Err(e) => {
                ctx.server = ServerState::NotStarted;
                return Err(e.into());
            }
        };
        ctx.server = ServerState::Terminated(outcome);
        let uptime = started.elapsed();

        match outcome {
            ChildOutcome::Interrupted => {
                ServerInterrupted { uptime }.log();
                Ok(StageOutcome::Interrupted)
            }
            ChildOutcome::Exited(code) => {
                ServerExited { code, uptime }.log();
                if code == Some(0) {
                    Ok(StageOutcome::Completed)
                } else {
                    Err(StageError::ServerExited { code })
                }
            }
        }
    }

    fn name(&self) -> &'static str {
        "launcher"
    }
}
