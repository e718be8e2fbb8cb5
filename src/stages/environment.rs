// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Conda environment creation, activation and activation verification.
//!
//! Activation cannot change the shell that started the workflow. Instead it
//! produces an [`Activation`]: the set of variables `conda activate` would
//! export, applied as an overlay to every later child process. Verification
//! runs an interpreter under that overlay and checks it reports the expected
//! environment name and prefix.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::engine::WorkflowContext;
use crate::errors::{CommandError, StageError};
use crate::observability::messages::provisioning::{
    ActivationMismatch, EnvironmentActivated, EnvironmentReady,
};
use crate::observability::messages::StructuredLog;
use crate::traits::{CommandOutput, CommandSpec, Stage, StageOutcome};

const MAX_ACTIVATION_ATTEMPTS: u32 = 2;
const BASE_ENVIRONMENT: &str = "base";

/// Prints the active environment name, then the interpreter prefix.
pub const CHECK_SCRIPT: &str =
    "import os, sys; print(os.environ.get('CONDA_DEFAULT_ENV', '')); print(sys.prefix)";

/// Variables that make an environment's tools effective for child processes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activation {
    pub name: String,
    pub prefix: PathBuf,
    pub overlay: BTreeMap<String, String>,
}

impl Activation {
    /// Overlay on top of the current process `PATH`.
    pub fn new(name: &str, prefix: &Path) -> Self {
        Self::with_base_path(name, prefix, std::env::var("PATH").ok().as_deref())
    }

    pub fn with_base_path(name: &str, prefix: &Path, base_path: Option<&str>) -> Self {
        let bin = prefix.join("bin").display().to_string();
        let path = match base_path.filter(|p| !p.is_empty()) {
            Some(base) => format!("{}:{}", bin, base),
            None => bin,
        };

        let mut overlay = BTreeMap::new();
        overlay.insert("CONDA_DEFAULT_ENV".to_string(), name.to_string());
        overlay.insert("CONDA_PREFIX".to_string(), prefix.display().to_string());
        overlay.insert("PATH".to_string(), path);

        Self {
            name: name.to_string(),
            prefix: prefix.to_path_buf(),
            overlay,
        }
    }

    /// The environment's interpreter, resolved through the overlay `PATH`.
    pub fn python(&self) -> CommandSpec {
        CommandSpec::new("python").envs(&self.overlay)
    }

    fn check(&self) -> CommandSpec {
        self.python().args(["-c", CHECK_SCRIPT])
    }

    /// Whether check output names this environment and prefix.
    fn matches(&self, observed: &Observed) -> bool {
        observed.name == self.name && Path::new(&observed.prefix) == self.prefix
    }
}

/// What the check interpreter reported.
#[derive(Debug, Default)]
struct Observed {
    name: String,
    prefix: String,
    stderr: String,
}

impl From<CommandOutput> for Observed {
    fn from(output: CommandOutput) -> Self {
        let mut lines = output.stdout.lines().map(str::trim);
        let (name, prefix) = if output.success() {
            (
                lines.next().unwrap_or_default().to_string(),
                lines.next().unwrap_or_default().to_string(),
            )
        } else {
            Default::default()
        };
        Self {
            name,
            prefix,
            stderr: output.stderr,
        }
    }
}

#[derive(Debug, Deserialize)]
struct EnvironmentList {
    envs: Vec<PathBuf>,
}

/// Parse `conda env list --json` output into environment prefixes.
pub fn parse_environment_list(json: &str) -> Result<Vec<PathBuf>, serde_json::Error> {
    serde_json::from_str::<EnvironmentList>(json).map(|list| list.envs)
}

/// Prefix of the environment called `name`: the install root for `base`,
/// otherwise any listed prefix whose directory name matches.
pub fn find_environment(envs: &[PathBuf], name: &str, install_dir: &Path) -> Option<PathBuf> {
    if name == BASE_ENVIRONMENT {
        return envs.iter().find(|p| p.as_path() == install_dir).cloned();
    }
    envs.iter()
        .find(|p| p.file_name().is_some_and(|f| f == name))
        .cloned()
}

/// Creates or reuses the configured environment, then activates and verifies it.
pub struct EnvironmentManager;

impl EnvironmentManager {
    async fn list(&self, ctx: &WorkflowContext, conda: &Path) -> Result<Vec<PathBuf>, StageError> {
        let cmd = CommandSpec::new(conda.display().to_string()).args(["env", "list", "--json"]);
        let output = ctx.runner.output(&cmd).await?;
        if !output.success() {
            return Err(CommandError::NonZeroExit {
                command: cmd.to_string(),
                code: output.code,
            }
            .into());
        }
        parse_environment_list(&output.stdout).map_err(|e| StageError::UnexpectedOutput {
            command: cmd.to_string(),
            reason: e.to_string(),
        })
    }

    /// Listed prefix of `name`, or its default location under the install root.
    async fn resolve(
        &self,
        ctx: &WorkflowContext,
        conda: &Path,
        name: &str,
        install_dir: &Path,
    ) -> Result<PathBuf, StageError> {
        let envs = self.list(ctx, conda).await?;
        Ok(find_environment(&envs, name, install_dir)
            .unwrap_or_else(|| install_dir.join("envs").join(name)))
    }

    /// Human-readable environment listing shown when activation fails.
    async fn diagnostics(&self, ctx: &WorkflowContext, conda: &Path) -> String {
        let cmd = CommandSpec::new(conda.display().to_string()).args(["env", "list"]);
        match ctx.runner.output(&cmd).await {
            Ok(output) if output.success() => output.stdout,
            Ok(output) => format!("`{}` failed: {}", cmd, output.stderr.trim()),
            Err(e) => format!("`{}` failed: {}", cmd, e),
        }
    }
}

#[async_trait]
impl Stage for EnvironmentManager {
    async fn run(&self, ctx: &mut WorkflowContext) -> Result<StageOutcome, StageError> {
        let config = ctx.config.clone();
        let env = &config.environment;
        let install_dir = config.runtime.install_dir();
        let conda = config.runtime.conda_bin();

        let envs = self.list(ctx, &conda).await?;
        let existing = find_environment(&envs, &env.name, &install_dir);
        let created = existing.is_none();

        if created {
            let create = CommandSpec::new(conda.display().to_string())
                .args(["create", "-y", "-n", env.name.as_str()])
                .arg(format!("python={}", env.python_version));
            ctx.runner.run(&create).await?;
        }
        EnvironmentReady {
            name: &env.name,
            python_version: &env.python_version,
            created,
        }
        .log();

        // conda may place a new environment outside the install root (envs_dirs)
        let mut prefix = match existing {
            Some(prefix) => prefix,
            None => self.resolve(ctx, &conda, &env.name, &install_dir).await?,
        };

        let mut last = Observed::default();
        for attempt in 1..=MAX_ACTIVATION_ATTEMPTS {
            if attempt > 1 {
                prefix = self.resolve(ctx, &conda, &env.name, &install_dir).await?;
            }
            let activation = Activation::new(&env.name, &prefix);

            let observed = Observed::from(ctx.runner.output(&activation.check()).await?);
            if activation.matches(&observed) {
                EnvironmentActivated {
                    name: &activation.name,
                    prefix: &activation.prefix,
                    attempt,
                }
                .log();
                ctx.activation = Some(activation);
                return Ok(if created {
                    StageOutcome::Applied
                } else {
                    StageOutcome::AlreadySatisfied(format!("environment '{}' exists", env.name))
                });
            }

            ActivationMismatch {
                expected_name: &activation.name,
                observed_name: &observed.name,
                expected_prefix: &activation.prefix,
                observed_prefix: &observed.prefix,
                attempt,
            }
            .log();
            last = observed;
        }

        let mut diagnostics = format!(
            "expected '{}' at {}\ncheck reported '{}' at '{}'\n",
            env.name,
            prefix.display(),
            last.name,
            last.prefix
        );
        if !last.stderr.trim().is_empty() {
            diagnostics.push_str(&format!("check stderr: {}\n", last.stderr.trim()));
        }
        diagnostics.push_str(&self.diagnostics(ctx, &conda).await);

        Err(StageError::ActivationFailed {
            name: env.name.clone(),
            attempts: MAX_ACTIVATION_ATTEMPTS,
            diagnostics,
        })
    }

    fn name(&self) -> &'static str {
        "environment"
    }
}
