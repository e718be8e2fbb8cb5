// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;

use crate::config::PackagesConfig;
use crate::engine::WorkflowContext;
use crate::errors::StageError;
use crate::stages::environment::Activation;
use crate::traits::{CommandSpec, Stage, StageOutcome};

/// Installs the numerical and serving libraries into the active environment.
///
/// pip decides what is already satisfied, so this stage always reports
/// `Applied`.
pub struct PackageInstaller;

/// The three pip invocations, in the order they run.
pub fn install_commands(activation: &Activation, packages: &PackagesConfig) -> Vec<CommandSpec> {
    let pip = || activation.python().args(["-m", "pip", "install"]);

    let upgrade_pip = pip().args(["--upgrade", "pip"]);

    let numerical = pip()
        .arg(packages.numerical.requirement())
        .arg("--index-url")
        .arg(packages.numerical_index_url());

    let serving = pip()
        .arg(packages.serving.requirement())
        .args(packages.auxiliary.iter().map(|aux| aux.requirement()))
        .args(
            packages
                .extra_index_urls
                .iter()
                .flat_map(|url| ["--extra-index-url".to_string(), url.clone()]),
        );

    vec![upgrade_pip, numerical, serving]
}

#[async_trait]
impl Stage for PackageInstaller {
    async fn run(&self, ctx: &mut WorkflowContext) -> Result<StageOutcome, StageError> {
        let commands = install_commands(ctx.activation()?, &ctx.config.packages);
        for cmd in &commands {
            tracing::debug!(command = %cmd, "installing packages");
            ctx.runner.run(cmd).await?;
        }
        Ok(StageOutcome::Applied)
    }

    fn name(&self) -> &'static str {
        "packages"
    }
}
