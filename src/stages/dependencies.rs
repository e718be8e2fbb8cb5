// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;

use crate::engine::WorkflowContext;
use crate::errors::StageError;
use crate::observability::messages::provisioning::{AlreadySatisfied, SystemPackagesMissing};
use crate::observability::messages::StructuredLog;
use crate::traits::{CommandSpec, Stage, StageOutcome};

const INSTALLED_STATUS: &str = "install ok installed";

/// Ensures the configured OS packages are installed with apt.
///
/// Packages are queried one by one; apt is only invoked for the missing
/// ones, so a fully provisioned machine sees no package manager calls.
pub struct DependencyInstaller;

/// Query the package database for one package's install status.
pub fn status_query(package: &str) -> CommandSpec {
    CommandSpec::new("dpkg-query").args(["-W", "-f=${Status}", package])
}

/// `apt-get` with non-interactive frontend, behind the privilege helper if any.
///
/// `sudo` scrubs the environment, so the frontend is passed as an assignment
/// argument in that case.
fn apt_get(privilege_command: Option<&str>) -> CommandSpec {
    match privilege_command.filter(|p| !p.trim().is_empty()) {
        Some(prefix) => CommandSpec::new(prefix).args(["DEBIAN_FRONTEND=noninteractive", "apt-get"]),
        None => CommandSpec::new("apt-get").env("DEBIAN_FRONTEND", "noninteractive"),
    }
}

#[async_trait]
impl Stage for DependencyInstaller {
    async fn run(&self, ctx: &mut WorkflowContext) -> Result<StageOutcome, StageError> {
        let system = &ctx.config.system;

        let mut missing = Vec::new();
        for package in &system.packages {
            let status = ctx.runner.output(&status_query(package)).await?;
            let installed = status.success() && status.stdout.contains(INSTALLED_STATUS);
            tracing::debug!(package = package.as_str(), installed, "system package status");
            if !installed {
                missing.push(package.clone());
            }
        }

        if missing.is_empty() {
            let detail = format!("{} system packages present", system.packages.len());
            AlreadySatisfied {
                stage: self.name(),
                detail: &detail,
            }
            .log();
            return Ok(StageOutcome::AlreadySatisfied(detail));
        }

        SystemPackagesMissing { missing: &missing }.log();

        let privilege = system.privilege_command.as_deref();
        ctx.runner.run(&apt_get(privilege).arg("update")).await?;
        ctx.runner
            .run(&apt_get(privilege).args(["install", "-y"]).args(missing))
            .await?;

        Ok(StageOutcome::Applied)
    }

    fn name(&self) -> &'static str {
        "dependencies"
    }
}
