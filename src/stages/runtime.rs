// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use std::path::Path;

use crate::engine::WorkflowContext;
use crate::errors::StageError;
use crate::observability::messages::provisioning::{
    AlreadySatisfied, ArtifactAlreadyPresent, ArtifactDownloaded,
};
use crate::observability::messages::StructuredLog;
use crate::traits::{CommandSpec, Stage, StageOutcome};

/// Installs the Python distribution manager when its directory is absent.
///
/// Every destructive or network step is guarded: an existing install
/// directory skips the stage, an existing artifact skips the download.
pub struct RuntimeInstaller;

async fn exists(path: &Path) -> Result<bool, StageError> {
    tokio::fs::try_exists(path)
        .await
        .map_err(|source| StageError::Io {
            path: path.to_path_buf(),
            source,
        })
}

/// Non-interactive batch install into `install_dir`.
pub fn installer_command(artifact: &Path, install_dir: &Path) -> CommandSpec {
    CommandSpec::new("bash")
        .arg(artifact.display().to_string())
        .args(["-b", "-p"])
        .arg(install_dir.display().to_string())
}

#[async_trait]
impl Stage for RuntimeInstaller {
    async fn run(&self, ctx: &mut WorkflowContext) -> Result<StageOutcome, StageError> {
        let runtime = &ctx.config.runtime;
        let install_dir = runtime.install_dir();

        if exists(&install_dir).await? {
            let detail = format!("{} already installed", install_dir.display());
            AlreadySatisfied {
                stage: self.name(),
                detail: &detail,
            }
            .log();
            return Ok(StageOutcome::AlreadySatisfied(detail));
        }

        let artifact = runtime.artifact_path();
        if exists(&artifact).await? {
            ArtifactAlreadyPresent { path: &artifact }.log();
        } else {
            if let Some(parent) = artifact.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|source| StageError::Io {
                        path: parent.to_path_buf(),
                        source,
                    })?;
            }
            let url = runtime.installer_url();
            let bytes = ctx.fetcher.fetch(url, &artifact).await?;
            ArtifactDownloaded {
                url,
                path: &artifact,
                bytes,
            }
            .log();
        }

        ctx.runner
            .run(&installer_command(&artifact, &install_dir))
            .await?;

        tokio::fs::remove_file(&artifact)
            .await
            .map_err(|source| StageError::Io {
                path: artifact.clone(),
                source,
            })?;

        Ok(StageOutcome::Applied)
    }

    fn name(&self) -> &'static str {
        "runtime"
    }
}
