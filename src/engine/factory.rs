// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::engine::SequentialExecutor;
use crate::stages::{
    DependencyInstaller, EnvironmentManager, PackageInstaller, RuntimeInstaller, ServerLauncher,
    Teardown,
};

/// Factory for the provisioning workflow.
pub struct WorkflowBuilder;

impl WorkflowBuilder {
    /// The full workflow: install, configure, launch, then teardown.
    pub fn standard() -> SequentialExecutor {
        SequentialExecutor::new(
            vec![
                Box::new(DependencyInstaller),
                Box::new(RuntimeInstaller),
                Box::new(EnvironmentManager),
                Box::new(PackageInstaller),
                Box::new(ServerLauncher),
            ],
            Box::new(Teardown),
        )
    }
}
