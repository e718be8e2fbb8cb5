//! Workflow stages, in the order the standard workflow runs them.

pub mod dependencies;
pub mod environment;
pub mod launcher;
pub mod packages;
pub mod runtime;
pub mod teardown;

pub use dependencies::DependencyInstaller;
pub use environment::{Activation, EnvironmentManager};
pub use launcher::{LaunchCommand, ServerLauncher};
pub use packages::PackageInstaller;
pub use runtime::RuntimeInstaller;
pub use teardown::Teardown;
