pub mod context;
pub mod factory;
pub mod sequential;
#[cfg(test)]
pub mod integration_tests;

pub use context::{ServerState, WorkflowContext};
pub use factory::WorkflowBuilder;
pub use sequential::{describe, SequentialExecutor, StageReport, WorkflowRun};
