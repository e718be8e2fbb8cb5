pub mod runner;
pub mod stage;

pub use runner::{ArtifactFetcher, ChildOutcome, CommandOutput, CommandRunner, CommandSpec};
pub use stage::{Stage, StageOutcome};
