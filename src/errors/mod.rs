// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod command;
mod config;
mod workflow;

pub use command::{CommandError, FetchError};
pub use config::{ConfigError, ValidationError};
pub use workflow::{StageError, WorkflowError, EXIT_FAILURE, EXIT_INTERRUPTED};
