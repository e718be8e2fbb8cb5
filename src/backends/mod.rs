// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Backends that connect the workflow to the outside world.
//!
//! Stages never spawn processes or open sockets themselves; they go through
//! the [`CommandRunner`](crate::traits::CommandRunner) and
//! [`ArtifactFetcher`](crate::traits::ArtifactFetcher) traits.
//!
//! # Available Backends
//!
//! ## System Backend
//! Real OS processes through `tokio::process`:
//! - **Checks**: captured stdout/stderr, exit status inspected by the caller
//! - **Installs**: inherited stdio so package manager progress stays visible
//! - **Supervision**: long-lived server child, killed when cancellation fires
//!
//! ## HTTP Backend
//! Installer downloads with `reqwest`, streamed to a `.part` file and renamed
//! into place when complete.
//!
//! ## Stub Backend (Test-Only)
//! - **ScriptedRunner**: answers commands from a pattern script and records them
//! - **RecordingFetcher**: writes a fake installer and records requested URLs
//! - **FailingStage** / **NoopStage**: fixed-behavior stages for executor tests
//!
//! # Examples
//!
//! ```rust,no_run
//! use llm_launchpad::backends::SystemRunner;
//! use llm_launchpad::traits::{CommandRunner, CommandSpec};
//!
//! # async fn demo() -> Result<(), llm_launchpad::errors::CommandError> {
//! let runner = SystemRunner::new();
//! let output = runner.output(&CommandSpec::new("dpkg-query").args(["-W", "git"])).await?;
//! println!("git installed: {}", output.success());
//! # Ok(())
//! # }
//! ```

pub mod http;
#[cfg(test)]
pub mod stub;
pub mod system;

pub use http::HttpFetcher;
pub use system::SystemRunner;
