// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Observability module for structured logging and tracing.
//!
//! Message types live in [`messages`], grouped by subsystem, so log text is
//! not scattered through the stages as string literals. [`init_tracing`]
//! installs the `tracing-subscriber` formatter used by the binary.
//!
//! # Usage
//!
//! ```rust
//! use llm_launchpad::observability::messages::workflow::StageFailed;
//!
//! let error = std::io::Error::new(std::io::ErrorKind::Other, "test error");
//! let msg = StageFailed {
//!     stage: "packages",
//!     error: &error,
//! };
//!
//! tracing::error!("{}", msg);
//! ```

use tracing_subscriber::EnvFilter;

pub mod messages;

/// Install the global `fmt` subscriber.
///
/// `RUST_LOG` wins when set; otherwise `default_level` applies to this crate
/// and `warn` to everything else.
pub fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("warn,llm_launchpad={}", default_level))
    });

    // A second init (e.g. from tests) is harmless
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
