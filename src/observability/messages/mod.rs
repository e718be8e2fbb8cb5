// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging.
//!
//! Each message type implements `Display` for the human-readable line and
//! [`StructuredLog`] to emit it with typed fields at the right level.
//!
//! # Organization
//!
//! * `workflow` - Executor lifecycle and per-stage events
//! * `provisioning` - Idempotency decisions, activation and teardown
//! * `launch` - Server process lifecycle
//! * `validation` - Configuration validation errors
//!
//! # Usage Pattern
//!
//! ```rust
//! use llm_launchpad::observability::messages::workflow::StageStarted;
//! use llm_launchpad::observability::messages::StructuredLog;
//!
//! let msg = StageStarted {
//!     stage: "dependencies",
//!     position: 1,
//!     total: 6,
//! };
//!
//! let span = msg.span("stage");
//! let _guard = span.enter();
//! msg.log();
//! ```

use tracing::Span;

pub mod launch;
pub mod provisioning;
pub mod validation;
pub mod workflow;

/// A log message that knows its own level and structured fields.
pub trait StructuredLog {
    /// Emit the message as a tracing event.
    fn log(&self);

    /// Open a span carrying the message's fields.
    fn span(&self, name: &str) -> Span;
}
