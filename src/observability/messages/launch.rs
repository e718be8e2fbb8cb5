// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for the inference server process lifecycle.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use std::time::Duration;
use tracing::Span;

/// Server process about to start.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use llm_launchpad::observability::messages::launch::ServerLaunching;
///
/// let msg = ServerLaunching {
///     command: "python -m sglang.launch_server --model-path M --tp 2",
///     host: "0.0.0.0",
///     port: 30000,
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct ServerLaunching<'a> {
    pub command: &'a str,
    pub host: &'a str,
    pub port: u16,
}

impl Display for ServerLaunching<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Launching server on {}:{}: {}",
            self.host, self.port, self.command
        )
    }
}

impl StructuredLog for ServerLaunching<'_> {
    fn log(&self) {
        tracing::info!(
            command = self.command,
            host = self.host,
            port = self.port,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "server",
            span_name = name,
            host = self.host,
            port = self.port,
        )
    }
}

/// Server process exited by itself.
///
/// # Log Level
/// `info!` on status 0, `error!` otherwise
pub struct ServerExited {
    pub code: Option<i32>,
    pub uptime: Duration,
}

impl Display for ServerExited {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self.code {
            Some(code) => write!(
                f,
                "Server exited with status {} after {:?}",
                code, self.uptime
            ),
            None => write!(f, "Server terminated by a signal after {:?}", self.uptime),
        }
    }
}

impl StructuredLog for ServerExited {
    fn log(&self) {
        if self.code == Some(0) {
            tracing::info!(
                code = self.code,
                uptime_ms = self.uptime.as_millis() as u64,
                "{}", self
            );
        } else {
            tracing::error!(
                code = self.code,
                uptime_ms = self.uptime.as_millis() as u64,
                "{}", self
            );
        }
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("server_exited", span_name = name, code = self.code)
    }
}

/// Server stopped because the operator interrupted the workflow.
///
/// # Log Level
/// `info!` - Expected way to stop a long-running server
pub struct ServerInterrupted {
    pub uptime: Duration,
}

impl Display for ServerInterrupted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Server interrupted after {:?}, child stopped", self.uptime)
    }
}

impl StructuredLog for ServerInterrupted {
    fn log(&self) {
        tracing::info!(uptime_ms = self.uptime.as_millis() as u64, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("server_interrupted", span_name = name)
    }
}
