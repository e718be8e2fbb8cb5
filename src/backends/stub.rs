// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::engine::WorkflowContext;
use crate::errors::{CommandError, FetchError, StageError};
use crate::traits::{
    ArtifactFetcher, ChildOutcome, CommandOutput, CommandRunner, CommandSpec, Stage, StageOutcome,
};

/// Scripted reply for a matching command
#[derive(Debug, Clone)]
pub enum Reply {
    Output(CommandOutput),
    Exit(Option<i32>),
}

impl Reply {
    pub fn ok() -> Self {
        Reply::Exit(Some(0))
    }

    pub fn fail(code: i32) -> Self {
        Reply::Exit(Some(code))
    }

    pub fn stdout(text: &str) -> Self {
        Reply::Output(CommandOutput {
            code: Some(0),
            stdout: text.to_string(),
            stderr: String::new(),
        })
    }

    fn code(&self) -> Option<i32> {
        match self {
            Reply::Output(output) => output.code,
            Reply::Exit(code) => *code,
        }
    }

    fn into_output(self) -> CommandOutput {
        match self {
            Reply::Output(output) => output,
            Reply::Exit(code) => CommandOutput {
                code,
                ..Default::default()
            },
        }
    }
}

struct Rule {
    pattern: String,
    replies: VecDeque<Reply>,
}

/// A command runner that records every invocation and answers from a script.
///
/// Rules match when the rendered command line contains the pattern; the
/// first matching rule wins. A rule with several replies hands them out in
/// order and repeats the last one. Unmatched commands succeed silently.
#[derive(Default)]
pub struct ScriptedRunner {
    rules: Mutex<Vec<Rule>>,
    calls: Mutex<Vec<CommandSpec>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(self, pattern: &str, reply: Reply) -> Self {
        self.on_sequence(pattern, vec![reply])
    }

    pub fn on_sequence(self, pattern: &str, replies: Vec<Reply>) -> Self {
        self.rules
            .lock()
            .expect("rules lock poisoned")
            .push(Rule {
                pattern: pattern.to_string(),
                replies: replies.into(),
            });
        self
    }

    /// Every command seen so far, in order.
    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls.lock().expect("calls lock poisoned").clone()
    }

    /// Rendered command lines seen so far.
    pub fn command_lines(&self) -> Vec<String> {
        self.calls().iter().map(|c| c.to_string()).collect()
    }

    pub fn saw(&self, pattern: &str) -> bool {
        self.command_lines().iter().any(|line| line.contains(pattern))
    }

    fn reply_for(&self, spec: &CommandSpec) -> Reply {
        self.calls
            .lock()
            .expect("calls lock poisoned")
            .push(spec.clone());

        let line = spec.to_string();
        let mut rules = self.rules.lock().expect("rules lock poisoned");
        for rule in rules.iter_mut() {
            if line.contains(&rule.pattern) {
                return if rule.replies.len() > 1 {
                    rule.replies.pop_front().unwrap_or_else(Reply::ok)
                } else {
                    rule.replies.front().cloned().unwrap_or_else(Reply::ok)
                };
            }
        }
        Reply::ok()
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn output(&self, spec: &CommandSpec) -> Result<CommandOutput, CommandError> {
        Ok(self.reply_for(spec).into_output())
    }

    async fn run(&self, spec: &CommandSpec) -> Result<(), CommandError> {
        match self.reply_for(spec).code() {
            Some(0) => Ok(()),
            code => Err(CommandError::NonZeroExit {
                command: spec.to_string(),
                code,
            }),
        }
    }

    async fn supervise(
        &self,
        spec: &CommandSpec,
        cancel: &CancellationToken,
    ) -> Result<ChildOutcome, CommandError> {
        let reply = self.reply_for(spec);
        if cancel.is_cancelled() {
            return Ok(ChildOutcome::Interrupted);
        }
        Ok(ChildOutcome::Exited(reply.code()))
    }
}

/// A fetcher that writes a fixed payload and records requested URLs.
#[derive(Default)]
pub struct RecordingFetcher {
    fetched: Mutex<Vec<(String, PathBuf)>>,
}

impl RecordingFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fetched(&self) -> Vec<(String, PathBuf)> {
        self.fetched.lock().expect("fetch lock poisoned").clone()
    }
}

#[async_trait]
impl ArtifactFetcher for RecordingFetcher {
    async fn fetch(&self, url: &str, dest: &Path) -> Result<u64, FetchError> {
        self.fetched
            .lock()
            .expect("fetch lock poisoned")
            .push((url.to_string(), dest.to_path_buf()));

        let payload = b"#!/bin/sh\nexit 0\n";
        tokio::fs::write(dest, payload)
            .await
            .map_err(|source| FetchError::Write {
                path: dest.to_path_buf(),
                source,
            })?;
        Ok(payload.len() as u64)
    }
}

/// A stage that always fails, for exercising error handling
pub struct FailingStage {
    pub name: &'static str,
}

#[async_trait]
impl Stage for FailingStage {
    async fn run(&self, _ctx: &mut WorkflowContext) -> Result<StageOutcome, StageError> {
        Err(StageError::UnexpectedOutput {
            command: self.name.to_string(),
            reason: "simulated stage failure".to_string(),
        })
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

/// A stage that records that it ran and does nothing else
pub struct NoopStage {
    pub name: &'static str,
}

#[async_trait]
impl Stage for NoopStage {
    async fn run(&self, _ctx: &mut WorkflowContext) -> Result<StageOutcome, StageError> {
        Ok(StageOutcome::AlreadySatisfied("nothing to do".to_string()))
    }

    fn name(&self) -> &'static str {
        self.name
    }
}
