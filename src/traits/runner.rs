use async_trait::async_trait;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use tokio_util::sync::CancellationToken;

use crate::errors::{CommandError, FetchError};

/// A fully described external command: program, arguments and the
/// environment variables layered on top of the inherited environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub env: BTreeMap<String, String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: BTreeMap::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn envs(mut self, vars: &BTreeMap<String, String>) -> Self {
        self.env
            .extend(vars.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }
}

impl fmt::Display for CommandSpec {
    /// Shell-like rendering used in logs and dry runs; overlay variables are not shown.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", quote(&self.program))?;
        for arg in &self.args {
            write!(f, " {}", quote(arg))?;
        }
        Ok(())
    }
}

fn quote(word: &str) -> String {
    let plain = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:,+@%".contains(c));
    if plain {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', r"'\''"))
    }
}

/// Captured result of a command that ran to completion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// `None` when the child was terminated by a signal
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// How a supervised long-running child ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildOutcome {
    /// The child exited by itself
    Exited(Option<i32>),
    /// Cancellation fired; the child was killed and reaped
    Interrupted,
}

/// Runs external programs on behalf of the workflow stages.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run to completion capturing stdout/stderr. A non-zero exit is not an
    /// error here; callers that use this for checks inspect the code.
    async fn output(&self, cmd: &CommandSpec) -> Result<CommandOutput, CommandError>;

    /// Run to completion with inherited stdio. A non-zero exit is an error.
    async fn run(&self, cmd: &CommandSpec) -> Result<(), CommandError>;

    /// Run a long-lived child with inherited stdio, blocking until it exits
    /// or `cancel` fires.
    async fn supervise(
        &self,
        cmd: &CommandSpec,
        cancel: &CancellationToken,
    ) -> Result<ChildOutcome, CommandError>;
}

/// Downloads installer artifacts.
#[async_trait]
pub trait ArtifactFetcher: Send + Sync {
    /// Download `url` into `dest`, returning the number of bytes written.
    async fn fetch(&self, url: &str, dest: &Path) -> Result<u64, FetchError>;
}
