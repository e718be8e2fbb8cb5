// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use llm_launchpad::backends::{HttpFetcher, SystemRunner};
use llm_launchpad::config::{load_and_validate_config, Config, ConfigOverrides};
use llm_launchpad::engine::{describe, WorkflowBuilder, WorkflowContext, WorkflowRun};
use llm_launchpad::errors::{StageError, WorkflowError, EXIT_FAILURE};
use llm_launchpad::observability::init_tracing;
use llm_launchpad::stages::LaunchCommand;
use llm_launchpad::traits::CommandSpec;

const DEFAULT_CONFIG_PATH: &str = "configs/launch.yaml";

/// Provision a conda environment and launch an LLM inference server.
#[derive(Parser)]
#[command(name = "llm-launchpad", version, about)]
struct Cli {
    /// Debug-level logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Provision everything, then run the server until it exits or Ctrl-C
    Run(LaunchArgs),
    /// Show the stages and the server command line without running anything
    Plan(LaunchArgs),
    /// Load and validate the configuration only
    Validate(LaunchArgs),
}

#[derive(Args)]
struct LaunchArgs {
    /// Workflow configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
    /// Model path or hub id
    #[arg(long)]
    model: Option<String>,
    /// Tensor parallel degree
    #[arg(long)]
    tp: Option<u32>,
    #[arg(long)]
    port: Option<u16>,
    #[arg(long)]
    host: Option<String>,
    /// Conda environment name
    #[arg(long)]
    env_name: Option<String>,
}

impl LaunchArgs {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            model_path: self.model.clone(),
            tensor_parallel: self.tp,
            port: self.port,
            host: self.host.clone(),
            environment_name: self.env_name.clone(),
        }
    }

    fn load(&self) -> anyhow::Result<Config> {
        load_and_validate_config(&self.config, &self.overrides())
            .with_context(|| format!("failed to load {}", self.config.display()))
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(if cli.verbose { "debug" } else { "info" });

    let result = match cli.command {
        Command::Run(args) => run(args).await,
        Command::Plan(args) => plan(args),
        Command::Validate(args) => validate(args),
    };

    match result {
        Ok(code) => exit_code(code),
        Err(e) => {
            eprintln!("❌ {:#}", e);
            exit_code(EXIT_FAILURE)
        }
    }
}

fn exit_code(code: i32) -> ExitCode {
    ExitCode::from(u8::try_from(code).unwrap_or(EXIT_FAILURE as u8))
}

async fn run(args: LaunchArgs) -> anyhow::Result<i32> {
    let config = Arc::new(args.load()?);
    print_summary(&config);

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let mut ctx = WorkflowContext::new(
        config,
        Arc::new(SystemRunner::new()),
        Arc::new(HttpFetcher::new()),
        cancel,
    );
    let run = WorkflowBuilder::standard().execute(&mut ctx).await;
    print_report(&run);

    Ok(run.exit_code())
}

fn plan(args: LaunchArgs) -> anyhow::Result<i32> {
    let config = args.load()?;
    print_summary(&config);

    println!("📋 Stages:");
    for (i, name) in WorkflowBuilder::standard().stage_names().iter().enumerate() {
        println!("   {}. {}", i + 1, name);
    }
    println!();

    let launch = LaunchCommand::from_config(&config.server);
    println!("🖥️  Server command:");
    println!("   {}", CommandSpec::new("python").args(launch.args().iter().cloned()));
    for (key, value) in &config.server.env {
        println!("   with {}={}", key, value);
    }
    Ok(0)
}

fn validate(args: LaunchArgs) -> anyhow::Result<i32> {
    args.load()?;
    println!("✅ {} is valid", args.config.display());
    Ok(0)
}

fn print_summary(config: &Config) {
    let server = &config.server;
    let packages = &config.packages;
    println!("🚀 LLM Launchpad");
    println!("═══════════════════════════════════");
    println!(
        "Environment: {} (python {})",
        config.environment.name, config.environment.python_version
    );
    println!("Install dir: {}", config.runtime.install_dir().display());
    println!(
        "Packages:    {} [{}], {}",
        packages.numerical.requirement(),
        packages.numerical_index_url(),
        packages.serving.requirement()
    );
    println!("Model:       {}", server.model_path);
    println!(
        "Server:      {}:{} tp={} dtype={}",
        server.host, server.port, server.tensor_parallel, server.dtype
    );
    println!();
}

fn print_report(run: &WorkflowRun) {
    println!();
    println!("📊 Stage report:");
    for report in &run.stages {
        println!(
            "   ✅ {:<14} {} ({:.2?})",
            report.stage,
            describe(&report.outcome),
            report.duration
        );
    }

    match &run.error {
        Some(WorkflowError::StageFailed { stage, source }) => {
            println!("   ❌ {:<14} {}", stage, source);
            if let StageError::ActivationFailed { diagnostics, .. } = source {
                println!();
                println!("Activation diagnostics:");
                println!("{}", diagnostics);
            }
        }
        Some(error @ WorkflowError::Interrupted { .. }) => println!("   ⏹️  {}", error),
        None => {}
    }

    if let Some(error) = &run.teardown_error {
        println!("   Note: teardown did not complete: {}", error);
    }
    println!("Exit status: {}", run.exit_code());
}
