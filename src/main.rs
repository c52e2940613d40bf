use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod config;
mod github;
mod preflight;
mod prompt;
mod provision;
mod runner;
mod steps;
mod templates;
#[cfg(test)]
mod testing;
mod workflow;

use cli::{Command, LoadbalancerCommand, ProjectCommand, RootArgs};

fn main() -> Result<()> {
    let RootArgs {
        command,
        config,
        verbose,
    } = RootArgs::parse();
    init_tracing(verbose);

    match command {
        Command::Init(_) => workflow::run_init(),
        Command::Setup(args) => workflow::run_setup(&args, &config),
        Command::Project(args) => match args.command {
            ProjectCommand::Create(args) => workflow::run_project_create(&args, &config),
        },
        Command::Loadbalancer(args) => match args.command {
            LoadbalancerCommand::Setup(args) => workflow::run_loadbalancer_setup(&args, &config),
        },
    }
}

/// Logs go to stderr; `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
