mod cli;
mod config;
mod exec;
mod progress;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use cli::{Cli, Commands, merge_config};
use config::NuLinkConfig;
use nulink_lib::progress::no_op_progress_callback;
use nulink_lib::{NuLinkFlasher, ProcessRunner, ToolLocation};
use std::process;

fn load_config(path: &str) -> Result<NuLinkConfig> {
    let config = NuLinkConfig::from_file(path)
        .map_err(|e| anyhow!("Failed to load config file '{}': {}", path, e))?;
    config
        .validate()
        .map_err(|e| anyhow!("Invalid config file '{}': {}", path, e))?;
    Ok(config)
}

fn resolve_tool(tool: Option<&str>) -> Result<ToolLocation> {
    let location = match tool {
        Some(path) => ToolLocation::existing(path),
        None => ToolLocation::detect(),
    };
    location.context("Cannot locate the NuLink command tool")
}

fn run(args: Cli) -> Result<()> {
    let config = args.config.as_deref().map(load_config).transpose()?;
    let merged = merge_config(&args, config)?;

    // Code size is computed locally and works without the tool installed.
    if let Commands::Size(params) = &args.command {
        return exec::print_code_size(&params.file);
    }

    let location = resolve_tool(merged.tool.as_deref())?;
    tracing::info!("using NuLink tool at {}", location);

    let progress = if merged.quiet {
        no_op_progress_callback()
    } else {
        progress::create_progress_callback()
    };

    let runner = ProcessRunner::with_timeout(merged.timeout);
    let flasher =
        NuLinkFlasher::with_runner(location, Box::new(runner)).progress_callback(progress);

    exec::execute_command(&args.command, &flasher, &merged)
}

fn main() {
    // Log level can be controlled by setting the RUST_LOG environment variable, e.g.:
    // RUST_LOG=debug, RUST_LOG=nulink_lib=trace, RUST_LOG=info
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("off"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let args = Cli::parse();

    if let Err(e) = run(args) {
        eprintln!("Error: {:?}", e);
        process::exit(1);
    }
}
