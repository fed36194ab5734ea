//! Lighthouse Audit MCP Server binary.
//!
//! Provides two subcommands:
//! - `serve` (default): Start the MCP server over Streamable HTTP or stdio
//! - `audit`: Run one audit and print the normalized result as JSON

use anyhow::Context;
use clap::{Parser, Subcommand};
use mcp_lighthouse_core::browser::ChromeLauncher;
use mcp_lighthouse_core::cli::LaunchArgs;
use mcp_lighthouse_core::engine::LighthouseCli;
use mcp_lighthouse_core::launch_config::LaunchConfig;
use mcp_lighthouse_core::options::{Category, Device};
use mcp_lighthouse_core::runner::AuditRunner;
use server_common::LogTarget;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(
    name = "lighthouse-server",
    about = "Lighthouse Audit MCP Server",
    args_conflicts_with_subcommands = true
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Serve options when no subcommand is given
    #[command(flatten)]
    serve: ServeArgs,
}

#[derive(Subcommand)]
enum Command {
    /// Start the MCP server (default when no subcommand given)
    Serve(ServeArgs),

    /// Audit one URL and print the normalized result
    Audit(AuditArgs),
}

/// Where the browser and the audit engine binaries live.
#[derive(clap::Args, Clone)]
struct ToolPaths {
    /// Custom Chrome/Chromium binary path
    #[arg(long)]
    chrome_path: Option<PathBuf>,

    /// Lighthouse CLI binary
    #[arg(long, env = "LIGHTHOUSE_PATH", default_value = "lighthouse")]
    lighthouse_path: String,
}

#[derive(clap::Args)]
struct ServeArgs {
    #[command(flatten)]
    server: server_common::CliArgs,

    #[command(flatten)]
    launch: LaunchArgs,

    #[command(flatten)]
    paths: ToolPaths,
}

#[derive(clap::Args)]
struct AuditArgs {
    /// URL to audit
    #[arg(long)]
    url: String,

    /// Device to emulate
    #[arg(long, default_value = "desktop")]
    device: Device,

    /// Comma-separated categories (default: all)
    #[arg(long, value_delimiter = ',')]
    categories: Vec<Category>,

    /// Apply the slow-network throttling profile
    #[arg(long)]
    throttling: bool,

    #[command(flatten)]
    launch: LaunchArgs,

    #[command(flatten)]
    paths: ToolPaths,
}

fn build_runner(launch: LaunchArgs, paths: ToolPaths) -> Arc<AuditRunner> {
    let config = LaunchConfig::merged(launch.into_settings());
    Arc::new(AuditRunner::new(
        config,
        Arc::new(ChromeLauncher::new(paths.chrome_path)),
        Arc::new(LighthouseCli::new(paths.lighthouse_path)),
    ))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Command::Serve(args)) => run_serve(args).await,
        Some(Command::Audit(args)) => run_audit(args).await,
        None => run_serve(cli.serve).await,
    }
}

async fn run_serve(args: ServeArgs) -> anyhow::Result<()> {
    let runner = build_runner(args.launch, args.paths);
    let server = mcp_lighthouse_core::build_server(runner)?;

    tokio::select! {
        result = server_common::run(server, &args.server) => result,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Ctrl+C received, shutting down");
            Ok(())
        }
    }
}

async fn run_audit(args: AuditArgs) -> anyhow::Result<()> {
    server_common::init_logging(LogTarget::Stderr);

    let categories = (!args.categories.is_empty()).then_some(args.categories);
    let runner = build_runner(args.launch, args.paths);

    let result = runner
        .run_formatted_audit(&args.url, categories.as_deref(), args.device, args.throttling)
        .await
        .with_context(|| format!("Audit of {} failed", args.url))?;

    println!("{}", serde_json::to_string_pretty(&result)?);

    Ok(())
}
