//! Shared transport bootstrap for the MCP servers in this workspace.
//!
//! Binary servers call `run()` and the `--stdio` flag picks the transport.
//! Each transport installs its own log target: HTTP logs to stdout, stdio
//! logs to stderr because stdout carries the protocol.

use pmcp::server::streamable_http_server::{StreamableHttpServer, StreamableHttpServerConfig};
use pmcp::Server;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// CLI arguments shared across all MCP servers.
#[derive(Debug, Clone, clap::Args)]
pub struct CliArgs {
    /// Host to bind to
    #[clap(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Port to bind to
    #[clap(long, default_value = "3100")]
    pub port: u16,

    /// Serve over standard input/output instead of HTTP
    #[clap(long)]
    pub stdio: bool,
}

/// Run the server over whichever transport `args` selects.
pub async fn run(server: Server, args: &CliArgs) -> anyhow::Result<()> {
    if args.stdio {
        run_stdio(server).await
    } else {
        run_http(server, args).await
    }
}

/// Run an MCP server over Streamable HTTP transport.
///
/// Logs to stdout, binds to the given host:port, and serves `/mcp` until the
/// server task ends.
pub async fn run_http(server: Server, args: &CliArgs) -> anyhow::Result<()> {
    init_logging(LogTarget::Stdout);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;

    tracing::info!(host = %args.host, port = args.port, "Starting MCP HTTP server");

    let server = Arc::new(Mutex::new(server));

    let config = StreamableHttpServerConfig {
        session_id_generator: None,
        enable_json_response: true,
        event_store: None,
        on_session_initialized: None,
        on_session_closed: None,
        http_middleware: None,
    };

    let http_server = StreamableHttpServer::with_config(addr, server, config);
    let (_bound_addr, server_handle) = http_server.start().await?;

    tracing::info!("MCP server listening on http://{}:{}/mcp", args.host, args.port);

    server_handle.await?;

    Ok(())
}

/// Run an MCP server over stdio.
///
/// stdout carries protocol frames only, so logs go to stderr.
pub async fn run_stdio(server: Server) -> anyhow::Result<()> {
    init_logging(LogTarget::Stderr);

    tracing::info!("Starting MCP stdio server");

    server.run_stdio().await?;

    Ok(())
}

/// Where the fmt layer writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget {
    Stdout,
    Stderr,
}

/// Install the global tracing subscriber. `RUST_LOG` overrides the `info` default.
///
/// Safe to call more than once; later calls are no-ops.
pub fn init_logging(target: LogTarget) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());

    let registry = tracing_subscriber::registry().with(filter);

    let _ = match target {
        LogTarget::Stdout => registry.with(tracing_subscriber::fmt::layer()).try_init(),
        LogTarget::Stderr => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init(),
    };
}
