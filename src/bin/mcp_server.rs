//! Process-capture MCP Server
//!
//! This binary provides a Model Context Protocol (MCP) server for process capture.
//! MCP clients feed it captured events and commands, and read back generated scripts,
//! documentation and diagrams.

use process_capture::mcp::CaptureServer;
use process_capture::{CaptureConfig, CaptureEngine, ProcessGraph};
use clap::{Parser, ValueEnum};
use rmcp::{ServiceExt, transport::stdio};
use std::path::PathBuf;

#[cfg(feature = "mcp-server")]
use rmcp::transport::{
    sse_server::{SseServer, SseServerConfig},
    streamable_http_server::{StreamableHttpService, session::local::LocalSessionManager},
};

#[cfg(feature = "mcp-server")]
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Transport {
    /// Standard input/output transport (default)
    Stdio,
    /// Server-Sent Events transport
    Sse,
    /// HTTP streamable transport
    Http,
}

#[derive(Parser)]
#[command(name = "process-capture-mcp")]
#[command(version)]
#[command(about = "Process capture MCP server", long_about = None)]
struct Cli {
    /// JSON capture configuration (thresholds, filters)
    #[arg(long, short = 'c', value_name = "FILE")]
    config: Option<PathBuf>,

    /// Persisted graph to continue
    #[arg(long, value_name = "FILE")]
    graph: Option<PathBuf>,

    /// Reopen the recording window automatically after a soft timeout
    #[arg(long)]
    continuous: bool,

    /// Transport type to use
    #[arg(long, short = 't', value_enum, default_value = "stdio")]
    transport: Transport,

    /// Port for SSE or HTTP transport (default: 3000)
    #[arg(long, short = 'p', default_value = "3000")]
    port: u16,

    /// SSE endpoint path (default: /sse)
    #[arg(long, default_value = "/sse")]
    sse_path: String,

    /// SSE POST path for messages (default: /message)
    #[arg(long, default_value = "/message")]
    sse_post_path: String,

    /// HTTP streamable endpoint path (default: /mcp)
    #[arg(long, default_value = "/mcp")]
    http_path: String,
}

fn build_server(cli: &Cli) -> Result<CaptureServer, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => CaptureConfig::from_file(path)?,
        None => CaptureConfig::default(),
    };
    if cli.continuous {
        config = config.continuous(true);
    }

    let mut engine = CaptureEngine::new(config);
    if let Some(path) = &cli.graph {
        let json = std::fs::read_to_string(path)?;
        engine = engine.with_graph(ProcessGraph::from_json(&json)?);
        eprintln!("Loaded graph: {}", path.display());
    }
    Ok(CaptureServer::with_engine(engine))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let cli = Cli::parse();

    eprintln!("Process-capture MCP Server v{}", env!("CARGO_PKG_VERSION"));
    if let Some(ref path) = cli.config {
        eprintln!("Config: {}", path.display());
    }

    // One engine for every connection
    let service = build_server(&cli)?;

    // Route to appropriate transport
    match cli.transport {
        Transport::Stdio => {
            eprintln!("Transport: stdio");
            eprintln!("Ready to accept MCP connections via stdio");
            let server = service.serve(stdio()).await?;
            let quit_reason = server.waiting().await?;
            eprintln!("Server quit with reason: {:?}", quit_reason);
        }
        Transport::Sse => {
            eprintln!("Transport: SSE");
            eprintln!("Port: {}", cli.port);
            eprintln!("SSE path: {}", cli.sse_path);
            eprintln!("SSE POST path: {}", cli.sse_post_path);

            let bind_addr = format!("127.0.0.1:{}", cli.port);

            // Create SSE server configuration
            let config = SseServerConfig {
                bind: bind_addr.parse()?,
                sse_path: cli.sse_path.clone(),
                post_path: cli.sse_post_path.clone(),
                ct: CancellationToken::new(),
                sse_keep_alive: None,
            };

            let (sse_server, router) = SseServer::new(config);

            eprintln!(
                "Ready to accept MCP connections at http://{}{}",
                bind_addr, cli.sse_path
            );

            let _cancellation_token = sse_server.with_service(move || service.clone());

            let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
            axum::serve(listener, router.into_make_service()).await?;
        }
        Transport::Http => {
            eprintln!("Transport: HTTP streamable");
            eprintln!("Port: {}", cli.port);
            eprintln!("HTTP path: {}", cli.http_path);

            let bind_addr = format!("127.0.0.1:{}", cli.port);

            let service_factory = move || Ok::<_, std::io::Error>(service.clone());

            let http_service = StreamableHttpService::new(
                service_factory,
                LocalSessionManager::default().into(),
                Default::default(),
            );

            let router = axum::Router::new().nest_service(&cli.http_path, http_service);

            eprintln!(
                "Ready to accept MCP connections at http://{}{}",
                bind_addr, cli.http_path
            );

            let listener = tokio::net::TcpListener::bind(bind_addr).await?;
            axum::serve(listener, router).await?;
        }
    }

    Ok(())
}
