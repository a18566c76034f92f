//cargo run --package plot --bin plot_server -- --transport sse --bind 127.0.0.1:50052
use std::path::PathBuf;

use clap::Parser;
use plot::{config::ServerConfig, PlotMcpServer, Transport};
use rmcp::{transport::{sse_server::SseServer, stdio}, ServiceExt};
use tracing_subscriber::{util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "plot_server", version, about = "Floor plan polygon extraction MCP server")]
struct Args {
    /// TOML file with transport, bind and max_workers
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(short, long)]
    transport: Option<Transport>,

    /// Listen address for the SSE transport
    #[arg(short, long)]
    bind: Option<String>,

    #[arg(short, long)]
    max_workers: Option<usize>,
}

impl Args {
    fn server_config(&self) -> color_eyre::Result<ServerConfig> {
        let mut config = match &self.config {
            Some(path) => ServerConfig::from_toml_file(path)?,
            None => ServerConfig::default(),
        };
        if let Some(transport) = self.transport {
            config.transport = transport;
        }
        if let Some(bind) = &self.bind {
            config.bind = bind.clone();
        }
        if let Some(max_workers) = self.max_workers {
            config.max_workers = max_workers;
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    // stdout carries the MCP protocol on stdio, keep logs on stderr
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let config = Args::parse().server_config()?;
    tracing::info!(
        transport = %config.transport,
        max_workers = config.max_workers,
        version = plot::VERSION,
        "Starting Navign plot server"
    );

    let server = PlotMcpServer::with_max_workers(config.max_workers);

    match config.transport {
        Transport::Stdio => serve_stdio(server).await,
        Transport::Sse => serve_sse(server, &config.bind).await,
    }
}

async fn serve_stdio(server: PlotMcpServer) -> color_eyre::Result<()> {
    let service = match server.serve(stdio()).await {
        Ok(service) => service,
        Err(e) => {
            tracing::error!("Failed to start MCP server: {:?}", e);
            return Err(e.into());
        }
    };

    tracing::info!("MCP server started, listening on stdio");

    tokio::select! {
        result = service.waiting() => {
            match result {
                Ok(reason) => tracing::info!("MCP server completed: {:?}", reason),
                Err(e) => {
                    tracing::error!("MCP server error: {:?}", e);
                    return Err(e.into());
                }
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received Ctrl+C, shutting down gracefully");
        }
    }

    tracing::info!("MCP server shut down");
    Ok(())
}

async fn serve_sse(server: PlotMcpServer, bind: &str) -> color_eyre::Result<()> {
    let addr = bind.parse()?;
    let cancel = SseServer::serve(addr)
        .await?
        .with_service(move || server.clone());

    tracing::info!(%addr, "MCP server started, listening for SSE connections");

    tokio::signal::ctrl_c().await?;
    tracing::info!("Received Ctrl+C, shutting down gracefully");
    cancel.cancel();

    tracing::info!("MCP server shut down");
    Ok(())
}
