mod greetings;

use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use anyhow::{Context, Result};
use axum::http::Method;
use clap::{Parser, Subcommand};
use mediator_endpoints::{EndpointHost, EndpointsConfig, HandlerRegistry};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

const DEFAULT_PORT: u16 = 8087;

/// Serves mediator request handlers as conventionally named HTTP endpoints
#[derive(Parser)]
#[command(name = "mediator-endpoints-server")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Print effective configuration (YAML) and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    Run,
    /// Build every endpoint, print the routing table and exit
    Check,
}

fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Reported before logging is set up.
    if let Some(path) = &cli.config
        && !path.is_file()
    {
        anyhow::bail!("config file does not exist: {}", path.display());
    }

    init_logging(cli.verbose);

    let config = EndpointsConfig::load(cli.config.as_deref())?;

    if cli.print_config {
        println!("{}", serde_saphyr::to_string(&config)?);
        return Ok(());
    }

    let host = EndpointHost::from_config(&config)
        .registry(HandlerRegistry::discover())
        .build()?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => serve(&host, cli.port.unwrap_or(DEFAULT_PORT)).await,
        Commands::Check => {
            host.router()?;
            print_routes(&host);
            Ok(())
        }
    }
}

async fn serve(host: &EndpointHost, port: u16) -> Result<()> {
    let router = host.router()?.layer(TraceLayer::new_for_http());
    let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, port));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, endpoints = host.models().len(), "HTTP server bound");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %err, "failed to listen for shutdown signal");
            }
            tracing::info!("HTTP server shutting down gracefully");
        })
        .await
        .context("HTTP server failed")
}

fn print_routes(host: &EndpointHost) {
    println!("Configuration is valid");
    for route in host.routes() {
        let methods = route.methods.map_or_else(
            || "ANY".to_owned(),
            |methods| {
                methods
                    .iter()
                    .map(Method::as_str)
                    .collect::<Vec<_>>()
                    .join(",")
            },
        );
        println!(
            "{methods:<8} {} -> {}.{}",
            route.path, route.endpoint, route.action
        );
    }
}
