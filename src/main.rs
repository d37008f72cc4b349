//! Plain-HTTP Forwarding Proxy
//!
//! Point a browser or HTTP client at this process as its HTTP proxy. Each
//! request is forwarded to the origin it names and the response is
//! streamed back untouched.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌──────────────────────────────────────────────────────┐
//!                    │                    FORWARD PROXY                      │
//!                    │                                                       │
//!   Client Request   │  ┌──────────┐   ┌───────────┐   ┌────────┐            │
//!   ─────────────────┼─▶│   net    │──▶│   http    │──▶│ target │            │
//!                    │  │ listener │   │  request  │   │resolver│            │
//!                    │  └──────────┘   └───────────┘   └───┬────┘            │
//!                    │                                     │                 │
//!                    │                                     ▼                 │
//!                    │                                ┌─────────┐            │
//!                    │                                │ rewrite │            │
//!                    │                                └────┬────┘            │
//!                    │                                     ▼                 │
//!   Client Response  │                                ┌─────────┐            │
//!   ◀────────────────┼────────────────────────────────│  relay  │◀───────────┼──── Origin
//!                    │   (or synthesized 502)         └─────────┘            │     Server
//!                    │                                                       │
//!                    │  config · lifecycle · observability · resilience      │
//!                    └──────────────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use forward_proxy::config::{load_config, validation::validate_config, ProxyConfig};
use forward_proxy::lifecycle::{drain, wait_for_signal, Shutdown};
use forward_proxy::net::Listener;
use forward_proxy::observability::logging;
use forward_proxy::proxy::SessionSettings;

#[derive(Parser, Debug)]
#[command(name = "forward-proxy", version)]
#[command(about = "Plain-HTTP forwarding proxy", long_about = None)]
struct Cli {
    /// TOML configuration file. Built-in defaults apply without one.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on, overriding the configured bind address's port.
    #[arg(short, long)]
    port: Option<u16>,

    /// Log level (trace, debug, info, warn, error) when RUST_LOG is unset.
    #[arg(long)]
    log_level: Option<String>,
}

fn build_config(cli: &Cli) -> Result<ProxyConfig, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ProxyConfig::default(),
    };

    if let Some(port) = cli.port {
        let mut addr: SocketAddr = config.listener.bind_address.parse()?;
        addr.set_port(port);
        config.listener.bind_address = addr.to_string();
    }
    if let Some(level) = &cli.log_level {
        config.observability.log_level = level.clone();
    }

    validate_config(&config).map_err(|errors| {
        errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    })?;
    Ok(config)
}

async fn run(config: ProxyConfig) -> Result<(), Box<dyn std::error::Error>> {
    let listener = Listener::bind(&config.listener)?;
    let local_addr = listener.local_addr()?;

    tracing::info!(address = %local_addr, "HTTP proxy listening");
    tracing::info!(
        "Set the browser HTTP proxy to localhost:{} to route traffic through it",
        local_addr.port()
    );

    let shutdown = Shutdown::new();
    let server = tokio::spawn(listener.run(SessionSettings::from(&config), shutdown.subscribe()));

    let signal = wait_for_signal().await?;
    tracing::info!(signal, "Shutdown signal received, proxy stopping");
    shutdown.trigger();

    let sessions = server.await?;
    if sessions.is_empty() {
        return Ok(());
    }

    let grace = config.lifecycle.shutdown_grace();
    tracing::info!(
        in_flight = sessions.len(),
        grace_secs = ?grace.map(|g| g.as_secs()),
        "Waiting for in-flight sessions"
    );
    tokio::select! {
        abandoned = drain(sessions, grace) => {
            if abandoned > 0 {
                tracing::warn!(abandoned, "Grace period expired, closing remaining sessions");
            }
        }
        _ = wait_for_signal() => {
            tracing::warn!("Second signal received, exiting immediately");
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match build_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("forward-proxy: invalid configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = logging::init(&config.observability.log_level) {
        eprintln!("forward-proxy: failed to initialize logging: {}", e);
        return ExitCode::FAILURE;
    }

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "forward-proxy starting");

    match run(config).await {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Proxy terminated");
            ExitCode::FAILURE
        }
    }
}
