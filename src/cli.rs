//! Command-line interface.

use std::io;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use hopchain_chain::{Conn, Registry};
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{build_router, load_config};

#[derive(Parser, Debug)]
#[command(
    name = "hopchain",
    version,
    about = "Route connections through chains of proxy hops",
    propagate_version = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the route a destination would take, without dialing.
    Route(RouteArgs),

    /// Dial a destination through the router and pipe stdin/stdout over it.
    Dial(DialArgs),
}

#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    /// Config file path (toml or json).
    #[arg(short, long, default_value = "hopchain.toml")]
    pub config: PathBuf,

    /// Log level override (e.g. "info", "debug", "hopchain_chain=trace").
    #[arg(long)]
    pub log_level: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct RouteArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Destination, host:port.
    pub address: String,

    #[arg(long, default_value = "tcp")]
    pub network: String,
}

#[derive(Args, Debug, Clone)]
pub struct DialArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Destination, host:port.
    pub address: String,

    #[arg(long, default_value = "tcp")]
    pub network: String,
}

pub async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Command::Route(args) => run_route(args).await,
        Command::Dial(args) => run_dial(args).await,
    }
}

async fn run_route(args: RouteArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(&args.common.config)?;
    init_tracing(args.common.log_level.as_deref());

    let router = build_router(&config, &Registry::with_builtins())?;
    let route = router.route(&args.network, &args.address);
    if route.is_empty() {
        println!("direct > {}", args.address);
        return Ok(());
    }
    for (i, node) in route.path().iter().enumerate() {
        println!("{i}: {} {}", node.name(), node.addr());
    }
    println!("{}", route.describe(&args.address));
    Ok(())
}

async fn run_dial(args: DialArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(&args.common.config)?;
    init_tracing(args.common.log_level.as_deref());

    let router = build_router(&config, &Registry::with_builtins())?;

    let shutdown = CancellationToken::new();
    let shutdown_signal = shutdown.clone();
    tokio::spawn(async move {
        shutdown_signal_handler().await;
        info!("shutdown signal received");
        shutdown_signal.cancel();
    });

    let conn = router
        .dial_with_cancel(&shutdown, &args.network, &args.address)
        .await?;
    let stream = match conn {
        Conn::Stream(s) => s,
        Conn::Packet(_) => {
            return Err(format!("{} is a datagram network; dial pipes streams only", args.network).into())
        }
    };
    info!(address = %args.address, "connected");

    let (mut reader, mut writer) = tokio::io::split(stream);
    let mut stdin = tokio::io::stdin();
    let mut stdout = tokio::io::stdout();

    let upload = async {
        let n = tokio::io::copy(&mut stdin, &mut writer).await?;
        writer.shutdown().await?;
        Ok::<u64, io::Error>(n)
    };
    let download = async {
        let n = tokio::io::copy(&mut reader, &mut stdout).await?;
        stdout.flush().await?;
        Ok::<u64, io::Error>(n)
    };

    tokio::select! {
        res = async { tokio::try_join!(upload, download) } => {
            let (up, down) = res?;
            info!(up, down, "connection closed");
        }
        _ = shutdown.cancelled() => {
            info!("interrupted");
        }
    }
    Ok(())
}

async fn shutdown_signal_handler() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

fn init_tracing(level: Option<&str>) {
    let level = level.unwrap_or("info");
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr))
        .init();

    debug!(
        project = hopchain_core::PROJECT_NAME,
        version = hopchain_core::VERSION,
        "logging initialized"
    );
}
