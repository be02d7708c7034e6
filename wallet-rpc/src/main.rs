//! # Solace Wallet RPC Server
//!
//! Entry point for the `solace-wallet-rpc` binary. Parses CLI arguments,
//! initializes logging and metrics, hands the wallet to the worker thread
//! and serves JSON-RPC over HTTP.
//!
//! Subcommands:
//!
//! - `run`:     serve a wallet
//! - `init`:    write a fresh development wallet file
//! - `version`: print build version information

mod api;
mod cli;
mod logging;
mod metrics;
mod worker;

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::watch;

use solace_wallet::engine::{MemoryWallet, SubaddressIndex, WalletEngine};
use solace_wallet::rpc::RpcService;

use cli::{Commands, WalletRpcCli};
use logging::LogFormat;
use metrics::WalletMetrics;
use worker::WorkerTiming;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = WalletRpcCli::parse();

    match cli.command {
        Commands::Run(args) => run_server(args).await,
        Commands::Init(args) => init_wallet(args),
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Loads the wallet and serves it until a signal or `stop_wallet`.
async fn run_server(args: cli::RunArgs) -> Result<()> {
    logging::init_logging(logging::DEFAULT_FILTER, LogFormat::from_flag(&args.log_format))
        .context("failed to install the log subscriber")?;

    let rpc_addr = args
        .bind_config()
        .validate()
        .context("refusing to start the RPC server")?;
    let network = args.network();
    let options = args.rpc_options();

    // --- Wallet ---
    let wallet = match &args.wallet_file {
        Some(path) => {
            let wallet = MemoryWallet::open(path)
                .with_context(|| format!("failed to open wallet {}", path.display()))?;
            if wallet.network() != network {
                bail!(
                    "wallet {} is a {} wallet, but the server runs on {}",
                    path.display(),
                    wallet.network(),
                    network
                );
            }
            wallet
        }
        None => {
            tracing::warn!("serving a development wallet, nothing will be persisted");
            MemoryWallet::dev(network)
        }
    };

    tracing::info!(
        network = %network,
        height = wallet.height(),
        restricted = options.restricted,
        max_transfer_attempts = options.retry.max_attempts,
        "starting solace-wallet-rpc"
    );

    // --- Worker ---
    let wallet_metrics = Arc::new(WalletMetrics::new());
    let (stopped_tx, mut stopped_rx) = watch::channel(false);
    let (worker_handle, worker_thread) = worker::spawn(
        RpcService::new(wallet, options),
        Arc::clone(&wallet_metrics),
        WorkerTiming::default(),
        stopped_tx,
    )
    .context("failed to start the wallet worker")?;
    let shutdown_handle = worker_handle.clone();

    // --- API server ---
    let app_state = api::AppState {
        version: env!("CARGO_PKG_VERSION").to_string(),
        network: network.to_string(),
        worker: worker_handle,
    };
    let api_router = api::create_router(app_state);
    let api_listener = tokio::net::TcpListener::bind(rpc_addr)
        .await
        .with_context(|| format!("failed to bind RPC listener on {}", rpc_addr))?;
    tracing::info!("JSON-RPC server listening on {}", rpc_addr);

    // --- Metrics server ---
    let metrics_router = axum::Router::new()
        .route("/metrics", axum::routing::get(metrics::metrics_handler))
        .with_state(Arc::clone(&wallet_metrics));
    let metrics_addr = std::net::SocketAddr::new(rpc_addr.ip(), args.metrics_port);
    let metrics_listener = tokio::net::TcpListener::bind(metrics_addr)
        .await
        .with_context(|| format!("failed to bind metrics listener on {}", metrics_addr))?;
    tracing::info!("Metrics server listening on {}", metrics_addr);

    // --- Serve ---
    tokio::select! {
        res = axum::serve(api_listener, api_router) => {
            if let Err(e) = res {
                tracing::error!("API server error: {}", e);
            }
        }
        res = axum::serve(metrics_listener, metrics_router) => {
            if let Err(e) = res {
                tracing::error!("Metrics server error: {}", e);
            }
        }
        _ = stopped_rx.wait_for(|stopped| *stopped) => {
            tracing::info!("wallet asked to stop");
        }
        _ = shutdown_signal() => {
            tracing::info!("shutdown signal received");
        }
    }

    shutdown_handle.shutdown();
    match tokio::task::spawn_blocking(move || worker_thread.join()).await {
        Ok(Ok(())) => {}
        _ => tracing::error!("wallet worker did not exit cleanly"),
    }
    tracing::info!("solace-wallet-rpc stopped");
    Ok(())
}

/// Writes a development wallet snapshot to `args.wallet_file`.
fn init_wallet(args: cli::InitArgs) -> Result<()> {
    logging::init_logging(logging::DEFAULT_FILTER, LogFormat::Pretty)
        .context("failed to install the log subscriber")?;

    let path = &args.wallet_file;
    if path.exists() && !args.force {
        bail!(
            "{} already exists; pass --force to overwrite it",
            path.display()
        );
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }

    let network = if args.testnet {
        solace_wallet::address::Network::Testnet
    } else {
        solace_wallet::address::Network::Mainnet
    };
    let mut wallet = MemoryWallet::dev(network);
    wallet.set_path(path.clone());
    wallet
        .store()
        .with_context(|| format!("failed to write wallet to {}", path.display()))?;

    let address = wallet
        .address(SubaddressIndex::new(0, 0))
        .map(|a| a.encode(network, false))
        .unwrap_or_default();
    tracing::info!(path = %path.display(), network = %network, "wallet written");

    println!("Wallet initialized successfully.");
    println!("  Wallet file     : {}", path.display());
    println!("  Network         : {}", network);
    println!("  Primary address : {}", address);

    Ok(())
}

/// Prints version information to stdout.
fn print_version() {
    println!("solace-wallet-rpc {}", env!("CARGO_PKG_VERSION"));
    println!("rustc             {}", rustc_version());
}

/// Returns the Rust compiler version used to build this binary.
fn rustc_version() -> &'static str {
    option_env!("RUSTC_VERSION").unwrap_or("unknown")
}

/// Waits for SIGINT (Ctrl+C) or SIGTERM, whichever comes first.
///
/// On non-Unix platforms, only Ctrl+C is supported.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {}", e);
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
