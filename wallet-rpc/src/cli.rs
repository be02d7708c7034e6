//! # CLI Interface
//!
//! Command-line structure for `solace-wallet-rpc` using `clap` derive.
//! Every `run` flag can also be set through a `SOLACE_*` environment
//! variable.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use solace_wallet::address::Network;
use solace_wallet::config::{
    BindConfig, RetryPolicy, RpcOptions, DEFAULT_MAX_TRANSFER_ATTEMPTS, DEFAULT_METRICS_PORT,
    DEFAULT_MIN_SIZE_TARGET_FACTOR, DEFAULT_RPC_PORT,
};

/// Solace wallet JSON-RPC server.
///
/// Serves transfer construction, sweeps and transfer history for a single
/// wallet over JSON-RPC 2.0, and exposes Prometheus metrics.
#[derive(Parser, Debug)]
#[command(
    name = "solace-wallet-rpc",
    about = "Solace wallet JSON-RPC server",
    version,
    propagate_version = true
)]
pub struct WalletRpcCli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the RPC server.
    Run(RunArgs),
    /// Write a fresh development wallet file.
    Init(InitArgs),
    /// Print version information and exit.
    Version,
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Wallet snapshot to serve.
    #[arg(
        long,
        env = "SOLACE_WALLET_FILE",
        conflicts_with = "dev",
        required_unless_present = "dev"
    )]
    pub wallet_file: Option<PathBuf>,

    /// Serve a throwaway in-memory development wallet instead of a file.
    #[arg(long, env = "SOLACE_DEV")]
    pub dev: bool,

    /// Use testnet address prefixes.
    #[arg(long, env = "SOLACE_TESTNET")]
    pub testnet: bool,

    /// IP address the JSON-RPC listener binds to.
    #[arg(long, env = "SOLACE_RPC_BIND_IP", default_value = "127.0.0.1")]
    pub rpc_bind_ip: String,

    #[arg(long, env = "SOLACE_RPC_BIND_PORT", default_value_t = DEFAULT_RPC_PORT)]
    pub rpc_bind_port: u16,

    /// Allow binding to a non-loopback address.
    #[arg(long, env = "SOLACE_CONFIRM_EXTERNAL_BIND")]
    pub confirm_external_bind: bool,

    /// Refuse operations that move funds or reveal history.
    #[arg(long, env = "SOLACE_RESTRICTED_RPC")]
    pub restricted_rpc: bool,

    /// Port for the Prometheus metrics endpoint.
    #[arg(long, env = "SOLACE_METRICS_PORT", default_value_t = DEFAULT_METRICS_PORT)]
    pub metrics_port: u16,

    /// Log output format: pretty or json.
    #[arg(long, env = "SOLACE_LOG_FORMAT", default_value = "pretty")]
    pub log_format: String,

    /// Construction attempts a split transfer may make before giving up.
    #[arg(
        long,
        env = "SOLACE_MAX_TRANSFER_ATTEMPTS",
        default_value_t = DEFAULT_MAX_TRANSFER_ATTEMPTS,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub max_transfer_attempts: u32,

    /// Smallest size target factor worth retrying with, in hundredths.
    #[arg(
        long,
        env = "SOLACE_MIN_SIZE_FACTOR",
        default_value_t = DEFAULT_MIN_SIZE_TARGET_FACTOR,
        value_parser = clap::value_parser!(u32).range(1..=100)
    )]
    pub min_size_factor: u32,
}

impl RunArgs {
    pub fn network(&self) -> Network {
        if self.testnet {
            Network::Testnet
        } else {
            Network::Mainnet
        }
    }

    pub fn bind_config(&self) -> BindConfig {
        BindConfig {
            ip: self.rpc_bind_ip.clone(),
            port: self.rpc_bind_port,
            confirm_external_bind: self.confirm_external_bind,
        }
    }

    pub fn rpc_options(&self) -> RpcOptions {
        RpcOptions {
            restricted: self.restricted_rpc,
            retry: RetryPolicy {
                max_attempts: self.max_transfer_attempts,
                min_factor: self.min_size_factor,
            },
        }
    }
}

/// Arguments for the `init` subcommand.
#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Where to write the wallet snapshot.
    #[arg(long, env = "SOLACE_WALLET_FILE")]
    pub wallet_file: PathBuf,

    /// Use testnet address prefixes.
    #[arg(long)]
    pub testnet: bool,

    /// Overwrite an existing file.
    #[arg(long)]
    pub force: bool,
}
