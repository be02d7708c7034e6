//! # Wallet RPC Configuration & Constants
//!
//! Every tunable of the transfer pipeline lives here: ring-size bounds,
//! the oversize retry policy defaults, address prefixes, the worker's idle
//! cadence, and the runtime options the RPC layer is constructed with.

use std::net::IpAddr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Ring Size Bounds
// ---------------------------------------------------------------------------

/// Smallest number of decoys a transfer may use. Requests below this are
/// raised to it silently.
pub const MIN_MIXIN: u64 = 12;

/// Largest number of decoys a transfer may use. Requests above this are
/// lowered to it silently.
pub const MAX_MIXIN: u64 = 240;

// ---------------------------------------------------------------------------
// Transaction Construction
// ---------------------------------------------------------------------------

/// Initial size target factor, in hundredths (1.00).
pub const INITIAL_SIZE_TARGET_FACTOR: u32 = 100;

/// Default maximum number of construction attempts for a split transfer.
pub const DEFAULT_MAX_TRANSFER_ATTEMPTS: u32 = 8;

/// Default floor for the size target factor, in hundredths (0.10).
pub const DEFAULT_MIN_SIZE_TARGET_FACTOR: u32 = 10;

/// Outputs below this amount are considered dust and only leave the wallet
/// through a dust sweep.
pub const DUST_THRESHOLD: u64 = 1_000_000;

/// Upper bound for a single extra-field nonce, in bytes.
pub const TX_EXTRA_NONCE_MAX_COUNT: usize = 255;

// ---------------------------------------------------------------------------
// Payment Identifiers
// ---------------------------------------------------------------------------

/// Length of a short (encrypted) payment id in bytes.
pub const SHORT_PAYMENT_ID_LENGTH: usize = 8;

/// Length of a long (plain) payment id in bytes.
pub const LONG_PAYMENT_ID_LENGTH: usize = 32;

// ---------------------------------------------------------------------------
// Address Prefixes
// ---------------------------------------------------------------------------

pub const MAINNET_ADDRESS_PREFIX: u64 = 0x2bb39a;
pub const MAINNET_INTEGRATED_ADDRESS_PREFIX: u64 = 0x29339a;
pub const MAINNET_SUBADDRESS_PREFIX: u64 = 0x8319a;

pub const TESTNET_ADDRESS_PREFIX: u64 = 0x37751a;
pub const TESTNET_INTEGRATED_ADDRESS_PREFIX: u64 = 0x34f51a;
pub const TESTNET_SUBADDRESS_PREFIX: u64 = 0x1d351a;

/// Number of checksum bytes appended to an encoded address.
pub const ADDRESS_CHECKSUM_SIZE: usize = 4;

// ---------------------------------------------------------------------------
// Payment URIs
// ---------------------------------------------------------------------------

/// Scheme of payment request URIs, without the trailing colon.
pub const URI_SCHEME: &str = "solace";

/// Fractional digits of one coin; `1.0` is `10^COIN_DECIMALS` atomic units.
pub const COIN_DECIMALS: u32 = 9;

// ---------------------------------------------------------------------------
// Worker Cadence
// ---------------------------------------------------------------------------

/// How often the worker pulls new blocks between requests.
pub const REFRESH_INTERVAL: Duration = Duration::from_secs(20);

/// How often the worker checks whether a stop was requested.
pub const STOP_POLL_INTERVAL: Duration = Duration::from_millis(500);

// ---------------------------------------------------------------------------
// Server Defaults
// ---------------------------------------------------------------------------

/// Default JSON-RPC port.
pub const DEFAULT_RPC_PORT: u16 = 19736;

/// Default Prometheus metrics port.
pub const DEFAULT_METRICS_PORT: u16 = 19737;

// ---------------------------------------------------------------------------
// Runtime Options
// ---------------------------------------------------------------------------

/// Bounds for the oversize retry loop of split transfers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total construction attempts, including the first one.
    pub max_attempts: u32,
    /// Smallest size target factor (hundredths) worth trying.
    pub min_factor: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_TRANSFER_ATTEMPTS,
            min_factor: DEFAULT_MIN_SIZE_TARGET_FACTOR,
        }
    }
}

/// Options the RPC service is constructed with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RpcOptions {
    /// Refuse fund-moving and history operations.
    pub restricted: bool,
    pub retry: RetryPolicy,
}

/// Errors raised while validating the listener configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The bind address did not parse as an IP address.
    #[error("invalid IP address given for rpc bind ip: {0}")]
    InvalidBindIp(String),

    /// A public bind address was requested without explicit confirmation.
    #[error(
        "binding to {0} exposes the wallet RPC beyond this host; pass --confirm-external-bind to allow it"
    )]
    ExternalBindNotConfirmed(IpAddr),
}

/// Where the JSON-RPC listener binds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindConfig {
    pub ip: String,
    pub port: u16,
    pub confirm_external_bind: bool,
}

impl BindConfig {
    /// Parses the bind address, refusing non-loopback addresses unless the
    /// operator confirmed the external bind.
    pub fn validate(&self) -> Result<std::net::SocketAddr, ConfigError> {
        let ip: IpAddr = self
            .ip
            .parse()
            .map_err(|_| ConfigError::InvalidBindIp(self.ip.clone()))?;
        if !ip.is_loopback() && !self.confirm_external_bind {
            return Err(ConfigError::ExternalBindNotConfirmed(ip));
        }
        Ok(std::net::SocketAddr::new(ip, self.port))
    }
}
