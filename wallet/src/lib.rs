//! # Solace Wallet
//!
//! The transfer side of a CryptoNote wallet RPC server: turning caller
//! requests into committed transactions, and reading the wallet's ledger
//! back out as a uniform transfer history.
//!
//! ## Architecture
//!
//! - **config**: Protocol constants and the options the RPC layer runs with.
//! - **crypto**: Hashing helpers and the 32-byte [`crypto::Hash`].
//! - **address**: Base58 address encoding, subaddresses, integrated addresses
//!   and payment request URIs.
//! - **engine**: The [`engine::WalletEngine`] boundary, plus an in-memory
//!   engine used for development and tests.
//! - **transfer**: Destination resolution, payment ids, mixin clamping,
//!   construction, the oversize retry loop and commit.
//! - **history**: Transfer history, payments by id and owned outputs.
//! - **rpc**: Method table, request handlers and wire errors.
//!
//! Nothing here does I/O except the in-memory engine's snapshot file. The
//! HTTP server and the worker thread live in the `solace-wallet-rpc` binary.

pub mod address;
pub mod config;
pub mod crypto;
pub mod engine;
pub mod history;
pub mod rpc;
pub mod transfer;
