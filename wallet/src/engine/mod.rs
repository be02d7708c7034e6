//! # Wallet Engine
//!
//! The cryptographic engine owns keys, outputs and the ledger. The RPC
//! layer never touches any of that directly: it asks the engine to build
//! and commit transactions and reads back four ledger views (confirmed
//! incoming, confirmed outgoing, unconfirmed outgoing, pool incoming).
//!
//! [`WalletEngine`] is that boundary. Every method is blocking and is only
//! ever called from the single RPC worker, so implementations need `Send`
//! but not `Sync`.
//!
//! [`MemoryWallet`] is a deterministic in-process implementation used by the
//! test suites and by the server's development mode.

pub mod memory;
pub mod types;

use std::collections::BTreeMap;

use thiserror::Error;

use crate::address::{AccountAddress, Network};
use crate::crypto::Hash;

pub use memory::{ConstructionLimits, MemoryWallet};
pub use types::*;

/// Failures reported by the engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The daemon is syncing or otherwise cannot serve requests right now.
    #[error("daemon is busy")]
    DaemonBusy,

    /// A constructed transaction exceeds the network's size limit.
    #[error("transaction too big: {size} bytes, limit {limit} bytes")]
    TxTooBig { size: u64, limit: u64 },

    /// The spendable balance does not cover the request.
    #[error("not enough money: available {available}, needed {needed}")]
    NotEnoughMoney { available: u64, needed: u64 },

    /// Any other construction or broadcast failure.
    #[error("{0}")]
    Transfer(String),

    /// Persisting the wallet failed.
    #[error("storage error: {0}")]
    Storage(String),
}

/// The collaborator that builds, signs and broadcasts transactions and
/// maintains the wallet's ledger.
pub trait WalletEngine: Send {
    fn network(&self) -> Network;

    /// Current blockchain height as seen by the wallet.
    fn height(&self) -> u64;

    /// Pulls new blocks from the daemon.
    fn refresh(&mut self) -> Result<(), EngineError>;

    /// Persists the wallet.
    fn store(&mut self) -> Result<(), EngineError>;

    fn rescan_blockchain(&mut self) -> Result<(), EngineError>;

    fn rescan_spent(&mut self) -> Result<(), EngineError>;

    // -- accounts ----------------------------------------------------------

    fn num_accounts(&self) -> u32;

    fn num_subaddresses(&self, account: u32) -> u32;

    /// Public address at `index`, `None` when out of range.
    fn address(&self, index: SubaddressIndex) -> Option<AccountAddress>;

    fn label(&self, index: SubaddressIndex) -> Option<String>;

    /// Relabels an existing subaddress. Returns `false` when out of range.
    fn set_label(&mut self, index: SubaddressIndex, label: String) -> bool;

    /// Appends a subaddress to `account` and returns its index.
    fn add_subaddress(&mut self, account: u32, label: String) -> Option<SubaddressIndex>;

    /// Appends an account and returns its index.
    fn add_account(&mut self, label: String) -> u32;

    /// Balances keyed by minor index, for subaddresses holding outputs.
    fn subaddress_balances(&self, account: u32) -> BTreeMap<u32, SubaddressBalance>;

    // -- construction ------------------------------------------------------

    /// Builds transactions for `request`, aiming each at
    /// `size_target_factor` times the size limit.
    fn create_transactions(
        &mut self,
        request: &ConstructionRequest,
        size_target_factor: f64,
    ) -> Result<Vec<PendingTransaction>, EngineError>;

    fn create_sweep_all(
        &mut self,
        request: &SweepRequest,
    ) -> Result<Vec<PendingTransaction>, EngineError>;

    /// Builds transactions spending every unmixable output.
    fn create_dust_sweep(
        &mut self,
        trusted_daemon: bool,
    ) -> Result<Vec<PendingTransaction>, EngineError>;

    /// Broadcasts one transaction and records it as pending.
    fn commit(&mut self, tx: &PendingTransaction) -> Result<(), EngineError>;

    // -- ledger views ------------------------------------------------------

    fn incoming_payments(&self) -> &[PaymentRecord];

    fn confirmed_outgoing(&self) -> &[ConfirmedTransfer];

    fn unconfirmed_outgoing(&self) -> &[UnconfirmedTransfer];

    /// Re-reads the daemon's pool. Must precede [`WalletEngine::pool_payments`].
    fn update_pool_state(&mut self) -> Result<(), EngineError>;

    fn pool_payments(&self) -> &[PaymentRecord];

    fn owned_outputs(&self) -> &[OwnedOutput];

    /// The note attached to `txid`, empty if none.
    fn tx_note(&self, txid: &Hash) -> String;

    fn set_tx_note(&mut self, txid: Hash, note: String);

    // -- address book ------------------------------------------------------

    fn address_book(&self) -> &[AddressBookRow];

    fn add_address_book_row(&mut self, row: AddressBookRow);

    /// Removes the row at `index`; later rows move up by one. `false` when
    /// there is no such row.
    fn delete_address_book_row(&mut self, index: usize) -> bool;
}
