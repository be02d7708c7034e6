//! Ledger records and construction inputs exchanged with a [`WalletEngine`].
//!
//! [`WalletEngine`]: super::WalletEngine

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::address::AccountAddress;
use crate::crypto::Hash;
use crate::transfer::payment_id::TxExtra;

/// Change value recorded when the engine could not determine it. Treated as
/// zero wherever amounts are derived.
pub const CHANGE_UNKNOWN: u64 = u64::MAX;

/// `(account, subaddress)` coordinates. `(n, 0)` is account `n`'s base address.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct SubaddressIndex {
    pub major: u32,
    pub minor: u32,
}

impl SubaddressIndex {
    pub fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }
}

/// One output of an outgoing transfer, as remembered by the sender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxDestination {
    pub address: AccountAddress,
    pub is_subaddress: bool,
    pub amount: u64,
}

/// A payment received by the wallet, confirmed or still in the pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub tx_hash: Hash,
    /// 32-byte slot; short ids are zero-padded.
    pub payment_id: Hash,
    pub amount: u64,
    /// Zero while the transaction sits in the pool.
    pub block_height: u64,
    pub unlock_time: u64,
    pub timestamp: u64,
    pub subaddr_index: SubaddressIndex,
}

/// An outgoing transfer that made it into a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmedTransfer {
    pub tx_hash: Hash,
    pub payment_id: Hash,
    pub amount_in: u64,
    pub amount_out: u64,
    /// [`CHANGE_UNKNOWN`] when not known.
    pub change: u64,
    pub block_height: u64,
    pub unlock_time: u64,
    pub timestamp: u64,
    pub destinations: Vec<TxDestination>,
    pub subaddr_account: u32,
    pub subaddr_indices: BTreeSet<u32>,
}

/// Where an unconfirmed outgoing transfer stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnconfirmedState {
    Pending,
    Failed,
}

/// An outgoing transfer that was broadcast but is not yet in a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnconfirmedTransfer {
    pub tx_hash: Hash,
    pub payment_id: Hash,
    pub amount_in: u64,
    pub amount_out: u64,
    pub change: u64,
    pub unlock_time: u64,
    pub timestamp: u64,
    pub destinations: Vec<TxDestination>,
    pub subaddr_account: u32,
    pub subaddr_indices: BTreeSet<u32>,
    pub state: UnconfirmedState,
}

/// An output the wallet owns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnedOutput {
    pub tx_hash: Hash,
    pub global_index: u64,
    pub amount: u64,
    pub block_height: u64,
    pub spent: bool,
    pub subaddr_index: SubaddressIndex,
}

/// Per-subaddress balance summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubaddressBalance {
    pub balance: u64,
    pub unlocked_balance: u64,
    pub num_unspent_outputs: u64,
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

/// Everything the engine needs to build transfers to explicit destinations.
#[derive(Debug, Clone)]
pub struct ConstructionRequest {
    pub destinations: Vec<TxDestination>,
    pub mixin: u64,
    pub unlock_time: u64,
    pub priority: u32,
    pub extra: TxExtra,
    pub subaddr_account: u32,
    /// Empty means any subaddress of the account.
    pub subaddr_indices: BTreeSet<u32>,
    pub trusted_daemon: bool,
}

/// Everything the engine needs to sweep the unlocked balance to one address.
#[derive(Debug, Clone)]
pub struct SweepRequest {
    pub destination: AccountAddress,
    pub is_subaddress: bool,
    pub mixin: u64,
    pub unlock_time: u64,
    pub priority: u32,
    pub extra: TxExtra,
    /// Only outputs strictly below this amount are swept; zero sweeps all.
    pub below_amount: u64,
    pub subaddr_account: u32,
    pub subaddr_indices: BTreeSet<u32>,
    pub trusted_daemon: bool,
}

/// A constructed, signed, not yet broadcast transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTransaction {
    pub tx_hash: Hash,
    pub tx_key: Hash,
    pub fee: u64,
    /// Serialized size in bytes.
    pub size: u64,
    /// Outputs to the recipients. Change is not listed here.
    pub destinations: Vec<TxDestination>,
    pub change: u64,
    pub amount_in: u64,
    pub spent_outputs: Vec<u64>,
    pub extra: TxExtra,
    pub subaddr_account: u32,
    pub subaddr_indices: BTreeSet<u32>,
}

impl PendingTransaction {
    /// Sum of the amounts sent to recipients.
    pub fn destination_total(&self) -> u64 {
        self.destinations
            .iter()
            .fold(0u64, |acc, d| acc.saturating_add(d.amount))
    }
}

/// A saved recipient. `payment_id` is all zeroes when none was given; short
/// ids sit zero-padded in the first eight bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressBookRow {
    pub address: AccountAddress,
    pub payment_id: Hash,
    pub description: String,
    pub is_subaddress: bool,
}
