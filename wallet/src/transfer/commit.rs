//! # Commit & Report
//!
//! Broadcasts a constructed batch through the engine, one transaction at a
//! time and in engine order, and reports what was sent. A failure part way
//! through leaves the earlier transactions broadcast.

use super::TransferError;
use crate::crypto::Hash;
use crate::engine::{PendingTransaction, WalletEngine};

/// What the caller learns about one committed transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommittedTransfer {
    pub tx_hash: Hash,
    /// Present only when the caller asked for keys.
    pub tx_key: Option<Hash>,
    pub fee: u64,
    /// Sum sent to recipients; change excluded.
    pub amount: u64,
}

/// Commits every transaction of `batch` and reports each one.
pub fn commit_and_report<E: WalletEngine>(
    engine: &mut E,
    batch: &[PendingTransaction],
    include_keys: bool,
) -> Result<Vec<CommittedTransfer>, TransferError> {
    let mut committed = Vec::with_capacity(batch.len());
    for tx in batch {
        engine.commit(tx)?;
        tracing::info!(
            tx_hash = %tx.tx_hash,
            fee = tx.fee,
            amount = tx.destination_total(),
            size = tx.size,
            "transaction committed"
        );
        committed.push(CommittedTransfer {
            tx_hash: tx.tx_hash,
            tx_key: include_keys.then_some(tx.tx_key),
            fee: tx.fee,
            amount: tx.destination_total(),
        });
    }
    Ok(committed)
}
