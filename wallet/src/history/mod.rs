//! # Transfer History
//!
//! Reconciles the engine's four ledger views into one list of
//! [`TransferEntry`] values:
//!
//! | View            | height       | fee                    | type                 |
//! |-----------------|--------------|------------------------|----------------------|
//! | confirmed in    | block height | 0                      | `in`                 |
//! | confirmed out   | block height | `amount_in - amount_out` | `out`              |
//! | unconfirmed out | 0            | `amount_in - amount_out` | `pending` / `failed` |
//! | pool in         | 0            | 0                      | `pool`               |
//!
//! Entries are recomputed on every query; nothing is cached. The pool view
//! is only refreshed when the caller asks for pool entries.

pub mod entry;
pub mod payments;
pub mod query;

use serde::{Deserialize, Serialize};

use crate::crypto::Hash;
use crate::engine::{EngineError, WalletEngine};

pub use entry::{
    incoming_entry, outgoing_amounts, outgoing_entry, pool_entry, unconfirmed_entry,
    TransferDestination, TransferEntry, TransferType,
};
pub use payments::{owned_outputs, payments_by_id, payments_since};
pub use query::{HeightRange, OutputFilter, OutputFilterError, TransferScope, TransfersQuery};

/// Entries grouped by category. Empty categories are left out on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferHistory {
    #[serde(rename = "in", default, skip_serializing_if = "Vec::is_empty")]
    pub incoming: Vec<TransferEntry>,
    #[serde(rename = "out", default, skip_serializing_if = "Vec::is_empty")]
    pub outgoing: Vec<TransferEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pending: Vec<TransferEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed: Vec<TransferEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pool: Vec<TransferEntry>,
}

impl TransferHistory {
    pub fn len(&self) -> usize {
        self.incoming.len()
            + self.outgoing.len()
            + self.pending.len()
            + self.failed.len()
            + self.pool.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Lists the categories selected by `query`.
pub fn collect_transfers<E: WalletEngine>(
    engine: &mut E,
    query: &TransfersQuery,
) -> Result<TransferHistory, EngineError> {
    let mut history = TransferHistory::default();
    let scope = &query.scope;

    if query.incoming {
        history.incoming = engine
            .incoming_payments()
            .iter()
            .filter(|p| query.heights.contains(p.block_height) && scope.contains(&p.subaddr_index))
            .map(|p| incoming_entry(&*engine, p))
            .collect();
    }

    if query.outgoing {
        history.outgoing = engine
            .confirmed_outgoing()
            .iter()
            .filter(|t| {
                query.heights.contains(t.block_height)
                    && scope.overlaps(t.subaddr_account, &t.subaddr_indices)
            })
            .map(|t| outgoing_entry(&*engine, t))
            .collect();
    }

    if query.pending || query.failed {
        for transfer in engine
            .unconfirmed_outgoing()
            .iter()
            .filter(|t| scope.overlaps(t.subaddr_account, &t.subaddr_indices))
        {
            let entry = unconfirmed_entry(&*engine, transfer);
            match entry.kind {
                TransferType::Failed if query.failed => history.failed.push(entry),
                TransferType::Pending if query.pending => history.pending.push(entry),
                _ => {}
            }
        }
    }

    if query.pool {
        engine.update_pool_state()?;
        history.pool = engine
            .pool_payments()
            .iter()
            .filter(|p| scope.contains(&p.subaddr_index))
            .map(|p| pool_entry(&*engine, p))
            .collect();
    }

    tracing::debug!(
        incoming = history.incoming.len(),
        outgoing = history.outgoing.len(),
        pending = history.pending.len(),
        failed = history.failed.len(),
        pool = history.pool.len(),
        "transfers collected"
    );
    Ok(history)
}

/// Finds the transfer with hash `txid` in any view, regardless of account.
/// Views are searched in the order in, out, unconfirmed, pool; the pool is
/// only refreshed when the others have no match.
pub fn find_transfer<E: WalletEngine>(
    engine: &mut E,
    txid: &Hash,
) -> Result<Option<TransferEntry>, EngineError> {
    if let Some(p) = engine.incoming_payments().iter().find(|p| p.tx_hash == *txid) {
        return Ok(Some(incoming_entry(&*engine, p)));
    }
    if let Some(t) = engine.confirmed_outgoing().iter().find(|t| t.tx_hash == *txid) {
        return Ok(Some(outgoing_entry(&*engine, t)));
    }
    if let Some(t) = engine.unconfirmed_outgoing().iter().find(|t| t.tx_hash == *txid) {
        return Ok(Some(unconfirmed_entry(&*engine, t)));
    }

    engine.update_pool_state()?;
    Ok(engine
        .pool_payments()
        .iter()
        .find(|p| p.tx_hash == *txid)
        .map(|p| pool_entry(&*engine, p)))
}
