//! Normalized transfer records and their derivation from ledger records.

use serde::{Deserialize, Serialize};

use crate::engine::{
    ConfirmedTransfer, PaymentRecord, SubaddressIndex, TxDestination, UnconfirmedState,
    UnconfirmedTransfer, WalletEngine, CHANGE_UNKNOWN,
};
use crate::transfer::canonical_payment_id;

/// Which ledger view an entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferType {
    In,
    Out,
    Pending,
    Failed,
    Pool,
}

/// One recipient of an outgoing entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferDestination {
    pub address: String,
    pub amount: u64,
}

/// A transfer as reported to callers, whatever ledger view it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferEntry {
    pub txid: String,
    pub payment_id: String,
    /// Zero for anything not yet in a block.
    pub height: u64,
    pub timestamp: u64,
    pub amount: u64,
    pub fee: u64,
    pub note: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub destinations: Vec<TransferDestination>,
    #[serde(rename = "type")]
    pub kind: TransferType,
    pub subaddr_index: SubaddressIndex,
}

/// `(amount, fee)` of an outgoing transfer. Unknown change counts as zero
/// and malformed records clamp at zero instead of wrapping.
pub fn outgoing_amounts(amount_in: u64, amount_out: u64, change: u64) -> (u64, u64) {
    let change = if change == CHANGE_UNKNOWN { 0 } else { change };
    let fee = amount_in.saturating_sub(amount_out);
    let amount = amount_in.saturating_sub(change).saturating_sub(fee);
    (amount, fee)
}

fn destinations<E: WalletEngine>(engine: &E, dests: &[TxDestination]) -> Vec<TransferDestination> {
    let network = engine.network();
    dests
        .iter()
        .map(|d| TransferDestination {
            address: d.address.encode(network, d.is_subaddress),
            amount: d.amount,
        })
        .collect()
}

fn received<E: WalletEngine>(engine: &E, record: &PaymentRecord, kind: TransferType) -> TransferEntry {
    TransferEntry {
        txid: record.tx_hash.to_hex(),
        payment_id: canonical_payment_id(&record.payment_id),
        height: if kind == TransferType::Pool {
            0
        } else {
            record.block_height
        },
        timestamp: record.timestamp,
        amount: record.amount,
        fee: 0,
        note: engine.tx_note(&record.tx_hash),
        destinations: Vec::new(),
        kind,
        subaddr_index: record.subaddr_index,
    }
}

/// Entry for a confirmed incoming payment.
pub fn incoming_entry<E: WalletEngine>(engine: &E, record: &PaymentRecord) -> TransferEntry {
    received(engine, record, TransferType::In)
}

/// Entry for an incoming payment still in the pool.
pub fn pool_entry<E: WalletEngine>(engine: &E, record: &PaymentRecord) -> TransferEntry {
    received(engine, record, TransferType::Pool)
}

/// Entry for a confirmed outgoing transfer.
pub fn outgoing_entry<E: WalletEngine>(engine: &E, transfer: &ConfirmedTransfer) -> TransferEntry {
    let (amount, fee) = outgoing_amounts(transfer.amount_in, transfer.amount_out, transfer.change);
    TransferEntry {
        txid: transfer.tx_hash.to_hex(),
        payment_id: canonical_payment_id(&transfer.payment_id),
        height: transfer.block_height,
        timestamp: transfer.timestamp,
        amount,
        fee,
        note: engine.tx_note(&transfer.tx_hash),
        destinations: destinations(engine, &transfer.destinations),
        kind: TransferType::Out,
        subaddr_index: SubaddressIndex::new(transfer.subaddr_account, 0),
    }
}

/// Entry for an outgoing transfer that is pending or failed.
pub fn unconfirmed_entry<E: WalletEngine>(
    engine: &E,
    transfer: &UnconfirmedTransfer,
) -> TransferEntry {
    let (amount, fee) = outgoing_amounts(transfer.amount_in, transfer.amount_out, transfer.change);
    TransferEntry {
        txid: transfer.tx_hash.to_hex(),
        payment_id: canonical_payment_id(&transfer.payment_id),
        height: 0,
        timestamp: transfer.timestamp,
        amount,
        fee,
        note: engine.tx_note(&transfer.tx_hash),
        destinations: destinations(engine, &transfer.destinations),
        kind: match transfer.state {
            UnconfirmedState::Pending => TransferType::Pending,
            UnconfirmedState::Failed => TransferType::Failed,
        },
        subaddr_index: SubaddressIndex::new(transfer.subaddr_account, 0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::Network;
    use crate::crypto::Hash;
    use crate::engine::MemoryWallet;
    use std::collections::BTreeSet;

    fn confirmed(amount_in: u64, amount_out: u64, change: u64) -> ConfirmedTransfer {
        ConfirmedTransfer {
            tx_hash: Hash([3; 32]),
            payment_id: Hash::ZERO,
            amount_in,
            amount_out,
            change,
            block_height: 77,
            unlock_time: 0,
            timestamp: 1_600_000_000,
            destinations: Vec::new(),
            subaddr_account: 2,
            subaddr_indices: BTreeSet::from([1]),
        }
    }

    #[test]
    fn outgoing_fee_and_amount() {
        let wallet = MemoryWallet::generate(Network::Mainnet, b"entry");
        let entry = outgoing_entry(&wallet, &confirmed(1_000_000, 990_000, 200_000));
        assert_eq!(entry.fee, 10_000);
        assert_eq!(entry.amount, 790_000);
        assert_eq!(entry.kind, TransferType::Out);
        assert_eq!(entry.height, 77);
        assert_eq!(entry.subaddr_index, SubaddressIndex::new(2, 0));
    }

    #[test]
    fn unknown_change_counts_as_zero() {
        assert_eq!(
            outgoing_amounts(1_000_000, 990_000, CHANGE_UNKNOWN),
            (990_000, 10_000)
        );
    }

    #[test]
    fn malformed_amounts_do_not_wrap() {
        assert_eq!(outgoing_amounts(100, 200, 500), (0, 0));
    }

    #[test]
    fn unconfirmed_state_picks_the_type() {
        let wallet = MemoryWallet::generate(Network::Mainnet, b"entry");
        let mut transfer = UnconfirmedTransfer {
            tx_hash: Hash([4; 32]),
            payment_id: Hash::ZERO,
            amount_in: 10,
            amount_out: 9,
            change: 0,
            unlock_time: 0,
            timestamp: 0,
            destinations: Vec::new(),
            subaddr_account: 0,
            subaddr_indices: BTreeSet::new(),
            state: UnconfirmedState::Failed,
        };
        assert_eq!(unconfirmed_entry(&wallet, &transfer).kind, TransferType::Failed);
        transfer.state = UnconfirmedState::Pending;
        let entry = unconfirmed_entry(&wallet, &transfer);
        assert_eq!(entry.kind, TransferType::Pending);
        assert_eq!(entry.height, 0);
    }

    #[test]
    fn serialized_shape() {
        let wallet = MemoryWallet::generate(Network::Mainnet, b"entry");
        let record = PaymentRecord {
            tx_hash: Hash([5; 32]),
            payment_id: Hash::ZERO,
            amount: 42,
            block_height: 9,
            unlock_time: 0,
            timestamp: 1,
            subaddr_index: SubaddressIndex::new(0, 3),
        };
        let json = serde_json::to_value(incoming_entry(&wallet, &record)).unwrap();
        assert_eq!(json["type"], "in");
        assert_eq!(json["payment_id"], "0000000000000000");
        assert_eq!(json["subaddr_index"]["minor"], 3);
        assert!(json.get("destinations").is_none());
    }
}
