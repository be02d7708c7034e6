//! Payment-id lookups and owned-output listings over the engine's ledger.

use super::query::{OutputFilter, TransferScope};
use crate::crypto::Hash;
use crate::engine::{OwnedOutput, PaymentRecord, WalletEngine};

/// Every confirmed payment carrying `slot`, at any height.
pub fn payments_by_id<'a, E: WalletEngine>(engine: &'a E, slot: &Hash) -> Vec<&'a PaymentRecord> {
    engine
        .incoming_payments()
        .iter()
        .filter(|p| p.payment_id == *slot)
        .collect()
}

/// Confirmed payments mined strictly above `min_block_height`, restricted
/// to `slots` when given.
pub fn payments_since<'a, E: WalletEngine>(
    engine: &'a E,
    slots: Option<&[Hash]>,
    min_block_height: u64,
) -> Vec<&'a PaymentRecord> {
    let payments = engine
        .incoming_payments()
        .iter()
        .filter(|p| p.block_height > min_block_height);
    match slots {
        None => payments.collect(),
        // Grouped per requested id, in request order.
        Some(slots) => slots
            .iter()
            .flat_map(move |slot| {
                engine
                    .incoming_payments()
                    .iter()
                    .filter(move |p| p.payment_id == *slot && p.block_height > min_block_height)
            })
            .collect(),
    }
}

/// Owned outputs in `scope` whose spent state passes `filter`.
pub fn owned_outputs<'a, E: WalletEngine>(
    engine: &'a E,
    filter: OutputFilter,
    scope: &TransferScope,
) -> Vec<&'a OwnedOutput> {
    engine
        .owned_outputs()
        .iter()
        .filter(|o| filter.accepts(o.spent) && scope.contains(&o.subaddr_index))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::Network;
    use crate::engine::{MemoryWallet, SubaddressIndex};
    use std::collections::BTreeSet;

    fn slot(tag: u8) -> Hash {
        let mut bytes = [0u8; 32];
        bytes[0] = tag;
        Hash(bytes)
    }

    fn wallet() -> MemoryWallet {
        let mut wallet = MemoryWallet::generate(Network::Mainnet, b"payments");
        wallet.add_subaddress(0, "second".into());
        wallet.credit(SubaddressIndex::new(0, 0), 100, slot(1), 10);
        wallet.credit(SubaddressIndex::new(0, 1), 200, slot(2), 20);
        wallet.credit(SubaddressIndex::new(0, 0), 300, slot(1), 30);
        wallet
    }

    #[test]
    fn lookup_by_id_ignores_height() {
        let wallet = wallet();
        let found = payments_by_id(&wallet, &slot(1));
        assert_eq!(found.iter().map(|p| p.amount).collect::<Vec<_>>(), vec![100, 300]);
        assert!(payments_by_id(&wallet, &slot(9)).is_empty());
    }

    #[test]
    fn min_height_is_exclusive() {
        let wallet = wallet();
        let found = payments_since(&wallet, None, 20);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].amount, 300);
    }

    #[test]
    fn bulk_lookup_groups_by_requested_id() {
        let wallet = wallet();
        let found = payments_since(&wallet, Some(&[slot(2), slot(1)]), 0);
        assert_eq!(
            found.iter().map(|p| p.amount).collect::<Vec<_>>(),
            vec![200, 100, 300]
        );
    }

    #[test]
    fn outputs_follow_filter_and_scope() {
        let wallet = wallet();
        let everything = TransferScope::default();
        assert_eq!(owned_outputs(&wallet, OutputFilter::All, &everything).len(), 3);
        assert!(owned_outputs(&wallet, OutputFilter::Unavailable, &everything).is_empty());

        let second_only = TransferScope {
            account_index: 0,
            subaddr_indices: BTreeSet::from([1]),
        };
        let outputs = owned_outputs(&wallet, OutputFilter::Available, &second_only);
        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs[0].amount, 200);
    }
}
