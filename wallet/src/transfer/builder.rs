//! # Transaction Builder Adapter
//!
//! Turns a resolved [`TransferPlan`] into an engine [`ConstructionRequest`]
//! (with the mixin clamped on the way) and forwards construction calls to
//! the engine, translating its failures into [`TransferError`]s.

use std::collections::BTreeSet;

use super::destination::TransferPlan;
use super::mixin::enforce_mixin;
use super::retry::SizeTargetFactor;
use super::{TransferError, TRANSFER_TOO_LARGE_MESSAGE};
use crate::engine::{ConstructionRequest, PendingTransaction, SweepRequest, WalletEngine};

/// Caller-supplied knobs shared by every construction request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferOptions {
    pub mixin: u64,
    pub unlock_time: u64,
    pub priority: u32,
    pub subaddr_account: u32,
    pub subaddr_indices: BTreeSet<u32>,
    pub trusted_daemon: bool,
}

impl TransferPlan {
    /// The engine request for this plan.
    pub fn into_request(self, options: &TransferOptions) -> ConstructionRequest {
        ConstructionRequest {
            destinations: self
                .destinations
                .iter()
                .map(|d| d.to_tx_destination())
                .collect(),
            mixin: enforce_mixin(options.mixin),
            unlock_time: options.unlock_time,
            priority: options.priority,
            extra: self.extra,
            subaddr_account: options.subaddr_account,
            subaddr_indices: options.subaddr_indices.clone(),
            trusted_daemon: options.trusted_daemon,
        }
    }

    /// The sweep request for this plan. Only the first destination is used.
    pub fn into_sweep(
        self,
        options: &TransferOptions,
        below_amount: u64,
    ) -> Result<SweepRequest, TransferError> {
        let destination = self
            .destinations
            .first()
            .ok_or_else(|| TransferError::Generic("No destination given".into()))?;
        Ok(SweepRequest {
            destination: destination.address,
            is_subaddress: destination.is_subaddress,
            mixin: enforce_mixin(options.mixin),
            unlock_time: options.unlock_time,
            priority: options.priority,
            extra: self.extra,
            below_amount,
            subaddr_account: options.subaddr_account,
            subaddr_indices: options.subaddr_indices.clone(),
            trusted_daemon: options.trusted_daemon,
        })
    }
}

/// Asks the engine for transactions at `factor`.
pub fn build<E: WalletEngine>(
    engine: &mut E,
    request: &ConstructionRequest,
    factor: SizeTargetFactor,
) -> Result<Vec<PendingTransaction>, TransferError> {
    let batch = engine.create_transactions(request, factor.as_f64())?;
    tracing::debug!(
        transactions = batch.len(),
        factor = %factor,
        "engine constructed transfer"
    );
    Ok(batch)
}

/// Builds a transfer that must fit in exactly one transaction.
pub fn build_single<E: WalletEngine>(
    engine: &mut E,
    request: &ConstructionRequest,
) -> Result<PendingTransaction, TransferError> {
    match build(engine, request, SizeTargetFactor::FULL) {
        Ok(batch) => expect_single(batch),
        Err(TransferError::TxTooBig { .. }) => {
            Err(TransferError::Generic(TRANSFER_TOO_LARGE_MESSAGE.into()))
        }
        Err(other) => Err(other),
    }
}

/// Unwraps a batch of exactly one transaction.
pub fn expect_single(
    mut batch: Vec<PendingTransaction>,
) -> Result<PendingTransaction, TransferError> {
    if batch.len() != 1 {
        tracing::debug!(transactions = batch.len(), "single transfer needs a split");
        return Err(TransferError::Generic(TRANSFER_TOO_LARGE_MESSAGE.into()));
    }
    Ok(batch.remove(0))
}

pub fn build_sweep_all<E: WalletEngine>(
    engine: &mut E,
    request: &SweepRequest,
) -> Result<Vec<PendingTransaction>, TransferError> {
    Ok(engine.create_sweep_all(request)?)
}

pub fn build_dust_sweep<E: WalletEngine>(
    engine: &mut E,
    trusted_daemon: bool,
) -> Result<Vec<PendingTransaction>, TransferError> {
    Ok(engine.create_dust_sweep(trusted_daemon)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::Network;
    use crate::config::{MAX_MIXIN, MIN_MIXIN};
    use crate::crypto::Hash;
    use crate::engine::{ConstructionLimits, MemoryWallet, SubaddressIndex};
    use crate::transfer::destination::{resolve_transfer, DestinationRequest};

    fn wallet() -> MemoryWallet {
        let mut wallet = MemoryWallet::generate(Network::Testnet, b"builder");
        wallet.set_height(100);
        for h in 0..8 {
            wallet.credit(SubaddressIndex::new(0, 0), 10_000_000_000, Hash::ZERO, h);
        }
        wallet
    }

    fn plan(wallet: &MemoryWallet, count: usize) -> TransferPlan {
        let address = wallet
            .address(SubaddressIndex::new(0, 0))
            .unwrap()
            .encode(Network::Testnet, false);
        let requests: Vec<_> = (0..count)
            .map(|_| DestinationRequest {
                address: address.clone(),
                amount: 1_000_000,
            })
            .collect();
        resolve_transfer(Network::Testnet, &requests, "").unwrap()
    }

    #[test]
    fn request_carries_clamped_mixin() {
        let w = wallet();
        let low = plan(&w, 1).into_request(&TransferOptions::default());
        assert_eq!(low.mixin, MIN_MIXIN);
        let high = plan(&w, 1).into_request(&TransferOptions {
            mixin: 10_000,
            ..Default::default()
        });
        assert_eq!(high.mixin, MAX_MIXIN);
    }

    #[test]
    fn single_transfer_fits() {
        let mut w = wallet();
        let request = plan(&w, 2).into_request(&TransferOptions::default());
        let tx = build_single(&mut w, &request).unwrap();
        assert_eq!(tx.destinations.len(), 2);
    }

    #[test]
    fn single_transfer_needing_two_transactions_is_refused() {
        let mut w = wallet();
        w.set_limits(ConstructionLimits {
            recipients_per_tx: Some(1),
            ..ConstructionLimits::default()
        });
        let request = plan(&w, 2).into_request(&TransferOptions::default());
        assert_eq!(
            build(&mut w, &request, SizeTargetFactor::FULL).map(|b| b.len()),
            Ok(2)
        );
        assert_eq!(
            build_single(&mut w, &request),
            Err(TransferError::Generic(TRANSFER_TOO_LARGE_MESSAGE.into()))
        );
    }

    #[test]
    fn oversize_single_transfer_suggests_split() {
        let mut w = wallet();
        let request = plan(&w, 300).into_request(&TransferOptions::default());
        assert_eq!(
            build_single(&mut w, &request),
            Err(TransferError::Generic(TRANSFER_TOO_LARGE_MESSAGE.into()))
        );
    }

    #[test]
    fn sweep_needs_a_destination() {
        let empty = TransferPlan {
            destinations: vec![],
            payment_id: Default::default(),
            extra: Default::default(),
        };
        assert!(empty.into_sweep(&TransferOptions::default(), 0).is_err());
    }
}
