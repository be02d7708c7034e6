//! # Destination Resolver
//!
//! Parses each recipient address, collects at most one payment id across
//! the whole request (either embedded in an integrated address or passed
//! explicitly) and writes it into a fresh extra blob.

use serde::{Deserialize, Serialize};

use super::payment_id::{PaymentId, TxExtra};
use super::{TransferError, SINGLE_PAYMENT_ID_MESSAGE};
use crate::address::{parse_address, AccountAddress, Network};
use crate::config::SHORT_PAYMENT_ID_LENGTH;
use crate::engine::TxDestination;

/// A recipient as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestinationRequest {
    pub address: String,
    pub amount: u64,
}

/// A recipient after its address has been parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedDestination {
    pub address: AccountAddress,
    pub is_subaddress: bool,
    pub amount: u64,
    pub embedded_payment_id: Option<[u8; SHORT_PAYMENT_ID_LENGTH]>,
}

impl ResolvedDestination {
    pub fn to_tx_destination(&self) -> TxDestination {
        TxDestination {
            address: self.address,
            is_subaddress: self.is_subaddress,
            amount: self.amount,
        }
    }
}

/// Parsed destinations in request order, plus the extra blob carrying the
/// request's payment id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferPlan {
    pub destinations: Vec<ResolvedDestination>,
    pub payment_id: PaymentId,
    pub extra: TxExtra,
}

/// Resolves `requests` against `network`. `explicit_payment_id` is the
/// caller's `payment_id` field; empty means none.
pub fn resolve_transfer(
    network: Network,
    requests: &[DestinationRequest],
    explicit_payment_id: &str,
) -> Result<TransferPlan, TransferError> {
    let mut destinations = Vec::with_capacity(requests.len());
    let mut payment_id = PaymentId::None;
    let mut extra = TxExtra::new();

    for request in requests {
        let info = parse_address(network, &request.address).map_err(|e| {
            tracing::debug!(address = %request.address, error = %e, "rejecting destination");
            TransferError::WrongAddress(request.address.clone())
        })?;

        if let Some(embedded) = info.payment_id {
            if !explicit_payment_id.is_empty() || !payment_id.is_none() {
                return Err(TransferError::WrongPaymentId(
                    SINGLE_PAYMENT_ID_MESSAGE.to_string(),
                ));
            }
            payment_id = PaymentId::Short(embedded);
            payment_id.encode_into(&mut extra)?;
        }

        destinations.push(ResolvedDestination {
            address: info.address,
            is_subaddress: info.is_subaddress,
            amount: request.amount,
            embedded_payment_id: info.payment_id,
        });
    }

    if !explicit_payment_id.is_empty() {
        payment_id = PaymentId::parse(explicit_payment_id)?;
        payment_id.encode_into(&mut extra)?;
    }

    Ok(TransferPlan {
        destinations,
        payment_id,
        extra,
    })
}
