//! # Transfer Pipeline
//!
//! Turning a transfer request into committed transactions happens in five
//! steps, each in its own module:
//!
//! 1. [`destination`] parses recipient addresses and collects the payment id,
//!    which [`payment_id`] writes into the extra blob.
//! 2. [`mixin`] clamps the requested ring size.
//! 3. [`builder`] hands the request to the engine and enforces the
//!    one-transaction rule of plain transfers.
//! 4. [`retry`] re-runs construction with a smaller size target whenever the
//!    engine reports an oversized transaction.
//! 5. [`commit`] broadcasts the batch and reports hashes, keys, amounts and
//!    fees.
//!
//! Every step fails with a [`TransferError`]; the RPC layer maps those onto
//! wire error codes.

pub mod builder;
pub mod commit;
pub mod destination;
pub mod mixin;
pub mod payment_id;
pub mod retry;

use thiserror::Error;

use crate::engine::EngineError;
use payment_id::PaymentIdError;

pub use builder::{build, build_dust_sweep, build_single, build_sweep_all, TransferOptions};
pub use commit::{commit_and_report, CommittedTransfer};
pub use destination::{resolve_transfer, DestinationRequest, ResolvedDestination, TransferPlan};
pub use mixin::enforce_mixin;
pub use payment_id::{canonical_payment_id, PaymentId, TxExtra};
pub use retry::{run_with_retry, RetryState, SizeTargetFactor};

/// Message used when a request carries more than one payment id.
pub const SINGLE_PAYMENT_ID_MESSAGE: &str = "A single payment id is allowed per transaction";

/// Message used when a plain transfer would need several transactions.
pub const TRANSFER_TOO_LARGE_MESSAGE: &str = "Transaction would be too large.  try /transfer_split.";

/// Failures of the transfer pipeline.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransferError {
    /// A destination address did not parse.
    #[error("WALLET_RPC_ERROR_CODE_WRONG_ADDRESS: {0}")]
    WrongAddress(String),

    /// A payment id was malformed, duplicated or could not be encoded.
    #[error("{0}")]
    WrongPaymentId(String),

    /// The daemon could not serve the request.
    #[error("daemon is busy")]
    DaemonBusy,

    /// Construction kept producing oversized transactions.
    #[error("transaction too big: {size} bytes, limit {limit} bytes")]
    TxTooBig { size: u64, limit: u64 },

    /// Anything else the engine refused.
    #[error("{0}")]
    Generic(String),
}

impl From<PaymentIdError> for TransferError {
    fn from(err: PaymentIdError) -> Self {
        TransferError::WrongPaymentId(err.to_string())
    }
}

impl From<EngineError> for TransferError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::DaemonBusy => TransferError::DaemonBusy,
            EngineError::TxTooBig { size, limit } => TransferError::TxTooBig { size, limit },
            other => TransferError::Generic(other.to_string()),
        }
    }
}
